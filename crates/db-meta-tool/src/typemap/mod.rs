//! Type mapping from Firebird catalog field type codes to SQL type names.
//!
//! `RDB$FIELDS.RDB$FIELD_TYPE` stores the physical storage type. Exact
//! numerics are stored as scaled integers, which the catalog reports as an
//! integer type with a negative `RDB$FIELD_SCALE`.

/// Known `RDB$FIELD_TYPE` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    SmallInt,
    Integer,
    Float,
    Date,
    Time,
    Char,
    BigInt,
    Boolean,
    DecFloat16,
    DecFloat34,
    Int128,
    Double,
    TimeTz,
    TimestampTz,
    Timestamp,
    Varchar,
    CString,
    Blob,
}

impl FieldType {
    /// Decode a raw catalog code.
    pub fn from_code(code: i16) -> Option<Self> {
        let field_type = match code {
            7 => FieldType::SmallInt,
            8 => FieldType::Integer,
            10 => FieldType::Float,
            12 => FieldType::Date,
            13 => FieldType::Time,
            14 => FieldType::Char,
            16 => FieldType::BigInt,
            23 => FieldType::Boolean,
            24 => FieldType::DecFloat16,
            25 => FieldType::DecFloat34,
            26 => FieldType::Int128,
            27 => FieldType::Double,
            28 => FieldType::TimeTz,
            29 => FieldType::TimestampTz,
            35 => FieldType::Timestamp,
            37 => FieldType::Varchar,
            40 => FieldType::CString,
            261 => FieldType::Blob,
            _ => return None,
        };
        Some(field_type)
    }

    /// Total digits used when a scaled integer is rendered as NUMERIC.
    ///
    /// These buckets do not follow the catalog's RDB$FIELD_PRECISION; they
    /// match what earlier exports produced and must stay stable.
    fn numeric_precision(self) -> Option<u8> {
        match self {
            FieldType::SmallInt => Some(15),
            FieldType::Integer | FieldType::BigInt => Some(18),
            FieldType::Int128 => Some(38),
            _ => None,
        }
    }
}

/// Map a catalog field type to its SQL type name.
///
/// Missing length/precision/scale read as zero. `precision` is accepted for
/// call-site symmetry with the catalog row but does not influence the result.
/// Unknown codes yield `UNKNOWN_TYPE_<code>` so the export still completes.
pub fn map_type(
    code: i16,
    length: Option<i32>,
    _precision: Option<i32>,
    scale: Option<i32>,
) -> String {
    let length = length.unwrap_or(0);
    let scale = scale.unwrap_or(0);

    let Some(field_type) = FieldType::from_code(code) else {
        return format!("UNKNOWN_TYPE_{}", code);
    };

    if scale < 0 {
        if let Some(digits) = field_type.numeric_precision() {
            return format!("NUMERIC({},{})", digits, scale.unsigned_abs());
        }
    }

    match field_type {
        FieldType::SmallInt => "SMALLINT".to_string(),
        FieldType::Integer => "INTEGER".to_string(),
        FieldType::BigInt => "BIGINT".to_string(),
        FieldType::Int128 => "INT128".to_string(),
        FieldType::Float => "FLOAT".to_string(),
        FieldType::Double => "DOUBLE PRECISION".to_string(),
        FieldType::DecFloat16 => "DECFLOAT(16)".to_string(),
        FieldType::DecFloat34 => "DECFLOAT(34)".to_string(),
        FieldType::Boolean => "BOOLEAN".to_string(),
        FieldType::Date => "DATE".to_string(),
        FieldType::Time => "TIME".to_string(),
        FieldType::TimeTz => "TIME WITH TIME ZONE".to_string(),
        FieldType::Timestamp => "TIMESTAMP".to_string(),
        FieldType::TimestampTz => "TIMESTAMP WITH TIME ZONE".to_string(),
        FieldType::Char => format!("CHAR({})", length),
        FieldType::Varchar => format!("VARCHAR({})", length),
        FieldType::CString => format!("CSTRING({})", length),
        FieldType::Blob => "BLOB SUB_TYPE TEXT".to_string(),
    }
}
