//! `RDB$` catalog queries and row decoding.
//!
//! Names in the catalog are `CHAR` columns padded with spaces; every name is
//! trimmed on decode. Integer codes are read as `i64` and narrowed here.
//!
//! A column based on a user domain inherits the domain's NOT NULL and default
//! unless the column overrides them, so both are read through `COALESCE`.

use crate::core::schema::{
    ColumnDescriptor, DomainDescriptor, FieldSpec, ParameterDescriptor, ParameterDirection,
    ProcedureDescriptor, TableDescriptor,
};

pub(super) const DOMAINS_QUERY: &str = r#"
    SELECT f.RDB$FIELD_NAME, f.RDB$FIELD_TYPE,
           COALESCE(f.RDB$CHARACTER_LENGTH, f.RDB$FIELD_LENGTH),
           f.RDB$FIELD_PRECISION, f.RDB$FIELD_SCALE, f.RDB$NULL_FLAG,
           f.RDB$DEFAULT_SOURCE, f.RDB$VALIDATION_SOURCE
    FROM RDB$FIELDS f
    WHERE f.RDB$FIELD_NAME NOT STARTING WITH 'RDB$'
      AND (f.RDB$SYSTEM_FLAG IS NULL OR f.RDB$SYSTEM_FLAG = 0)
    ORDER BY f.RDB$FIELD_NAME
"#;

pub(super) const TABLES_QUERY: &str = r#"
    SELECT r.RDB$RELATION_NAME
    FROM RDB$RELATIONS r
    WHERE (r.RDB$SYSTEM_FLAG IS NULL OR r.RDB$SYSTEM_FLAG = 0)
      AND r.RDB$VIEW_BLR IS NULL
    ORDER BY r.RDB$RELATION_NAME
"#;

pub(super) const COLUMNS_QUERY: &str = r#"
    SELECT rf.RDB$FIELD_NAME, f.RDB$FIELD_TYPE,
           COALESCE(f.RDB$CHARACTER_LENGTH, f.RDB$FIELD_LENGTH),
           f.RDB$FIELD_PRECISION, f.RDB$FIELD_SCALE,
           COALESCE(rf.RDB$NULL_FLAG, f.RDB$NULL_FLAG),
           COALESCE(rf.RDB$DEFAULT_SOURCE, f.RDB$DEFAULT_SOURCE),
           rf.RDB$FIELD_POSITION, rf.RDB$FIELD_SOURCE
    FROM RDB$RELATION_FIELDS rf
    JOIN RDB$FIELDS f ON rf.RDB$FIELD_SOURCE = f.RDB$FIELD_NAME
    WHERE rf.RDB$RELATION_NAME = ?
    ORDER BY rf.RDB$FIELD_POSITION
"#;

pub(super) const PROCEDURES_QUERY: &str = r#"
    SELECT p.RDB$PROCEDURE_NAME, p.RDB$PROCEDURE_SOURCE
    FROM RDB$PROCEDURES p
    WHERE (p.RDB$SYSTEM_FLAG IS NULL OR p.RDB$SYSTEM_FLAG = 0)
      AND p.RDB$PACKAGE_NAME IS NULL
    ORDER BY p.RDB$PROCEDURE_NAME
"#;

pub(super) const PARAMETERS_QUERY: &str = r#"
    SELECT p.RDB$PARAMETER_NAME, p.RDB$PARAMETER_TYPE, f.RDB$FIELD_TYPE,
           COALESCE(f.RDB$CHARACTER_LENGTH, f.RDB$FIELD_LENGTH),
           f.RDB$FIELD_PRECISION, f.RDB$FIELD_SCALE, p.RDB$PARAMETER_NUMBER
    FROM RDB$PROCEDURE_PARAMETERS p
    JOIN RDB$FIELDS f ON p.RDB$FIELD_SOURCE = f.RDB$FIELD_NAME
    WHERE p.RDB$PROCEDURE_NAME = ?
      AND p.RDB$PACKAGE_NAME IS NULL
    ORDER BY p.RDB$PARAMETER_TYPE, p.RDB$PARAMETER_NUMBER
"#;

/// name, type, length, precision, scale, null flag, default, check
pub(super) type DomainRow = (
    String,
    i64,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<String>,
    Option<String>,
);

/// name, type, length, precision, scale, null flag, default, position, field source
pub(super) type ColumnRow = (
    String,
    i64,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<String>,
    Option<i64>,
    String,
);

/// name, source
pub(super) type ProcedureRow = (String, Option<String>);

/// name, direction, type, length, precision, scale, position
pub(super) type ParameterRow = (
    String,
    i64,
    i64,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
);

fn field_spec(
    field_type: i64,
    length: Option<i64>,
    precision: Option<i64>,
    scale: Option<i64>,
) -> FieldSpec {
    FieldSpec {
        field_type: field_type as i16,
        length: length.map(|v| v as i32),
        precision: precision.map(|v| v as i32),
        scale: scale.map(|v| v as i32),
    }
}

pub(super) fn domain_from_row(row: DomainRow) -> DomainDescriptor {
    let (name, field_type, length, precision, scale, null_flag, default_source, check_source) = row;
    DomainDescriptor {
        name: name.trim().to_string(),
        field: field_spec(field_type, length, precision, scale),
        not_null: null_flag.unwrap_or(0) == 1,
        default_source,
        check_source,
    }
}

pub(super) fn table_from_row((name,): (String,)) -> TableDescriptor {
    TableDescriptor::new(name.trim())
}

pub(super) fn column_from_row(row: ColumnRow) -> ColumnDescriptor {
    let (name, field_type, length, precision, scale, null_flag, default_source, position, source) =
        row;
    let source = source.trim();
    // Columns declared with a plain type get an implicit `RDB$` domain.
    let domain = (!source.is_empty() && !source.starts_with("RDB$")).then(|| source.to_string());
    ColumnDescriptor {
        name: name.trim().to_string(),
        field: field_spec(field_type, length, precision, scale),
        domain,
        not_null: null_flag.unwrap_or(0) == 1,
        default_source,
        position: position.unwrap_or(0) as i32,
    }
}

pub(super) fn procedure_from_row((name, source): ProcedureRow) -> ProcedureDescriptor {
    ProcedureDescriptor::new(name.trim(), source)
}

pub(super) fn parameter_from_row(row: ParameterRow) -> ParameterDescriptor {
    let (name, direction, field_type, length, precision, scale, position) = row;
    ParameterDescriptor {
        name: name.trim().to_string(),
        direction: ParameterDirection::from_code(direction as i16),
        field: field_spec(field_type, length, precision, scale),
        position: position.unwrap_or(0) as i32,
    }
}
