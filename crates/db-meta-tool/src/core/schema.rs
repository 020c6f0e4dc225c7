//! Catalog descriptor types for domains, tables, columns, and procedures.
//!
//! These are read from the `RDB$` system tables and rendered back into DDL
//! by the [`ddl`](crate::ddl) module. Source-text fields hold the catalog's
//! stored text verbatim (for example `DEFAULT 0` or `CHECK (VALUE > 0)`).

use serde::{Deserialize, Serialize};

use crate::typemap::map_type;

/// Storage type of a field as reported by `RDB$FIELDS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Raw `RDB$FIELD_TYPE` code.
    pub field_type: i16,
    /// Character length for string types, byte length otherwise.
    pub length: Option<i32>,
    /// Reported numeric precision.
    pub precision: Option<i32>,
    /// Numeric scale (negative for scaled integers).
    pub scale: Option<i32>,
}

impl FieldSpec {
    /// Render the SQL type name for this field.
    pub fn sql_type(&self) -> String {
        map_type(self.field_type, self.length, self.precision, self.scale)
    }
}

/// User-defined domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainDescriptor {
    pub name: String,
    pub field: FieldSpec,
    pub not_null: bool,
    pub default_source: Option<String>,
    pub check_source: Option<String>,
}

/// User table (views and system relations excluded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    /// Columns in `RDB$FIELD_POSITION` order.
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    /// Create a table with no columns loaded yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Sort columns by ordinal position.
    ///
    /// The catalog query already orders them; this keeps the invariant for
    /// sources that do not.
    pub fn sort_columns(&mut self) {
        self.columns.sort_by_key(|c| c.position);
    }
}

/// Table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub field: FieldSpec,
    /// User domain the column is declared with; rendered instead of the base type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub not_null: bool,
    pub default_source: Option<String>,
    pub position: i32,
}

/// Direction of a procedure parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterDirection {
    Input,
    Output,
}

impl ParameterDirection {
    /// Decode `RDB$PROCEDURE_PARAMETERS.RDB$PARAMETER_TYPE` (0 input, 1 output).
    pub fn from_code(code: i16) -> Self {
        if code == 1 {
            ParameterDirection::Output
        } else {
            ParameterDirection::Input
        }
    }
}

/// Stored procedure parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub direction: ParameterDirection,
    pub field: FieldSpec,
    pub position: i32,
}

/// User-defined stored procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureDescriptor {
    pub name: String,
    /// `RDB$PROCEDURE_SOURCE`: the body text following `AS`.
    pub source: Option<String>,
    pub inputs: Vec<ParameterDescriptor>,
    pub outputs: Vec<ParameterDescriptor>,
}

impl ProcedureDescriptor {
    /// Create a procedure without parameters.
    pub fn new(name: impl Into<String>, source: Option<String>) -> Self {
        Self {
            name: name.into(),
            source,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Distribute parameters into input and output lists, each in position order.
    pub fn set_parameters(&mut self, mut params: Vec<ParameterDescriptor>) {
        params.sort_by_key(|p| p.position);
        let (outputs, inputs): (Vec<_>, Vec<_>) = params
            .into_iter()
            .partition(|p| p.direction == ParameterDirection::Output);
        self.inputs = inputs;
        self.outputs = outputs;
    }
}
