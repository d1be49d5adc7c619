//! Schema model for reference-aware data generation.
//!
//! This module provides:
//! - Data models for tables, columns, column types and references
//! - DDL parsing for extracting schema information from a dump
//! - The column dependency graph that drives value resolution

mod ddl;
mod graph;

pub use ddl::*;
pub use graph::*;

use ahash::AHashMap;
use std::fmt;

/// Unique identifier for a table within a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(pub u32);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableId({})", self.0)
    }
}

/// Unique identifier for a column within a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnId(pub u16);

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ColumnId({})", self.0)
    }
}

/// Storage width of an integer column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    /// SMALLINT, INT2, SMALLSERIAL (16 bit)
    Small,
    /// MEDIUMINT (24 bit)
    Medium,
    /// INT, INTEGER, INT4, SERIAL (32 bit)
    Standard,
    /// BIGINT, INT8, BIGSERIAL (64 bit)
    Big,
}

impl IntWidth {
    /// Number of value bits for this width
    pub fn bits(&self) -> u32 {
        match self {
            IntWidth::Small => 16,
            IntWidth::Medium => 24,
            IntWidth::Standard => 32,
            IntWidth::Big => 64,
        }
    }
}

/// Base kind of a declared column type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Text types: CHAR, VARCHAR, TEXT, ENUM, SET
    Text,
    /// Binary types: BINARY, VARBINARY, BLOB family
    Binary,
    /// Integer types of a given storage width
    Int(IntWidth),
    /// One-byte boolean-ish numbers: TINYINT, BOOL, BOOLEAN
    TinyInt,
    /// Timestamp types: TIMESTAMP, DATETIME
    DateTime,
    /// Calendar date without time
    Date,
    /// JSON, JSONB
    Json,
    /// Any other type (no value generator available)
    Other(String),
}

/// Declared column type: base kind, optional size and signedness
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    pub kind: ColumnKind,
    /// Size/precision parameter, e.g. 255 in VARCHAR(255)
    pub size: Option<u32>,
    /// UNSIGNED modifier (integer types only)
    pub unsigned: bool,
}

impl ColumnType {
    pub fn new(kind: ColumnKind) -> Self {
        Self {
            kind,
            size: None,
            unsigned: false,
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    /// Parse a SQL type string into a ColumnType
    /// Supports MySQL, PostgreSQL, and SQLite types
    pub fn from_sql_type(type_str: &str) -> Self {
        let type_lower = type_str.trim().to_lowercase();
        let base_type = type_lower
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or(&type_lower);

        let kind = match base_type {
            "char" | "varchar" | "character" | "nchar" | "nvarchar" | "text" | "tinytext"
            | "mediumtext" | "longtext" | "enum" | "set" | "citext" => ColumnKind::Text,
            "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob" | "bytea" => {
                ColumnKind::Binary
            }
            "tinyint" | "bool" | "boolean" => ColumnKind::TinyInt,
            "smallint" | "int2" | "smallserial" | "serial2" => ColumnKind::Int(IntWidth::Small),
            "mediumint" => ColumnKind::Int(IntWidth::Medium),
            "int" | "integer" | "int4" | "serial" | "serial4" => {
                ColumnKind::Int(IntWidth::Standard)
            }
            "bigint" | "int8" | "bigserial" | "serial8" => ColumnKind::Int(IntWidth::Big),
            "timestamp" | "datetime" | "timestamptz" => ColumnKind::DateTime,
            "date" => ColumnKind::Date,
            "json" | "jsonb" => ColumnKind::Json,
            _ => ColumnKind::Other(type_str.trim().to_string()),
        };

        let size = type_lower
            .split_once('(')
            .and_then(|(_, rest)| {
                rest.split(|c: char| c == ',' || c == ')')
                    .next()
                    .map(str::trim)
            })
            .and_then(|n| n.parse::<u32>().ok());

        let unsigned = type_lower
            .split_whitespace()
            .any(|word| word == "unsigned");

        Self {
            kind,
            size,
            unsigned,
        }
    }

    /// Whether the type name itself implies an auto-generated value (SERIAL family)
    pub fn is_serial(type_str: &str) -> bool {
        let lower = type_str.trim().to_lowercase();
        matches!(
            lower.as_str(),
            "serial" | "smallserial" | "bigserial" | "serial2" | "serial4" | "serial8"
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match &self.kind {
            ColumnKind::Text => "varchar",
            ColumnKind::Binary => "varbinary",
            ColumnKind::Int(IntWidth::Small) => "smallint",
            ColumnKind::Int(IntWidth::Medium) => "mediumint",
            ColumnKind::Int(IntWidth::Standard) => "int",
            ColumnKind::Int(IntWidth::Big) => "bigint",
            ColumnKind::TinyInt => "tinyint",
            ColumnKind::DateTime => "datetime",
            ColumnKind::Date => "date",
            ColumnKind::Json => "json",
            ColumnKind::Other(raw) => return write!(f, "{}", raw),
        };
        write!(f, "{}", base)?;
        if let Some(size) = self.size {
            write!(f, "({})", size)?;
        }
        if self.unsigned {
            write!(f, " unsigned")?;
        }
        Ok(())
    }
}

/// Reference from one column to another (foreign-key-like).
/// The target is kept by name; it is resolved when the column graph is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Referenced table name
    pub table: String,
    /// Referenced column name
    pub column: String,
}

impl Reference {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Full `table.column` name of the target
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.table, self.column)
    }
}

/// Column definition within a table
#[derive(Debug, Clone)]
pub struct Column {
    /// Column name
    pub name: String,
    /// `table.column`, unique within the schema
    pub full_name: String,
    /// Column type
    pub col_type: ColumnType,
    /// Position in table (0-indexed)
    pub ordinal: ColumnId,
    /// Value is assigned by the database (AUTO_INCREMENT, SERIAL, IDENTITY)
    pub is_auto_generated: bool,
    /// Columns this column takes its values from
    pub references: Vec<Reference>,
}

impl Column {
    pub fn has_references(&self) -> bool {
        !self.references.is_empty()
    }

    /// Add a reference, ignoring exact duplicates
    pub fn add_reference(&mut self, reference: Reference) {
        if !self.references.contains(&reference) {
            self.references.push(reference);
        }
    }
}

/// Complete table schema definition
#[derive(Debug, Clone)]
pub struct TableSchema {
    /// Table name
    pub name: String,
    /// Table ID within the schema
    pub id: TableId,
    /// Column definitions in order
    pub columns: Vec<Column>,
}

impl TableSchema {
    /// Create a new empty table schema
    pub fn new(name: String, id: TableId) -> Self {
        Self {
            name,
            id,
            columns: Vec::new(),
        }
    }

    /// Append a column, assigning its ordinal and full name
    pub fn add_column(&mut self, name: &str, col_type: ColumnType) -> &mut Column {
        let ordinal = ColumnId(self.columns.len() as u16);
        self.columns.push(Column {
            name: name.to_string(),
            full_name: format!("{}.{}", self.name, name),
            col_type,
            ordinal,
            is_auto_generated: false,
            references: Vec::new(),
        });
        let last = self.columns.len() - 1;
        &mut self.columns[last]
    }

    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Get a mutable column by name
    pub fn get_column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Get column by ID
    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(id.0 as usize)
    }

    /// Columns that receive generated values in INSERT statements
    pub fn insertable_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.is_auto_generated)
    }
}

/// Complete database schema
#[derive(Debug)]
pub struct Schema {
    /// Map from table name to table ID
    pub tables: AHashMap<String, TableId>,
    /// Table schemas indexed by TableId
    pub table_schemas: Vec<TableSchema>,
}

impl Schema {
    /// Create a new empty schema
    pub fn new() -> Self {
        Self {
            tables: AHashMap::new(),
            table_schemas: Vec::new(),
        }
    }

    /// Get table ID by name (case-insensitive)
    pub fn get_table_id(&self, name: &str) -> Option<TableId> {
        // Try exact match first
        if let Some(&id) = self.tables.get(name) {
            return Some(id);
        }
        let name_lower = name.to_lowercase();
        self.tables
            .iter()
            .find(|(k, _)| k.to_lowercase() == name_lower)
            .map(|(_, &id)| id)
    }

    /// Get table schema by ID
    pub fn table(&self, id: TableId) -> Option<&TableSchema> {
        self.table_schemas.get(id.0 as usize)
    }

    /// Get mutable table schema by ID
    pub fn table_mut(&mut self, id: TableId) -> Option<&mut TableSchema> {
        self.table_schemas.get_mut(id.0 as usize)
    }

    /// Get table schema by name
    pub fn get_table(&self, name: &str) -> Option<&TableSchema> {
        self.get_table_id(name).and_then(|id| self.table(id))
    }

    /// Add a new table schema, returning its ID
    pub fn add_table(&mut self, mut schema: TableSchema) -> TableId {
        let id = TableId(self.table_schemas.len() as u32);
        schema.id = id;
        self.tables.insert(schema.name.clone(), id);
        self.table_schemas.push(schema);
        id
    }

    /// Remove a table by name (case-insensitive). Later tables move up one
    /// position, so their `TableId`s change.
    pub fn remove_table(&mut self, name: &str) -> Option<TableSchema> {
        let id = self.get_table_id(name)?;
        let removed = self.table_schemas.remove(id.0 as usize);

        self.tables.clear();
        for (i, table) in self.table_schemas.iter_mut().enumerate() {
            table.id = TableId(i as u32);
            self.tables.insert(table.name.clone(), table.id);
        }

        Some(removed)
    }

    /// Get the number of tables
    pub fn len(&self) -> usize {
        self.table_schemas.len()
    }

    /// Check if schema is empty
    pub fn is_empty(&self) -> bool {
        self.table_schemas.is_empty()
    }

    /// Total number of columns across all tables
    pub fn column_count(&self) -> usize {
        self.table_schemas.iter().map(|t| t.columns.len()).sum()
    }

    /// Iterate over all table schemas
    pub fn iter(&self) -> impl Iterator<Item = &TableSchema> {
        self.table_schemas.iter()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}
