//! DDL parsing for schema extraction.
//!
//! Parses CREATE TABLE and ALTER TABLE statements to extract:
//! - Column definitions with types, UNSIGNED and auto-generation markers
//! - Table-level FOREIGN KEY constraints
//! - Inline column REFERENCES clauses

use super::{ColumnType, Reference, Schema, TableId, TableSchema};
use crate::parser::{
    determine_buffer_size, skip_leading_noise, Compression, Parser, StatementType,
    SMALL_BUFFER_SIZE,
};
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Regex to extract table name from CREATE TABLE
/// Supports: `table` (MySQL), "table" (PostgreSQL), [table] (MSSQL), table (SQLite/unquoted), schema.table
static CREATE_TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?"#)
        .unwrap()
});

/// Regex to extract table name from ALTER TABLE
static ALTER_TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)ALTER\s+TABLE\s+(?:ONLY\s+)?(?:IF\s+EXISTS\s+)?(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s]+)[\]`"]?"#).unwrap()
});

/// Regex to extract the table list from DROP TABLE
static DROP_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)DROP\s+TABLE\s+(?:IF\s+EXISTS\s+)?(.+?)\s*(?:\bCASCADE\b|\bRESTRICT\b)?\s*;?\s*$"#)
        .unwrap()
});

/// Regex for column definition: name, then type with optional size and UNSIGNED.
/// Multi-word type names (`character varying`, `double precision`,
/// `timestamp with time zone`) are kept whole.
static COLUMN_DEF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)^\s*[\[`"]?([^\[\]`"\s,]+)[\]`"]?\s+(\w+(?:\s+(?:varying|precision))?(?:\s*\([^)]*\))?(?:\s+unsigned)?(?:\s+with(?:out)?\s+time\s+zone)?)"#,
    )
    .unwrap()
});

/// Regex for auto-generation markers in the constraint part of a column definition
static AUTO_GENERATED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:AUTO_INCREMENT|AUTOINCREMENT|IDENTITY)\b").unwrap());

/// Single-quoted string literal, e.g. a DEFAULT or COMMENT value
static STRING_LITERAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'(?:[^'\\]|\\.|'')*'").unwrap());

/// Regex for an inline `REFERENCES table (column)` clause on a column definition
static INLINE_REFERENCES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\bREFERENCES\s+(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?\s*\(([^)]+)\)"#,
    )
    .unwrap()
});

/// Regex for FOREIGN KEY constraint with optional constraint name
/// Supports: `name` (MySQL), "name" (PostgreSQL), [name] (MSSQL), name (unquoted)
static FOREIGN_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(?:CONSTRAINT\s+[\[`"]?([^\[\]`"\s]+)[\]`"]?\s+)?FOREIGN\s+KEY\s*\(([^)]+)\)\s*REFERENCES\s+(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?\s*\(([^)]+)\)"#,
    )
    .unwrap()
});

/// Parsed FOREIGN KEY constraint, before it is attached to columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDef {
    /// Constraint name (optional)
    pub name: Option<String>,
    /// Column names in this table
    pub columns: Vec<String>,
    /// Referenced table name
    pub referenced_table: String,
    /// Referenced column names, paired positionally with `columns`
    pub referenced_columns: Vec<String>,
}

impl ForeignKeyDef {
    /// Pair local columns with their targets
    pub fn references(&self) -> impl Iterator<Item = (&str, Reference)> + '_ {
        self.columns
            .iter()
            .zip(self.referenced_columns.iter())
            .map(|(local, target)| {
                (
                    local.as_str(),
                    Reference::new(self.referenced_table.clone(), target.clone()),
                )
            })
    }
}

/// Builder for constructing schema from DDL statements
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new() -> Self {
        Self {
            schema: Schema::new(),
        }
    }

    /// Parse a CREATE TABLE statement and add to schema
    pub fn parse_create_table(&mut self, stmt: &str) -> Option<TableId> {
        let table_name = extract_create_table_name(stmt)?;

        // Check if table already exists
        if let Some(id) = self.schema.get_table_id(&table_name) {
            return Some(id);
        }

        let mut table = TableSchema::new(table_name, TableId(0));

        // Extract the body between first ( and last )
        let body = extract_table_body(stmt)?;

        // Parse columns and constraints
        parse_table_body(&body, &mut table);

        Some(self.schema.add_table(table))
    }

    /// Parse an ALTER TABLE statement and attach any FOREIGN KEY it adds
    pub fn parse_alter_table(&mut self, stmt: &str) -> Option<TableId> {
        let table_name = extract_alter_table_name(stmt)?;
        let table_id = self.schema.get_table_id(&table_name)?;

        if let Some(table) = self.schema.table_mut(table_id) {
            for fk in parse_foreign_keys(stmt) {
                attach_foreign_key(table, &fk);
            }
        }

        Some(table_id)
    }

    /// Parse a DROP TABLE statement and forget every listed table that was
    /// declared so far. Returns the number of tables removed.
    pub fn parse_drop_table(&mut self, stmt: &str) -> usize {
        extract_drop_table_names(stmt)
            .iter()
            .filter(|name| self.schema.remove_table(name).is_some())
            .count()
    }

    /// Dispatch a raw statement to the matching parser
    pub fn parse_statement(&mut self, stmt: &[u8]) {
        let stmt_type = Parser::<&[u8]>::parse_statement(stmt);
        let text = String::from_utf8_lossy(skip_leading_noise(stmt));
        match stmt_type {
            StatementType::CreateTable => {
                self.parse_create_table(&text);
            }
            StatementType::AlterTable => {
                self.parse_alter_table(&text);
            }
            StatementType::DropTable => {
                self.parse_drop_table(&text);
            }
            StatementType::Unknown => {}
        }
    }

    /// Finalize the schema
    pub fn build(self) -> Schema {
        self.schema
    }

    /// Get current schema (for inspection during building)
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// Read every statement from a reader and build the schema it declares
pub fn read_schema<R: Read>(reader: R, buffer_size: usize) -> std::io::Result<Schema> {
    let mut parser = Parser::new(reader, buffer_size);
    let mut builder = SchemaBuilder::new();

    while let Some(stmt) = parser.read_statement()? {
        builder.parse_statement(&stmt);
    }

    Ok(builder.build())
}

/// Parse a schema from an in-memory DDL string
pub fn parse_schema_sql(sql: &str) -> Schema {
    let mut parser = Parser::new(sql.as_bytes(), SMALL_BUFFER_SIZE);
    let mut builder = SchemaBuilder::new();

    // Reading from a byte slice cannot fail
    while let Ok(Some(stmt)) = parser.read_statement() {
        builder.parse_statement(&stmt);
    }

    builder.build()
}

/// Load a schema from a (possibly compressed) DDL file
pub fn load_schema(path: &Path) -> anyhow::Result<Schema> {
    let file = File::open(path)
        .with_context(|| format!("failed to open schema file: {}", path.display()))?;
    let file_size = file.metadata()?.len();

    let compression = Compression::from_path(path);
    let reader = compression
        .wrap_reader(Box::new(file))
        .with_context(|| format!("failed to open {} stream: {}", compression, path.display()))?;

    read_schema(reader, determine_buffer_size(file_size))
        .with_context(|| format!("failed to read schema file: {}", path.display()))
}

/// Extract table name from CREATE TABLE statement
pub fn extract_create_table_name(stmt: &str) -> Option<String> {
    CREATE_TABLE_NAME_RE
        .captures(stmt)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract table name from ALTER TABLE statement
pub fn extract_alter_table_name(stmt: &str) -> Option<String> {
    ALTER_TABLE_NAME_RE
        .captures(stmt)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract the table names from a DROP TABLE statement, without schema prefix or quotes
pub fn extract_drop_table_names(stmt: &str) -> Vec<String> {
    let Some(list) = DROP_TABLE_RE.captures(stmt).and_then(|c| c.get(1)) else {
        return Vec::new();
    };
    list.as_str()
        .split(',')
        .filter_map(|name| name.trim().rsplit('.').next())
        .map(|name| {
            name.trim()
                .trim_matches(|c| matches!(c, '`' | '"' | '[' | ']'))
                .to_string()
        })
        .filter(|name| !name.is_empty())
        .collect()
}

/// Extract the body of a CREATE TABLE statement (between first ( and matching ))
fn extract_table_body(stmt: &str) -> Option<String> {
    let bytes = stmt.as_bytes();
    let mut depth = 0;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, &b) in bytes.iter().enumerate() {
        if escape_next {
            escape_next = false;
            continue;
        }

        if b == b'\\' && in_string {
            escape_next = true;
            continue;
        }

        if b == b'\'' {
            in_string = !in_string;
            continue;
        }

        if in_string {
            continue;
        }

        if b == b'(' {
            if depth == 0 {
                start = Some(i + 1);
            }
            depth += 1;
        } else if b == b')' {
            depth -= 1;
            if depth == 0 {
                if let Some(s) = start {
                    return Some(stmt[s..i].to_string());
                }
            }
        }
    }

    None
}

/// Parse the body of a CREATE TABLE to extract columns and constraints
fn parse_table_body(body: &str, table: &mut TableSchema) {
    // Constraints may name columns declared after them, so attach FKs last
    let mut foreign_keys = Vec::new();

    for part in split_table_body(body) {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_table_constraint(trimmed) {
            foreign_keys.extend(parse_foreign_keys(trimmed));
        } else {
            parse_column_def(trimmed, table);
        }
    }

    for fk in &foreign_keys {
        attach_foreign_key(table, fk);
    }
}

fn is_table_constraint(part: &str) -> bool {
    let upper = part.to_uppercase();
    [
        "PRIMARY KEY",
        "CONSTRAINT",
        "FOREIGN KEY",
        "KEY ",
        "INDEX ",
        "UNIQUE ",
        "UNIQUE(",
        "FULLTEXT ",
        "SPATIAL ",
        "CHECK ",
        "CHECK(",
        "EXCLUDE ",
    ]
    .iter()
    .any(|prefix| upper.starts_with(prefix))
}

/// Split table body by commas, respecting nested parentheses
pub fn split_table_body(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for ch in body.chars() {
        if escape_next {
            current.push(ch);
            escape_next = false;
            continue;
        }

        if ch == '\\' && in_string {
            current.push(ch);
            escape_next = true;
            continue;
        }

        if ch == '\'' {
            in_string = !in_string;
            current.push(ch);
            continue;
        }

        if in_string {
            current.push(ch);
            continue;
        }

        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current = String::new();
            }
            _ => {
                current.push(ch);
            }
        }
    }

    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }

    parts
}

/// Parse a column definition and append it to the table
fn parse_column_def(def: &str, table: &mut TableSchema) {
    let Some(caps) = COLUMN_DEF_RE.captures(def) else {
        return;
    };
    let (Some(name), Some(type_match)) = (caps.get(1), caps.get(2)) else {
        return;
    };
    let type_str = type_match.as_str();

    let col_type = ColumnType::from_sql_type(type_str);
    let base_type = type_str
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or(type_str);

    // Only the constraints after the type count, with string literals blanked out
    let constraints = STRING_LITERAL_RE.replace_all(&def[type_match.end()..], "''");
    let is_auto_generated =
        AUTO_GENERATED_RE.is_match(&constraints) || ColumnType::is_serial(base_type);

    let column = table.add_column(name.as_str(), col_type);
    column.is_auto_generated = is_auto_generated;

    if let Some(refs) = INLINE_REFERENCES_RE.captures(&constraints) {
        let target_table = refs.get(1).map(|m| m.as_str()).unwrap_or_default();
        let target_column = refs
            .get(2)
            .and_then(|m| parse_column_list(m.as_str()).into_iter().next());
        if let Some(target_column) = target_column {
            if !target_table.is_empty() {
                column.add_reference(Reference::new(target_table, target_column));
            }
        }
    }
}

/// Attach a foreign key's references to the matching local columns.
/// Columns that do not exist in the table are skipped.
fn attach_foreign_key(table: &mut TableSchema, fk: &ForeignKeyDef) {
    for (local, reference) in fk.references() {
        if let Some(column) = table.get_column_mut(local) {
            column.add_reference(reference);
        }
    }
}

/// Parse FOREIGN KEY constraints from a statement
pub fn parse_foreign_keys(stmt: &str) -> Vec<ForeignKeyDef> {
    let mut fks = Vec::new();

    for caps in FOREIGN_KEY_RE.captures_iter(stmt) {
        let name = caps.get(1).map(|m| m.as_str().to_string());
        let local_cols = caps
            .get(2)
            .map(|m| parse_column_list(m.as_str()))
            .unwrap_or_default();
        let ref_table = caps
            .get(3)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let ref_cols = caps
            .get(4)
            .map(|m| parse_column_list(m.as_str()))
            .unwrap_or_default();

        if !local_cols.is_empty() && !ref_table.is_empty() && !ref_cols.is_empty() {
            fks.push(ForeignKeyDef {
                name,
                columns: local_cols,
                referenced_table: ref_table,
                referenced_columns: ref_cols,
            });
        }
    }

    fks
}

/// Parse a comma-separated column list, stripping quotes (backticks, double quotes, brackets)
pub fn parse_column_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|c| {
            c.trim()
                .trim_matches('`')
                .trim_matches('"')
                .trim_matches('[')
                .trim_matches(']')
                .to_string()
        })
        .filter(|c| !c.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnKind;

    #[test]
    fn test_extract_table_body_skips_strings() {
        let stmt = "CREATE TABLE t (a VARCHAR(3) DEFAULT ')', b INT) ENGINE=InnoDB;";
        let body = extract_table_body(stmt).unwrap();
        assert_eq!(body, "a VARCHAR(3) DEFAULT ')', b INT");
    }

    #[test]
    fn test_constraint_detection() {
        assert!(is_table_constraint("PRIMARY KEY (`id`)"));
        assert!(is_table_constraint("CONSTRAINT `fk` FOREIGN KEY (`a`) REFERENCES `b` (`c`)"));
        assert!(is_table_constraint("UNIQUE KEY `uniq` (`email`)"));
        assert!(!is_table_constraint("`key_name` varchar(20)"));
        assert!(!is_table_constraint("unique_code INT"));
    }

    #[test]
    fn test_foreign_key_pairs_columns_positionally() {
        let fks = parse_foreign_keys(
            "FOREIGN KEY (`tenant_id`, `user_id`) REFERENCES `users` (`tenant_id`, `id`)",
        );
        assert_eq!(fks.len(), 1);
        let pairs: Vec<_> = fks[0].references().collect();
        assert_eq!(pairs[0].0, "tenant_id");
        assert_eq!(pairs[0].1, Reference::new("users", "tenant_id"));
        assert_eq!(pairs[1].0, "user_id");
        assert_eq!(pairs[1].1, Reference::new("users", "id"));
    }

    #[test]
    fn test_constraint_before_column_is_attached() {
        let mut builder = SchemaBuilder::new();
        builder.parse_create_table(
            "CREATE TABLE t (FOREIGN KEY (owner) REFERENCES u (name), owner VARCHAR(10));",
        );
        let schema = builder.build();
        let owner = schema.get_table("t").unwrap().get_column("owner").unwrap();
        assert_eq!(owner.references, vec![Reference::new("u", "name")]);
    }

    #[test]
    fn test_multi_word_types_keep_size() {
        let mut table = TableSchema::new("t".to_string(), TableId(0));
        parse_column_def("name character varying(20) NOT NULL", &mut table);
        parse_column_def("price double precision", &mut table);
        parse_column_def("seen_at timestamp(3) without time zone", &mut table);

        assert_eq!(
            table.columns[0].col_type,
            ColumnType::from_sql_type("varchar(20)")
        );
        assert_eq!(table.columns[0].col_type.size, Some(20));
        assert_eq!(
            table.columns[1].col_type.kind,
            ColumnKind::Other("double precision".to_string())
        );
        assert_eq!(
            table.columns[2].col_type.kind,
            ColumnKind::DateTime
        );
    }

    #[test]
    fn test_identity_outside_constraints_is_not_auto_generated() {
        let mut table = TableSchema::new("t".to_string(), TableId(0));
        parse_column_def("`identity` VARCHAR(10) NOT NULL", &mut table);
        parse_column_def("owner VARCHAR(10) COMMENT 'identity of the owner'", &mut table);
        parse_column_def("note TEXT DEFAULT 'AUTO_INCREMENT'", &mut table);
        parse_column_def("id INT GENERATED BY DEFAULT AS IDENTITY", &mut table);

        let flags: Vec<bool> = table.columns.iter().map(|c| c.is_auto_generated).collect();
        assert_eq!(flags, vec![false, false, false, true]);
    }

    #[test]
    fn test_extract_drop_table_names() {
        assert_eq!(extract_drop_table_names("DROP TABLE IF EXISTS `users`;"), vec!["users"]);
        assert_eq!(
            extract_drop_table_names("DROP TABLE public.orders, \"Items\" CASCADE;"),
            vec!["orders", "Items"]
        );
        assert!(extract_drop_table_names("DROP INDEX idx;").is_empty());
    }
}
