//! Record assembly, INSERT rendering and statement output.

use crate::generator::{ColumnValues, Value};
use crate::parser::SqlDialect;
use crate::schema::Schema;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub const WRITER_BUFFER_SIZE: usize = 256 * 1024;
pub const STMT_BUFFER_COUNT: usize = 100;

/// Rows of one table, ready to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRecords {
    /// Table name
    pub table: String,
    /// Column names in declared order, auto-generated columns excluded
    pub columns: Vec<String>,
    /// One record per row, aligned with `columns`
    pub records: Vec<Vec<Value>>,
}

/// Regroup column values into per-table records, in schema order.
///
/// Row `k` of a table holds value `k` of each of its non-auto-generated columns.
pub fn assemble_records(values: &ColumnValues, schema: &Schema, rows: usize) -> Vec<TableRecords> {
    schema
        .iter()
        .map(|table| {
            let columns: Vec<_> = table.insertable_columns().collect();
            let column_values: Vec<&[Value]> = columns
                .iter()
                .map(|c| values.get(&c.full_name).unwrap_or(&[]))
                .collect();

            let records = (0..rows)
                .map(|k| {
                    column_values
                        .iter()
                        .map(|v| v.get(k).cloned().unwrap_or_default())
                        .collect()
                })
                .collect();

            TableRecords {
                table: table.name.clone(),
                columns: columns.iter().map(|c| c.name.clone()).collect(),
                records,
            }
        })
        .collect()
}

/// Renders table records as INSERT statements for one dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertRenderer {
    dialect: SqlDialect,
}

impl InsertRenderer {
    pub fn new(dialect: SqlDialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    /// Render one INSERT per table with records, between the statements
    /// that switch referential integrity checks off and back on.
    ///
    /// Returns an empty list when no table has records.
    pub fn render(&self, tables: &[TableRecords]) -> Vec<String> {
        let inserts: Vec<String> = tables
            .iter()
            .filter(|t| !t.records.is_empty())
            .flat_map(|t| self.render_table(t))
            .collect();

        if inserts.is_empty() {
            return Vec::new();
        }

        let mut statements = Vec::with_capacity(inserts.len() + 2);
        statements.push(self.disable_integrity_checks().to_string());
        statements.extend(inserts);
        statements.push(self.enable_integrity_checks().to_string());
        statements
    }

    /// Statements inserting every record of one table.
    ///
    /// This is a single multi-row INSERT, except for tables without insertable
    /// columns outside MySQL: those get one `DEFAULT VALUES` insert per row.
    pub fn render_table(&self, table: &TableRecords) -> Vec<String> {
        if table.columns.is_empty() && self.dialect != SqlDialect::MySql {
            let stmt = format!(
                "INSERT INTO {} DEFAULT VALUES;",
                self.quote_identifier(&table.table)
            );
            return vec![stmt; table.records.len()];
        }
        vec![self.render_insert(table)]
    }

    /// ``INSERT INTO `table`(`a`, `b`) VALUES ('1','2'),('3','4');``
    pub fn render_insert(&self, table: &TableRecords) -> String {
        let columns = table
            .columns
            .iter()
            .map(|c| self.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");

        let tuples = table
            .records
            .iter()
            .map(|record| {
                let values = record
                    .iter()
                    .map(|v| self.format_sql_string(v))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("({})", values)
            })
            .collect::<Vec<_>>()
            .join(",");

        format!(
            "INSERT INTO {}({}) VALUES {};",
            self.quote_identifier(&table.table),
            columns,
            tuples
        )
    }

    pub fn disable_integrity_checks(&self) -> &'static str {
        match self.dialect {
            SqlDialect::MySql => "SET foreign_key_checks = 0;",
            SqlDialect::Postgres => "SET session_replication_role = replica;",
            SqlDialect::Sqlite => "PRAGMA foreign_keys = OFF;",
        }
    }

    pub fn enable_integrity_checks(&self) -> &'static str {
        match self.dialect {
            SqlDialect::MySql => "SET foreign_key_checks = 1;",
            SqlDialect::Postgres => "SET session_replication_role = DEFAULT;",
            SqlDialect::Sqlite => "PRAGMA foreign_keys = ON;",
        }
    }

    /// Quote an identifier based on dialect
    pub fn quote_identifier(&self, name: &str) -> String {
        match self.dialect {
            SqlDialect::MySql => format!("`{}`", name.replace('`', "``")),
            SqlDialect::Postgres | SqlDialect::Sqlite => {
                format!("\"{}\"", name.replace('"', "\"\""))
            }
        }
    }

    /// Quote and escape a value as a string literal
    pub fn format_sql_string(&self, value: &str) -> String {
        match self.dialect {
            SqlDialect::MySql => {
                // MySQL uses backslash escaping
                let escaped = value
                    .replace('\\', "\\\\")
                    .replace('\'', "\\'")
                    .replace('\n', "\\n")
                    .replace('\r', "\\r")
                    .replace('\t', "\\t")
                    .replace('\0', "\\0");
                format!("'{}'", escaped)
            }
            SqlDialect::Postgres | SqlDialect::Sqlite => {
                let escaped = value.replace('\'', "''");
                format!("'{}'", escaped)
            }
        }
    }
}

/// Buffered statement output, one statement per paragraph
pub struct StatementWriter<W: Write> {
    writer: BufWriter<W>,
    written: usize,
    write_count: usize,
}

impl StatementWriter<Box<dyn Write>> {
    /// Write to a file, or to stdout when no path is given
    pub fn create(output: Option<&Path>) -> io::Result<Self> {
        let inner: Box<dyn Write> = match output {
            Some(path) => Box::new(File::create(path)?),
            None => Box::new(io::stdout()),
        };
        Ok(Self::new(inner))
    }
}

impl<W: Write> StatementWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(WRITER_BUFFER_SIZE, inner),
            written: 0,
            write_count: 0,
        }
    }

    pub fn write_statement(&mut self, stmt: &str) -> io::Result<()> {
        if self.written > 0 {
            self.writer.write_all(b"\n")?;
        }
        self.writer.write_all(stmt.as_bytes())?;
        self.writer.write_all(b"\n")?;

        self.written += 1;
        self.write_count += 1;
        if self.write_count >= STMT_BUFFER_COUNT {
            self.write_count = 0;
            self.writer.flush()?;
        }

        Ok(())
    }

    /// Number of statements written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.write_count = 0;
        self.writer.flush()
    }

    /// Flush and return the underlying writer
    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}
