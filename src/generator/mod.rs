//! Reference-aware dummy data generation.
//!
//! Pipeline for one request:
//! 1. Build the column dependency graph from the schema
//! 2. Resolve every column to `rows` values (random or derived from references)
//! 3. Regroup the values into per-table records
//! 4. Render INSERT statements wrapped in integrity toggles
//!
//! Nothing is kept between requests; each call builds its own graph and state.

mod config;
mod fake;
mod random;
mod resolve;

pub use config::{ColumnStrategy, GenerateYamlConfig, TableConfig};
pub use fake::{ConstantGenerator, FakeGenerator, FakeKind};
pub use random::{
    AlphanumericGenerator, DateGenerator, DateTimeGenerator, GeneratorRegistry, IntegerGenerator,
    JsonGenerator, TinyIntGenerator, ValueGenerator, DEFAULT_STRING_LENGTH, MAX_TIMESTAMP,
    MIN_TIMESTAMP,
};
pub use resolve::{
    resolution_order, resolve_values, ColumnValues, NodeState, ResolutionState, Resolver,
};

use crate::error::GenerateError;
use crate::parser::SqlDialect;
use crate::schema::{ColumnGraph, Schema};
use crate::writer::{assemble_records, InsertRenderer, TableRecords};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

/// One generated or derived literal
pub type Value = String;

/// Value emitted for columns the database assigns itself
pub const AUTO_GENERATED_PLACEHOLDER: &str = "NULL";

/// Default number of rows per table
pub const DEFAULT_ROWS: usize = 10;

/// Options for one generation request
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Rows generated for every table
    pub rows: usize,
    /// Dialect of the rendered statements
    pub dialect: SqlDialect,
    /// Random seed; a fresh one is drawn when absent
    pub seed: Option<u64>,
    /// Tables that take part in resolution but get no INSERT
    pub skip_tables: Vec<String>,
    /// Value generators, including per-column overrides
    pub registry: GeneratorRegistry,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            dialect: SqlDialect::default(),
            seed: None,
            skip_tables: Vec::new(),
            registry: GeneratorRegistry::with_defaults(),
        }
    }
}

impl GenerateOptions {
    pub fn with_rows(rows: usize) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Whether a table is excluded from the output (case-insensitive)
    pub fn is_skipped(&self, table: &str) -> bool {
        self.skip_tables
            .iter()
            .any(|t| t.eq_ignore_ascii_case(table))
    }
}

/// Per-table figures of a generation run
#[derive(Debug, Clone, Serialize)]
pub struct TableGenerateStats {
    pub name: String,
    /// Columns listed in the INSERT (auto-generated columns excluded)
    pub columns: usize,
    pub rows: usize,
    pub skipped: bool,
}

/// Summary of a generation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateStats {
    pub tables: usize,
    pub columns: usize,
    /// Columns filled by a value generator
    pub generated_columns: usize,
    /// Columns copied or concatenated from referenced columns
    pub derived_columns: usize,
    /// Columns left to the database
    pub auto_generated_columns: usize,
    /// Resolved references (dangling ones are not counted)
    pub references: usize,
    pub rows_per_table: usize,
    pub statements: usize,
    pub seed: u64,
    pub skipped_tables: Vec<String>,
    pub table_stats: Vec<TableGenerateStats>,
}

/// Result of a generation request
#[derive(Debug)]
pub struct GeneratedOutput {
    /// Statements in execution order
    pub statements: Vec<String>,
    /// Resolved values for every column
    pub values: ColumnValues,
    pub stats: GenerateStats,
}

/// Generate INSERT statements for a schema.
///
/// Either the full statement list is produced or an error is returned.
pub fn generate(schema: &Schema, options: &GenerateOptions) -> Result<GeneratedOutput, GenerateError> {
    let graph = ColumnGraph::from_schema(schema);

    let seed = options.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);

    let values = resolve_values(&graph, &options.registry, options.rows, &mut rng)?;

    let mut records = assemble_records(&values, schema, options.rows);
    records.retain(|t| !options.is_skipped(&t.table));

    let statements = InsertRenderer::new(options.dialect).render(&records);

    let mut stats = collect_stats(&graph, &records, options);
    stats.seed = seed;
    stats.statements = statements.len();

    Ok(GeneratedOutput {
        statements,
        values,
        stats,
    })
}

fn collect_stats(
    graph: &ColumnGraph<'_>,
    records: &[TableRecords],
    options: &GenerateOptions,
) -> GenerateStats {
    let schema = graph.schema();
    let mut stats = GenerateStats {
        tables: schema.len(),
        columns: graph.len(),
        references: graph.edge_count(),
        rows_per_table: options.rows,
        ..GenerateStats::default()
    };

    for id in graph.node_ids() {
        let Ok(column) = graph.column(id) else {
            continue;
        };
        if column.is_auto_generated {
            stats.auto_generated_columns += 1;
        } else if graph.has_dependencies(id).unwrap_or(false) {
            stats.derived_columns += 1;
        } else {
            stats.generated_columns += 1;
        }
    }

    for table in schema.iter() {
        let skipped = options.is_skipped(&table.name);
        if skipped {
            stats.skipped_tables.push(table.name.clone());
        }
        let rows = records
            .iter()
            .find(|r| r.table == table.name)
            .map(|r| r.records.len())
            .unwrap_or(0);
        stats.table_stats.push(TableGenerateStats {
            name: table.name.clone(),
            columns: table.insertable_columns().count(),
            rows,
            skipped,
        });
    }

    stats
}
