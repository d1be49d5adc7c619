//! Errors raised while building the column graph and resolving values.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    /// A graph query addressed a node that does not exist
    #[error("node index {index} is out of range (graph has {len} columns)")]
    InvalidIndex { index: usize, len: usize },

    /// Columns reference each other in a loop; the first column is repeated at the end
    #[error("cyclic reference between columns: {}", columns.join(" -> "))]
    CyclicDependency { columns: Vec<String> },

    /// No value generator is registered for the column's declared type
    #[error("no value generator for column {column} of type {col_type}")]
    UnsupportedColumnType { column: String, col_type: String },
}
