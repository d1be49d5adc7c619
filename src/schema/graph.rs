//! Column dependency graph for reference-aware generation.
//!
//! Provides:
//! - A dense node index over every column, in table-then-column order
//! - Sparse dependency/dependent lists built from column references
//! - Bounds-checked adjacency queries used by the resolver

use super::{Column, ColumnId, Schema, TableId};
use crate::error::GenerateError;
use ahash::AHashMap;
use smallvec::SmallVec;
use std::fmt;

/// Dense index of a column within a [`ColumnGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

type Adjacency = SmallVec<[NodeId; 4]>;

/// Directed graph over all columns of a schema.
///
/// An edge `a -> b` means column `a` references column `b`, so `b` must be
/// resolved before `a`:
/// - `dependencies[a]` lists the columns `a` takes its values from, in the
///   order the references were declared
/// - `dependents[b]` lists the columns that take values from `b`
///
/// References whose target cannot be found are dropped.
#[derive(Debug)]
pub struct ColumnGraph<'s> {
    schema: &'s Schema,
    /// Table and column position of each node
    nodes: Vec<(TableId, ColumnId)>,
    dependencies: Vec<Adjacency>,
    dependents: Vec<Adjacency>,
    /// Lowercased full name to node
    index: AHashMap<String, NodeId>,
}

impl<'s> ColumnGraph<'s> {
    /// Build the graph for a schema
    pub fn from_schema(schema: &'s Schema) -> Self {
        let n = schema.column_count();
        let mut nodes = Vec::with_capacity(n);
        let mut index = AHashMap::with_capacity(n);

        for table in schema.iter() {
            for column in &table.columns {
                let id = NodeId(nodes.len() as u32);
                nodes.push((table.id, column.ordinal));
                index.entry(column.full_name.to_lowercase()).or_insert(id);
            }
        }

        let mut dependencies: Vec<Adjacency> = vec![SmallVec::new(); n];
        let mut dependents: Vec<Adjacency> = vec![SmallVec::new(); n];

        let mut node = 0usize;
        for table in schema.iter() {
            for column in &table.columns {
                let from = NodeId(node as u32);
                for reference in &column.references {
                    let Some(&to) = index.get(&reference.full_name().to_lowercase()) else {
                        continue;
                    };
                    if !dependencies[from.index()].contains(&to) {
                        dependencies[from.index()].push(to);
                        dependents[to.index()].push(from);
                    }
                }
                node += 1;
            }
        }

        Self {
            schema,
            nodes,
            dependencies,
            dependents,
            index,
        }
    }

    /// Number of nodes (columns) in the graph
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The schema this graph was built from
    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Iterate over every node in index order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.len()).map(|i| NodeId(i as u32))
    }

    /// Total number of edges
    pub fn edge_count(&self) -> usize {
        self.dependencies.iter().map(|d| d.len()).sum()
    }

    /// Look up a node by `table.column` (case-insensitive)
    pub fn node_id(&self, full_name: &str) -> Option<NodeId> {
        self.index.get(&full_name.to_lowercase()).copied()
    }

    fn check(&self, id: NodeId) -> Result<usize, GenerateError> {
        let i = id.index();
        if i < self.nodes.len() {
            Ok(i)
        } else {
            Err(GenerateError::InvalidIndex {
                index: i,
                len: self.nodes.len(),
            })
        }
    }

    /// Column behind a node
    pub fn column(&self, id: NodeId) -> Result<&'s Column, GenerateError> {
        let i = self.check(id)?;
        let (table_id, column_id) = self.nodes[i];
        self.schema
            .table(table_id)
            .and_then(|t| t.column(column_id))
            .ok_or(GenerateError::InvalidIndex {
                index: i,
                len: self.nodes.len(),
            })
    }

    /// Full `table.column` name of a node
    pub fn full_name(&self, id: NodeId) -> Result<&'s str, GenerateError> {
        self.column(id).map(|c| c.full_name.as_str())
    }

    /// Whether the column references any other column
    pub fn has_dependencies(&self, id: NodeId) -> Result<bool, GenerateError> {
        let i = self.check(id)?;
        Ok(!self.dependencies[i].is_empty())
    }

    /// Columns this column takes values from, in reference declaration order
    pub fn dependency_indexes(&self, id: NodeId) -> Result<&[NodeId], GenerateError> {
        let i = self.check(id)?;
        Ok(&self.dependencies[i])
    }

    /// Whether any column references this column
    pub fn has_dependents(&self, id: NodeId) -> Result<bool, GenerateError> {
        let i = self.check(id)?;
        Ok(!self.dependents[i].is_empty())
    }

    /// Columns that take values from this column
    pub fn dependent_indexes(&self, id: NodeId) -> Result<&[NodeId], GenerateError> {
        let i = self.check(id)?;
        Ok(&self.dependents[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnKind, ColumnType, Reference, TableSchema};

    fn two_table_schema() -> Schema {
        let mut schema = Schema::new();
        let mut users = TableSchema::new("users".to_string(), TableId(0));
        users.add_column("id", ColumnType::new(ColumnKind::Text));
        schema.add_table(users);

        let mut orders = TableSchema::new("orders".to_string(), TableId(0));
        orders
            .add_column("user_id", ColumnType::new(ColumnKind::Text))
            .add_reference(Reference::new("USERS", "ID"));
        orders
            .add_column("ghost", ColumnType::new(ColumnKind::Text))
            .add_reference(Reference::new("nowhere", "id"));
        schema.add_table(orders);
        schema
    }

    #[test]
    fn test_reference_lookup_ignores_case() {
        let schema = two_table_schema();
        let graph = ColumnGraph::from_schema(&schema);
        assert_eq!(graph.dependency_indexes(NodeId(1)).unwrap(), &[NodeId(0)]);
        assert_eq!(graph.dependent_indexes(NodeId(0)).unwrap(), &[NodeId(1)]);
    }

    #[test]
    fn test_dangling_reference_dropped() {
        let schema = two_table_schema();
        let graph = ColumnGraph::from_schema(&schema);
        assert!(!graph.has_dependencies(NodeId(2)).unwrap());
        assert_eq!(graph.edge_count(), 1);
    }
}
