//! Value resolution over the column dependency graph.
//!
//! Columns are filled lazily in dependency order:
//! - a column without dependencies gets fresh values from its generator
//!   (or the placeholder if the database assigns it)
//! - a column with dependencies gets, for each row, the concatenation of its
//!   sources' values at that row
//!
//! The walk is an iterative three-colour DFS. A dependency that is still
//! being visited closes a cycle and aborts with `CyclicDependency`. Every time
//! a column is resolved, dependents whose sources are now complete are
//! resolved immediately through a worklist.

use super::{GeneratorRegistry, Value, AUTO_GENERATED_PLACEHOLDER};
use crate::error::GenerateError;
use crate::schema::{ColumnGraph, NodeId};
use ahash::AHashMap;
use rand::RngCore;

/// Resolution state of one column
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NodeState {
    #[default]
    Unresolved,
    /// On the DFS stack, waiting for its dependencies
    Visiting,
    /// All rows computed
    Resolved(Vec<Value>),
}

impl NodeState {
    pub fn is_resolved(&self) -> bool {
        matches!(self, NodeState::Resolved(_))
    }
}

/// Per-column state for one generation request
#[derive(Debug, Clone)]
pub struct ResolutionState {
    states: Vec<NodeState>,
    resolved: usize,
    /// Nodes in the order they were resolved
    order: Vec<NodeId>,
}

impl ResolutionState {
    /// All columns start unresolved
    pub fn new(len: usize) -> Self {
        Self {
            states: vec![NodeState::Unresolved; len],
            resolved: 0,
            order: Vec::with_capacity(len),
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn check(&self, id: NodeId) -> Result<usize, GenerateError> {
        let i = id.index();
        if i < self.states.len() {
            Ok(i)
        } else {
            Err(GenerateError::InvalidIndex {
                index: i,
                len: self.states.len(),
            })
        }
    }

    pub fn state(&self, id: NodeId) -> Result<&NodeState, GenerateError> {
        let i = self.check(id)?;
        Ok(&self.states[i])
    }

    pub fn is_resolved(&self, id: NodeId) -> Result<bool, GenerateError> {
        self.state(id).map(NodeState::is_resolved)
    }

    /// Values of a resolved column, `None` while unresolved
    pub fn values(&self, id: NodeId) -> Result<Option<&[Value]>, GenerateError> {
        match self.state(id)? {
            NodeState::Resolved(values) => Ok(Some(values)),
            _ => Ok(None),
        }
    }

    /// Whether every column `id` depends on is resolved (true when it has none)
    pub fn all_dependencies_resolved(
        &self,
        graph: &ColumnGraph<'_>,
        id: NodeId,
    ) -> Result<bool, GenerateError> {
        for &dep in graph.dependency_indexes(id)? {
            if !self.is_resolved(dep)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Whether every column is resolved
    pub fn all_resolved(&self) -> bool {
        self.resolved == self.states.len()
    }

    /// Store a column's values. Marking an already resolved column is a no-op
    /// and keeps the values it already has.
    pub fn mark_resolved(&mut self, id: NodeId, values: Vec<Value>) -> Result<(), GenerateError> {
        let i = self.check(id)?;
        if self.states[i].is_resolved() {
            return Ok(());
        }
        self.states[i] = NodeState::Resolved(values);
        self.resolved += 1;
        self.order.push(id);
        Ok(())
    }

    fn mark_visiting(&mut self, id: NodeId) -> Result<(), GenerateError> {
        let i = self.check(id)?;
        if !self.states[i].is_resolved() {
            self.states[i] = NodeState::Visiting;
        }
        Ok(())
    }

    /// Nodes in the order they were resolved
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Move resolved values into a name-keyed map
    pub fn into_values(self, graph: &ColumnGraph<'_>) -> Result<ColumnValues, GenerateError> {
        let mut values = AHashMap::with_capacity(self.states.len());
        let mut order = Vec::with_capacity(self.order.len());
        let mut states = self.states;

        for id in self.order {
            let name = graph.full_name(id)?.to_string();
            if let NodeState::Resolved(v) = std::mem::take(&mut states[id.index()]) {
                values.insert(name.clone(), v);
            }
            order.push(name);
        }

        Ok(ColumnValues { values, order })
    }
}

/// Generated values keyed by `table.column`, every list row-aligned
#[derive(Debug, Clone, Default)]
pub struct ColumnValues {
    values: AHashMap<String, Vec<Value>>,
    order: Vec<String>,
}

impl ColumnValues {
    /// Values for a column by full name
    pub fn get(&self, full_name: &str) -> Option<&[Value]> {
        self.values.get(full_name).map(Vec::as_slice)
    }

    pub fn contains(&self, full_name: &str) -> bool {
        self.values.contains_key(full_name)
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column names in the order they were resolved
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Iterate over columns in resolution order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.order
            .iter()
            .filter_map(|name| self.get(name).map(|v| (name.as_str(), v)))
    }
}

/// Resolve `start` and everything it depends on.
///
/// `fill` computes a column's values once all of its dependencies are resolved.
fn resolve_from<F>(
    graph: &ColumnGraph<'_>,
    state: &mut ResolutionState,
    start: NodeId,
    fill: &mut F,
) -> Result<(), GenerateError>
where
    F: FnMut(NodeId, &ResolutionState) -> Result<Vec<Value>, GenerateError>,
{
    if state.is_resolved(start)? {
        return Ok(());
    }

    // (node, index of the next dependency to visit)
    let mut stack: Vec<(NodeId, usize)> = vec![(start, 0)];
    state.mark_visiting(start)?;

    while let Some(&(node, cursor)) = stack.last() {
        let deps = graph.dependency_indexes(node)?;

        if let Some(&dep) = deps.get(cursor) {
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }
            match state.state(dep)? {
                NodeState::Resolved(_) => {}
                NodeState::Visiting => return Err(cycle_error(graph, &stack, dep)),
                NodeState::Unresolved => {
                    state.mark_visiting(dep)?;
                    stack.push((dep, 0));
                }
            }
            continue;
        }

        stack.pop();
        if !state.is_resolved(node)? {
            let values = fill(node, state)?;
            state.mark_resolved(node, values)?;
            cascade(graph, state, node, fill)?;
        }
    }

    Ok(())
}

/// Resolve dependents of `node` whose dependencies are now all resolved
fn cascade<F>(
    graph: &ColumnGraph<'_>,
    state: &mut ResolutionState,
    node: NodeId,
    fill: &mut F,
) -> Result<(), GenerateError>
where
    F: FnMut(NodeId, &ResolutionState) -> Result<Vec<Value>, GenerateError>,
{
    let mut pending: Vec<NodeId> = graph.dependent_indexes(node)?.to_vec();

    while let Some(next) = pending.pop() {
        // Visiting nodes are finished when the DFS pops them
        if !matches!(state.state(next)?, NodeState::Unresolved) {
            continue;
        }
        if !state.all_dependencies_resolved(graph, next)? {
            continue;
        }
        let values = fill(next, state)?;
        state.mark_resolved(next, values)?;
        pending.extend_from_slice(graph.dependent_indexes(next)?);
    }

    Ok(())
}

fn cycle_error(graph: &ColumnGraph<'_>, stack: &[(NodeId, usize)], closing: NodeId) -> GenerateError {
    let start = stack
        .iter()
        .position(|&(id, _)| id == closing)
        .unwrap_or(0);

    let mut columns: Vec<String> = stack[start..]
        .iter()
        .filter_map(|&(id, _)| graph.full_name(id).ok())
        .map(str::to_string)
        .collect();
    if let Ok(name) = graph.full_name(closing) {
        columns.push(name.to_string());
    }

    GenerateError::CyclicDependency { columns }
}

/// Drive resolution over every node of the graph
fn resolve_graph<F>(graph: &ColumnGraph<'_>, fill: &mut F) -> Result<ResolutionState, GenerateError>
where
    F: FnMut(NodeId, &ResolutionState) -> Result<Vec<Value>, GenerateError>,
{
    let mut state = ResolutionState::new(graph.len());

    for id in graph.node_ids() {
        if state.all_resolved() {
            break;
        }
        resolve_from(graph, &mut state, id, fill)?;
    }

    Ok(state)
}

/// Order in which columns would be resolved, without generating any values
pub fn resolution_order(graph: &ColumnGraph<'_>) -> Result<Vec<NodeId>, GenerateError> {
    let mut skip_values =
        |_: NodeId, _: &ResolutionState| -> Result<Vec<Value>, GenerateError> { Ok(Vec::new()) };
    let state = resolve_graph(graph, &mut skip_values)?;
    Ok(state.order().to_vec())
}

/// Fills every column of a graph with `rows` values
pub struct Resolver<'g, 's> {
    graph: &'g ColumnGraph<'s>,
    registry: &'g GeneratorRegistry,
    rows: usize,
}

impl<'g, 's> Resolver<'g, 's> {
    pub fn new(graph: &'g ColumnGraph<'s>, registry: &'g GeneratorRegistry, rows: usize) -> Self {
        Self {
            graph,
            registry,
            rows,
        }
    }

    /// Resolve every column of the graph
    pub fn resolve_all(&self, rng: &mut dyn RngCore) -> Result<ColumnValues, GenerateError> {
        let state = self.resolve_state(rng)?;
        state.into_values(self.graph)
    }

    /// Resolve every column, keeping the per-node state
    pub fn resolve_state(&self, rng: &mut dyn RngCore) -> Result<ResolutionState, GenerateError> {
        resolve_graph(self.graph, &mut |node: NodeId, state: &ResolutionState| {
            self.fill(node, state, rng)
        })
    }

    /// Resolve one more node into an existing state. Already resolved nodes are left untouched.
    pub fn resolve_node(
        &self,
        state: &mut ResolutionState,
        id: NodeId,
        rng: &mut dyn RngCore,
    ) -> Result<(), GenerateError> {
        resolve_from(self.graph, state, id, &mut |node: NodeId, state: &ResolutionState| {
            self.fill(node, state, rng)
        })
    }

    fn fill(
        &self,
        node: NodeId,
        state: &ResolutionState,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Value>, GenerateError> {
        let column = self.graph.column(node)?;

        if column.is_auto_generated {
            return Ok(vec![AUTO_GENERATED_PLACEHOLDER.to_string(); self.rows]);
        }

        let deps = self.graph.dependency_indexes(node)?;
        if deps.is_empty() {
            let generator = self.registry.generator_for(column)?;
            return Ok((0..self.rows)
                .map(|_| generator.generate(&column.col_type, rng))
                .collect());
        }

        // Dependencies are resolved before their dependents
        let mut sources = Vec::with_capacity(deps.len());
        for &dep in deps {
            sources.push(state.values(dep)?.unwrap_or(&[]));
        }

        Ok((0..self.rows)
            .map(|k| {
                sources
                    .iter()
                    .filter_map(|values| values.get(k))
                    .map(String::as_str)
                    .collect::<String>()
            })
            .collect())
    }
}

/// Resolve every column of `graph` with `rows` values each
pub fn resolve_values(
    graph: &ColumnGraph<'_>,
    registry: &GeneratorRegistry,
    rows: usize,
    rng: &mut dyn RngCore,
) -> Result<ColumnValues, GenerateError> {
    Resolver::new(graph, registry, rows).resolve_all(rng)
}
