// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query graph model
//!
//! Immutable view of a bound MATCH pattern: query nodes, query
//! relationships, adjacency by variable name and the position maps the
//! enumerator keys on. Positions are assigned in insertion order and stay
//! stable for the lifetime of a plan search.

use petgraph::graph::UnGraph;
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::expr::{collect_dependent_var_names, Expression};
use crate::graph::subquery_graph::SubqueryGraph;

/// Identifier of a node or relationship table in the catalog.
pub type TableId = u64;

/// Direction of a relationship pattern as written in the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelDirection {
    Fwd,
    Bwd,
    Both,
}

/// Direction an Extend operator traverses a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtendDirection {
    Fwd,
    Bwd,
    Both,
}

/// Kind of a query relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryRelType {
    NonRecursive,
    VariableLength { lower: u32, upper: u32 },
    Shortest,
    AllShortest,
}

impl QueryRelType {
    pub fn is_recursive(&self) -> bool {
        !matches!(self, QueryRelType::NonRecursive)
    }
}

/// A pattern variable bound to one or more node tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryNode {
    variable: String,
    table_ids: Vec<TableId>,
}

impl QueryNode {
    pub fn new(variable: impl Into<String>, table_ids: Vec<TableId>) -> Self {
        Self {
            variable: variable.into(),
            table_ids,
        }
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn table_ids(&self) -> &[TableId] {
        &self.table_ids
    }

    /// The stable join key of this node.
    pub fn internal_id(&self) -> Expression {
        Expression::internal_id(&self.variable)
    }
}

/// A pattern variable connecting two query nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRel {
    variable: String,
    src: String,
    dst: String,
    direction: RelDirection,
    rel_type: QueryRelType,
    table_ids: Vec<TableId>,
}

impl QueryRel {
    pub fn new(
        variable: impl Into<String>,
        src: impl Into<String>,
        dst: impl Into<String>,
        direction: RelDirection,
        rel_type: QueryRelType,
        table_ids: Vec<TableId>,
    ) -> Self {
        Self {
            variable: variable.into(),
            src: src.into(),
            dst: dst.into(),
            direction,
            rel_type,
            table_ids,
        }
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn src_node_name(&self) -> &str {
        &self.src
    }

    pub fn dst_node_name(&self) -> &str {
        &self.dst
    }

    pub fn direction(&self) -> RelDirection {
        self.direction
    }

    pub fn rel_type(&self) -> &QueryRelType {
        &self.rel_type
    }

    pub fn table_ids(&self) -> &[TableId] {
        &self.table_ids
    }

    /// The endpoint opposite to `node_name`.
    pub fn other_node_name(&self, node_name: &str) -> &str {
        if self.src == node_name {
            &self.dst
        } else {
            &self.src
        }
    }
}

/// Direction an Extend over `rel` takes when starting from `bound_node`.
/// An undirected relationship always extends in `Both`.
pub fn extend_direction(rel: &QueryRel, bound_node: &str) -> ExtendDirection {
    if rel.direction() == RelDirection::Both {
        ExtendDirection::Both
    } else if rel.src_node_name() == bound_node {
        ExtendDirection::Fwd
    } else {
        ExtendDirection::Bwd
    }
}

/// One weakly connected component of the bound pattern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryGraph {
    nodes: Vec<QueryNode>,
    rels: Vec<QueryRel>,
    node_positions: HashMap<String, usize>,
    rel_positions: HashMap<String, usize>,
}

impl QueryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_query_node(&mut self, node: QueryNode) {
        debug_assert!(!self.node_positions.contains_key(node.variable()));
        self.node_positions
            .insert(node.variable().to_string(), self.nodes.len());
        self.nodes.push(node);
    }

    /// Endpoints must have been added before the relationship.
    pub fn add_query_rel(&mut self, rel: QueryRel) {
        debug_assert!(self.node_positions.contains_key(rel.src_node_name()));
        debug_assert!(self.node_positions.contains_key(rel.dst_node_name()));
        debug_assert!(!self.rel_positions.contains_key(rel.variable()));
        self.rel_positions
            .insert(rel.variable().to_string(), self.rels.len());
        self.rels.push(rel);
    }

    pub fn num_query_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_query_rels(&self) -> usize {
        self.rels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.rels.is_empty()
    }

    pub fn query_node(&self, pos: usize) -> &QueryNode {
        &self.nodes[pos]
    }

    pub fn query_rel(&self, pos: usize) -> &QueryRel {
        &self.rels[pos]
    }

    pub fn query_nodes(&self) -> &[QueryNode] {
        &self.nodes
    }

    pub fn query_rels(&self) -> &[QueryRel] {
        &self.rels
    }

    pub fn query_node_idx(&self, name: &str) -> Option<usize> {
        self.node_positions.get(name).copied()
    }

    pub fn query_rel_idx(&self, name: &str) -> Option<usize> {
        self.rel_positions.get(name).copied()
    }

    pub fn contains_query_node(&self, name: &str) -> bool {
        self.node_positions.contains_key(name)
    }

    pub fn contains_query_rel(&self, name: &str) -> bool {
        self.rel_positions.contains_key(name)
    }

    pub fn query_nodes_at(&self, positions: &[usize]) -> Vec<&QueryNode> {
        positions.iter().map(|&pos| &self.nodes[pos]).collect()
    }

    /// True iff every variable the expression depends on names an element
    /// of this graph.
    pub fn can_project_expression(&self, expr: &Expression) -> bool {
        collect_dependent_var_names(expr)
            .iter()
            .all(|name| self.contains_query_node(name) || self.contains_query_rel(name))
    }

    pub fn empty_subquery_graph(&self) -> SubqueryGraph {
        SubqueryGraph::empty()
    }

    pub fn fully_matched_subquery_graph(&self) -> SubqueryGraph {
        let mut subgraph = SubqueryGraph::empty();
        for pos in 0..self.nodes.len() {
            subgraph.add_query_node(pos);
        }
        for pos in 0..self.rels.len() {
            subgraph.add_query_rel(self, pos);
        }
        subgraph
    }
}

/// The weakly connected components of one bound pattern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryGraphCollection {
    graphs: Vec<QueryGraph>,
}

impl QueryGraphCollection {
    /// Wrap pre-split components, e.g. from the binder.
    pub fn new(graphs: Vec<QueryGraph>) -> Self {
        Self { graphs }
    }

    /// Split a flat bound pattern into its weakly connected components.
    /// Isolated nodes each form their own component.
    pub fn from_pattern(nodes: Vec<QueryNode>, rels: Vec<QueryRel>) -> Self {
        let mut connectivity: UnGraph<usize, usize> = UnGraph::new_undirected();
        let mut petgraph_idx = HashMap::new();
        for (pos, node) in nodes.iter().enumerate() {
            petgraph_idx.insert(node.variable().to_string(), connectivity.add_node(pos));
        }
        for (rel_pos, rel) in rels.iter().enumerate() {
            let src = petgraph_idx[rel.src_node_name()];
            let dst = petgraph_idx[rel.dst_node_name()];
            connectivity.add_edge(src, dst, rel_pos);
        }

        let mut components = UnionFind::new(connectivity.node_count());
        for edge in connectivity.edge_references() {
            components.union(edge.source().index(), edge.target().index());
        }

        let mut graph_per_root: HashMap<usize, QueryGraph> = HashMap::new();
        let mut root_order = Vec::new();
        for (pos, node) in nodes.into_iter().enumerate() {
            let root = components.find(pos);
            if !graph_per_root.contains_key(&root) {
                root_order.push(root);
            }
            graph_per_root.entry(root).or_default().add_query_node(node);
        }
        for rel in rels {
            let src_pos = petgraph_idx[rel.src_node_name()].index();
            let root = components.find(src_pos);
            graph_per_root
                .get_mut(&root)
                .expect("relationship endpoint belongs to a component")
                .add_query_rel(rel);
        }
        let graphs = root_order
            .into_iter()
            .map(|root| {
                graph_per_root
                    .remove(&root)
                    .expect("every component root was recorded")
            })
            .collect();
        Self { graphs }
    }

    pub fn num_query_graphs(&self) -> usize {
        self.graphs.len()
    }

    pub fn query_graph(&self, idx: usize) -> &QueryGraph {
        &self.graphs[idx]
    }

    pub fn query_graphs(&self) -> &[QueryGraph] {
        &self.graphs
    }

    /// Index of the first component whose node set mentions one of the
    /// given correlated internal-ID expressions, or None. This is the hook
    /// for correlated-subquery placement.
    pub fn connected_query_graph_idx(&self, expr_names: &HashSet<String>) -> Option<usize> {
        for (idx, graph) in self.graphs.iter().enumerate() {
            for node in graph.query_nodes() {
                if expr_names.contains(&node.internal_id().unique_name()) {
                    return Some(idx);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str) -> QueryNode {
        QueryNode::new(name, vec![0])
    }

    fn rel(name: &str, src: &str, dst: &str) -> QueryRel {
        QueryRel::new(
            name,
            src,
            dst,
            RelDirection::Fwd,
            QueryRelType::NonRecursive,
            vec![100],
        )
    }

    #[test]
    fn test_positions_are_insertion_ordered() {
        let mut graph = QueryGraph::new();
        graph.add_query_node(node("a"));
        graph.add_query_node(node("b"));
        graph.add_query_rel(rel("e", "a", "b"));
        assert_eq!(graph.query_node_idx("a"), Some(0));
        assert_eq!(graph.query_node_idx("b"), Some(1));
        assert_eq!(graph.query_rel_idx("e"), Some(0));
        assert!(graph.contains_query_node("a"));
        assert!(!graph.contains_query_node("e"));
    }

    #[test]
    fn test_can_project_expression() {
        let mut graph = QueryGraph::new();
        graph.add_query_node(node("a"));
        graph.add_query_node(node("b"));
        graph.add_query_rel(rel("e", "a", "b"));
        assert!(graph.can_project_expression(&Expression::property("a", "age")));
        assert!(graph.can_project_expression(&Expression::variable("e")));
        assert!(!graph.can_project_expression(&Expression::property("c", "age")));
    }

    #[test]
    fn test_collection_splits_components() {
        let collection = QueryGraphCollection::from_pattern(
            vec![node("a"), node("b"), node("c"), node("d")],
            vec![rel("e1", "a", "b"), rel("e2", "c", "d")],
        );
        assert_eq!(collection.num_query_graphs(), 2);
        assert!(collection.query_graph(0).contains_query_rel("e1"));
        assert!(collection.query_graph(1).contains_query_rel("e2"));
    }

    #[test]
    fn test_isolated_node_is_own_component() {
        let collection = QueryGraphCollection::from_pattern(
            vec![node("a"), node("b"), node("c")],
            vec![rel("e1", "a", "b")],
        );
        assert_eq!(collection.num_query_graphs(), 2);
        assert_eq!(collection.query_graph(1).num_query_nodes(), 1);
        assert_eq!(collection.query_graph(1).num_query_rels(), 0);
    }

    #[test]
    fn test_connected_query_graph_idx() {
        let collection = QueryGraphCollection::from_pattern(
            vec![node("a"), node("b"), node("c"), node("d")],
            vec![rel("e1", "a", "b"), rel("e2", "c", "d")],
        );
        let mut names = HashSet::new();
        names.insert("c._id".to_string());
        assert_eq!(collection.connected_query_graph_idx(&names), Some(1));
        let mut unknown = HashSet::new();
        unknown.insert("z._id".to_string());
        assert_eq!(collection.connected_query_graph_idx(&unknown), None);
    }

    #[test]
    fn test_extend_direction() {
        let directed = rel("e", "a", "b");
        assert_eq!(extend_direction(&directed, "a"), ExtendDirection::Fwd);
        assert_eq!(extend_direction(&directed, "b"), ExtendDirection::Bwd);
        let undirected = QueryRel::new(
            "u",
            "a",
            "b",
            RelDirection::Both,
            QueryRelType::NonRecursive,
            vec![100],
        );
        assert_eq!(extend_direction(&undirected, "a"), ExtendDirection::Both);
    }
}
