// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Matched-subgraph bitmasks
//!
//! A `SubqueryGraph` denotes which positions of one query graph a partial
//! plan has matched: one fixed-width selector over node positions, one
//! over relationship positions. It is the key of the sub-plans table.
//!
//! Adding a relationship normally also selects both endpoint nodes. The
//! `ignoring node selector` variant selects the relationship bit alone and
//! exists for relationships whose endpoints are matched externally; it
//! only feeds implicit-join detection.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::graph::query_graph::QueryGraph;

/// Upper bound on nodes or relationships per query graph, matching the
/// fixed selector width.
pub const MAX_PATTERN_VARIABLES: usize = 64;

/// Bitmask pair over one query graph's positions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct SubqueryGraph {
    node_selector: u64,
    rel_selector: u64,
}

impl SubqueryGraph {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn add_query_node(&mut self, node_pos: usize) {
        debug_assert!(node_pos < MAX_PATTERN_VARIABLES);
        self.node_selector |= 1 << node_pos;
    }

    /// Select a relationship and both of its endpoint nodes.
    pub fn add_query_rel(&mut self, graph: &QueryGraph, rel_pos: usize) {
        debug_assert!(rel_pos < MAX_PATTERN_VARIABLES);
        self.rel_selector |= 1 << rel_pos;
        let rel = graph.query_rel(rel_pos);
        if let Some(src_pos) = graph.query_node_idx(rel.src_node_name()) {
            self.add_query_node(src_pos);
        }
        if let Some(dst_pos) = graph.query_node_idx(rel.dst_node_name()) {
            self.add_query_node(dst_pos);
        }
    }

    /// Select a relationship without its endpoints. Endpoints matched
    /// externally stay unselected; such subgraphs are only compared, never
    /// planned from.
    pub fn add_query_rel_ignoring_node_selector(&mut self, rel_pos: usize) {
        debug_assert!(rel_pos < MAX_PATTERN_VARIABLES);
        self.rel_selector |= 1 << rel_pos;
    }

    /// Union in another subgraph.
    pub fn add_subquery_graph(&mut self, other: &SubqueryGraph) {
        self.node_selector |= other.node_selector;
        self.rel_selector |= other.rel_selector;
    }

    pub fn contains_query_node(&self, node_pos: usize) -> bool {
        self.node_selector & (1 << node_pos) != 0
    }

    pub fn contains_query_rel(&self, rel_pos: usize) -> bool {
        self.rel_selector & (1 << rel_pos) != 0
    }

    /// Number of matched relationships; this is the DP level of any plan
    /// stored under this subgraph.
    pub fn num_query_rels(&self) -> usize {
        self.rel_selector.count_ones() as usize
    }

    pub fn num_query_nodes(&self) -> usize {
        self.node_selector.count_ones() as usize
    }

    pub fn is_single_rel(&self) -> bool {
        self.rel_selector.count_ones() == 1
    }

    pub fn node_positions(&self) -> Vec<usize> {
        (0..MAX_PATTERN_VARIABLES)
            .filter(|pos| self.contains_query_node(*pos))
            .collect()
    }

    pub fn rel_positions(&self) -> Vec<usize> {
        (0..MAX_PATTERN_VARIABLES)
            .filter(|pos| self.contains_query_rel(*pos))
            .collect()
    }

    /// True iff the two subgraphs match no relationship in common.
    pub fn is_rel_disjoint(&self, other: &SubqueryGraph) -> bool {
        self.rel_selector & other.rel_selector == 0
    }

    /// Node positions selected by both subgraphs; these are the join nodes
    /// declared for a join of the two.
    pub fn connected_node_positions(&self, other: &SubqueryGraph) -> Vec<usize> {
        let shared = self.node_selector & other.node_selector;
        (0..MAX_PATTERN_VARIABLES)
            .filter(|pos| shared & (1 << pos) != 0)
            .collect()
    }

    /// Node positions incident to the matched relationships, regardless of
    /// the node selector. Used only to detect implicit joins.
    pub fn node_positions_ignoring_node_selector(&self, graph: &QueryGraph) -> HashSet<usize> {
        let mut positions = HashSet::new();
        for rel_pos in 0..graph.num_query_rels() {
            if !self.contains_query_rel(rel_pos) {
                continue;
            }
            let rel = graph.query_rel(rel_pos);
            if let Some(src_pos) = graph.query_node_idx(rel.src_node_name()) {
                positions.insert(src_pos);
            }
            if let Some(dst_pos) = graph.query_node_idx(rel.dst_node_name()) {
                positions.insert(dst_pos);
            }
        }
        positions
    }

    /// Relationships outside this subgraph with at least one endpoint
    /// inside it. These are the candidates a WCO join may intersect.
    pub fn rel_nbr_positions(&self, graph: &QueryGraph) -> Vec<usize> {
        let mut positions = Vec::new();
        for rel_pos in 0..graph.num_query_rels() {
            if self.contains_query_rel(rel_pos) {
                continue;
            }
            let rel = graph.query_rel(rel_pos);
            let src_selected = graph
                .query_node_idx(rel.src_node_name())
                .map(|pos| self.contains_query_node(pos))
                .unwrap_or(false);
            let dst_selected = graph
                .query_node_idx(rel.dst_node_name())
                .map(|pos| self.contains_query_node(pos))
                .unwrap_or(false);
            if src_selected || dst_selected {
                positions.push(rel_pos);
            }
        }
        positions
    }

    /// True iff every named variable is a matched node or relationship of
    /// this subgraph. Predicate eligibility reduces to this test.
    pub fn contains_all_variables(&self, graph: &QueryGraph, names: &HashSet<String>) -> bool {
        names.iter().all(|name| {
            if let Some(pos) = graph.query_node_idx(name) {
                return self.contains_query_node(pos);
            }
            if let Some(pos) = graph.query_rel_idx(name) {
                return self.contains_query_rel(pos);
            }
            false
        })
    }
}

impl std::fmt::Display for SubqueryGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "nodes={:#x} rels={:#x}",
            self.node_selector, self.rel_selector
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::query_graph::{QueryNode, QueryRel, QueryRelType, RelDirection};

    fn two_cycle() -> QueryGraph {
        let mut graph = QueryGraph::new();
        graph.add_query_node(QueryNode::new("a", vec![0]));
        graph.add_query_node(QueryNode::new("b", vec![0]));
        graph.add_query_rel(QueryRel::new(
            "e1",
            "a",
            "b",
            RelDirection::Fwd,
            QueryRelType::NonRecursive,
            vec![100],
        ));
        graph.add_query_rel(QueryRel::new(
            "e2",
            "b",
            "a",
            RelDirection::Fwd,
            QueryRelType::NonRecursive,
            vec![100],
        ));
        graph
    }

    #[test]
    fn test_add_rel_selects_endpoints() {
        let graph = two_cycle();
        let mut subgraph = SubqueryGraph::empty();
        subgraph.add_query_rel(&graph, 0);
        assert!(subgraph.contains_query_rel(0));
        assert!(subgraph.contains_query_node(0));
        assert!(subgraph.contains_query_node(1));
        assert_eq!(subgraph.num_query_rels(), 1);
        assert!(subgraph.is_single_rel());
    }

    #[test]
    fn test_ignoring_node_selector_leaves_nodes_unselected() {
        let graph = two_cycle();
        let mut subgraph = SubqueryGraph::empty();
        subgraph.add_query_rel_ignoring_node_selector(1);
        assert!(subgraph.contains_query_rel(1));
        assert_eq!(subgraph.num_query_nodes(), 0);
        // Implicit-join detection still sees both endpoints.
        let implicit = subgraph.node_positions_ignoring_node_selector(&graph);
        assert_eq!(implicit.len(), 2);
    }

    #[test]
    fn test_equality_is_both_selectors() {
        let graph = two_cycle();
        let mut closed = SubqueryGraph::empty();
        closed.add_query_rel(&graph, 1);
        let mut bare = SubqueryGraph::empty();
        bare.add_query_rel_ignoring_node_selector(1);
        assert_ne!(closed, bare);
    }

    #[test]
    fn test_rel_nbr_positions() {
        let graph = two_cycle();
        let mut subgraph = SubqueryGraph::empty();
        subgraph.add_query_rel(&graph, 0);
        assert_eq!(subgraph.rel_nbr_positions(&graph), vec![1]);
    }

    #[test]
    fn test_contains_all_variables() {
        let graph = two_cycle();
        let mut subgraph = SubqueryGraph::empty();
        subgraph.add_query_rel(&graph, 0);
        let mut names = HashSet::new();
        names.insert("a".to_string());
        names.insert("e1".to_string());
        assert!(subgraph.contains_all_variables(&graph, &names));
        names.insert("e2".to_string());
        assert!(!subgraph.contains_all_variables(&graph, &names));
    }
}
