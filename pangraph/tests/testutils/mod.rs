// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Shared fixtures for the planner integration tests

#![allow(dead_code)]

use pangraph::catalog::{GraphStatistics, StatsEstimator};
use pangraph::expr::PropertyExprCollection;
use pangraph::graph::{
    QueryGraphCollection, QueryNode, QueryRel, QueryRelType, RelDirection,
};
use pangraph::plan::Planner;
use pangraph::session::{ClientContext, Transaction};

/// Node table ids of the fixture catalog.
pub const PERSON: u64 = 0;
pub const CITY: u64 = 1;
/// Rel table ids.
pub const KNOWS: u64 = 100;

/// Statistics for a small social graph: 1000 persons, 100 cities, 5000
/// knows edges.
pub fn statistics() -> GraphStatistics {
    let mut stats = GraphStatistics::new();
    stats.set_node_table_cardinality(PERSON, 1000);
    stats.set_node_table_cardinality(CITY, 100);
    stats.set_rel_table_cardinality(KNOWS, 5000);
    stats
}

/// Owns everything a [`Planner`] borrows.
pub struct PlannerFixture {
    pub context: ClientContext,
    pub estimator: StatsEstimator,
    pub properties: PropertyExprCollection,
}

impl PlannerFixture {
    pub fn new() -> Self {
        Self::with_context(ClientContext::new(Transaction::new(1)))
    }

    pub fn with_context(context: ClientContext) -> Self {
        Self {
            context,
            estimator: StatsEstimator::new(statistics()),
            properties: PropertyExprCollection::new(),
        }
    }

    pub fn planner(&self) -> Planner<'_> {
        Planner::new(&self.context, &self.estimator, &self.properties)
    }
}

pub fn node(name: &str) -> QueryNode {
    QueryNode::new(name, vec![PERSON])
}

pub fn node_in(name: &str, table: u64) -> QueryNode {
    QueryNode::new(name, vec![table])
}

pub fn rel(name: &str, src: &str, dst: &str) -> QueryRel {
    QueryRel::new(
        name,
        src,
        dst,
        RelDirection::Fwd,
        QueryRelType::NonRecursive,
        vec![KNOWS],
    )
}

pub fn var_length_rel(name: &str, src: &str, dst: &str, lower: u32, upper: u32) -> QueryRel {
    QueryRel::new(
        name,
        src,
        dst,
        RelDirection::Fwd,
        QueryRelType::VariableLength { lower, upper },
        vec![KNOWS],
    )
}

/// `(a)-[e1]->(b)-[e2]->(c)`, `(a)-[e3]->(c)`.
pub fn triangle() -> QueryGraphCollection {
    QueryGraphCollection::from_pattern(
        vec![node("a"), node("b"), node("c")],
        vec![rel("e1", "a", "b"), rel("e2", "b", "c"), rel("e3", "a", "c")],
    )
}

/// Linear chain `(n0)-[r0]->(n1)-...->(n{len-1})`.
pub fn chain(len: usize) -> QueryGraphCollection {
    let nodes: Vec<QueryNode> = (0..len).map(|i| node(&format!("n{}", i))).collect();
    let rels: Vec<QueryRel> = (0..len - 1)
        .map(|i| rel(&format!("r{}", i), &format!("n{}", i), &format!("n{}", i + 1)))
        .collect();
    QueryGraphCollection::from_pattern(nodes, rels)
}
