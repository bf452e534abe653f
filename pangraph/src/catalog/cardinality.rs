// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cardinality estimation
//!
//! The enumerator treats the estimator as an opaque oracle behind a narrow
//! trait. The statistics-backed implementation caches node-ID domains
//! keyed by (table, transaction); independent planning calls share one
//! estimator instance, so the cache sits behind a lock.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::catalog::stats::GraphStatistics;
use crate::expr::Expression;
use crate::graph::{QueryGraph, QueryNode, QueryRel, TableId};
use crate::session::context::Transaction;

/// Narrow estimation oracle consumed by the plan constructors.
pub trait CardinalityEstimator {
    /// Warm the node-ID-domain cache for every node table the graph binds.
    fn init_node_id_dom(&self, graph: &QueryGraph, tx: &Transaction);

    /// Domain size of a node variable's internal ID: the number of
    /// distinct node IDs it may take.
    fn node_id_dom(&self, graph: &QueryGraph, node_variable: &str, tx: &Transaction) -> f64;

    fn estimate_scan_node(&self, node: &QueryNode, tx: &Transaction) -> f64;

    fn estimate_extend(&self, input_cardinality: f64, rel: &QueryRel, tx: &Transaction) -> f64;

    fn estimate_filter(&self, input_cardinality: f64, predicate: &Expression) -> f64;

    fn estimate_hash_join(
        &self,
        graph: &QueryGraph,
        join_node_ids: &[Expression],
        probe_cardinality: f64,
        build_cardinality: f64,
        tx: &Transaction,
    ) -> f64;

    fn estimate_intersect(
        &self,
        graph: &QueryGraph,
        intersect_node_id: &Expression,
        probe_cardinality: f64,
        build_cardinalities: &[f64],
        tx: &Transaction,
    ) -> f64;

    fn estimate_cross_product(&self, left_cardinality: f64, right_cardinality: f64) -> f64;
}

/// Selectivity assumed for predicates the estimator has no statistics for.
const DEFAULT_SELECTIVITY: f64 = 0.5;
/// Selectivity assumed for equality predicates.
const EQUALITY_SELECTIVITY: f64 = 0.1;
/// Selectivity assumed for range comparisons.
const COMPARISON_SELECTIVITY: f64 = 0.3;

/// Extracts the variable a node-internal-ID expression refers to.
fn internal_id_variable(expr: &Expression) -> Option<&str> {
    match expr {
        Expression::Property { variable, .. } => Some(variable),
        _ => None,
    }
}

/// Statistics-backed estimator shared across planning calls.
#[derive(Debug, Default)]
pub struct StatsEstimator {
    stats: GraphStatistics,
    /// (table, transaction) -> cached node-ID-domain size.
    node_id_dom_cache: RwLock<HashMap<(TableId, u64), f64>>,
}

impl StatsEstimator {
    pub fn new(stats: GraphStatistics) -> Self {
        Self {
            stats,
            node_id_dom_cache: RwLock::new(HashMap::new()),
        }
    }

    fn table_dom(&self, table: TableId, tx: &Transaction) -> f64 {
        let key = (table, tx.id());
        if let Some(dom) = self.node_id_dom_cache.read().get(&key) {
            return *dom;
        }
        let dom = self.stats.node_table_cardinality(table) as f64;
        self.node_id_dom_cache.write().insert(key, dom);
        dom
    }

    /// Average out-degree over the relationship's tables, relative to the
    /// whole node population.
    fn average_degree(&self, rel: &QueryRel) -> f64 {
        let rel_count: u64 = rel
            .table_ids()
            .iter()
            .map(|t| self.stats.rel_table_cardinality(*t))
            .sum();
        let node_count = self.stats.total_node_count().max(1);
        (rel_count as f64 / node_count as f64).max(1.0)
    }
}

impl CardinalityEstimator for StatsEstimator {
    fn init_node_id_dom(&self, graph: &QueryGraph, tx: &Transaction) {
        for node in graph.query_nodes() {
            for table in node.table_ids() {
                self.table_dom(*table, tx);
            }
        }
    }

    fn node_id_dom(&self, graph: &QueryGraph, node_variable: &str, tx: &Transaction) -> f64 {
        let Some(pos) = graph.query_node_idx(node_variable) else {
            return 1.0;
        };
        graph
            .query_node(pos)
            .table_ids()
            .iter()
            .map(|t| self.table_dom(*t, tx))
            .sum::<f64>()
            .max(1.0)
    }

    fn estimate_scan_node(&self, node: &QueryNode, tx: &Transaction) -> f64 {
        node.table_ids()
            .iter()
            .map(|t| self.table_dom(*t, tx))
            .sum::<f64>()
            .max(1.0)
    }

    fn estimate_extend(&self, input_cardinality: f64, rel: &QueryRel, tx: &Transaction) -> f64 {
        let _ = tx;
        input_cardinality * self.average_degree(rel)
    }

    fn estimate_filter(&self, input_cardinality: f64, predicate: &Expression) -> f64 {
        let selectivity = match predicate {
            Expression::Function { name, .. } if name == "EQUALS" => EQUALITY_SELECTIVITY,
            Expression::Function { name, .. }
                if matches!(
                    name.as_str(),
                    "LESS_THAN" | "LESS_THAN_EQUALS" | "GREATER_THAN" | "GREATER_THAN_EQUALS"
                ) =>
            {
                COMPARISON_SELECTIVITY
            }
            _ => DEFAULT_SELECTIVITY,
        };
        (input_cardinality * selectivity).max(1.0)
    }

    fn estimate_hash_join(
        &self,
        graph: &QueryGraph,
        join_node_ids: &[Expression],
        probe_cardinality: f64,
        build_cardinality: f64,
        tx: &Transaction,
    ) -> f64 {
        let mut dom_product = 1.0;
        for key in join_node_ids {
            if let Some(variable) = internal_id_variable(key) {
                dom_product *= self.node_id_dom(graph, variable, tx);
            }
        }
        (probe_cardinality * build_cardinality / dom_product.max(1.0)).max(1.0)
    }

    fn estimate_intersect(
        &self,
        graph: &QueryGraph,
        intersect_node_id: &Expression,
        probe_cardinality: f64,
        build_cardinalities: &[f64],
        tx: &Transaction,
    ) -> f64 {
        let min_build = build_cardinalities
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        let dom = internal_id_variable(intersect_node_id)
            .map(|variable| self.node_id_dom(graph, variable, tx))
            .unwrap_or(1.0);
        (probe_cardinality * min_build / dom.max(1.0)).max(1.0)
    }

    fn estimate_cross_product(&self, left_cardinality: f64, right_cardinality: f64) -> f64 {
        (left_cardinality * right_cardinality).max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{QueryRelType, RelDirection};

    fn estimator() -> StatsEstimator {
        let mut stats = GraphStatistics::new();
        stats.set_node_table_cardinality(0, 1000);
        stats.set_rel_table_cardinality(100, 5000);
        StatsEstimator::new(stats)
    }

    fn graph() -> QueryGraph {
        let mut graph = QueryGraph::new();
        graph.add_query_node(QueryNode::new("a", vec![0]));
        graph.add_query_node(QueryNode::new("b", vec![0]));
        graph.add_query_rel(QueryRel::new(
            "e",
            "a",
            "b",
            RelDirection::Fwd,
            QueryRelType::NonRecursive,
            vec![100],
        ));
        graph
    }

    #[test]
    fn test_node_id_dom_is_table_cardinality() {
        let estimator = estimator();
        let graph = graph();
        let tx = Transaction::new(1);
        estimator.init_node_id_dom(&graph, &tx);
        assert_eq!(estimator.node_id_dom(&graph, "a", &tx), 1000.0);
    }

    #[test]
    fn test_dom_cache_keyed_by_transaction() {
        let estimator = estimator();
        let graph = graph();
        estimator.init_node_id_dom(&graph, &Transaction::new(1));
        estimator.init_node_id_dom(&graph, &Transaction::new(2));
        assert_eq!(estimator.node_id_dom_cache.read().len(), 2);
    }

    #[test]
    fn test_hash_join_divides_by_key_domain() {
        let estimator = estimator();
        let graph = graph();
        let tx = Transaction::new(1);
        let card = estimator.estimate_hash_join(
            &graph,
            &[Expression::internal_id("a")],
            2000.0,
            1000.0,
            &tx,
        );
        assert_eq!(card, 2000.0);
    }

    #[test]
    fn test_extend_scales_by_degree() {
        let estimator = estimator();
        let graph = graph();
        let tx = Transaction::new(1);
        let rel = graph.query_rel(0).clone();
        assert_eq!(estimator.estimate_extend(100.0, &rel, &tx), 500.0);
    }
}
