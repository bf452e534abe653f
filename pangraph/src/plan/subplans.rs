// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Sub-plans table
//!
//! The shared structure of the dynamic program: for every matched
//! subgraph, the candidate plans found so far and the cheapest cost seen.
//! Plans are grouped by level (number of matched relationships) so the
//! enumerator can walk one level at a time. Pruning happens at the
//! enumerator's insertion sites, not here: scans and extends always land,
//! hash joins are only materialized when they beat the ceiling.

use std::collections::HashMap;

use crate::graph::SubqueryGraph;
use crate::plan::logical::LogicalPlan;

#[derive(Debug, Default)]
pub struct SubPlansTable {
    /// `plans_per_level[level]` maps each subgraph with `level` matched
    /// relationships to its candidate plans.
    plans_per_level: Vec<HashMap<SubqueryGraph, Vec<LogicalPlan>>>,
    /// Cheapest cost ever inserted per subgraph; the pruning ceiling.
    max_costs: HashMap<SubqueryGraph, f64>,
}

impl SubPlansTable {
    pub fn new(max_level: usize) -> Self {
        Self {
            plans_per_level: vec![HashMap::new(); max_level + 1],
            max_costs: HashMap::new(),
        }
    }

    pub fn clear(&mut self, max_level: usize) {
        self.plans_per_level = vec![HashMap::new(); max_level + 1];
        self.max_costs.clear();
    }

    /// Append a plan under its subgraph and lower the cost ceiling if the
    /// plan beats it. Duplicate plans are permitted; different operator
    /// shapes survive at equal cost.
    pub fn add_plan(&mut self, subgraph: SubqueryGraph, plan: LogicalPlan) {
        let level = subgraph.num_query_rels();
        debug_assert!(level < self.plans_per_level.len(), "level {} out of range", level);
        let ceiling = self.max_costs.entry(subgraph).or_insert(f64::INFINITY);
        if plan.cost() < *ceiling {
            *ceiling = plan.cost();
        }
        self.plans_per_level[level]
            .entry(subgraph)
            .or_default()
            .push(plan);
    }

    pub fn contains_subgraph_plans(&self, subgraph: &SubqueryGraph) -> bool {
        let level = subgraph.num_query_rels();
        self.plans_per_level
            .get(level)
            .map(|m| m.contains_key(subgraph))
            .unwrap_or(false)
    }

    pub fn subgraph_plans(&self, subgraph: &SubqueryGraph) -> &[LogicalPlan] {
        let level = subgraph.num_query_rels();
        self.plans_per_level
            .get(level)
            .and_then(|m| m.get(subgraph))
            .map(|plans| plans.as_slice())
            .unwrap_or(&[])
    }

    /// Subgraphs registered at a level, in deterministic selector order.
    pub fn subquery_graphs(&self, level: usize) -> Vec<SubqueryGraph> {
        let mut subgraphs: Vec<SubqueryGraph> = self
            .plans_per_level
            .get(level)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default();
        subgraphs.sort_unstable();
        subgraphs
    }

    /// Cheapest cost seen for a subgraph; infinity before the first plan
    /// lands, so baselines always insert.
    pub fn max_cost(&self, subgraph: &SubqueryGraph) -> f64 {
        self.max_costs
            .get(subgraph)
            .copied()
            .unwrap_or(f64::INFINITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::query_graph::{QueryGraph, QueryNode, QueryRel, QueryRelType, RelDirection};

    fn one_rel_graph() -> QueryGraph {
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

    fn plan_with_cost(cost: f64) -> LogicalPlan {
        let mut plan = LogicalPlan::new();
        plan.set_cost(cost);
        plan
    }

    #[test]
    fn test_ceiling_tracks_minimum() {
        let graph = one_rel_graph();
        let mut table = SubPlansTable::new(1);
        let mut subgraph = SubqueryGraph::empty();
        subgraph.add_query_rel(&graph, 0);

        assert_eq!(table.max_cost(&subgraph), f64::INFINITY);
        table.add_plan(subgraph, plan_with_cost(10.0));
        assert_eq!(table.max_cost(&subgraph), 10.0);
        table.add_plan(subgraph, plan_with_cost(25.0));
        assert_eq!(table.max_cost(&subgraph), 10.0);
        table.add_plan(subgraph, plan_with_cost(5.0));
        assert_eq!(table.max_cost(&subgraph), 5.0);
        assert_eq!(table.subgraph_plans(&subgraph).len(), 3);
    }

    #[test]
    fn test_level_grouping() {
        let graph = one_rel_graph();
        let mut table = SubPlansTable::new(1);
        let mut node_only = SubqueryGraph::empty();
        node_only.add_query_node(0);
        let mut one_rel = SubqueryGraph::empty();
        one_rel.add_query_rel(&graph, 0);

        table.add_plan(node_only, plan_with_cost(1.0));
        table.add_plan(one_rel, plan_with_cost(2.0));
        assert_eq!(table.subquery_graphs(0), vec![node_only]);
        assert_eq!(table.subquery_graphs(1), vec![one_rel]);
        assert!(table.contains_subgraph_plans(&one_rel));
    }
}
