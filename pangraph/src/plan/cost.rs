// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cost model for plan selection
//!
//! Pure functions over plans and their proposed extensions; no state, no
//! side effects. The enumerator compares costs with strict less-than
//! against the per-subgraph ceiling, so ties never displace an incumbent.

use crate::expr::Expression;
use crate::plan::logical::LogicalPlan;

/// Per-tuple cost constants. Scan and extend costs are folded into plan
/// cardinality when the corresponding operator is appended; the join
/// costs here are what the enumerator prunes on.
#[derive(Debug, Clone)]
pub struct CostModel {
    /// Cost of streaming one probe-side tuple through a join.
    probe_cost_per_tuple: f64,
    /// Cost of materializing one build-side tuple.
    build_cost_per_tuple: f64,
    /// Cost of producing one scanned tuple.
    scan_cost_per_tuple: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CostModel {
    pub fn new() -> Self {
        Self {
            probe_cost_per_tuple: 1.0,
            build_cost_per_tuple: 2.0,
            scan_cost_per_tuple: 1.0,
        }
    }

    /// Cost of a hash join: both inputs plus build-side materialization
    /// and probe-side scan-through. Monotone in both input cardinalities
    /// and independent of the key expressions themselves.
    pub fn compute_hash_join_cost(
        &self,
        _join_node_ids: &[Expression],
        probe: &LogicalPlan,
        build: &LogicalPlan,
    ) -> f64 {
        probe.cost()
            + build.cost()
            + self.probe_cost_per_tuple * probe.cardinality()
            + self.build_cost_per_tuple * build.cardinality()
    }

    /// Cost of a multiway intersect: probe scan-through plus every build
    /// side materialized.
    pub fn compute_intersect_cost(&self, probe: &LogicalPlan, builds: &[LogicalPlan]) -> f64 {
        let builds_cost: f64 = builds
            .iter()
            .map(|b| b.cost() + self.build_cost_per_tuple * b.cardinality())
            .sum();
        probe.cost() + self.probe_cost_per_tuple * probe.cardinality() + builds_cost
    }

    pub fn compute_cross_product_cost(
        &self,
        left: &LogicalPlan,
        right: &LogicalPlan,
        output_cardinality: f64,
    ) -> f64 {
        left.cost() + right.cost() + output_cardinality
    }

    pub fn compute_scan_cost(&self, cardinality: f64) -> f64 {
        self.scan_cost_per_tuple * cardinality
    }

    /// An extend pays for each tuple it produces.
    pub fn compute_extend_cost(&self, output_cardinality: f64) -> f64 {
        output_cardinality
    }

    /// A filter pays for each tuple it inspects.
    pub fn compute_filter_cost(&self, input_cardinality: f64) -> f64 {
        input_cardinality
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_with(cost: f64, cardinality: f64) -> LogicalPlan {
        let mut plan = LogicalPlan::new();
        plan.set_cost(cost);
        plan.set_cardinality(cardinality);
        plan
    }

    #[test]
    fn test_hash_join_cost_is_monotone_in_inputs() {
        let model = CostModel::new();
        let keys = vec![Expression::internal_id("a")];
        let small = model.compute_hash_join_cost(&keys, &plan_with(0.0, 10.0), &plan_with(0.0, 10.0));
        let bigger_probe =
            model.compute_hash_join_cost(&keys, &plan_with(0.0, 100.0), &plan_with(0.0, 10.0));
        let bigger_build =
            model.compute_hash_join_cost(&keys, &plan_with(0.0, 10.0), &plan_with(0.0, 100.0));
        assert!(bigger_probe > small);
        assert!(bigger_build > small);
    }

    #[test]
    fn test_build_side_is_pricier_than_probe_side() {
        let model = CostModel::new();
        let keys = vec![Expression::internal_id("a")];
        let probe_heavy =
            model.compute_hash_join_cost(&keys, &plan_with(0.0, 100.0), &plan_with(0.0, 10.0));
        let build_heavy =
            model.compute_hash_join_cost(&keys, &plan_with(0.0, 10.0), &plan_with(0.0, 100.0));
        assert!(build_heavy > probe_heavy);
    }
}
