// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Logical operator constructors
//!
//! Every `append_*` replaces the plan's root with a new operator whose
//! child is the previous root, derives the new schema, then updates the
//! cumulative cost and the cardinality through the estimator. Plans
//! already inserted into the sub-plans table are never appended to
//! directly; callers append onto fresh shallow copies.

use crate::expr::Expression;
use crate::graph::{ExtendDirection, QueryNode, QueryRel, QueryRelType};
use crate::plan::enumerator::Planner;
use crate::plan::logical::{JoinType, LogicalOperator, LogicalPlan};

impl<'a> Planner<'a> {
    pub(crate) fn append_scan_node_table(
        &self,
        node: &QueryNode,
        properties: Vec<Expression>,
        plan: &mut LogicalPlan,
    ) {
        debug_assert!(plan.is_empty());
        let cardinality = self.estimator.estimate_scan_node(node, self.tx);
        let group = plan.schema_mut().create_group(true);
        plan.schema_mut().insert_to_group(node.internal_id(), group);
        for property in &properties {
            plan.schema_mut().insert_to_group(property.clone(), group);
        }
        plan.install_root(LogicalOperator::ScanNodeTable {
            node_id: node.internal_id(),
            table_ids: node.table_ids().to_vec(),
            properties,
        });
        plan.set_cardinality(cardinality);
        plan.set_cost(plan.cost() + self.cost_model.compute_scan_cost(cardinality));
    }

    /// Dispatches on the relationship kind; recursive patterns lower to
    /// RecursiveExtend with the session's bounds.
    pub(crate) fn append_extend(
        &self,
        bound: &QueryNode,
        nbr: &QueryNode,
        rel: &QueryRel,
        direction: ExtendDirection,
        properties: Vec<Expression>,
        plan: &mut LogicalPlan,
    ) {
        if rel.rel_type().is_recursive() {
            self.append_recursive_extend(bound, nbr, rel, direction, plan);
        } else {
            self.append_non_recursive_extend(bound, nbr, rel, direction, properties, plan);
        }
    }

    pub(crate) fn append_non_recursive_extend(
        &self,
        bound: &QueryNode,
        nbr: &QueryNode,
        rel: &QueryRel,
        direction: ExtendDirection,
        properties: Vec<Expression>,
        plan: &mut LogicalPlan,
    ) {
        self.flatten_group_of(&bound.internal_id().unique_name(), plan);
        let group = plan.schema_mut().create_group(false);
        plan.schema_mut().insert_to_group(nbr.internal_id(), group);
        for property in &properties {
            plan.schema_mut().insert_to_group(property.clone(), group);
        }
        let child = plan.take_root().expect("extend requires a child plan");
        let extend_from_source = bound.variable() == rel.src_node_name();
        plan.install_root(LogicalOperator::Extend {
            bound_node_id: bound.internal_id(),
            nbr_node_id: nbr.internal_id(),
            rel_variable: rel.variable().to_string(),
            direction,
            extend_from_source,
            properties,
            child,
        });
        let cardinality = self
            .estimator
            .estimate_extend(plan.cardinality(), rel, self.tx);
        plan.set_cardinality(cardinality);
        plan.set_cost(plan.cost() + self.cost_model.compute_extend_cost(cardinality));
    }

    pub(crate) fn append_recursive_extend(
        &self,
        bound: &QueryNode,
        nbr: &QueryNode,
        rel: &QueryRel,
        direction: ExtendDirection,
        plan: &mut LogicalPlan,
    ) {
        self.flatten_group_of(&bound.internal_id().unique_name(), plan);
        let group = plan.schema_mut().create_group(false);
        plan.schema_mut().insert_to_group(nbr.internal_id(), group);
        let max_depth = match rel.rel_type() {
            QueryRelType::VariableLength { upper, .. } => {
                (*upper).min(self.config.var_length_max_depth)
            }
            _ => self.config.var_length_max_depth,
        };
        let child = plan.take_root().expect("extend requires a child plan");
        plan.install_root(LogicalOperator::RecursiveExtend {
            bound_node_id: bound.internal_id(),
            nbr_node_id: nbr.internal_id(),
            rel_variable: rel.variable().to_string(),
            direction,
            semantic: self.config.recursive_pattern_semantic,
            max_depth,
            child,
        });
        let cardinality = self
            .estimator
            .estimate_extend(plan.cardinality(), rel, self.tx)
            * self.config.recursive_pattern_factor as f64;
        plan.set_cardinality(cardinality);
        plan.set_cost(plan.cost() + self.cost_model.compute_extend_cost(cardinality));
    }

    pub(crate) fn append_filter(&self, predicate: Expression, plan: &mut LogicalPlan) {
        let input_cardinality = plan.cardinality();
        let cardinality = self.estimator.estimate_filter(input_cardinality, &predicate);
        let child = plan.take_root().expect("filter requires a child plan");
        plan.install_root(LogicalOperator::Filter { predicate, child });
        plan.set_cardinality(cardinality);
        plan.set_cost(plan.cost() + self.cost_model.compute_filter_cost(input_cardinality));
    }

    pub(crate) fn append_filters(&self, predicates: Vec<Expression>, plan: &mut LogicalPlan) {
        for predicate in predicates {
            self.append_filter(predicate, plan);
        }
    }

    pub(crate) fn append_flatten(&self, group: usize, plan: &mut LogicalPlan) {
        let child = plan.take_root().expect("flatten requires a child plan");
        plan.install_root(LogicalOperator::Flatten { group, child });
        plan.schema_mut().flatten_group(group);
    }

    /// Flatten the group holding `name`, if any and if unflat.
    fn flatten_group_of(&self, name: &str, plan: &mut LogicalPlan) {
        if let Some(group) = plan.schema().group_of(name) {
            if !plan.schema().group(group).is_flat() {
                self.append_flatten(group, plan);
            }
        }
    }

    /// Flatten every group containing one of the given expressions.
    fn flatten_groups_containing(&self, names: &[String], plan: &mut LogicalPlan) {
        for group in plan.schema().groups_containing(names) {
            if !plan.schema().group(group).is_flat() {
                self.append_flatten(group, plan);
            }
        }
    }

    /// Joins `build` into `probe`; `probe` becomes the joined plan. The
    /// probe-side groups holding the join keys are flattened first, then
    /// the schema widens with the build side minus the duplicate keys.
    pub(crate) fn append_hash_join(
        &self,
        join_node_ids: &[Expression],
        join_type: JoinType,
        probe: &mut LogicalPlan,
        build: &LogicalPlan,
    ) {
        let key_names: Vec<String> = join_node_ids.iter().map(|e| e.unique_name()).collect();
        self.flatten_groups_containing(&key_names, probe);
        let cost = self
            .cost_model
            .compute_hash_join_cost(join_node_ids, probe, build);
        let cardinality = self.estimator.estimate_hash_join(
            &self.graph,
            join_node_ids,
            probe.cardinality(),
            build.cardinality(),
            self.tx,
        );
        let probe_root = probe.take_root().expect("hash join requires a probe plan");
        let build_root = build
            .root()
            .cloned()
            .expect("hash join requires a build plan");
        probe.schema_mut().merge(build.schema());
        probe.install_root(LogicalOperator::HashJoin {
            join_node_ids: join_node_ids.to_vec(),
            join_type,
            probe: probe_root,
            build: build_root,
        });
        probe.set_cardinality(cardinality);
        probe.set_cost(cost);
    }

    /// Multiway intersect of the builds' neighbor lists on the intersect
    /// node, probed by `probe`.
    pub(crate) fn append_intersect(
        &self,
        intersect_node_id: Expression,
        bound_node_ids: Vec<Expression>,
        probe: &mut LogicalPlan,
        builds: &[LogicalPlan],
    ) {
        let bound_names: Vec<String> = bound_node_ids.iter().map(|e| e.unique_name()).collect();
        self.flatten_groups_containing(&bound_names, probe);
        let cost = self.cost_model.compute_intersect_cost(probe, builds);
        let build_cardinalities: Vec<f64> = builds.iter().map(LogicalPlan::cardinality).collect();
        let cardinality = self.estimator.estimate_intersect(
            &self.graph,
            &intersect_node_id,
            probe.cardinality(),
            &build_cardinalities,
            self.tx,
        );
        for build in builds {
            probe.schema_mut().merge(build.schema());
        }
        if !probe
            .schema()
            .is_expression_in_scope(&intersect_node_id.unique_name())
        {
            let group = probe.schema_mut().create_group(false);
            probe
                .schema_mut()
                .insert_to_group(intersect_node_id.clone(), group);
        }
        let probe_root = probe.take_root().expect("intersect requires a probe plan");
        let build_roots = builds
            .iter()
            .map(|b| b.root().cloned().expect("intersect requires build plans"))
            .collect();
        probe.install_root(LogicalOperator::Intersect {
            intersect_node_id,
            bound_node_ids,
            probe: probe_root,
            builds: build_roots,
        });
        probe.set_cardinality(cardinality);
        probe.set_cost(cost);
    }

    pub(crate) fn append_cross_product(&self, probe: &mut LogicalPlan, build: &LogicalPlan) {
        let cardinality = self
            .estimator
            .estimate_cross_product(probe.cardinality(), build.cardinality());
        let cost = self
            .cost_model
            .compute_cross_product_cost(probe, build, cardinality);
        let left = probe
            .take_root()
            .expect("cross product requires a left plan");
        let right = build
            .root()
            .cloned()
            .expect("cross product requires a right plan");
        probe.schema_mut().merge(build.schema());
        probe.install_root(LogicalOperator::CrossProduct { left, right });
        probe.set_cardinality(cardinality);
        probe.set_cost(cost);
    }

    pub(crate) fn append_expressions_scan(
        &self,
        expressions: Vec<Expression>,
        plan: &mut LogicalPlan,
    ) {
        debug_assert!(plan.is_empty());
        let group = plan.schema_mut().create_group(true);
        for expression in &expressions {
            plan.schema_mut().insert_to_group(expression.clone(), group);
        }
        plan.install_root(LogicalOperator::ExpressionsScan { expressions });
        plan.set_cardinality(1.0);
    }

    /// Distinct projects the plan down to its keys; the output schema is a
    /// single flat group.
    pub(crate) fn append_distinct(&self, keys: Vec<Expression>, plan: &mut LogicalPlan) {
        let child = plan.take_root().expect("distinct requires a child plan");
        let mut schema = crate::plan::schema::Schema::new();
        let group = schema.create_group(true);
        for key in &keys {
            schema.insert_to_group(key.clone(), group);
        }
        *plan.schema_mut() = schema;
        plan.install_root(LogicalOperator::Distinct { keys, child });
        plan.set_cost(plan.cost() + plan.cardinality());
    }

    pub(crate) fn append_empty_result(&self, plan: &mut LogicalPlan) {
        let child = plan.take_root();
        plan.install_root(LogicalOperator::EmptyResult { child });
        plan.set_cardinality(0.0);
    }
}
