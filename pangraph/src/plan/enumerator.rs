// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Join-order enumeration
//!
//! Level-by-level dynamic programming over matched subgraphs. Level 1
//! holds the base table scans; level `k` joins every viable (l, k-l)
//! partition of its subgraphs through hash joins, index-nested-loop
//! extends and worst-case-optimal intersects. Beyond a fixed level the
//! enumeration degrades to left-deep splits only. Components of a
//! collection are planned independently and combined by cross products.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use crate::catalog::CardinalityEstimator;
use crate::error::{PlannerError, PlannerResult};
use crate::expr::{collect_dependent_var_names, Expression, PropertyExprCollection};
use crate::graph::{
    extend_direction, QueryGraph, QueryGraphCollection, QueryNode, SubqueryGraph,
};
use crate::plan::cost::CostModel;
use crate::plan::hint::{JoinPlanSolver, JoinTreeConstructor, JoinTreeHint};
use crate::plan::logical::{JoinType, LogicalOperator, LogicalPlan};
use crate::plan::subplans::SubPlansTable;
use crate::session::context::{ClientContext, PlannerConfig, Transaction};

/// Levels up to this bound enumerate every (l, k-l) partition; beyond it
/// only the left-deep (1, k-1) split is considered.
pub const MAX_LEVEL_TO_PLAN_EXACTLY: usize = 6;

/// How an inner query graph correlates with its enclosing query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubqueryType {
    /// Not a subquery, or an uncorrelated one.
    None,
    /// Correlated on node internal IDs only; correlated nodes are scanned
    /// ID-only to avoid reading storage twice.
    InternalIdCorrelated,
    /// Fully correlated; correlated nodes are supplied by the outer query
    /// through an expressions scan.
    Correlated,
}

/// Per-call planning input alongside the query graph collection.
#[derive(Debug, Clone)]
pub struct QueryGraphPlanningInfo {
    /// Conjuncts of the WHERE clause, already split on AND.
    pub predicates: Vec<Expression>,
    pub subquery_type: SubqueryType,
    /// Correlated expressions supplied by the outer query.
    pub corr_exprs: Vec<Expression>,
    /// Cardinality of the distinct correlated values.
    pub corr_exprs_card: f64,
    /// User-specified join order; set, it bypasses enumeration entirely.
    pub hint: Option<JoinTreeHint>,
}

impl Default for QueryGraphPlanningInfo {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
            subquery_type: SubqueryType::None,
            corr_exprs: Vec::new(),
            corr_exprs_card: 1.0,
            hint: None,
        }
    }
}

/// The planner core: owns the per-call enumeration state and produces one
/// logical plan per query graph collection.
pub struct Planner<'a> {
    pub(crate) config: PlannerConfig,
    pub(crate) tx: &'a Transaction,
    pub(crate) estimator: &'a dyn CardinalityEstimator,
    pub(crate) properties: &'a PropertyExprCollection,
    pub(crate) cost_model: CostModel,
    /// Query graph of the component currently being enumerated.
    pub(crate) graph: QueryGraph,
    where_exprs: Vec<Expression>,
    /// Internal-ID names of correlated nodes; non-empty only in
    /// CORRELATED mode. Correlated nodes are supplied by the outer query,
    /// so no join may bind one by traversal.
    corr_names: HashSet<String>,
    pub(crate) subplans: SubPlansTable,
    deadline: Option<Instant>,
}

impl<'a> Planner<'a> {
    pub fn new(
        context: &'a ClientContext,
        estimator: &'a dyn CardinalityEstimator,
        properties: &'a PropertyExprCollection,
    ) -> Self {
        Self {
            config: PlannerConfig::from_context(context),
            tx: context.transaction(),
            estimator,
            properties,
            cost_model: CostModel::new(),
            graph: QueryGraph::new(),
            where_exprs: Vec::new(),
            corr_names: HashSet::new(),
            subplans: SubPlansTable::new(0),
            deadline: None,
        }
    }

    /// Plan a collection and return the cheapest complete plan. This is
    /// the entry point the query compiler calls.
    pub fn plan_query_graph_collection(
        &mut self,
        collection: &QueryGraphCollection,
        info: &QueryGraphPlanningInfo,
    ) -> PlannerResult<LogicalPlan> {
        if self.config.timeout_ms > 0 {
            self.deadline = Some(Instant::now() + Duration::from_millis(self.config.timeout_ms));
        }
        let plans = self.enumerate_query_graph_collection(collection, info)?;
        let mut best = plans
            .into_iter()
            .min_by(|a, b| {
                a.cost()
                    .partial_cmp(&b.cost())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .ok_or_else(|| {
                PlannerError::Internal("Enumeration produced no plan for a non-empty collection".to_string())
            })?;
        best.set_expressions_to_collect(best.schema().expressions_in_scope());
        Ok(best)
    }

    /// Plan each component, combine components by cross product, then
    /// apply the predicates no single component could evaluate.
    fn enumerate_query_graph_collection(
        &mut self,
        collection: &QueryGraphCollection,
        info: &QueryGraphPlanningInfo,
    ) -> PlannerResult<Vec<LogicalPlan>> {
        debug_assert!(collection.num_query_graphs() > 0);
        let corr_names: HashSet<String> = info
            .corr_exprs
            .iter()
            .map(Expression::unique_name)
            .collect();
        // Pick the component that plans the expressions scan. None means
        // no component mentions a correlated variable and we fall back to
        // a cross product with a standalone scan.
        let expressions_scan_idx = if info.subquery_type == SubqueryType::Correlated {
            collection.connected_query_graph_idx(&corr_names)
        } else {
            None
        };
        let mut evaluated_predicates: HashSet<usize> = HashSet::new();
        let mut plans_per_graph: Vec<Vec<LogicalPlan>> = Vec::new();
        for (idx, graph) in collection.query_graphs().iter().enumerate() {
            let mut predicate_indices = Vec::new();
            for (pred_idx, predicate) in info.predicates.iter().enumerate() {
                if predicate.is_literal() || evaluated_predicates.contains(&pred_idx) {
                    continue;
                }
                if graph.can_project_expression(predicate) {
                    predicate_indices.push(pred_idx);
                }
            }
            evaluated_predicates.extend(predicate_indices.iter().copied());
            let mut graph_info = info.clone();
            graph_info.predicates = predicate_indices
                .iter()
                .map(|&i| info.predicates[i].clone())
                .collect();
            if info.subquery_type == SubqueryType::Correlated
                && Some(idx) != expressions_scan_idx
            {
                // Components without correlated variables plan in
                // isolation.
                graph_info.subquery_type = SubqueryType::None;
            }
            plans_per_graph.push(self.enumerate_query_graph(graph, &graph_info)?);
        }
        if info.subquery_type == SubqueryType::Correlated && expressions_scan_idx.is_none() {
            let mut plan = LogicalPlan::new();
            self.append_expressions_scan(info.corr_exprs.clone(), &mut plan);
            plan.set_cardinality(info.corr_exprs_card);
            self.append_distinct(info.corr_exprs.clone(), &mut plan);
            plans_per_graph.push(vec![plan]);
        }
        let mut result = plans_per_graph.remove(0);
        for right_plans in plans_per_graph {
            result = self.plan_cross_product(result, right_plans);
        }
        let remaining_predicates: Vec<Expression> = info
            .predicates
            .iter()
            .enumerate()
            .filter(|(i, _)| !evaluated_predicates.contains(i))
            .map(|(_, p)| p.clone())
            .collect();
        for plan in &mut result {
            for predicate in &remaining_predicates {
                self.append_filter(predicate.clone(), plan);
            }
        }
        Ok(result)
    }

    /// Enumerate one connected component and return every plan surviving
    /// at its fully matched subgraph.
    pub fn enumerate_query_graph(
        &mut self,
        graph: &QueryGraph,
        info: &QueryGraphPlanningInfo,
    ) -> PlannerResult<Vec<LogicalPlan>> {
        self.init(graph, &info.predicates);
        self.corr_names = if info.subquery_type == SubqueryType::Correlated {
            info.corr_exprs
                .iter()
                .map(Expression::unique_name)
                .collect()
        } else {
            HashSet::new()
        };
        self.estimator.init_node_id_dom(&self.graph, self.tx);
        if let Some(hint) = &info.hint {
            let constructor = JoinTreeConstructor::new(&self.graph);
            let tree = constructor.construct(hint)?;
            let plan = JoinPlanSolver::new(self).solve(&tree)?;
            return Ok(vec![plan]);
        }
        self.plan_base_table_scans(info);
        let max_level = self.graph.num_query_rels();
        for level in 2..=max_level {
            if self.deadline_expired() {
                let full = self.graph.fully_matched_subquery_graph();
                if self.subplans.contains_subgraph_plans(&full) {
                    log::warn!(
                        "Planning deadline reached before level {}; keeping the plans found so far",
                        level
                    );
                    break;
                }
                return Err(PlannerError::Timeout);
            }
            self.plan_level(level)?;
        }
        let full = self.graph.fully_matched_subquery_graph();
        let mut plans: Vec<LogicalPlan> = self.subplans.subgraph_plans(&full).to_vec();
        if self.graph.is_empty() {
            for plan in &mut plans {
                self.append_empty_result(plan);
            }
        }
        if plans.is_empty() {
            return Err(PlannerError::Internal(format!(
                "No plan at the fully matched subgraph ({})",
                full
            )));
        }
        Ok(plans)
    }

    fn init(&mut self, graph: &QueryGraph, predicates: &[Expression]) {
        self.graph = graph.clone();
        self.where_exprs = predicates.to_vec();
        self.subplans.clear(graph.num_query_rels());
        if graph.is_empty() {
            // Seed the empty subgraph so an empty pattern still yields a
            // plan to wrap in EmptyResult.
            self.subplans
                .add_plan(SubqueryGraph::empty(), LogicalPlan::new());
        }
    }

    fn deadline_expired(&self) -> bool {
        self.deadline
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }

    fn plan_level(&mut self, level: usize) -> PlannerResult<()> {
        debug_assert!(level > 1);
        if level > MAX_LEVEL_TO_PLAN_EXACTLY {
            log::debug!("Planning level {} approximately", level);
            self.plan_level_approximately(level)
        } else {
            log::debug!("Planning level {} exactly", level);
            self.plan_level_exactly(level)
        }
    }

    fn plan_level_exactly(&mut self, level: usize) -> PlannerResult<()> {
        let max_left_level = level / 2;
        for left_level in 1..=max_left_level {
            let right_level = level - left_level;
            self.plan_inner_join(left_level, right_level)?;
            // A WCO join needs at least two dangling rels on its build
            // side; try whichever orientation of the split provides them.
            // Intersects insert unpruned, so they go after the split's
            // hash joins.
            if left_level > 1 {
                self.plan_wco_join(left_level, right_level)?;
            }
            if right_level > 1 && right_level != left_level {
                self.plan_wco_join(right_level, left_level)?;
            }
        }
        Ok(())
    }

    fn plan_level_approximately(&mut self, level: usize) -> PlannerResult<()> {
        self.plan_inner_join(1, level - 1)
    }

    fn plan_base_table_scans(&mut self, info: &QueryGraphPlanningInfo) {
        let corr_names: HashSet<String> = info
            .corr_exprs
            .iter()
            .map(Expression::unique_name)
            .collect();
        match info.subquery_type {
            SubqueryType::None => {
                for node_pos in 0..self.graph.num_query_nodes() {
                    self.plan_node_scan(node_pos);
                }
            }
            SubqueryType::InternalIdCorrelated => {
                for node_pos in 0..self.graph.num_query_nodes() {
                    let internal_id = self.graph.query_node(node_pos).internal_id().unique_name();
                    if corr_names.contains(&internal_id) {
                        // The outer query scanned this node already; only
                        // its internal ID is needed here.
                        self.plan_node_id_scan(node_pos);
                    } else {
                        self.plan_node_scan(node_pos);
                    }
                }
            }
            SubqueryType::Correlated => {
                for node_pos in 0..self.graph.num_query_nodes() {
                    let internal_id = self.graph.query_node(node_pos).internal_id().unique_name();
                    if corr_names.contains(&internal_id) {
                        continue;
                    }
                    self.plan_node_scan(node_pos);
                }
                self.plan_correlated_expressions_scan(info);
            }
        }
        for rel_pos in 0..self.graph.num_query_rels() {
            self.plan_rel_scan(rel_pos, info, &corr_names);
        }
    }

    fn plan_node_scan(&mut self, node_pos: usize) {
        let node = self.graph.query_node(node_pos).clone();
        let mut subgraph = SubqueryGraph::empty();
        subgraph.add_query_node(node_pos);
        let mut plan = LogicalPlan::new();
        let properties = self.properties.properties_of(node.variable());
        self.append_scan_node_table(&node, properties, &mut plan);
        let predicates = self.newly_matched_predicates(&[SubqueryGraph::empty()], &subgraph);
        self.append_filters(predicates, &mut plan);
        self.subplans.add_plan(subgraph, plan);
    }

    /// ID-only scan; no property columns and no filters.
    fn plan_node_id_scan(&mut self, node_pos: usize) {
        let node = self.graph.query_node(node_pos).clone();
        let mut subgraph = SubqueryGraph::empty();
        subgraph.add_query_node(node_pos);
        let mut plan = LogicalPlan::new();
        self.append_scan_node_table(&node, Vec::new(), &mut plan);
        self.subplans.add_plan(subgraph, plan);
    }

    /// Seed plan for a correlated component: the outer values scanned,
    /// filtered, then deduplicated.
    fn plan_correlated_expressions_scan(&mut self, info: &QueryGraphPlanningInfo) {
        let corr_names: HashSet<String> = info
            .corr_exprs
            .iter()
            .map(Expression::unique_name)
            .collect();
        let subgraph = self.correlated_subgraph(&corr_names);
        let mut plan = LogicalPlan::new();
        self.append_expressions_scan(info.corr_exprs.clone(), &mut plan);
        plan.set_cardinality(info.corr_exprs_card);
        let predicates = self.newly_matched_predicates(&[SubqueryGraph::empty()], &subgraph);
        self.append_filters(predicates, &mut plan);
        self.append_distinct(info.corr_exprs.clone(), &mut plan);
        self.subplans.add_plan(subgraph, plan);
    }

    /// Subgraph covering exactly the correlated nodes.
    fn correlated_subgraph(&self, corr_names: &HashSet<String>) -> SubqueryGraph {
        let mut subgraph = SubqueryGraph::empty();
        for node_pos in 0..self.graph.num_query_nodes() {
            let internal_id = self.graph.query_node(node_pos).internal_id().unique_name();
            if corr_names.contains(&internal_id) {
                subgraph.add_query_node(node_pos);
            }
        }
        subgraph
    }

    /// Register the level-1 plans of one relationship. Regardless of the
    /// pattern's direction, both traversal orders are enumerated so later
    /// levels can pick the cheaper one. Relationships with a correlated
    /// endpoint instead grow out of the correlated expressions scan and
    /// never scan the correlated node table.
    fn plan_rel_scan(
        &mut self,
        rel_pos: usize,
        info: &QueryGraphPlanningInfo,
        corr_names: &HashSet<String>,
    ) {
        let rel = self.graph.query_rel(rel_pos).clone();
        let src_pos = self
            .graph
            .query_node_idx(rel.src_node_name())
            .expect("bound rel endpoints are in the graph");
        let dst_pos = self
            .graph
            .query_node_idx(rel.dst_node_name())
            .expect("bound rel endpoints are in the graph");
        if info.subquery_type == SubqueryType::Correlated {
            let src_corr = corr_names.contains(
                &self.graph.query_node(src_pos).internal_id().unique_name(),
            );
            let dst_corr = corr_names.contains(
                &self.graph.query_node(dst_pos).internal_id().unique_name(),
            );
            if src_corr || dst_corr {
                let bound_pos = if src_corr { src_pos } else { dst_pos };
                self.plan_rel_scan_from_correlated(rel_pos, bound_pos, corr_names);
                return;
            }
        }
        let mut new_subgraph = SubqueryGraph::empty();
        new_subgraph.add_query_rel(&self.graph, rel_pos);
        let predicates = self.newly_matched_predicates(&[SubqueryGraph::empty()], &new_subgraph);
        for bound_pos in [src_pos, dst_pos] {
            let bound = self.graph.query_node(bound_pos).clone();
            let nbr_pos = self
                .graph
                .query_node_idx(rel.other_node_name(bound.variable()))
                .expect("bound rel endpoints are in the graph");
            let nbr = self.graph.query_node(nbr_pos).clone();
            let direction = extend_direction(&rel, bound.variable());
            let mut plan = LogicalPlan::new();
            self.append_scan_node_table(&bound, Vec::new(), &mut plan);
            self.append_extend(
                &bound,
                &nbr,
                &rel,
                direction,
                self.properties.properties_of(rel.variable()),
                &mut plan,
            );
            self.append_filters(predicates.clone(), &mut plan);
            self.subplans.add_plan(new_subgraph, plan);
        }
    }

    /// Extend a relationship out of the correlated expressions scan. The
    /// correlated endpoint is supplied by the outer query, so the only
    /// legal traversal starts there.
    fn plan_rel_scan_from_correlated(
        &mut self,
        rel_pos: usize,
        bound_pos: usize,
        corr_names: &HashSet<String>,
    ) {
        let rel = self.graph.query_rel(rel_pos).clone();
        let bound = self.graph.query_node(bound_pos).clone();
        let nbr_pos = self
            .graph
            .query_node_idx(rel.other_node_name(bound.variable()))
            .expect("bound rel endpoints are in the graph");
        let nbr = self.graph.query_node(nbr_pos).clone();
        let direction = extend_direction(&rel, bound.variable());
        let base_subgraph = self.correlated_subgraph(corr_names);
        let mut new_subgraph = base_subgraph;
        new_subgraph.add_query_rel(&self.graph, rel_pos);
        let predicates = self.newly_matched_predicates(&[base_subgraph], &new_subgraph);
        for base_plan in self.subplans.subgraph_plans(&base_subgraph).to_vec() {
            let mut plan = base_plan.shallow_copy();
            self.append_extend(
                &bound,
                &nbr,
                &rel,
                direction,
                self.properties.properties_of(rel.variable()),
                &mut plan,
            );
            self.append_filters(predicates.clone(), &mut plan);
            self.subplans.add_plan(new_subgraph, plan);
        }
    }

    /// Join every viable pair of disjoint, connected subgraphs of the two
    /// levels. An index-nested-loop extend, when possible, replaces (and
    /// prunes) the hash joins of its pair.
    fn plan_inner_join(&mut self, left_level: usize, right_level: usize) -> PlannerResult<()> {
        for right_subgraph in self.subplans.subquery_graphs(right_level) {
            for left_subgraph in self.subplans.subquery_graphs(left_level) {
                if !right_subgraph.is_rel_disjoint(&left_subgraph) {
                    continue;
                }
                let join_positions = right_subgraph.connected_node_positions(&left_subgraph);
                if join_positions.is_empty() {
                    continue;
                }
                if need_prune_implicit_joins(
                    &self.graph,
                    &left_subgraph,
                    &right_subgraph,
                    join_positions.len(),
                ) {
                    continue;
                }
                let join_nodes: Vec<QueryNode> = join_positions
                    .iter()
                    .map(|&pos| self.graph.query_node(pos).clone())
                    .collect();
                if self.try_plan_inl_join(right_subgraph, left_subgraph, &join_nodes) {
                    continue;
                }
                self.plan_inner_hash_join(
                    right_subgraph,
                    left_subgraph,
                    &join_nodes,
                    left_level != right_level,
                );
            }
        }
        Ok(())
    }

    /// Index-nested-loop join: when the pair shares a single join node and
    /// one side is a single relationship, a plan on the other side that is
    /// still sequential on the join node absorbs the relationship as an
    /// Extend. Returns whether any plan was emitted.
    fn try_plan_inl_join(
        &mut self,
        subgraph: SubqueryGraph,
        other: SubqueryGraph,
        join_nodes: &[QueryNode],
    ) -> bool {
        if join_nodes.len() > 1 {
            return false;
        }
        if !subgraph.is_single_rel() && !other.is_single_rel() {
            return false;
        }
        // The single-rel side is absorbed; the other side probes.
        let (probe_subgraph, rel_side) = if other.is_single_rel() {
            (subgraph, other)
        } else {
            (other, subgraph)
        };
        let rel_pos = rel_side.rel_positions()[0];
        let rel = self.graph.query_rel(rel_pos).clone();
        let bound = join_nodes[0].clone();
        let nbr_pos = match self
            .graph
            .query_node_idx(rel.other_node_name(bound.variable()))
        {
            Some(pos) => pos,
            None => return false,
        };
        let nbr = self.graph.query_node(nbr_pos).clone();
        // A correlated neighbor is supplied by the outer query; binding it
        // by traversal would bypass the expressions scan.
        if self.corr_names.contains(&nbr.internal_id().unique_name()) {
            return false;
        }
        let direction = extend_direction(&rel, bound.variable());
        let mut new_subgraph = probe_subgraph;
        new_subgraph.add_query_rel(&self.graph, rel_pos);
        let predicates = self.newly_matched_predicates(&[probe_subgraph], &new_subgraph);
        let bound_id_name = bound.internal_id().unique_name();
        let mut applied = false;
        for prev_plan in self.subplans.subgraph_plans(&probe_subgraph).to_vec() {
            if !is_node_sequential_on_plan(&prev_plan, &bound_id_name) {
                continue;
            }
            let mut plan = prev_plan.shallow_copy();
            self.append_extend(
                &bound,
                &nbr,
                &rel,
                direction,
                self.properties.properties_of(rel.variable()),
                &mut plan,
            );
            self.append_filters(predicates.clone(), &mut plan);
            self.subplans.add_plan(new_subgraph, plan);
            applied = true;
        }
        applied
    }

    /// Hash-join every plan pair of the two subgraphs, pruning against the
    /// target subgraph's cost ceiling. With `flip` set the mirrored
    /// build/probe assignment is considered as well.
    fn plan_inner_hash_join(
        &mut self,
        subgraph: SubqueryGraph,
        other: SubqueryGraph,
        join_nodes: &[QueryNode],
        flip: bool,
    ) {
        let mut new_subgraph = subgraph;
        new_subgraph.add_subquery_graph(&other);
        let max_cost = self.subplans.max_cost(&new_subgraph);
        let join_node_ids: Vec<Expression> =
            join_nodes.iter().map(QueryNode::internal_id).collect();
        let predicates = self.newly_matched_predicates(&[subgraph, other], &new_subgraph);
        for left_plan in self.subplans.subgraph_plans(&subgraph).to_vec() {
            for right_plan in self.subplans.subgraph_plans(&other).to_vec() {
                if self
                    .cost_model
                    .compute_hash_join_cost(&join_node_ids, &left_plan, &right_plan)
                    < max_cost
                {
                    let mut probe = left_plan.shallow_copy();
                    self.append_hash_join(&join_node_ids, JoinType::Inner, &mut probe, &right_plan);
                    self.append_filters(predicates.clone(), &mut probe);
                    self.subplans.add_plan(new_subgraph, probe);
                }
                // Mirror build and probe for another candidate.
                if flip
                    && self
                        .cost_model
                        .compute_hash_join_cost(&join_node_ids, &right_plan, &left_plan)
                        < max_cost
                {
                    let mut probe = right_plan.shallow_copy();
                    self.append_hash_join(&join_node_ids, JoinType::Inner, &mut probe, &left_plan);
                    self.append_filters(predicates.clone(), &mut probe);
                    self.subplans.add_plan(new_subgraph, probe);
                }
            }
        }
    }

    /// Worst-case-optimal join: for every probe subgraph at `probe_level`,
    /// intersect `build_count` dangling relationships on their common
    /// unmatched endpoint.
    fn plan_wco_join(&mut self, build_count: usize, probe_level: usize) -> PlannerResult<()> {
        debug_assert!(build_count >= 2);
        for probe_subgraph in self.subplans.subquery_graphs(probe_level) {
            let candidates = populate_intersect_rel_candidates(&self.graph, &probe_subgraph);
            let mut intersect_positions: Vec<usize> = candidates.keys().copied().collect();
            intersect_positions.sort_unstable();
            for intersect_pos in intersect_positions {
                let rel_positions = &candidates[&intersect_pos];
                if rel_positions.len() == build_count {
                    self.plan_wco_join_on_node(probe_subgraph, rel_positions.clone(), intersect_pos);
                }
            }
        }
        Ok(())
    }

    fn plan_wco_join_on_node(
        &mut self,
        probe_subgraph: SubqueryGraph,
        rel_positions: Vec<usize>,
        intersect_pos: usize,
    ) {
        let intersect_node = self.graph.query_node(intersect_pos).clone();
        let intersect_id_name = intersect_node.internal_id().unique_name();
        if self.corr_names.contains(&intersect_id_name) {
            return;
        }
        let mut new_subgraph = probe_subgraph;
        let mut bound_node_ids = Vec::new();
        let mut build_plans = Vec::new();
        for &rel_pos in &rel_positions {
            let rel = self.graph.query_rel(rel_pos).clone();
            let bound_name = rel.other_node_name(intersect_node.variable()).to_string();
            let bound_id = Expression::internal_id(&bound_name);
            new_subgraph.add_query_rel(&self.graph, rel_pos);
            let mut rel_subgraph = SubqueryGraph::empty();
            rel_subgraph.add_query_rel(&self.graph, rel_pos);
            // The build heuristic: take the single-rel plan that scans the
            // bound endpoint sequentially.
            let build = self
                .subplans
                .subgraph_plans(&rel_subgraph)
                .iter()
                .find(|plan| is_node_sequential_on_plan(plan, &bound_id.unique_name()))
                .map(LogicalPlan::shallow_copy);
            match build {
                Some(build) => build_plans.push(build),
                // No suitable build plan; give up on this combination.
                None => return,
            }
            bound_node_ids.push(bound_id);
        }
        let predicates = self.newly_matched_predicates(&[probe_subgraph], &new_subgraph);
        for probe_plan in self.subplans.subgraph_plans(&probe_subgraph).to_vec() {
            // The intersect node already being in probe scope means the
            // closing edges should have been built and intersected
            // together, which edge-at-a-time enumeration cannot express.
            // Disabled rather than planned wrong.
            // TODO: re-enable once enumeration moves node-at-a-time.
            if probe_plan.schema().is_expression_in_scope(&intersect_id_name) {
                continue;
            }
            let mut probe = probe_plan.shallow_copy();
            self.append_intersect(
                intersect_node.internal_id(),
                bound_node_ids.clone(),
                &mut probe,
                &build_plans,
            );
            self.append_filters(predicates.clone(), &mut probe);
            self.subplans.add_plan(new_subgraph, probe);
        }
    }

    /// Pairwise cross products across two components' plan lists.
    fn plan_cross_product(
        &self,
        left_plans: Vec<LogicalPlan>,
        right_plans: Vec<LogicalPlan>,
    ) -> Vec<LogicalPlan> {
        let mut result = Vec::with_capacity(left_plans.len() * right_plans.len());
        for left_plan in &left_plans {
            for right_plan in &right_plans {
                let mut probe = left_plan.shallow_copy();
                self.append_cross_product(&mut probe, right_plan);
                result.push(probe);
            }
        }
        result
    }

    /// Predicates that become eligible exactly at the transition into
    /// `new_subgraph`: no previous subgraph contains all their variables,
    /// the new one does.
    pub(crate) fn newly_matched_predicates(
        &self,
        prev_subgraphs: &[SubqueryGraph],
        new_subgraph: &SubqueryGraph,
    ) -> Vec<Expression> {
        self.where_exprs
            .iter()
            .filter(|expr| {
                let variables = collect_dependent_var_names(expr);
                if prev_subgraphs
                    .iter()
                    .any(|prev| prev.contains_all_variables(&self.graph, &variables))
                {
                    return false;
                }
                new_subgraph.contains_all_variables(&self.graph, &variables)
            })
            .cloned()
            .collect()
    }
}

/// True when the declared join nodes undercount the nodes the two sides
/// actually share through their relationships; a better plan exists via a
/// different split, so the pair is skipped.
pub(crate) fn need_prune_implicit_joins(
    graph: &QueryGraph,
    left: &SubqueryGraph,
    right: &SubqueryGraph,
    num_join_nodes: usize,
) -> bool {
    let left_nodes = left.node_positions_ignoring_node_selector(graph);
    let right_nodes = right.node_positions_ignoring_node_selector(graph);
    let shared = left_nodes.intersection(&right_nodes).count();
    shared > num_join_nodes
}

/// Whether the plan's operator chain bottoms out at a sequential scan of
/// the given node.
pub(crate) fn is_node_sequential_on_plan(plan: &LogicalPlan, node_id_name: &str) -> bool {
    let Some(root) = plan.root() else {
        return false;
    };
    match root.sequential_scan() {
        Some(LogicalOperator::ScanNodeTable { node_id, .. }) => {
            node_id.unique_name() == node_id_name
        }
        _ => false,
    }
}

/// Dangling relationships of a subgraph grouped by the unmatched endpoint
/// they would intersect on. Relationships whose endpoints are both
/// matched close a cycle and belong to the inner join instead.
fn populate_intersect_rel_candidates(
    graph: &QueryGraph,
    subgraph: &SubqueryGraph,
) -> HashMap<usize, Vec<usize>> {
    let mut candidates: HashMap<usize, Vec<usize>> = HashMap::new();
    for rel_pos in subgraph.rel_nbr_positions(graph) {
        let rel = graph.query_rel(rel_pos);
        let src_pos = graph
            .query_node_idx(rel.src_node_name())
            .expect("bound rel endpoints are in the graph");
        let dst_pos = graph
            .query_node_idx(rel.dst_node_name())
            .expect("bound rel endpoints are in the graph");
        let src_connected = subgraph.contains_query_node(src_pos);
        let dst_connected = subgraph.contains_query_node(dst_pos);
        if src_connected && dst_connected {
            continue;
        }
        let intersect_pos = if src_connected { dst_pos } else { src_pos };
        candidates.entry(intersect_pos).or_default().push(rel_pos);
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{GraphStatistics, StatsEstimator};
    use crate::graph::{QueryRel, QueryRelType, RelDirection};
    use crate::plan::printer::encode_join;

    fn statistics() -> GraphStatistics {
        let mut stats = GraphStatistics::new();
        stats.set_node_table_cardinality(0, 1000);
        stats.set_rel_table_cardinality(100, 5000);
        stats
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

    /// `(a)-[e1]->(b)`, `(b)-[e2]->(a)`.
    fn two_cycle() -> QueryGraph {
        let mut graph = QueryGraph::new();
        graph.add_query_node(crate::graph::QueryNode::new("a", vec![0]));
        graph.add_query_node(crate::graph::QueryNode::new("b", vec![0]));
        graph.add_query_rel(rel("e1", "a", "b"));
        graph.add_query_rel(rel("e2", "b", "a"));
        graph
    }

    // Scenario E: a relationship whose endpoints are matched externally
    // declares fewer join nodes than the pair actually shares; the pair
    // must be pruned.
    #[test]
    fn test_prunes_implicit_joins_of_partially_scoped_pairs() {
        let graph = two_cycle();
        let mut right = SubqueryGraph::empty();
        right.add_query_rel(&graph, 0);
        // e2 enters with its endpoints matched externally; only b is in
        // its declared scope.
        let mut left = SubqueryGraph::empty();
        left.add_query_rel_ignoring_node_selector(1);
        left.add_query_node(1);
        let declared = right.connected_node_positions(&left);
        assert_eq!(declared.len(), 1);
        assert!(need_prune_implicit_joins(&graph, &left, &right, declared.len()));
    }

    #[test]
    fn test_fully_scoped_cycle_pair_is_not_pruned() {
        let graph = two_cycle();
        let mut right = SubqueryGraph::empty();
        right.add_query_rel(&graph, 0);
        let mut left = SubqueryGraph::empty();
        left.add_query_rel(&graph, 1);
        let declared = right.connected_node_positions(&left);
        assert_eq!(declared.len(), 2);
        assert!(!need_prune_implicit_joins(&graph, &left, &right, declared.len()));
    }

    // The closed two-cycle still plans end to end, via the hash join on
    // both shared nodes.
    #[test]
    fn test_two_cycle_plans_completely() {
        let context = ClientContext::new(Transaction::new(1));
        let estimator = StatsEstimator::new(statistics());
        let properties = PropertyExprCollection::new();
        let mut planner = Planner::new(&context, &estimator, &properties);
        let plans = planner
            .enumerate_query_graph(&two_cycle(), &QueryGraphPlanningInfo::default())
            .unwrap();
        assert!(!plans.is_empty());
        assert!(plans.iter().any(|p| encode_join(p).starts_with("HJ(a,b)")));
    }

    #[test]
    fn test_is_node_sequential_on_plan() {
        let context = ClientContext::new(Transaction::new(1));
        let estimator = StatsEstimator::new(statistics());
        let properties = PropertyExprCollection::new();
        let planner = Planner::new(&context, &estimator, &properties);
        let graph = two_cycle();
        let node_a = graph.query_node(0).clone();
        let node_b = graph.query_node(1).clone();
        let e1 = graph.query_rel(0).clone();
        let mut plan = LogicalPlan::new();
        planner.append_scan_node_table(&node_a, Vec::new(), &mut plan);
        planner.append_extend(
            &node_a,
            &node_b,
            &e1,
            crate::graph::ExtendDirection::Fwd,
            Vec::new(),
            &mut plan,
        );
        assert!(is_node_sequential_on_plan(&plan, "a._id"));
        assert!(!is_node_sequential_on_plan(&plan, "b._id"));
    }

    #[test]
    fn test_intersect_candidates_skip_closing_rels() {
        let graph = two_cycle();
        let mut subgraph = SubqueryGraph::empty();
        subgraph.add_query_rel(&graph, 0);
        // e2 closes the cycle: both endpoints are already matched, so it
        // is inner-join territory, not an intersect candidate.
        let candidates = populate_intersect_rel_candidates(&graph, &subgraph);
        assert!(candidates.is_empty());
    }
}
