// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Join-order hints
//!
//! A hint is a user-specified join tree over pattern variables. When one
//! is supplied, enumeration is skipped entirely: the constructor validates
//! the tree against the query graph and the solver lowers it to a single
//! plan, choosing only among traversal directions and build/probe
//! assignments within the fixed tree shape.

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult};
use crate::expr::Expression;
use crate::graph::{extend_direction, QueryGraph, SubqueryGraph};
use crate::plan::enumerator::Planner;
use crate::plan::logical::{JoinType, LogicalPlan};

/// User-facing join-order hint: variables at the leaves, joins inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JoinTreeHint {
    Variable(String),
    Join(Box<JoinTreeHint>, Box<JoinTreeHint>),
}

impl JoinTreeHint {
    pub fn variable(name: impl Into<String>) -> Self {
        JoinTreeHint::Variable(name.into())
    }

    pub fn join(left: JoinTreeHint, right: JoinTreeHint) -> Self {
        JoinTreeHint::Join(Box::new(left), Box::new(right))
    }
}

/// Validated hint tree annotated with the subgraph each subtree covers.
#[derive(Debug)]
pub(crate) enum JoinTreeNode {
    LeafNode {
        node_pos: usize,
        subgraph: SubqueryGraph,
    },
    LeafRel {
        rel_pos: usize,
        subgraph: SubqueryGraph,
    },
    Join {
        left: Box<JoinTreeNode>,
        right: Box<JoinTreeNode>,
        join_node_positions: Vec<usize>,
        subgraph: SubqueryGraph,
    },
}

impl JoinTreeNode {
    fn subgraph(&self) -> SubqueryGraph {
        match self {
            JoinTreeNode::LeafNode { subgraph, .. }
            | JoinTreeNode::LeafRel { subgraph, .. }
            | JoinTreeNode::Join { subgraph, .. } => *subgraph,
        }
    }
}

#[derive(Debug)]
pub(crate) struct JoinTree {
    pub(crate) root: JoinTreeNode,
}

/// Validates a hint against the query graph.
pub(crate) struct JoinTreeConstructor<'a> {
    graph: &'a QueryGraph,
}

impl<'a> JoinTreeConstructor<'a> {
    pub(crate) fn new(graph: &'a QueryGraph) -> Self {
        Self { graph }
    }

    pub(crate) fn construct(&self, hint: &JoinTreeHint) -> PlannerResult<JoinTree> {
        let root = self.build(hint)?;
        let full = self.graph.fully_matched_subquery_graph();
        if root.subgraph() != full {
            return Err(PlannerError::HintInfeasible(
                "Join order hint must cover every pattern variable".to_string(),
            ));
        }
        Ok(JoinTree { root })
    }

    fn build(&self, hint: &JoinTreeHint) -> PlannerResult<JoinTreeNode> {
        match hint {
            JoinTreeHint::Variable(name) => {
                if let Some(rel_pos) = self.graph.query_rel_idx(name) {
                    let mut subgraph = SubqueryGraph::empty();
                    subgraph.add_query_rel(self.graph, rel_pos);
                    Ok(JoinTreeNode::LeafRel { rel_pos, subgraph })
                } else if let Some(node_pos) = self.graph.query_node_idx(name) {
                    let mut subgraph = SubqueryGraph::empty();
                    subgraph.add_query_node(node_pos);
                    Ok(JoinTreeNode::LeafNode { node_pos, subgraph })
                } else {
                    Err(PlannerError::HintInfeasible(format!(
                        "Unknown pattern variable in join order hint: {}",
                        name
                    )))
                }
            }
            JoinTreeHint::Join(left, right) => {
                let left = self.build(left)?;
                let right = self.build(right)?;
                let left_subgraph = left.subgraph();
                let right_subgraph = right.subgraph();
                if !left_subgraph.is_rel_disjoint(&right_subgraph) {
                    return Err(PlannerError::HintInfeasible(
                        "Join order hint mentions a relationship twice".to_string(),
                    ));
                }
                let join_node_positions =
                    left_subgraph.connected_node_positions(&right_subgraph);
                if join_node_positions.is_empty() {
                    return Err(PlannerError::HintInfeasible(
                        "Join order hint joins two unconnected sub-patterns".to_string(),
                    ));
                }
                let mut subgraph = left_subgraph;
                subgraph.add_subquery_graph(&right_subgraph);
                Ok(JoinTreeNode::Join {
                    left: Box::new(left),
                    right: Box::new(right),
                    join_node_positions,
                    subgraph,
                })
            }
        }
    }
}

/// Lowers a validated join tree to one logical plan.
pub(crate) struct JoinPlanSolver<'a, 'b> {
    planner: &'b Planner<'a>,
}

impl<'a, 'b> JoinPlanSolver<'a, 'b> {
    pub(crate) fn new(planner: &'b Planner<'a>) -> Self {
        Self { planner }
    }

    pub(crate) fn solve(&self, tree: &JoinTree) -> PlannerResult<LogicalPlan> {
        let candidates = self.solve_node(&tree.root)?;
        candidates
            .into_iter()
            .min_by(|a, b| {
                a.cost()
                    .partial_cmp(&b.cost())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .ok_or_else(|| {
                PlannerError::Internal("Hint solver produced no candidate plan".to_string())
            })
    }

    /// Leaves keep both traversal directions alive; every join reduces to
    /// the cheapest orientation so the overall shape stays the hint's.
    fn solve_node(&self, node: &JoinTreeNode) -> PlannerResult<Vec<LogicalPlan>> {
        let planner = self.planner;
        match node {
            JoinTreeNode::LeafNode { node_pos, subgraph } => {
                let query_node = planner.graph.query_node(*node_pos).clone();
                let mut plan = LogicalPlan::new();
                let properties = planner.properties.properties_of(query_node.variable());
                planner.append_scan_node_table(&query_node, properties, &mut plan);
                let predicates =
                    planner.newly_matched_predicates(&[SubqueryGraph::empty()], subgraph);
                planner.append_filters(predicates, &mut plan);
                Ok(vec![plan])
            }
            JoinTreeNode::LeafRel { rel_pos, subgraph } => {
                let rel = planner.graph.query_rel(*rel_pos).clone();
                let predicates =
                    planner.newly_matched_predicates(&[SubqueryGraph::empty()], subgraph);
                let mut plans = Vec::new();
                for bound_name in [rel.src_node_name(), rel.dst_node_name()] {
                    let bound_pos = planner
                        .graph
                        .query_node_idx(bound_name)
                        .expect("bound rel endpoints are in the graph");
                    let bound = planner.graph.query_node(bound_pos).clone();
                    let nbr_pos = planner
                        .graph
                        .query_node_idx(rel.other_node_name(bound.variable()))
                        .expect("bound rel endpoints are in the graph");
                    let nbr = planner.graph.query_node(nbr_pos).clone();
                    let direction = extend_direction(&rel, bound.variable());
                    let mut plan = LogicalPlan::new();
                    planner.append_scan_node_table(&bound, Vec::new(), &mut plan);
                    planner.append_extend(
                        &bound,
                        &nbr,
                        &rel,
                        direction,
                        planner.properties.properties_of(rel.variable()),
                        &mut plan,
                    );
                    planner.append_filters(predicates.clone(), &mut plan);
                    plans.push(plan);
                }
                Ok(plans)
            }
            JoinTreeNode::Join {
                left,
                right,
                join_node_positions,
                subgraph,
            } => {
                let left_plans = self.solve_node(left)?;
                let right_plans = self.solve_node(right)?;
                let join_node_ids: Vec<Expression> = join_node_positions
                    .iter()
                    .map(|&pos| planner.graph.query_node(pos).internal_id())
                    .collect();
                let predicates = planner.newly_matched_predicates(
                    &[left.subgraph(), right.subgraph()],
                    subgraph,
                );
                let mut candidates = Vec::new();
                for left_plan in &left_plans {
                    for right_plan in &right_plans {
                        for (probe_plan, build_plan) in
                            [(left_plan, right_plan), (right_plan, left_plan)]
                        {
                            let mut probe = probe_plan.shallow_copy();
                            planner.append_hash_join(
                                &join_node_ids,
                                JoinType::Inner,
                                &mut probe,
                                build_plan,
                            );
                            planner.append_filters(predicates.clone(), &mut probe);
                            candidates.push(probe);
                        }
                    }
                }
                let best = candidates.into_iter().min_by(|a, b| {
                    a.cost()
                        .partial_cmp(&b.cost())
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                Ok(best.into_iter().collect())
            }
        }
    }
}
