// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Plan rendering
//!
//! Two views of a logical plan: a compact join-tree encoding that captures
//! scan/extend/join structure on one line (what the join-order tests
//! compare), and an indented operator tree for EXPLAIN output.

use crate::expr::Expression;
use crate::plan::logical::{LogicalOperator, LogicalPlan};

/// Variable a node-internal-ID expression refers to; falls back to the
/// full unique name for anything else.
fn variable_of(expr: &Expression) -> String {
    match expr {
        Expression::Property { variable, .. } => variable.clone(),
        other => other.unique_name(),
    }
}

/// Compact join-tree encoding. Decorating operators (filters, flattens,
/// projections) are looked through so the encoding captures the join
/// structure alone, e.g. `HJ(b){E(b)S(a)}{E(b)S(c)}`.
pub fn encode_join(plan: &LogicalPlan) -> String {
    plan.root()
        .map(|root| encode_operator(root))
        .unwrap_or_default()
}

fn encode_operator(op: &LogicalOperator) -> String {
    match op {
        LogicalOperator::ScanNodeTable { node_id, .. } => {
            format!("S({})", variable_of(node_id))
        }
        LogicalOperator::Extend {
            nbr_node_id, child, ..
        } => format!("E({}){}", variable_of(nbr_node_id), encode_operator(child)),
        LogicalOperator::RecursiveExtend {
            nbr_node_id, child, ..
        } => format!("RE({}){}", variable_of(nbr_node_id), encode_operator(child)),
        LogicalOperator::Filter { child, .. }
        | LogicalOperator::Flatten { child, .. }
        | LogicalOperator::Projection { child, .. } => encode_operator(child),
        LogicalOperator::HashJoin { join_node_ids, probe, build, .. } => {
            let keys = join_node_ids
                .iter()
                .map(variable_of)
                .collect::<Vec<_>>()
                .join(",");
            format!(
                "HJ({}){{{}}}{{{}}}",
                keys,
                encode_operator(probe),
                encode_operator(build)
            )
        }
        LogicalOperator::Intersect {
            intersect_node_id,
            probe,
            builds,
            ..
        } => {
            let mut encoded = format!(
                "I({}){{{}}}",
                variable_of(intersect_node_id),
                encode_operator(probe)
            );
            for build in builds {
                encoded.push('{');
                encoded.push_str(&encode_operator(build));
                encoded.push('}');
            }
            encoded
        }
        LogicalOperator::CrossProduct { left, right } => format!(
            "CP{{{}}}{{{}}}",
            encode_operator(left),
            encode_operator(right)
        ),
        LogicalOperator::ExpressionsScan { .. } => "ES".to_string(),
        LogicalOperator::Distinct { child, .. } => format!("D{}", encode_operator(child)),
        LogicalOperator::EmptyResult { child } => match child {
            Some(child) => format!("[]{}", encode_operator(child)),
            None => "[]".to_string(),
        },
    }
}

/// Indented operator tree with the plan's estimates, for EXPLAIN output.
pub fn explain(plan: &LogicalPlan) -> String {
    let mut out = format!(
        "cost={:.1} cardinality={:.1}\n",
        plan.cost(),
        plan.cardinality()
    );
    if let Some(root) = plan.root() {
        explain_operator(root, 0, &mut out);
    }
    out
}

fn explain_operator(op: &LogicalOperator, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let line = match op {
        LogicalOperator::ScanNodeTable { node_id, table_ids, .. } => {
            format!("ScanNodeTable {} tables={:?}", node_id, table_ids)
        }
        LogicalOperator::Extend {
            bound_node_id,
            nbr_node_id,
            rel_variable,
            ..
        } => format!("Extend {} -> {} via {}", bound_node_id, nbr_node_id, rel_variable),
        LogicalOperator::RecursiveExtend {
            bound_node_id,
            nbr_node_id,
            rel_variable,
            max_depth,
            ..
        } => format!(
            "RecursiveExtend {} -> {} via {} maxDepth={}",
            bound_node_id, nbr_node_id, rel_variable, max_depth
        ),
        LogicalOperator::Filter { predicate, .. } => format!("Filter {}", predicate),
        LogicalOperator::Flatten { group, .. } => format!("Flatten group={}", group),
        LogicalOperator::Projection { expressions, .. } => {
            format!("Projection [{}]", join_names(expressions))
        }
        LogicalOperator::HashJoin { join_node_ids, .. } => {
            format!("HashJoin [{}]", join_names(join_node_ids))
        }
        LogicalOperator::Intersect {
            intersect_node_id,
            bound_node_ids,
            ..
        } => format!(
            "Intersect {} bound=[{}]",
            intersect_node_id,
            join_names(bound_node_ids)
        ),
        LogicalOperator::CrossProduct { .. } => "CrossProduct".to_string(),
        LogicalOperator::ExpressionsScan { expressions } => {
            format!("ExpressionsScan [{}]", join_names(expressions))
        }
        LogicalOperator::Distinct { keys, .. } => format!("Distinct [{}]", join_names(keys)),
        LogicalOperator::EmptyResult { .. } => "EmptyResult".to_string(),
    };
    out.push_str(&indent);
    out.push_str(&line);
    out.push('\n');
    for child in op.children() {
        explain_operator(child, depth + 1, out);
    }
}

fn join_names(expressions: &[Expression]) -> String {
    expressions
        .iter()
        .map(Expression::unique_name)
        .collect::<Vec<_>>()
        .join(", ")
}
