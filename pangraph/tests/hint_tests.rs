// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Join-order hint tests

mod testutils;

use pangraph::graph::QueryGraphCollection;
use pangraph::plan::{encode_join, JoinTreeHint, LogicalOperatorType, QueryGraphPlanningInfo};
use pangraph::PlannerError;
use testutils::{chain, node, node_in, rel, triangle, PlannerFixture, CITY};

// Property 7: a hint that reproduces the naturally selected tree yields
// the same plan.
#[test]
fn test_hint_reproducing_natural_tree_is_idempotent() {
    let fixture = PlannerFixture::new();
    let collection = QueryGraphCollection::from_pattern(
        vec![node("a"), node_in("b", CITY)],
        vec![rel("e", "a", "b")],
    );
    let natural = {
        let mut planner = fixture.planner();
        planner
            .plan_query_graph_collection(&collection, &QueryGraphPlanningInfo::default())
            .unwrap()
    };
    let hinted = {
        let mut planner = fixture.planner();
        let info = QueryGraphPlanningInfo {
            hint: Some(JoinTreeHint::variable("e")),
            ..Default::default()
        };
        planner.plan_query_graph_collection(&collection, &info).unwrap()
    };
    assert_eq!(encode_join(&hinted), encode_join(&natural));
    assert_eq!(hinted.cost(), natural.cost());
}

// The hint fixes the join tree shape even where enumeration would have
// preferred an extend.
#[test]
fn test_hint_forces_hash_join_shape() {
    let fixture = PlannerFixture::new();
    let mut planner = fixture.planner();
    let collection = chain(3);
    let info = QueryGraphPlanningInfo {
        hint: Some(JoinTreeHint::join(
            JoinTreeHint::variable("r0"),
            JoinTreeHint::variable("r1"),
        )),
        ..Default::default()
    };
    let best = planner.plan_query_graph_collection(&collection, &info).unwrap();
    assert_eq!(best.count_operators(LogicalOperatorType::HashJoin), 1);
    assert_eq!(best.count_operators(LogicalOperatorType::Extend), 2);
}

#[test]
fn test_hint_unknown_variable_is_infeasible() {
    let fixture = PlannerFixture::new();
    let mut planner = fixture.planner();
    let info = QueryGraphPlanningInfo {
        hint: Some(JoinTreeHint::variable("nope")),
        ..Default::default()
    };
    let err = planner.plan_query_graph_collection(&chain(3), &info);
    assert!(matches!(err, Err(PlannerError::HintInfeasible(_))));
}

#[test]
fn test_hint_must_cover_whole_pattern() {
    let fixture = PlannerFixture::new();
    let mut planner = fixture.planner();
    let info = QueryGraphPlanningInfo {
        hint: Some(JoinTreeHint::variable("e1")),
        ..Default::default()
    };
    let err = planner.plan_query_graph_collection(&triangle(), &info);
    assert!(matches!(err, Err(PlannerError::HintInfeasible(_))));
}

#[test]
fn test_hint_joining_unconnected_parts_is_infeasible() {
    let fixture = PlannerFixture::new();
    let mut planner = fixture.planner();
    // r0 covers (n0, n1); r2 covers (n2, n3); they share no node.
    let info = QueryGraphPlanningInfo {
        hint: Some(JoinTreeHint::join(
            JoinTreeHint::variable("r0"),
            JoinTreeHint::variable("r2"),
        )),
        ..Default::default()
    };
    let err = planner.plan_query_graph_collection(&chain(4), &info);
    assert!(matches!(err, Err(PlannerError::HintInfeasible(_))));
}

#[test]
fn test_hint_repeating_a_relationship_is_infeasible() {
    let fixture = PlannerFixture::new();
    let mut planner = fixture.planner();
    let collection = QueryGraphCollection::from_pattern(
        vec![node("a"), node("b")],
        vec![rel("e", "a", "b")],
    );
    let info = QueryGraphPlanningInfo {
        hint: Some(JoinTreeHint::join(
            JoinTreeHint::variable("e"),
            JoinTreeHint::variable("e"),
        )),
        ..Default::default()
    };
    let err = planner.plan_query_graph_collection(&collection, &info);
    assert!(matches!(err, Err(PlannerError::HintInfeasible(_))));
}
