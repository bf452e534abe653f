// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Pangraph - join-order planning core for a property-graph query engine
//!
//! Pangraph compiles a bound graph pattern (query nodes and relationships
//! connected by variable bindings, plus a Boolean predicate expression)
//! into a single executable logical plan.
//!
//! # Features
//!
//! - **DPsize enumeration**: level-by-level dynamic programming over
//!   matched subgraphs, with cost-ceiling pruning per subgraph
//! - **Structural joins**: hash joins, index-nested-loop extends along
//!   sequential scans, and worst-case-optimal multiway intersects
//! - **Correlated subqueries**: three correlation modes, from ID-only
//!   rescans to outer-value expression scans
//! - **Join-order hints**: a user-specified join tree bypasses
//!   enumeration and lowers directly
//! - **Cost model**: pure, deterministic estimates driven by an opaque
//!   cardinality oracle
//!
//! # Usage
//!
//! The binder hands [`Planner::plan_query_graph_collection`] a
//! [`QueryGraphCollection`] and a [`QueryGraphPlanningInfo`]; the returned
//! [`LogicalPlan`] goes to the physical-operator mapper, which may
//! annotate it but not reshape its join tree.

pub mod catalog;
pub mod error;
pub mod expr;
pub mod graph;
pub mod plan;
pub mod session;

pub use catalog::{CardinalityEstimator, GraphStatistics, StatsEstimator};
pub use error::{PlannerError, PlannerResult};
pub use expr::{Expression, LiteralValue, PropertyExprCollection};
pub use graph::{
    QueryGraph, QueryGraphCollection, QueryNode, QueryRel, QueryRelType, RelDirection,
    SubqueryGraph,
};
pub use plan::{
    JoinTreeHint, LogicalOperator, LogicalOperatorType, LogicalPlan, Planner,
    QueryGraphPlanningInfo, SubqueryType,
};
pub use session::{ClientContext, PlannerConfig, Transaction};

/// Pangraph version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Pangraph crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
