// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query planning: logical plans, cost model, join-order enumeration
//!
//! The enumerator turns a bound query graph collection into one logical
//! plan. Logical operators, the factorized schema, the sub-plans table
//! and the cost model live in their own modules; `enumerator` drives
//! them level by level.

pub mod append;
pub mod cost;
pub mod enumerator;
pub mod hint;
pub mod logical;
pub mod printer;
pub mod schema;
pub mod subplans;

pub use cost::CostModel;
pub use enumerator::{Planner, QueryGraphPlanningInfo, SubqueryType, MAX_LEVEL_TO_PLAN_EXACTLY};
pub use hint::JoinTreeHint;
pub use logical::{JoinType, LogicalOperator, LogicalOperatorType, LogicalPlan};
pub use printer::{encode_join, explain};
pub use schema::Schema;
pub use subplans::SubPlansTable;
