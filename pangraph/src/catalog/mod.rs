// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog-facing interfaces the planner consumes

pub mod cardinality;
pub mod stats;

pub use cardinality::{CardinalityEstimator, StatsEstimator};
pub use stats::GraphStatistics;
