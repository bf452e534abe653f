// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Bound pattern model: query graphs and matched-subgraph bitmasks

pub mod query_graph;
pub mod subquery_graph;

pub use query_graph::{
    extend_direction, ExtendDirection, QueryGraph, QueryGraphCollection, QueryNode, QueryRel,
    QueryRelType, RelDirection, TableId,
};
pub use subquery_graph::{SubqueryGraph, MAX_PATTERN_VARIABLES};
