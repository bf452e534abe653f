// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Graph statistics backing the cardinality estimates
//!
//! Per-table tuple counts collected by the storage layer. The planner only
//! reads these; collection and maintenance live with the catalog.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::graph::TableId;

/// Statistics about data distribution used during planning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphStatistics {
    /// Tuple count per node table.
    node_table_cardinalities: HashMap<TableId, u64>,
    /// Tuple count per relationship table.
    rel_table_cardinalities: HashMap<TableId, u64>,
}

impl GraphStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_node_table_cardinality(&mut self, table: TableId, cardinality: u64) {
        self.node_table_cardinalities.insert(table, cardinality);
    }

    pub fn set_rel_table_cardinality(&mut self, table: TableId, cardinality: u64) {
        self.rel_table_cardinalities.insert(table, cardinality);
    }

    /// Tuple count of one node table; unknown tables report a single
    /// tuple so downstream ratios stay finite.
    pub fn node_table_cardinality(&self, table: TableId) -> u64 {
        self.node_table_cardinalities.get(&table).copied().unwrap_or(1)
    }

    pub fn rel_table_cardinality(&self, table: TableId) -> u64 {
        self.rel_table_cardinalities.get(&table).copied().unwrap_or(1)
    }

    /// Total tuple count over all node tables.
    pub fn total_node_count(&self) -> u64 {
        self.node_table_cardinalities.values().sum()
    }
}
