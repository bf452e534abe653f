// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Client context and planner configuration
//!
//! Settings are threaded through the client context rather than read from
//! process-wide state. The planner derives one immutable `PlannerConfig`
//! from the context at entry and passes it by borrow.

use serde::{Deserialize, Serialize};

/// Handle of the transaction a planning call runs under. The estimator
/// keys its statistic caches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    id: u64,
}

impl Transaction {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Match semantics of recursive (variable-length) relationship patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecursivePatternSemantic {
    Walk,
    Trail,
    Acyclic,
}

/// Per-session state the planner reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientContext {
    transaction: Transaction,
    /// Execution parallelism budget; the planner reads it only as a
    /// cost-model input.
    pub num_threads: u64,
    /// Planning deadline in milliseconds; 0 disables the deadline.
    pub timeout_ms: u64,
    /// Bound on recursive extends.
    pub var_length_max_depth: u32,
    /// Whether semi-join filters may be appended during physical mapping.
    pub enable_semi_mask: bool,
    pub recursive_pattern_semantic: RecursivePatternSemantic,
    /// Cardinality scale multiplier for recursive plans.
    pub recursive_pattern_factor: u64,
    /// Wired but not usable; toggling it on is rejected.
    pub enable_zone_map: bool,
}

impl ClientContext {
    pub fn new(transaction: Transaction) -> Self {
        Self {
            transaction,
            num_threads: 1,
            timeout_ms: 0,
            var_length_max_depth: 30,
            enable_semi_mask: true,
            recursive_pattern_semantic: RecursivePatternSemantic::Walk,
            recursive_pattern_factor: 1,
            enable_zone_map: false,
        }
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }
}

/// Immutable snapshot of the planner-relevant configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub num_threads: u64,
    pub timeout_ms: u64,
    pub var_length_max_depth: u32,
    pub enable_semi_mask: bool,
    pub recursive_pattern_semantic: RecursivePatternSemantic,
    pub recursive_pattern_factor: u64,
}

impl PlannerConfig {
    pub fn from_context(context: &ClientContext) -> Self {
        Self {
            num_threads: context.num_threads,
            timeout_ms: context.timeout_ms,
            var_length_max_depth: context.var_length_max_depth,
            enable_semi_mask: context.enable_semi_mask,
            recursive_pattern_semantic: context.recursive_pattern_semantic,
            recursive_pattern_factor: context.recursive_pattern_factor,
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self::from_context(&ClientContext::new(Transaction::new(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_snapshots_context() {
        let mut context = ClientContext::new(Transaction::new(7));
        context.timeout_ms = 250;
        context.recursive_pattern_factor = 8;
        let config = PlannerConfig::from_context(&context);
        assert_eq!(config.timeout_ms, 250);
        assert_eq!(config.recursive_pattern_factor, 8);
    }
}
