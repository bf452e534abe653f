// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types reported by the planner

use thiserror::Error;

/// Errors produced while planning a query graph collection
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    /// Planning exceeded the client-supplied deadline before any complete
    /// plan was found.
    #[error("Query planning timed out")]
    Timeout,

    /// A join-order hint references an unknown variable or a topology that
    /// cannot be joined.
    #[error("Infeasible join order hint: {0}")]
    HintInfeasible(String),

    /// A recognized setting or construct that is wired but not yet usable.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// An unrecognized setting or an unsupported query shape.
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// The enumerator reached a state that is unreachable under the DP.
    /// Always indicates a bug; the message carries the offending subgraph.
    #[error("Internal planner error: {0}")]
    Internal(String),
}

/// Convenience alias used across the planner modules.
pub type PlannerResult<T> = Result<T, PlannerError>;
