// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Bound expressions, traversals and property bookkeeping

pub mod expression;
pub mod properties;
pub mod visitor;

pub use expression::{Expression, LiteralValue, INTERNAL_ID_PROPERTY};
pub use properties::PropertyExprCollection;
pub use visitor::{collect_dependent_var_names, DependentVarNameCollector};
