// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Property requirements per pattern variable
//!
//! The binder records which properties of each variable later pipeline
//! stages read. Scans and extends consult this collection to decide which
//! columns they must materialize.

use std::collections::HashMap;

use crate::expr::expression::Expression;

/// Maps a variable name to the property expressions read downstream.
#[derive(Debug, Clone, Default)]
pub struct PropertyExprCollection {
    properties: HashMap<String, Vec<Expression>>,
}

impl PropertyExprCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `property` of `variable` is read downstream. Duplicate
    /// registrations are collapsed by unique name.
    pub fn add_property(&mut self, variable: impl Into<String>, property: Expression) {
        let entry = self.properties.entry(variable.into()).or_default();
        if !entry
            .iter()
            .any(|e| e.unique_name() == property.unique_name())
        {
            entry.push(property);
        }
    }

    /// Properties a scan or extend of `variable` must materialize.
    pub fn properties_of(&self, variable: &str) -> Vec<Expression> {
        self.properties.get(variable).cloned().unwrap_or_default()
    }
}
