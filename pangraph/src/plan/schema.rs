// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Factorized plan schema
//!
//! The schema partitions the expressions in scope of an operator into
//! groups. A group is either flat (one value per tuple) or unflat (a list
//! per tuple, the shape an Extend produces on its neighbor side). Every
//! expression resolves to a (group, position-within-group) pair.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::expr::Expression;

/// One factorization group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorizationGroup {
    expressions: Vec<Expression>,
    flat: bool,
}

impl FactorizationGroup {
    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }

    pub fn is_flat(&self) -> bool {
        self.flat
    }
}

/// Partition of the in-scope expressions of a plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    groups: Vec<FactorizationGroup>,
    positions: HashMap<String, (usize, usize)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn group(&self, idx: usize) -> &FactorizationGroup {
        &self.groups[idx]
    }

    pub fn create_group(&mut self, flat: bool) -> usize {
        self.groups.push(FactorizationGroup {
            expressions: Vec::new(),
            flat,
        });
        self.groups.len() - 1
    }

    /// Insert an expression into a group. Expressions already in scope are
    /// left where they are.
    pub fn insert_to_group(&mut self, expr: Expression, group: usize) {
        let name = expr.unique_name();
        if self.positions.contains_key(&name) {
            return;
        }
        let pos = self.groups[group].expressions.len();
        self.groups[group].expressions.push(expr);
        self.positions.insert(name, (group, pos));
    }

    /// Resolve an expression to its (group, position) pair.
    pub fn expression_position(&self, name: &str) -> Option<(usize, usize)> {
        self.positions.get(name).copied()
    }

    pub fn group_of(&self, name: &str) -> Option<usize> {
        self.positions.get(name).map(|(group, _)| *group)
    }

    pub fn is_expression_in_scope(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Coerce a group to flat.
    pub fn flatten_group(&mut self, group: usize) {
        self.groups[group].flat = true;
    }

    /// Groups that contain at least one of the named expressions.
    pub fn groups_containing(&self, names: &[String]) -> Vec<usize> {
        let mut groups: Vec<usize> = names
            .iter()
            .filter_map(|name| self.group_of(name))
            .collect();
        groups.sort_unstable();
        groups.dedup();
        groups
    }

    /// All expressions currently in scope, in group order.
    pub fn expressions_in_scope(&self) -> Vec<Expression> {
        self.groups
            .iter()
            .flat_map(|group| group.expressions.iter().cloned())
            .collect()
    }

    /// Widen this schema with another one, as a binary join does. Groups
    /// come over with their flatness; expressions already in scope (the
    /// join keys) are not duplicated.
    pub fn merge(&mut self, other: &Schema) {
        for group in &other.groups {
            let incoming: Vec<Expression> = group
                .expressions
                .iter()
                .filter(|e| !self.is_expression_in_scope(&e.unique_name()))
                .cloned()
                .collect();
            if incoming.is_empty() {
                continue;
            }
            let idx = self.create_group(group.flat);
            for expr in incoming {
                self.insert_to_group(expr, idx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_track_insertions() {
        let mut schema = Schema::new();
        let g0 = schema.create_group(true);
        schema.insert_to_group(Expression::internal_id("a"), g0);
        schema.insert_to_group(Expression::property("a", "age"), g0);
        assert_eq!(schema.expression_position("a._id"), Some((0, 0)));
        assert_eq!(schema.expression_position("a.age"), Some((0, 1)));
        assert!(schema.is_expression_in_scope("a._id"));
        assert!(!schema.is_expression_in_scope("b._id"));
    }

    #[test]
    fn test_duplicate_insert_is_ignored() {
        let mut schema = Schema::new();
        let g0 = schema.create_group(true);
        let g1 = schema.create_group(false);
        schema.insert_to_group(Expression::internal_id("a"), g0);
        schema.insert_to_group(Expression::internal_id("a"), g1);
        assert_eq!(schema.expression_position("a._id"), Some((0, 0)));
        assert!(schema.group(1).expressions().is_empty());
    }

    #[test]
    fn test_merge_skips_join_keys() {
        let mut probe = Schema::new();
        let g = probe.create_group(true);
        probe.insert_to_group(Expression::internal_id("a"), g);
        probe.insert_to_group(Expression::internal_id("b"), g);

        let mut build = Schema::new();
        let g = build.create_group(true);
        build.insert_to_group(Expression::internal_id("b"), g);
        build.insert_to_group(Expression::internal_id("c"), g);

        probe.merge(&build);
        assert_eq!(probe.num_groups(), 2);
        assert!(probe.is_expression_in_scope("c._id"));
        assert_eq!(probe.group(1).expressions().len(), 1);
    }

    #[test]
    fn test_flatten_group() {
        let mut schema = Schema::new();
        let g = schema.create_group(false);
        assert!(!schema.group(g).is_flat());
        schema.flatten_group(g);
        assert!(schema.group(g).is_flat());
    }
}
