// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Session settings recognized by the planner
//!
//! Each setting names a field of the client context. Values arrive as the
//! loosely-typed session values the shell produces and are validated here.

use crate::error::{PlannerError, PlannerResult};
use crate::session::context::{ClientContext, RecursivePatternSemantic};

/// Loosely-typed value of a `SET` statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Int(i64),
    Bool(bool),
    String(String),
}

impl SettingValue {
    fn as_int(&self, name: &str) -> PlannerResult<i64> {
        match self {
            SettingValue::Int(v) => Ok(*v),
            _ => Err(PlannerError::UnsupportedFeature(format!(
                "Setting {} expects an integer",
                name
            ))),
        }
    }

    fn as_bool(&self, name: &str) -> PlannerResult<bool> {
        match self {
            SettingValue::Bool(v) => Ok(*v),
            _ => Err(PlannerError::UnsupportedFeature(format!(
                "Setting {} expects a boolean",
                name
            ))),
        }
    }

    fn as_str(&self, name: &str) -> PlannerResult<&str> {
        match self {
            SettingValue::String(v) => Ok(v),
            _ => Err(PlannerError::UnsupportedFeature(format!(
                "Setting {} expects a string",
                name
            ))),
        }
    }
}

/// Apply one recognized setting to the context.
pub fn apply_setting(
    context: &mut ClientContext,
    name: &str,
    value: SettingValue,
) -> PlannerResult<()> {
    match name {
        "threads" => {
            context.num_threads = value.as_int(name)?.max(1) as u64;
        }
        "timeout" => {
            context.timeout_ms = value.as_int(name)?.max(0) as u64;
        }
        "var_length_extend_max_depth" => {
            context.var_length_max_depth = value.as_int(name)?.max(1) as u32;
        }
        "enable_semi_mask" => {
            context.enable_semi_mask = value.as_bool(name)?;
        }
        "recursive_pattern_semantic" => {
            context.recursive_pattern_semantic = match value.as_str(name)? {
                "WALK" | "walk" => RecursivePatternSemantic::Walk,
                "TRAIL" | "trail" => RecursivePatternSemantic::Trail,
                "ACYCLIC" | "acyclic" => RecursivePatternSemantic::Acyclic,
                other => {
                    return Err(PlannerError::UnsupportedFeature(format!(
                        "Unknown recursive pattern semantic: {}",
                        other
                    )))
                }
            };
        }
        "recursive_pattern_factor" => {
            context.recursive_pattern_factor = value.as_int(name)?.max(1) as u64;
        }
        "enable_zone_map" => {
            value.as_bool(name)?;
            // TODO: remove once zone maps can be consumed by scans.
            return Err(PlannerError::NotImplemented(
                "Zone map is not yet ready to be turned on".to_string(),
            ));
        }
        other => {
            return Err(PlannerError::UnsupportedFeature(format!(
                "Unknown setting: {}",
                other
            )))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::context::Transaction;

    #[test]
    fn test_apply_known_settings() {
        let mut context = ClientContext::new(Transaction::new(0));
        apply_setting(&mut context, "threads", SettingValue::Int(8)).unwrap();
        apply_setting(&mut context, "timeout", SettingValue::Int(1000)).unwrap();
        apply_setting(
            &mut context,
            "recursive_pattern_semantic",
            SettingValue::String("TRAIL".into()),
        )
        .unwrap();
        assert_eq!(context.num_threads, 8);
        assert_eq!(context.timeout_ms, 1000);
        assert_eq!(
            context.recursive_pattern_semantic,
            RecursivePatternSemantic::Trail
        );
    }

    #[test]
    fn test_zone_map_is_not_implemented() {
        let mut context = ClientContext::new(Transaction::new(0));
        let err = apply_setting(&mut context, "enable_zone_map", SettingValue::Bool(true));
        assert!(matches!(err, Err(PlannerError::NotImplemented(_))));
        assert!(!context.enable_zone_map);
    }

    #[test]
    fn test_unknown_setting_is_rejected() {
        let mut context = ClientContext::new(Transaction::new(0));
        let err = apply_setting(&mut context, "no_such_setting", SettingValue::Int(1));
        assert!(matches!(err, Err(PlannerError::UnsupportedFeature(_))));
    }

    #[test]
    fn test_type_mismatch_is_rejected() {
        let mut context = ClientContext::new(Transaction::new(0));
        let err = apply_setting(&mut context, "threads", SettingValue::Bool(true));
        assert!(matches!(err, Err(PlannerError::UnsupportedFeature(_))));
    }
}
