// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Session state: client context, transaction handle, settings

pub mod context;
pub mod settings;

pub use context::{ClientContext, PlannerConfig, RecursivePatternSemantic, Transaction};
pub use settings::{apply_setting, SettingValue};
