//! Command implementations for the `sheet` binary.
//!
//! Each command owns its CLI args and runs against a built [`Runtime`].
//! Output is JSON on stdout; logs go to stderr.
//!
//! [`Runtime`]: runtime::Runtime

mod check;
mod clear;
mod pending;
mod resolve;
mod select;

use std::collections::BTreeMap;

use anyhow::Result;
use serde::Serialize;

use rules_core::{
    AdvisoryModifier, ContentRef, Operation, OperationId, Resolution, ResolutionReport,
    VariableValue,
};

pub use check::Check;
pub use clear::Clear;
pub use pending::Pending;
pub use resolve::Resolve;
pub use select::Select;

/// A pending `select` with the options a player can pick from.
#[derive(Debug, Serialize)]
pub struct PendingView<'a> {
    pub operation: OperationId,
    pub title: &'a str,
    pub source: Option<&'a ContentRef>,
    pub options: Vec<OptionView<'a>>,
}

#[derive(Debug, Serialize)]
pub struct OptionView<'a> {
    pub id: OperationId,
    pub label: &'a str,
}

impl<'a> PendingView<'a> {
    fn from_operation(operation: &'a Operation) -> Option<Self> {
        let select = operation.as_select()?;
        Some(Self {
            operation: operation.id,
            title: &select.title,
            source: operation.source.as_ref(),
            options: select
                .options
                .iter()
                .map(|option| OptionView {
                    id: option.id,
                    label: &option.label,
                })
                .collect(),
        })
    }
}

pub fn pending_views(resolution: &Resolution) -> Vec<PendingView<'_>> {
    resolution
        .pending_selections()
        .filter_map(PendingView::from_operation)
        .collect()
}

/// Resolved `CHARACTER` scope plus everything a sheet renderer needs.
#[derive(Debug, Serialize)]
pub struct SheetView<'a> {
    pub character: &'a str,
    pub variables: BTreeMap<&'a str, &'a VariableValue>,
    pub advisories: Vec<AdvisoryModifier>,
    pub pending_selections: Vec<PendingView<'a>>,
    pub report: &'a ResolutionReport,
}

impl<'a> SheetView<'a> {
    pub fn new(character: &'a str, resolution: &'a Resolution) -> Self {
        Self {
            character,
            variables: resolution
                .character_scope()
                .iter()
                .map(|variable| (variable.name(), variable.value()))
                .collect(),
            advisories: resolution.advisories(),
            pending_selections: pending_views(resolution),
            report: resolution.report(),
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
