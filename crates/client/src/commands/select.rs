//! Record a player's choice for a `select` operation.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use rules_core::{OperationId, ResolutionReport};
use runtime::Runtime;

use super::{PendingView, pending_views, print_json};

/// Record a selection and print the re-resolved report
#[derive(Parser)]
pub struct Select {
    #[arg(value_name = "CHARACTER")]
    character: String,

    /// Id of the select operation
    #[arg(value_name = "OPERATION")]
    operation: OperationId,

    /// Id of the chosen option
    #[arg(value_name = "OPTION")]
    option: OperationId,
}

#[derive(Serialize)]
struct SelectionOutcome<'a> {
    character: &'a str,
    operation: OperationId,
    option: OperationId,
    pending_selections: Vec<PendingView<'a>>,
    report: &'a ResolutionReport,
}

impl Select {
    pub async fn execute(self, runtime: &Runtime) -> Result<()> {
        let resolution = runtime
            .record_selection(&self.character, self.operation, self.option)
            .await
            .with_context(|| {
                format!(
                    "Failed to record option {} for {} on {}",
                    self.option, self.operation, self.character
                )
            })?;

        print_json(&SelectionOutcome {
            character: &self.character,
            operation: self.operation,
            option: self.option,
            pending_selections: pending_views(&resolution),
            report: resolution.report(),
        })
    }
}
