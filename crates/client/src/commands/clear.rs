//! Remove a stored choice.

use anyhow::{Context, Result};
use clap::Parser;

use rules_core::OperationId;
use runtime::Runtime;

use super::{pending_views, print_json};

/// Clear a stored selection and print the selections now pending
#[derive(Parser)]
pub struct Clear {
    #[arg(value_name = "CHARACTER")]
    character: String,

    #[arg(value_name = "OPERATION")]
    operation: OperationId,
}

impl Clear {
    pub async fn execute(self, runtime: &Runtime) -> Result<()> {
        let resolution = runtime
            .clear_selection(&self.character, self.operation)
            .await
            .with_context(|| format!("Failed to clear {} on {}", self.operation, self.character))?;

        print_json(&pending_views(&resolution))
    }
}
