//! List selections a character still has to make.

use anyhow::{Context, Result};
use clap::Parser;

use runtime::Runtime;

use super::{pending_views, print_json};

/// List pending selections with their options
#[derive(Parser)]
pub struct Pending {
    #[arg(value_name = "CHARACTER")]
    character: String,
}

impl Pending {
    pub async fn execute(self, runtime: &Runtime) -> Result<()> {
        let resolution = runtime
            .resolve(&self.character)
            .await
            .with_context(|| format!("Failed to resolve {}", self.character))?;

        print_json(&pending_views(&resolution))
    }
}
