//! Consistency check for stored characters.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use rules_core::{Issue, IssueKind};
use runtime::Runtime;

use super::print_json;

/// Report stale, orphaned, cyclic or mistyped content; fails when any is found
#[derive(Parser)]
pub struct Check {
    /// Character ids; all stored characters when omitted
    #[arg(value_name = "CHARACTER")]
    characters: Vec<String>,
}

#[derive(Serialize)]
struct CheckResult<'a> {
    character: &'a str,
    needs_attention: bool,
    counts: BTreeMap<IssueKind, usize>,
    issues: Vec<&'a Issue>,
}

impl Check {
    /// Returns whether every checked character is clean.
    pub async fn execute(self, runtime: &Runtime) -> Result<bool> {
        let ids = if self.characters.is_empty() {
            runtime
                .repository()
                .list()
                .context("Failed to list stored characters")?
        } else {
            self.characters
        };

        let results = runtime.resolve_many(&ids).await;
        let mut clean = true;
        let mut output = Vec::with_capacity(results.len());
        for (id, result) in &results {
            let resolution = result
                .as_ref()
                .map_err(|err| anyhow::anyhow!("Failed to resolve {}: {}", id, err))?;
            let report = resolution.report();
            let needs_attention = report.needs_attention();
            if needs_attention {
                tracing::warn!(character = %id, "character needs attention");
                clean = false;
            }
            output.push(CheckResult {
                character: id,
                needs_attention,
                counts: report.counts(),
                issues: report
                    .issues()
                    .iter()
                    .filter(|issue| issue.kind().needs_attention())
                    .collect(),
            });
        }

        print_json(&output)?;
        Ok(clean)
    }
}
