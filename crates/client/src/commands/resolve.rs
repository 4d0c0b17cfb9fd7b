//! Resolve a stored character and print its sheet.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::Parser;

use rules_core::{CHARACTER_SCOPE, Resolution, Variable};
use runtime::Runtime;

use super::{SheetView, print_json};

/// Resolve a character and print the CHARACTER scope and report
#[derive(Parser)]
pub struct Resolve {
    /// Character id (file stem in the character directory)
    #[arg(value_name = "CHARACTER")]
    character: String,

    /// Print only these variables, with their bonus entries
    #[arg(long = "variable", value_name = "NAME")]
    variables: Vec<String>,
}

impl Resolve {
    pub async fn execute(self, runtime: &Runtime) -> Result<()> {
        let resolution = runtime
            .resolve(&self.character)
            .await
            .with_context(|| format!("Failed to resolve {}", self.character))?;

        if self.variables.is_empty() {
            return print_json(&SheetView::new(&self.character, &resolution));
        }
        print_json(&pick_variables(&resolution, &self.variables)?)
    }
}

/// Looks up each named `CHARACTER` variable; an undefined name is an error.
fn pick_variables<'a>(
    resolution: &'a Resolution,
    names: &'a [String],
) -> Result<BTreeMap<&'a str, &'a Variable>> {
    let store = resolution.store();
    names
        .iter()
        .map(|name| -> Result<(&'a str, &'a Variable)> {
            let variable = store.require(CHARACTER_SCOPE, name)?;
            Ok((name.as_str(), variable))
        })
        .collect()
}
