use anyhow::{Context, Result};
use infra_model::Stack;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_plain::derive_fromstr_from_deserialize;
use std::path::Path;

/// The format that plans and key pairs are printed in.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Format {
    Json,
    Yaml,
}

derive_fromstr_from_deserialize!(Format);

/// Read a YAML configuration document from `path`.
pub(crate) async fn read_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .context(format!("Unable to read '{}'", path.display()))?;
    serde_yaml::from_str(&contents).context(format!(
        "Unable to deserialize the configuration in '{}'",
        path.display()
    ))
}

/// Print `value` to stdout in `format`.
pub(crate) fn print<T: Serialize>(value: &T, format: Format) -> Result<()> {
    let s = match format {
        Format::Json => {
            serde_json::to_string_pretty(value).context("Unable to serialize output as JSON")?
        }
        Format::Yaml => serde_yaml::to_string(value).context("Unable to serialize output as YAML")?,
    };
    println!("{}", s);
    Ok(())
}

/// Print the plan of everything described in `stack`.
pub(crate) fn print_plan(stack: &Stack, format: Format) -> Result<()> {
    let plan = stack.plan().context("Unable to plan the described resources")?;
    print(&plan, format)
}
