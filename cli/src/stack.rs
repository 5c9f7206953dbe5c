use crate::lookups::CliLookup;
use crate::output::{print_plan, read_config, Format};
use anyhow::{Context, Result};
use clap::{value_parser, Parser};
use infra_components::build_stack;
use infra_types::StackConfig;
use log::info;
use std::path::PathBuf;

/// Describe a complete environment from the `StackConfig` YAML file at `config`. Unless a name is
/// given, the stack is named after the configuration.
#[derive(Debug, Parser)]
pub(crate) struct Stack {
    /// Path to the stack configuration YAML file.
    #[clap(value_parser = value_parser!(PathBuf))]
    config: PathBuf,
}

impl Stack {
    pub(crate) async fn run(
        self,
        stack_name: Option<String>,
        lookup: &CliLookup,
        format: Format,
    ) -> Result<()> {
        let config: StackConfig = read_config(&self.config).await?;
        let mut stack =
            infra_model::Stack::new(stack_name.unwrap_or_else(|| config.name.clone()));
        let environment = build_stack(&mut stack, lookup.lookups(), &config)
            .await
            .context(format!("Unable to describe stack '{}'", config.name))?;
        if environment.keypair.is_some() {
            info!(
                "A key pair was generated for '{}', its private key is only written to the bastion's user data",
                config.name
            );
        }
        print_plan(&stack, format)
    }
}
