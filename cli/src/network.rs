use crate::lookups::CliLookup;
use crate::output::{print_plan, read_config, Format};
use anyhow::{Context, Result};
use clap::{value_parser, Parser};
use infra_components::build_network;
use infra_model::Stack;
use infra_types::NetworkConfig;
use std::path::PathBuf;

/// Describe a network from the `NetworkConfig` YAML file at `config`.
#[derive(Debug, Parser)]
pub(crate) struct Network {
    /// Path to the network configuration YAML file.
    #[clap(value_parser = value_parser!(PathBuf))]
    config: PathBuf,
}

impl Network {
    pub(crate) async fn run(self, stack_name: &str, lookup: &CliLookup, format: Format) -> Result<()> {
        let config: NetworkConfig = read_config(&self.config).await?;
        let mut stack = Stack::new(stack_name);
        build_network(&mut stack, lookup.lookups(), &config)
            .await
            .context(format!("Unable to describe network '{}'", config.name))?;
        print_plan(&stack, format)
    }
}
