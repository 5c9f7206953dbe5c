use crate::lookups::CliLookup;
use crate::output::{print_plan, read_config, Format};
use anyhow::{Context, Result};
use clap::{value_parser, Parser};
use infra_components::{build_instance, InstanceArgs};
use infra_model::Stack;
use infra_types::InstanceConfig;
use std::path::PathBuf;

/// Describe an instance from the `InstanceConfig` YAML file at `config`.
#[derive(Debug, Parser)]
pub(crate) struct Instance {
    /// Path to the instance configuration YAML file.
    #[clap(value_parser = value_parser!(PathBuf))]
    config: PathBuf,
}

impl Instance {
    pub(crate) async fn run(self, stack_name: &str, lookup: &CliLookup, format: Format) -> Result<()> {
        let config: InstanceConfig = read_config(&self.config).await?;
        let name = config.name.clone();
        let args = InstanceArgs::from_config(config)
            .context(format!("Unable to wire instance '{}'", name))?;
        let mut stack = Stack::new(stack_name);
        build_instance(&mut stack, lookup.lookups(), args)
            .await
            .context(format!("Unable to describe instance '{}'", name))?;
        print_plan(&stack, format)
    }
}
