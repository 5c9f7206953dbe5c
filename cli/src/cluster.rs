use crate::lookups::CliLookup;
use crate::output::{print_plan, read_config, Format};
use anyhow::{Context, Result};
use clap::{value_parser, Parser};
use infra_components::{build_cluster, ClusterArgs};
use infra_model::Stack;
use infra_types::ClusterConfig;
use std::path::PathBuf;

/// Describe a cluster from the `ClusterConfig` YAML file at `config`. The configuration must name
/// the VPC, subnets and bastion security group to use.
#[derive(Debug, Parser)]
pub(crate) struct Cluster {
    /// Path to the cluster configuration YAML file.
    #[clap(value_parser = value_parser!(PathBuf))]
    config: PathBuf,
}

impl Cluster {
    pub(crate) async fn run(self, stack_name: &str, lookup: &CliLookup, format: Format) -> Result<()> {
        let config: ClusterConfig = read_config(&self.config).await?;
        let name = config.name.clone();
        let args = ClusterArgs::from_config(config)
            .context(format!("Unable to wire cluster '{}'", name))?;
        let mut stack = Stack::new(stack_name);
        build_cluster(&mut stack, lookup.lookups(), args)
            .await
            .context(format!("Unable to describe cluster '{}'", name))?;
        print_plan(&stack, format)
    }
}
