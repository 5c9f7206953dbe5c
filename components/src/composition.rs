use crate::cluster::{build_cluster, Cluster, ClusterArgs};
use crate::error::Result;
use crate::instance::{build_instance, Instance, InstanceArgs};
use crate::keypair::Keypair;
use crate::network::{build_network, Network};
use crate::Lookups;
use infra_model::constants::STACK_COMPONENT;
use infra_model::{Describe, Output, ResourceDescription, Stack, Urn};
use infra_types::component_config::INSTANCE_ROLE_TAG;
use infra_types::{InstanceRole, StackConfig};
use log::info;
use std::collections::BTreeSet;

/// A described environment. Everything in it is nested under a single stack component.
#[derive(Clone, Debug)]
pub struct Environment {
    urn: Urn,
    pub network: Network,
    pub keypair: Option<Keypair>,
    pub bastion: Option<Instance>,
    pub cluster: Option<Cluster>,
}

impl Describe for Environment {
    fn urn(&self) -> &Urn {
        &self.urn
    }

    fn parent(&self) -> Option<&Urn> {
        None
    }

    fn dependencies(&self) -> BTreeSet<Urn> {
        BTreeSet::new()
    }
}

/// Describe a network, and optionally a key pair, a bastion in the public subnet and a cluster
/// whose workers live in the private subnets. If any part fails, nothing is added to `stack`.
pub async fn build_stack(
    stack: &mut Stack,
    lookups: Lookups<'_>,
    config: &StackConfig,
) -> Result<Environment> {
    info!("Describing environment '{}'", config.name);
    let mut staging = Stack::new(stack.name());
    let urn = staging
        .scope(
            ResourceDescription::new(STACK_COMPONENT, &config.name)
                .input("generateKeypair", config.generate_keypair),
        )?
        .commit()?;
    staging.set_default_parent(Some(urn.clone()));

    let network = build_network(&mut staging, lookups, &config.network).await?;

    let keypair = if config.generate_keypair {
        Some(Keypair::generate()?)
    } else {
        None
    };
    let generated_key_name: Option<Output<String>> = match &keypair {
        Some(keypair) => {
            let key = staging
                .register(keypair.describe(format!("{}-keypair", config.name)).parent(&urn))?;
            Some(key.output("keyName"))
        }
        None => None,
    };

    let bastion = match &config.bastion {
        Some(bastion) => {
            let mut bastion = bastion.clone();
            bastion
                .tags
                .entry(INSTANCE_ROLE_TAG.to_string())
                .or_insert_with(|| InstanceRole::Bastion.to_string());
            let mut security_group_ids = vec![network.security_groups.public.clone()];
            security_group_ids.extend(bastion.security_groups.iter().cloned().map(Output::known));
            let args = InstanceArgs {
                subnet_id: network.public_subnet_id()?,
                security_group_ids,
                key_name: generated_key_name
                    .clone()
                    .or_else(|| bastion.key.clone().map(Output::known)),
                private_key: keypair
                    .as_ref()
                    .map(|keypair| quoted(&keypair.private))
                    .or_else(|| bastion.private_key.clone()),
                config: bastion,
            };
            Some(build_instance(&mut staging, lookups, args).await?)
        }
        None => None,
    };

    let cluster = match &config.cluster {
        Some(cluster) => {
            let args = ClusterArgs {
                vpc_id: network.vpc_id.clone(),
                subnet_ids: network.subnet_ids(),
                worker_subnet_ids: network.private_subnets(),
                bastion_security_group_id: network.security_groups.public.clone(),
                key_name: generated_key_name
                    .clone()
                    .or_else(|| cluster.key_name.clone().map(Output::known)),
                config: cluster.clone(),
            };
            Some(build_cluster(&mut staging, lookups, args).await?)
        }
        None => None,
    };

    stack.merge(staging)?;
    Ok(Environment {
        urn,
        network,
        keypair,
        bastion,
        cluster,
    })
}

/// The PEM spans several lines, so it is double quoted to reach `echo` as a single argument.
fn quoted(pem: &str) -> String {
    format!("\"{}\"", pem.trim_end())
}
