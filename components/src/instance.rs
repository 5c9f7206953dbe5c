use crate::cluster::required;
use crate::constants::{INSTANCE, INSTANCE_IMAGE_PATTERN};
use crate::error::{self, Result};
use crate::userdata::bastion_key_writer;
use crate::Lookups;
use infra_model::constants::INSTANCE_COMPONENT;
use infra_model::{Describe, Input, Output, ResourceDescription, Stack, Urn};
use infra_types::component_config::INSTANCE_ROLE_TAG;
use infra_types::{InstanceConfig, InstanceRole};
use infra_utils::constants::AMAZON_OWNER;
use infra_utils::ImageQuery;
use log::{info, warn};
use snafu::{OptionExt, ResultExt};
use std::collections::BTreeSet;

/// The parameters of an instance along with the network values it is wired to.
#[derive(Clone, Debug)]
pub struct InstanceArgs {
    pub config: InstanceConfig,
    pub subnet_id: Output<String>,
    pub security_group_ids: Vec<Output<String>>,
    pub key_name: Option<Output<String>>,
    /// Private key material for a bastion to write on boot.
    pub private_key: Option<String>,
}

impl InstanceArgs {
    /// Wire an instance from fixed values in its configuration.
    pub fn from_config(config: InstanceConfig) -> Result<Self> {
        let subnet_id = required(&config.name, "subnetId", config.subnet_id.clone())?;
        Ok(Self {
            subnet_id: Output::known(subnet_id),
            security_group_ids: config
                .security_groups
                .iter()
                .cloned()
                .map(Output::known)
                .collect(),
            key_name: config.key.clone().map(Output::known),
            private_key: config.private_key.clone(),
            config,
        })
    }
}

/// The image query for general purpose instances.
pub fn instance_image_query() -> ImageQuery {
    ImageQuery::new(AMAZON_OWNER, INSTANCE_IMAGE_PATTERN)
}

/// The user data of an instance. Only a bastion that is given a private key gets any.
pub fn user_data(role: InstanceRole, private_key: Option<&str>) -> Option<String> {
    match (role, private_key) {
        (InstanceRole::Bastion, Some(key)) => Some(bastion_key_writer(key)),
        _ => None,
    }
}

/// A described instance.
#[derive(Clone, Debug)]
pub struct Instance {
    urn: Urn,
    parent: Option<Urn>,
    pub role: InstanceRole,
    pub image_id: String,
    pub user_data: Option<String>,
    pub public_dns: Output<String>,
    pub private_ip: Output<String>,
}

impl Describe for Instance {
    fn urn(&self) -> &Urn {
        &self.urn
    }

    fn parent(&self) -> Option<&Urn> {
        self.parent.as_ref()
    }

    fn dependencies(&self) -> BTreeSet<Urn> {
        BTreeSet::new()
    }
}

/// Describe a single EC2 instance whose role is taken from its `type` tag. Nothing is described if
/// the tag is missing or invalid, or if the image lookup fails.
pub async fn build_instance(
    stack: &mut Stack,
    lookups: Lookups<'_>,
    args: InstanceArgs,
) -> Result<Instance> {
    let config = &args.config;
    let name = config.name.as_str();
    let role_tag = config.role_tag().context(error::MissingTagSnafu {
        name,
        tag: INSTANCE_ROLE_TAG,
    })?;
    let role = InstanceRole::parse(role_tag)
        .map_err(|message| error::InstanceRoleSnafu { name, message }.build())?;
    if !role.is_bastion() && args.private_key.is_some() {
        warn!(
            "Instance '{}' is not a bastion, ignoring the private key it was given",
            name
        );
    }
    let user_data = user_data(role, args.private_key.as_deref());

    let image_query = instance_image_query();
    let image_id = lookups
        .images
        .most_recent_image(&image_query)
        .await
        .context(error::ImageLookupSnafu {
            name_pattern: &image_query.name_pattern,
        })?;
    info!(
        "Describing {} instance '{}' of size '{}' using '{}'",
        role, name, config.size, image_id
    );

    let component = ResourceDescription::new(INSTANCE_COMPONENT, name)
        .input("role", role.to_string())
        .input("size", &config.size);
    let mut scope = stack.scope(component)?;
    let server = scope.describe(
        ResourceDescription::new(INSTANCE, name)
            .input("instanceType", &config.size)
            .input("ami", &image_id)
            .input(
                "vpcSecurityGroupIds",
                Input::list(args.security_group_ids.iter()),
            )
            .input("subnetId", &args.subnet_id)
            .optional_input("keyName", args.key_name.as_ref())
            .input("tags", Input::object(config.tags.clone()))
            .input("associatePublicIpAddress", role.is_bastion())
            .optional_input("userData", user_data.clone()),
    )?;
    let public_dns = server.output("publicDns");
    let private_ip = server.output("privateIp");

    let urn = scope.commit()?;
    let parent = stack.get(&urn).and_then(|c| c.parent().cloned());
    Ok(Instance {
        urn,
        parent,
        role,
        image_id,
        user_data,
        public_dns,
        private_ip,
    })
}
