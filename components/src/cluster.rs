use crate::constants::{
    AUTOSCALING_GROUP, CLUSTER_OWNERSHIP_TAG_PREFIX, CONTROL_PLANE_POLICIES, EC2_SERVICE_PRINCIPAL,
    EKS_CLUSTER, EKS_NODE_IMAGE_PREFIX, EKS_SERVICE_PRINCIPAL, HTTPS_PORT, LAUNCH_CONFIGURATION,
    WORKER_POLICIES,
};
use crate::error::{self, Result};
use crate::kubernetes::{aws_auth_config_map, kubeconfig};
use crate::security_group::{security_group, Peer, Rule};
use crate::userdata::worker_user_data;
use crate::{iam, Lookups};
use infra_model::constants::CLUSTER_COMPONENT;
use infra_model::{Describe, Input, Output, ResourceDescription, Stack, Urn};
use infra_types::{ClusterConfig, K8sVersion};
use infra_utils::constants::AMAZON_OWNER;
use infra_utils::{json_display, ImageQuery};
use log::{debug, info};
use maplit::btreemap;
use snafu::{OptionExt, ResultExt};
use std::collections::{BTreeMap, BTreeSet};

/// The parameters of a cluster along with the network values it is wired to. The network values
/// are usually outputs of a network described in the same stack.
#[derive(Clone, Debug)]
pub struct ClusterArgs {
    pub config: ClusterConfig,
    pub vpc_id: Output<String>,
    /// Subnets of the control plane.
    pub subnet_ids: Output<Vec<String>>,
    /// Subnets the worker pool is spread across.
    pub worker_subnet_ids: Output<Vec<String>>,
    pub bastion_security_group_id: Output<String>,
    pub key_name: Option<Output<String>>,
}

impl ClusterArgs {
    /// Wire a cluster from fixed values in its configuration. The control plane and the workers
    /// share the configured subnets.
    pub fn from_config(config: ClusterConfig) -> Result<Self> {
        let vpc_id = required(&config.name, "vpcId", config.vpc_id.clone())?;
        let subnet_ids = required(&config.name, "subnetIds", config.subnet_ids.clone())?;
        let bastion_security_group_id =
            required(&config.name, "bastionSgId", config.bastion_sg_id.clone())?;
        let key_name = config.key_name.clone().map(Output::known);
        Ok(Self {
            vpc_id: Output::known(vpc_id),
            subnet_ids: Output::known(subnet_ids.clone()),
            worker_subnet_ids: Output::known(subnet_ids),
            bastion_security_group_id: Output::known(bastion_security_group_id),
            key_name,
            config,
        })
    }
}

pub(crate) fn required<T>(component: &str, field: &str, value: Option<T>) -> Result<T> {
    value.context(error::MissingFieldSnafu { component, field })
}

/// The image query for worker nodes of the given Kubernetes version. The patch version is not
/// part of EKS node image names, so `1.18.3` and `1.18.9` find the same image.
pub fn eks_image_query(version: &K8sVersion) -> ImageQuery {
    ImageQuery::new(
        AMAZON_OWNER,
        format!(
            "{}-{}-v*",
            EKS_NODE_IMAGE_PREFIX,
            version.major_minor_without_v()
        ),
    )
}

/// A described cluster.
#[derive(Clone, Debug)]
pub struct Cluster {
    urn: Urn,
    parent: Option<Urn>,
    pub version: K8sVersion,
    pub image_id: String,
    pub endpoint: Output<String>,
    /// The base64 encoded certificate authority of the API server.
    pub certificate_authority: Output<String>,
    pub kubeconfig: Output<String>,
    pub worker_role_arn: Output<String>,
    pub master_security_group_id: Output<String>,
    pub worker_security_group_id: Output<String>,
}

impl Describe for Cluster {
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

/// Describe an EKS cluster with its IAM roles, security groups and a fixed size worker pool.
/// Nothing is described if the version is invalid or a lookup fails.
pub async fn build_cluster(
    stack: &mut Stack,
    lookups: Lookups<'_>,
    args: ClusterArgs,
) -> Result<Cluster> {
    let config = &args.config;
    let name = config.name.as_str();
    debug!("Cluster configuration:\n{}", json_display(config));
    let version = K8sVersion::parse(&config.version)
        .map_err(|message| error::VersionSnafu { name, message }.build())?;
    let image_query = eks_image_query(&version);
    let image_id = lookups
        .images
        .most_recent_image(&image_query)
        .await
        .context(error::ImageLookupSnafu {
            name_pattern: &image_query.name_pattern,
        })?;
    let workstation_ip = lookups
        .workstation
        .workstation_ip()
        .await
        .context(error::WorkstationIpSnafu)?;
    info!(
        "Describing cluster '{}' version {} with {} '{}' nodes using '{}'",
        name,
        version.major_minor_without_v(),
        config.node_count,
        config.instance_type,
        image_id
    );

    let component = ResourceDescription::new(CLUSTER_COMPONENT, name).configuration(config)?;
    let mut scope = stack.scope(component)?;

    // IAM
    let master_role = scope.describe(iam::role(
        &format!("{}-master-role", name),
        "role for eks service",
        EKS_SERVICE_PRINCIPAL,
    ))?;
    let worker_role = scope.describe(iam::role(
        &format!("{}-worker-role", name),
        "role for eks worker nodes",
        EC2_SERVICE_PRINCIPAL,
    ))?;
    let instance_profile = scope.describe(iam::instance_profile(
        &format!("{}-instance-profile", name),
        &worker_role,
    ))?;
    let mut master_attachments = Vec::new();
    for policy in CONTROL_PLANE_POLICIES {
        master_attachments.push(scope.describe(iam::policy_attachment(&master_role, policy))?);
    }
    for policy in WORKER_POLICIES {
        scope.describe(iam::policy_attachment(&worker_role, policy))?;
    }

    // Security groups
    let master_sg_name = format!("{}-master-sg", name);
    let worker_sg_name = format!("{}-worker-sg", name);
    let master_sg: Output<String> = scope
        .describe(security_group(
            &master_sg_name,
            "security group for communication with the eks master plane",
            &args.vpc_id,
            &name_tag(&master_sg_name),
        ))?
        .output("id");
    let worker_sg: Output<String> = scope
        .describe(security_group(
            &worker_sg_name,
            "security group for communication with the worker nodes",
            &args.vpc_id,
            &name_tag(&worker_sg_name),
        ))?
        .output("id");
    let rules = [
        (&master_sg, Rule::egress(format!("{}-egress", master_sg_name))),
        (
            &master_sg,
            Rule::ingress(
                format!("{}-ingress-from-workstation", master_sg_name),
                Peer::host(workstation_ip),
            )
            .tcp(HTTPS_PORT),
        ),
        (
            &master_sg,
            Rule::ingress(
                format!("{}-ingress-from-workers", master_sg_name),
                Peer::Group(worker_sg.clone()),
            ),
        ),
        (&worker_sg, Rule::egress(format!("{}-egress", worker_sg_name))),
        (
            &worker_sg,
            Rule::ingress(format!("{}-ingress-itself", worker_sg_name), Peer::Itself),
        ),
        (
            &worker_sg,
            Rule::ingress(
                format!("{}-ingress-master", worker_sg_name),
                Peer::Group(master_sg.clone()),
            ),
        ),
        (
            &worker_sg,
            Rule::ingress(
                format!("{}-ingress-bastion", worker_sg_name),
                Peer::Group(args.bastion_security_group_id.clone()),
            ),
        ),
    ];
    for (group, rule) in rules {
        scope.describe(rule.describe(group))?;
    }

    // Control plane
    let eks = scope.describe(
        ResourceDescription::new(EKS_CLUSTER, name)
            .input("name", name)
            .input("roleArn", master_role.output::<String>("arn"))
            .input("version", version.major_minor_without_v())
            .input(
                "vpcConfig",
                Input::object(vec![
                    ("securityGroupIds", Input::list(vec![&master_sg])),
                    ("subnetIds", Input::from(&args.subnet_ids)),
                ]),
            )
            .input("tags", Input::object(name_tag(name)))
            .depends_on_all(&master_attachments),
    )?;
    let endpoint: Output<String> = eks.output("endpoint");
    let certificate_authority: Output<String> = eks.output("certificateAuthority.data");

    // Worker pool
    debug!("Describing the worker pool of '{}'", name);
    let launch_configuration = scope.describe(
        ResourceDescription::new(LAUNCH_CONFIGURATION, format!("{}-launch-config", name))
            .input("name", name)
            .input("imageId", &image_id)
            .input("instanceType", &config.instance_type)
            .input(
                "iamInstanceProfile",
                instance_profile.output::<String>("name"),
            )
            .input("securityGroups", Input::list(vec![&worker_sg]))
            .optional_input("keyName", args.key_name.as_ref())
            .input(
                "userData",
                worker_user_data(endpoint.clone(), certificate_authority.clone(), name),
            ),
    )?;
    scope.describe(
        ResourceDescription::new(AUTOSCALING_GROUP, format!("{}-asg", name))
            .input(
                "launchConfiguration",
                launch_configuration.output::<String>("id"),
            )
            .input("minSize", config.node_count)
            .input("maxSize", config.node_count)
            .input("desiredCapacity", config.node_count)
            .input("vpcZoneIdentifiers", &args.worker_subnet_ids)
            .input(
                "tags",
                Input::list(vec![Input::object(vec![
                    (
                        "key",
                        Input::from(format!("{}{}", CLUSTER_OWNERSHIP_TAG_PREFIX, name)),
                    ),
                    ("value", Input::from("owned")),
                    ("propagateAtLaunch", Input::from(true)),
                ])]),
            )
            .depends_on(&eks),
    )?;

    let worker_role_arn: Output<String> = worker_role.output("arn");
    if config.register_nodes {
        scope.describe(
            aws_auth_config_map(&format!("{}-aws-auth", name), &worker_role_arn).depends_on(&eks),
        )?;
    }

    let cluster_name = name.to_string();
    let kubeconfig = endpoint
        .clone()
        .zip(certificate_authority.clone())
        .try_map(move |(endpoint, ca)| kubeconfig(&cluster_name, &endpoint, &ca));

    let urn = scope.commit()?;
    let parent = stack.get(&urn).and_then(|c| c.parent().cloned());
    Ok(Cluster {
        urn,
        parent,
        version,
        image_id,
        endpoint,
        certificate_authority,
        kubeconfig,
        worker_role_arn,
        master_security_group_id: master_sg,
        worker_security_group_id: worker_sg,
    })
}

fn name_tag(name: &str) -> BTreeMap<String, String> {
    btreemap! {
        "Name".to_string() => name.to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn image_query_ignores_the_patch_version() {
        let first = eks_image_query(&K8sVersion::parse("1.18.3").unwrap());
        let second = eks_image_query(&K8sVersion::parse("v1.18.9").unwrap());
        assert_eq!(first, second);
        assert_eq!(first.name_pattern, "amazon-eks-node-1.18-v*");
        assert_eq!(first.owners, vec!["amazon".to_string()]);
    }

    #[test]
    fn standalone_cluster_needs_network_values() {
        let config = ClusterConfig {
            name: "dev".to_string(),
            version: "1.21".to_string(),
            vpc_id: Some("vpc-1".to_string()),
            bastion_sg_id: Some("sg-1".to_string()),
            ..ClusterConfig::default()
        };
        let err = ClusterArgs::from_config(config.clone()).unwrap_err();
        assert!(err.to_string().contains("subnetIds"));

        let args = ClusterArgs::from_config(ClusterConfig {
            subnet_ids: Some(vec!["subnet-1".to_string(), "subnet-2".to_string()]),
            ..config
        })
        .unwrap();
        assert!(args.key_name.is_none());
        assert_eq!(
            args.worker_subnet_ids
                .resolve(&infra_model::State::default())
                .unwrap(),
            vec!["subnet-1".to_string(), "subnet-2".to_string()]
        );
    }
}
