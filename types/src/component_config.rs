use configuration_derive::Configuration;
use infra_model::constants::DEFAULT_STACK_NAME;
use serde::{Deserialize, Serialize};
use serde_plain::{derive_deserialize_from_fromstr, derive_serialize_from_display};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The tag that selects an instance's role.
pub const INSTANCE_ROLE_TAG: &str = "type";

/// The instance type used when none is given.
pub const DEFAULT_INSTANCE_TYPE: &str = "t2.micro";

/// The parameters of a network: one VPC with a public subnet and one or two private subnets behind
/// a shared NAT gateway.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Default, Configuration)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    /// Used as the VPC name and as the prefix of every other resource in the network.
    pub name: String,

    /// The total number of subnets. Only 2 and 3 are supported.
    pub subnet_count: u32,

    /// Ports the operator intends to open. These are recorded on the network but no rules are
    /// derived from them.
    #[serde(default)]
    pub port_list: Vec<u16>,

    /// Tags for the VPC, its gateways and subnets.
    #[serde(default)]
    pub vpc_tags: BTreeMap<String, String>,

    /// Tags for the security groups.
    #[serde(default)]
    pub sg_tags: BTreeMap<String, String>,
}

/// The parameters of a managed Kubernetes cluster and its worker pool.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Configuration)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    pub name: String,

    #[serde(default = "default_instance_type")]
    pub instance_type: String,

    /// The fixed size of the worker pool. Min, max and desired capacity are all set to this.
    #[serde(default = "default_node_count")]
    pub node_count: u32,

    /// Kubernetes version such as `1.21` or `v1.21.3`. Only the major and minor parts are used.
    pub version: String,

    /// The EC2 key pair for worker nodes.
    pub key_name: Option<String>,

    /// The VPC to create the cluster in. Not needed when the cluster is part of a stack.
    pub vpc_id: Option<String>,

    /// Subnets for the control plane and workers. Not needed when the cluster is part of a stack.
    pub subnet_ids: Option<Vec<String>>,

    /// The security group of the bastion that workers accept traffic from. Not needed when the
    /// cluster is part of a stack.
    pub bastion_sg_id: Option<String>,

    /// Describe the `aws-auth` config map that lets worker nodes join the cluster.
    #[serde(default = "default_true")]
    pub register_nodes: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            instance_type: default_instance_type(),
            node_count: default_node_count(),
            version: String::new(),
            key_name: None,
            vpc_id: None,
            subnet_ids: None,
            bastion_sg_id: None,
            register_nodes: true,
        }
    }
}

/// The parameters of a single EC2 instance.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Configuration)]
#[serde(rename_all = "camelCase")]
pub struct InstanceConfig {
    pub name: String,

    #[serde(default = "default_instance_type")]
    pub size: String,

    /// Ids of the VPC security groups to attach.
    #[serde(default)]
    pub security_groups: Vec<String>,

    /// Must contain a `type` tag, see [`InstanceRole`].
    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    pub subnet_id: Option<String>,

    /// The EC2 key pair name.
    pub key: Option<String>,

    /// Private key material that a bastion writes to `bastion.pem` on boot. The key is written
    /// verbatim and must not contain shell metacharacters.
    pub private_key: Option<String>,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            size: default_instance_type(),
            security_groups: Vec::new(),
            tags: BTreeMap::new(),
            subnet_id: None,
            key: None,
            private_key: None,
        }
    }
}

impl InstanceConfig {
    /// The value of the `type` tag, if present.
    pub fn role_tag(&self) -> Option<&str> {
        self.tags.get(INSTANCE_ROLE_TAG).map(String::as_str)
    }
}

/// Everything needed to describe a complete environment: a network, optionally a bastion in its
/// public subnet and optionally a cluster in its private subnets.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Configuration)]
#[serde(rename_all = "camelCase")]
pub struct StackConfig {
    #[serde(default = "default_stack_name")]
    pub name: String,

    pub network: NetworkConfig,

    /// The bastion. Its subnet and security group come from the network, and it receives the
    /// private half of the generated key pair.
    pub bastion: Option<InstanceConfig>,

    /// The cluster. Its VPC, subnets and bastion security group come from the network.
    pub cluster: Option<ClusterConfig>,

    /// Generate a key pair for reaching private nodes from the bastion.
    #[serde(default = "default_true")]
    pub generate_keypair: bool,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            name: default_stack_name(),
            network: NetworkConfig::default(),
            bastion: None,
            cluster: None,
            generate_keypair: true,
        }
    }
}

fn default_instance_type() -> String {
    DEFAULT_INSTANCE_TYPE.to_string()
}

fn default_node_count() -> u32 {
    2
}

fn default_stack_name() -> String {
    DEFAULT_STACK_NAME.to_string()
}

fn default_true() -> bool {
    true
}

/// What an instance is for. Parsed from the `type` tag, which must be spelled exactly as one of
/// `bastion`, `Bastion`, `private` or `Private`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum InstanceRole {
    /// Publicly reachable, used to relay SSH into private subnets.
    Bastion,
    /// Reachable only from inside the VPC.
    Private,
}

impl InstanceRole {
    pub fn parse<S: AsRef<str>>(s: S) -> std::result::Result<Self, String> {
        match s.as_ref() {
            "bastion" | "Bastion" => Ok(Self::Bastion),
            "private" | "Private" => Ok(Self::Private),
            other => Err(format!(
                "Unsupported instance type '{}', expected 'bastion' or 'private'",
                other
            )),
        }
    }

    pub fn is_bastion(&self) -> bool {
        matches!(self, Self::Bastion)
    }
}

impl Display for InstanceRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bastion => Display::fmt("bastion", f),
            Self::Private => Display::fmt("private", f),
        }
    }
}

impl FromStr for InstanceRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InstanceRole::parse(s)
    }
}

derive_serialize_from_display!(InstanceRole);
derive_deserialize_from_fromstr!(InstanceRole, "instance role 'bastion' or 'private'");

/// Represents a parsed Kubernetes version. Examples of valid values when parsing:
/// - `v1.21`
/// - `1.21`
/// - `v1.21.1`
/// - `1.21.1`
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct K8sVersion {
    major: u8,
    minor: u8,
    patch: Option<u8>,
}

impl K8sVersion {
    pub const fn new(major: u8, minor: u8, patch: Option<u8>) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Returns the major and minor versions without a v prefix (even if a patch value is
    /// present). Example: `1.21`.
    pub fn major_minor_without_v(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }

    /// Includes the patch value if it exists. Examples: `1.21.1` when a patch value exists, or
    /// `1.21` if the patch value is `None`.
    pub fn full_version_without_v(&self) -> String {
        if let Some(patch) = self.patch {
            format!("{}.{}.{}", self.major, self.minor, patch)
        } else {
            self.major_minor_without_v()
        }
    }

    pub fn parse<S: AsRef<str>>(s: S) -> std::result::Result<Self, String> {
        let original = s.as_ref();
        // skip the 'v' if present
        let no_v = original.strip_prefix('v').unwrap_or(original);
        let mut iter = no_v.split('.');
        let major = iter
            .next()
            .filter(|major| !major.is_empty())
            .ok_or_else(|| {
                format!(
                    "Unable to find the major version number when parsing '{}' as a k8s version",
                    original
                )
            })?
            .parse::<u8>()
            .map_err(|e| {
                format!(
                    "Error when parsing the major version number of k8s version '{}': {}",
                    original, e
                )
            })?;
        let minor = iter
            .next()
            .ok_or_else(|| {
                format!(
                    "Unable to find the minor version number when parsing '{}' as a k8s version",
                    original
                )
            })?
            .parse::<u8>()
            .map_err(|e| {
                format!(
                    "Error when parsing the minor version number of k8s version '{}': {}",
                    original, e
                )
            })?;
        let patch = iter.next().and_then(|s| s.parse::<u8>().ok());
        Ok(Self {
            major,
            minor,
            patch,
        })
    }
}

impl Display for K8sVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.full_version_without_v(), f)
    }
}

impl FromStr for K8sVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        K8sVersion::parse(s)
    }
}

derive_serialize_from_display!(K8sVersion);
derive_deserialize_from_fromstr!(K8sVersion, "k8s version such as v1.21 or 1.21.1");

#[test]
fn k8s_version_invalid() {
    assert!(K8sVersion::parse("1.foo").is_err());
    assert!(K8sVersion::parse("1").is_err());
    assert!(K8sVersion::parse("").is_err());
    assert!(K8sVersion::parse("latest").is_err());
}

#[test]
fn k8s_version_valid() {
    let k8s_version = K8sVersion::from_str("v1.21.3").unwrap();
    assert_eq!("1.21", k8s_version.major_minor_without_v());
    assert_eq!("1.21.3", k8s_version.full_version_without_v());
    assert_eq!(
        K8sVersion::parse("1.18.3").unwrap().major_minor_without_v(),
        K8sVersion::parse("1.18.9").unwrap().major_minor_without_v()
    );
}

#[test]
fn instance_role_is_case_sensitive() {
    assert_eq!(InstanceRole::parse("bastion"), Ok(InstanceRole::Bastion));
    assert_eq!(InstanceRole::parse("Bastion"), Ok(InstanceRole::Bastion));
    assert_eq!(InstanceRole::parse("Private"), Ok(InstanceRole::Private));
    let err = InstanceRole::parse("BASTION").unwrap_err();
    assert!(err.contains("BASTION"));
    assert!(InstanceRole::parse("worker").is_err());
}

#[cfg(test)]
mod test {
    use super::{ClusterConfig, InstanceConfig, InstanceRole, NetworkConfig, StackConfig};
    use infra_model::Configuration;
    use std::fs::read_to_string;
    use std::path::PathBuf;

    fn samples_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("samples")
    }

    fn read_sample(filename: &str) -> String {
        let p = samples_dir().join(filename);
        read_to_string(&p).expect(&format!("unable to open '{}'", p.display()))
    }

    // These tests assert that the sample configuration files can be deserialized into the
    // component configuration structs.

    #[test]
    fn network_sample() {
        let config: NetworkConfig = serde_yaml::from_str(&read_sample("network.yaml")).unwrap();
        assert_eq!(config.name, "dev");
        assert_eq!(config.subnet_count, 3);
        assert_eq!(config.port_list, vec![22, 443]);
        assert_eq!(config.vpc_tags.get("Environment").unwrap(), "dev");
    }

    #[test]
    fn cluster_sample() {
        let config: ClusterConfig = serde_yaml::from_str(&read_sample("cluster.yaml")).unwrap();
        assert_eq!(config.instance_type, "t3.medium");
        assert_eq!(config.node_count, 3);
        assert_eq!(config.version, "1.18.9");
        assert!(config.register_nodes);
        assert_eq!(config.subnet_ids.unwrap().len(), 2);
    }

    #[test]
    fn instance_sample() {
        let config: InstanceConfig =
            serde_yaml::from_str(&read_sample("instance.yaml")).unwrap();
        assert_eq!(config.size, "t2.micro");
        assert_eq!(
            config.role_tag().map(InstanceRole::parse),
            Some(Ok(InstanceRole::Bastion))
        );
    }

    #[test]
    fn stack_sample() {
        let config: StackConfig = serde_yaml::from_str(&read_sample("stack.yaml")).unwrap();
        assert_eq!(config.name, "demo");
        assert!(config.generate_keypair);
        assert_eq!(config.network.subnet_count, 2);
        assert!(config.bastion.is_some());
        let cluster = config.cluster.unwrap();
        assert_eq!(cluster.node_count, 2);
        assert!(!cluster.register_nodes);
    }

    #[test]
    fn configuration_round_trips_through_a_map() {
        let config: StackConfig = serde_yaml::from_str(&read_sample("stack.yaml")).unwrap();
        let map = config.clone().into_map().unwrap();
        assert!(map.contains_key("network"));
        assert_eq!(StackConfig::from_map(map).unwrap(), config);
    }
}
