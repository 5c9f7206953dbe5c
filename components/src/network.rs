use crate::constants::{
    ANY_CIDR, EIP, INTERNET_GATEWAY, MAX_SUBNETS, MIN_SUBNETS, NAT_GATEWAY, ROUTE, ROUTE_TABLE,
    ROUTE_TABLE_ASSOCIATION, SSH_PORT, SUBNET, VPC, VPC_CIDR,
};
use crate::error::{self, Result};
use crate::security_group::{security_group, Peer, Rule};
use crate::Lookups;
use infra_model::constants::NETWORK_COMPONENT;
use infra_model::{Describe, Input, Output, ResourceDescription, Scope, Stack, Urn};
use infra_types::NetworkConfig;
use infra_utils::json_display;
use log::{debug, info};
use snafu::{ensure, OptionExt, ResultExt};
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubnetRole {
    /// Routed through the internet gateway, instances get public addresses.
    Public,
    /// Routed through the shared NAT gateway.
    Private,
}

/// The layout of the subnets in a network. The first subnet is always the only public one; the
/// rest are private.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubnetPlan {
    roles: Vec<SubnetRole>,
}

impl SubnetPlan {
    pub fn new(subnet_count: u32) -> Result<Self> {
        ensure!(
            (MIN_SUBNETS..=MAX_SUBNETS).contains(&subnet_count),
            error::SubnetCountSnafu {
                count: subnet_count
            }
        );
        let roles = (0..subnet_count)
            .map(|index| {
                if index == 0 {
                    SubnetRole::Public
                } else {
                    SubnetRole::Private
                }
            })
            .collect();
        Ok(Self { roles })
    }

    pub fn roles(&self) -> &[SubnetRole] {
        &self.roles
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn public_count(&self) -> usize {
        self.count(SubnetRole::Public)
    }

    pub fn private_count(&self) -> usize {
        self.count(SubnetRole::Private)
    }

    /// The CIDR block of the subnet at `index`.
    pub fn cidr_block(index: usize) -> String {
        format!("10.0.{}.0/24", index)
    }

    fn count(&self, role: SubnetRole) -> usize {
        self.roles.iter().filter(|r| **r == role).count()
    }
}

/// The ids of the security groups that a network derives its rules for.
#[derive(Clone, Debug)]
pub struct SecurityGroupPair {
    pub public: Output<String>,
    pub private: Output<String>,
}

/// A described network.
#[derive(Clone, Debug)]
pub struct Network {
    urn: Urn,
    parent: Option<Urn>,
    pub plan: SubnetPlan,
    pub vpc_id: Output<String>,
    pub public_subnet_ids: Vec<Output<String>>,
    pub private_subnet_ids: Vec<Output<String>>,
    pub security_groups: SecurityGroupPair,
}

impl Network {
    /// All subnet ids, public first.
    pub fn subnet_ids(&self) -> Output<Vec<String>> {
        Output::all(
            self.public_subnet_ids
                .iter()
                .chain(self.private_subnet_ids.iter())
                .cloned(),
        )
    }

    /// The private subnet ids.
    pub fn private_subnets(&self) -> Output<Vec<String>> {
        Output::all(self.private_subnet_ids.iter().cloned())
    }

    /// The id of the single public subnet.
    pub fn public_subnet_id(&self) -> Result<Output<String>> {
        self.public_subnet_ids
            .first()
            .cloned()
            .context(error::MissingPrerequisiteSnafu {
                resource: self.urn.to_string(),
                prerequisite: "public subnet",
            })
    }
}

impl Describe for Network {
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

/// Describe a VPC with one public subnet and one or two private subnets, along with the gateways,
/// routes and security groups they need. Nothing is described if the subnet count is not 2 or 3,
/// or if any lookup fails.
pub async fn build_network(
    stack: &mut Stack,
    lookups: Lookups<'_>,
    config: &NetworkConfig,
) -> Result<Network> {
    debug!("Network configuration:\n{}", json_display(config));
    let plan = SubnetPlan::new(config.subnet_count)?;
    let zone_ids = lookups.zones.zone_ids().await.context(error::ZoneLookupSnafu)?;
    ensure!(
        zone_ids.len() >= plan.len(),
        error::NotEnoughZonesSnafu {
            wanted: plan.len(),
            found: zone_ids.len(),
        }
    );
    let workstation_ip = lookups
        .workstation
        .workstation_ip()
        .await
        .context(error::WorkstationIpSnafu)?;
    info!(
        "Describing network '{}' with {} subnets",
        config.name,
        plan.len()
    );

    let component = ResourceDescription::new(NETWORK_COMPONENT, &config.name).configuration(config)?;
    let mut builder = NetworkBuilder {
        scope: stack.scope(component)?,
        name: &config.name,
        vpc_tags: &config.vpc_tags,
    };

    let vpc_id = builder.vpc()?;
    let public_route_table = builder.public_route_table(&vpc_id)?;
    let mut private_route_table = None;
    let mut public_subnet_ids = Vec::new();
    let mut private_subnet_ids = Vec::new();
    for (index, (role, zone_id)) in plan.roles().iter().zip(&zone_ids).enumerate() {
        match role {
            SubnetRole::Public => {
                public_subnet_ids.push(builder.subnet(
                    &vpc_id,
                    &public_route_table,
                    index,
                    zone_id,
                    *role,
                )?);
            }
            SubnetRole::Private => {
                if private_route_table.is_none() {
                    let public_subnet_id =
                        public_subnet_ids
                            .first()
                            .context(error::MissingPrerequisiteSnafu {
                                resource: builder.nat_name(),
                                prerequisite: "public subnet",
                            })?;
                    private_route_table =
                        Some(builder.private_route_table(&vpc_id, public_subnet_id)?);
                }
                private_subnet_ids.push(builder.private_subnet(
                    &vpc_id,
                    private_route_table.as_ref(),
                    index,
                    zone_id,
                )?);
            }
        }
    }
    let security_groups = builder.security_groups(&vpc_id, &config.sg_tags, workstation_ip)?;

    let urn = builder.scope.commit()?;
    let parent = stack.get(&urn).and_then(|c| c.parent().cloned());
    Ok(Network {
        urn,
        parent,
        plan,
        vpc_id,
        public_subnet_ids,
        private_subnet_ids,
        security_groups,
    })
}

struct NetworkBuilder<'a, 'b> {
    scope: Scope<'a>,
    name: &'b str,
    vpc_tags: &'b BTreeMap<String, String>,
}

impl<'a, 'b> NetworkBuilder<'a, 'b> {
    fn tags(&self) -> Input {
        Input::object(self.vpc_tags.clone())
    }

    fn nat_name(&self) -> String {
        format!("{}-nat", self.name)
    }

    fn vpc(&mut self) -> Result<Output<String>> {
        let vpc = self.scope.describe(
            ResourceDescription::new(VPC, self.name)
                .input("cidrBlock", VPC_CIDR)
                .input("enableDnsHostnames", true)
                .input("enableDnsSupport", true)
                .input("tags", self.tags()),
        )?;
        Ok(vpc.output("id"))
    }

    /// The internet gateway and the route table that sends all traffic through it.
    fn public_route_table(&mut self, vpc_id: &Output<String>) -> Result<Output<String>> {
        let gateway = self.scope.describe(
            ResourceDescription::new(INTERNET_GATEWAY, format!("{}-ig", self.name))
                .input("vpcId", vpc_id)
                .input("tags", self.tags()),
        )?;
        let route_table = self.route_table(format!("{}-public-rt", self.name), vpc_id)?;
        self.scope.describe(
            ResourceDescription::new(ROUTE, format!("{}-public-route", self.name))
                .input("routeTableId", &route_table)
                .input("destinationCidrBlock", ANY_CIDR)
                .input("gatewayId", gateway.output::<String>("id")),
        )?;
        Ok(route_table)
    }

    /// The elastic IP, the NAT gateway in the public subnet, and the route table that sends all
    /// traffic through the NAT gateway. Shared by every private subnet.
    fn private_route_table(
        &mut self,
        vpc_id: &Output<String>,
        public_subnet_id: &Output<String>,
    ) -> Result<Output<String>> {
        debug!("Describing the shared NAT gateway for '{}'", self.name);
        let eip = self.scope.describe(
            ResourceDescription::new(EIP, format!("{}-nat-eip", self.name)).input("vpc", true),
        )?;
        let nat = self.scope.describe(
            ResourceDescription::new(NAT_GATEWAY, self.nat_name())
                .input("subnetId", public_subnet_id)
                .input("allocationId", eip.output::<String>("id"))
                .input("tags", self.tags()),
        )?;
        let route_table = self.route_table(format!("{}-private-rt", self.name), vpc_id)?;
        self.scope.describe(
            ResourceDescription::new(ROUTE, format!("{}-private-route", self.name))
                .input("routeTableId", &route_table)
                .input("destinationCidrBlock", ANY_CIDR)
                .input("natGatewayId", nat.output::<String>("id")),
        )?;
        Ok(route_table)
    }

    fn route_table(&mut self, name: String, vpc_id: &Output<String>) -> Result<Output<String>> {
        let route_table = self.scope.describe(
            ResourceDescription::new(ROUTE_TABLE, name)
                .input("vpcId", vpc_id)
                .input("tags", self.tags()),
        )?;
        Ok(route_table.output("id"))
    }

    fn private_subnet(
        &mut self,
        vpc_id: &Output<String>,
        route_table: Option<&Output<String>>,
        index: usize,
        zone_id: &str,
    ) -> Result<Output<String>> {
        let route_table = route_table.context(error::MissingPrerequisiteSnafu {
            resource: subnet_name(self.name, index, SubnetRole::Private),
            prerequisite: "private route table",
        })?;
        self.subnet(vpc_id, route_table, index, zone_id, SubnetRole::Private)
    }

    /// A subnet and its association with `route_table`.
    fn subnet(
        &mut self,
        vpc_id: &Output<String>,
        route_table: &Output<String>,
        index: usize,
        zone_id: &str,
        role: SubnetRole,
    ) -> Result<Output<String>> {
        let name = subnet_name(self.name, index, role);
        let subnet = self.scope.describe(
            ResourceDescription::new(SUBNET, &name)
                .input("vpcId", vpc_id)
                .input("availabilityZoneId", zone_id)
                .input("cidrBlock", SubnetPlan::cidr_block(index))
                .input("mapPublicIpOnLaunch", role == SubnetRole::Public)
                .input("tags", self.tags()),
        )?;
        let subnet_id: Output<String> = subnet.output("id");
        self.scope.describe(
            ResourceDescription::new(ROUTE_TABLE_ASSOCIATION, format!("{}-rt-assoc", name))
                .input("routeTableId", route_table)
                .input("subnetId", &subnet_id),
        )?;
        Ok(subnet_id)
    }

    /// The public and private security groups. Public accepts traffic from itself, from private,
    /// and SSH from the workstation; private accepts traffic from itself and from public. Both
    /// allow all egress.
    fn security_groups(
        &mut self,
        vpc_id: &Output<String>,
        sg_tags: &BTreeMap<String, String>,
        workstation_ip: Ipv4Addr,
    ) -> Result<SecurityGroupPair> {
        let public_name = format!("{}-public-sg", self.name);
        let private_name = format!("{}-private-sg", self.name);
        let public: Output<String> = self
            .scope
            .describe(security_group(&public_name, &public_name, vpc_id, sg_tags))?
            .output("id");
        let private: Output<String> = self
            .scope
            .describe(security_group(&private_name, &private_name, vpc_id, sg_tags))?
            .output("id");

        let rules = [
            (
                &public,
                Rule::ingress(
                    format!("{}-public-ingress-from-itself", self.name),
                    Peer::Itself,
                ),
            ),
            (
                &public,
                Rule::ingress(
                    format!("{}-public-ingress-from-private", self.name),
                    Peer::Group(private.clone()),
                ),
            ),
            (
                &public,
                Rule::egress(format!("{}-public-egress", self.name))
                    .description("egress traffic from public sg"),
            ),
            (
                &public,
                Rule::ingress(
                    format!("{}-public-ingress-from-current-ip", self.name),
                    Peer::host(workstation_ip),
                )
                .tcp(SSH_PORT),
            ),
            (
                &private,
                Rule::ingress(
                    format!("{}-private-ingress-from-itself", self.name),
                    Peer::Itself,
                ),
            ),
            (
                &private,
                Rule::ingress(
                    format!("{}-private-ingress-from-public", self.name),
                    Peer::Group(public.clone()),
                ),
            ),
            (
                &private,
                Rule::egress(format!("{}-private-egress", self.name))
                    .description("egress traffic from private sg"),
            ),
        ];
        for (group, rule) in rules {
            self.scope.describe(rule.describe(group))?;
        }
        Ok(SecurityGroupPair { public, private })
    }
}

fn subnet_name(network: &str, index: usize, role: SubnetRole) -> String {
    match role {
        SubnetRole::Public => format!("{}-{}-public-subnet", network, index),
        SubnetRole::Private => format!("{}-{}-private-subnet", network, index),
    }
}
