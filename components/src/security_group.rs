use crate::constants::{ANY_CIDR, SECURITY_GROUP, SECURITY_GROUP_RULE};
use infra_model::{Input, Output, ResourceDescription};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// The protocol value that matches all traffic.
const ALL_PROTOCOLS: &str = "-1";
const TCP: &str = "tcp";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Direction {
    Ingress,
    Egress,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::Ingress => "ingress",
            Direction::Egress => "egress",
        }
    }
}

/// Where the traffic a rule allows comes from (ingress) or goes to (egress).
#[derive(Clone, Debug)]
pub(crate) enum Peer {
    /// Members of the group the rule belongs to.
    Itself,
    Group(Output<String>),
    Cidr(String),
}

impl Peer {
    pub(crate) fn host(ip: Ipv4Addr) -> Self {
        Peer::Cidr(format!("{}/32", ip))
    }
}

/// A security group rule. Rules allow all traffic unless narrowed with [`Rule::tcp`].
#[derive(Clone, Debug)]
pub(crate) struct Rule {
    name: String,
    direction: Direction,
    peer: Peer,
    protocol: &'static str,
    port: u16,
    description: Option<String>,
}

impl Rule {
    pub(crate) fn ingress<S: Into<String>>(name: S, peer: Peer) -> Self {
        Self {
            name: name.into(),
            direction: Direction::Ingress,
            peer,
            protocol: ALL_PROTOCOLS,
            port: 0,
            description: None,
        }
    }

    /// Unrestricted egress.
    pub(crate) fn egress<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            direction: Direction::Egress,
            peer: Peer::Cidr(ANY_CIDR.to_string()),
            protocol: ALL_PROTOCOLS,
            port: 0,
            description: None,
        }
    }

    /// Only allow TCP traffic on `port`.
    pub(crate) fn tcp(mut self, port: u16) -> Self {
        self.protocol = TCP;
        self.port = port;
        self
    }

    pub(crate) fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Describe the rule as a member of `group_id`.
    pub(crate) fn describe(self, group_id: &Output<String>) -> ResourceDescription {
        let description = ResourceDescription::new(SECURITY_GROUP_RULE, self.name)
            .input("type", self.direction.as_str())
            .input("protocol", self.protocol)
            .input("fromPort", self.port)
            .input("toPort", self.port)
            .input("securityGroupId", group_id)
            .optional_input("description", self.description);
        match self.peer {
            Peer::Itself => description.input("self", true),
            Peer::Group(source) => description.input("sourceSecurityGroupId", source),
            Peer::Cidr(cidr) => description.input("cidrBlocks", Input::list(vec![cidr])),
        }
    }
}

/// Describe a security group in `vpc_id`.
pub(crate) fn security_group<S: Into<String>>(
    name: S,
    description: &str,
    vpc_id: &Output<String>,
    tags: &BTreeMap<String, String>,
) -> ResourceDescription {
    let name = name.into();
    ResourceDescription::new(SECURITY_GROUP, name.clone())
        .input("name", name)
        .input("description", description)
        .input("vpcId", vpc_id)
        .input("tags", Input::object(tags.clone()))
}

#[cfg(test)]
mod test {
    use super::*;
    use infra_model::Urn;
    use serde_json::json;

    #[test]
    fn workstation_ingress_is_a_single_host() {
        let group = Urn::new(SECURITY_GROUP, "dev-public-sg").output::<String>("id");
        let rule = Rule::ingress("ssh", Peer::host(Ipv4Addr::new(203, 0, 113, 7)))
            .tcp(22)
            .describe(&group);
        let inputs = rule.inputs();
        assert_eq!(inputs["cidrBlocks"].render(), json!(["203.0.113.7/32"]));
        assert_eq!(inputs["protocol"].render(), json!("tcp"));
        assert_eq!(inputs["fromPort"].render(), json!(22));
        assert_eq!(inputs["toPort"].render(), json!(22));
        assert_eq!(inputs["type"].render(), json!("ingress"));
    }

    #[test]
    fn egress_allows_everything() {
        let group = Urn::new(SECURITY_GROUP, "dev-public-sg").output::<String>("id");
        let rule = Rule::egress("out").describe(&group);
        let inputs = rule.inputs();
        assert_eq!(inputs["cidrBlocks"].render(), json!(["0.0.0.0/0"]));
        assert_eq!(inputs["protocol"].render(), json!("-1"));
        assert_eq!(inputs["fromPort"].render(), json!(0));
    }
}
