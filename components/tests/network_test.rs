pub(crate) mod mock;

use infra_components::constants::{
    EIP, NAT_GATEWAY, ROUTE, ROUTE_TABLE, ROUTE_TABLE_ASSOCIATION, SECURITY_GROUP_RULE, SUBNET,
};
use infra_components::{build_network, Lookups};
use infra_model::constants::NETWORK_COMPONENT;
use infra_model::{Describe, Stack, Urn};
use infra_types::NetworkConfig;
use maplit::btreemap;
use mock::{planned, MockLookup};
use serde_json::json;

fn config(subnet_count: u32) -> NetworkConfig {
    NetworkConfig {
        name: "dev".to_string(),
        subnet_count,
        port_list: vec![22, 443],
        vpc_tags: btreemap! {"Environment".to_string() => "dev".to_string()},
        sg_tags: btreemap! {"Environment".to_string() => "dev".to_string()},
    }
}

#[tokio::test]
async fn unsupported_subnet_count_describes_nothing() {
    let lookup = MockLookup::new();
    for count in [0, 1, 4] {
        let mut stack = Stack::new("test");
        let err = build_network(&mut stack, Lookups::from_one(&lookup), &config(count))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "Unsupported amount of subnets! 2 or 3 supported. {} entered",
                count
            )
        );
        assert!(stack.is_empty());
    }
}

#[tokio::test]
async fn workstation_ip_failure_describes_nothing() {
    let lookup = MockLookup::without_workstation_ip();
    let mut stack = Stack::new("test");
    assert!(
        build_network(&mut stack, Lookups::from_one(&lookup), &config(2))
            .await
            .is_err()
    );
    assert!(stack.is_empty());
}

#[tokio::test]
async fn too_few_zones_describes_nothing() {
    let lookup = MockLookup::with_one_zone();
    let mut stack = Stack::new("test");
    assert!(
        build_network(&mut stack, Lookups::from_one(&lookup), &config(2))
            .await
            .is_err()
    );
    assert!(stack.is_empty());
}

#[tokio::test]
async fn private_subnets_share_one_nat_gateway() {
    let lookup = MockLookup::new();
    for count in [2, 3] {
        let mut stack = Stack::new("test");
        let network = build_network(&mut stack, Lookups::from_one(&lookup), &config(count))
            .await
            .unwrap();
        let plan = stack.plan().unwrap();
        let count = count as usize;

        assert_eq!(plan.of_kind(NAT_GATEWAY).count(), 1);
        assert_eq!(plan.of_kind(EIP).count(), 1);
        assert_eq!(plan.of_kind(ROUTE_TABLE).count(), 2);
        assert_eq!(plan.of_kind(ROUTE).count(), 2);
        assert_eq!(plan.of_kind(SUBNET).count(), count);
        assert_eq!(plan.of_kind(ROUTE_TABLE_ASSOCIATION).count(), count);
        assert_eq!(network.public_subnet_ids.len(), 1);
        assert_eq!(network.private_subnet_ids.len(), count - 1);

        let nat = planned(&plan, NAT_GATEWAY, "dev-nat");
        assert_eq!(
            nat.inputs["subnetId"],
            json!("${aws:ec2:Subnet::dev-0-public-subnet.id}")
        );
        let private_route = planned(&plan, ROUTE, "dev-private-route");
        assert_eq!(
            private_route.inputs["natGatewayId"],
            json!("${aws:ec2:NatGateway::dev-nat.id}")
        );
        assert_eq!(private_route.inputs["destinationCidrBlock"], json!("0.0.0.0/0"));
        for index in 1..count {
            let association = planned(
                &plan,
                ROUTE_TABLE_ASSOCIATION,
                &format!("dev-{}-private-subnet-rt-assoc", index),
            );
            assert_eq!(
                association.inputs["routeTableId"],
                json!("${aws:ec2:RouteTable::dev-private-rt.id}")
            );
        }
    }
}

#[tokio::test]
async fn subnets_follow_their_index() {
    let lookup = MockLookup::new();
    let mut stack = Stack::new("test");
    build_network(&mut stack, Lookups::from_one(&lookup), &config(3))
        .await
        .unwrap();
    let plan = stack.plan().unwrap();

    let public = planned(&plan, SUBNET, "dev-0-public-subnet");
    assert_eq!(public.inputs["cidrBlock"], json!("10.0.0.0/24"));
    assert_eq!(public.inputs["mapPublicIpOnLaunch"], json!(true));
    assert_eq!(public.inputs["availabilityZoneId"], json!("usw2-az1"));
    assert_eq!(public.inputs["tags"], json!({"Environment": "dev"}));

    let private = planned(&plan, SUBNET, "dev-2-private-subnet");
    assert_eq!(private.inputs["cidrBlock"], json!("10.0.2.0/24"));
    assert_eq!(private.inputs["mapPublicIpOnLaunch"], json!(false));
    assert_eq!(private.inputs["availabilityZoneId"], json!("usw2-az3"));
}

#[tokio::test]
async fn security_group_rules_are_symmetric() {
    let lookup = MockLookup::new();
    let mut stack = Stack::new("test");
    build_network(&mut stack, Lookups::from_one(&lookup), &config(2))
        .await
        .unwrap();
    let plan = stack.plan().unwrap();
    assert_eq!(plan.of_kind(SECURITY_GROUP_RULE).count(), 7);

    let from_private = planned(&plan, SECURITY_GROUP_RULE, "dev-public-ingress-from-private");
    assert_eq!(
        from_private.inputs["securityGroupId"],
        json!("${aws:ec2:SecurityGroup::dev-public-sg.id}")
    );
    assert_eq!(
        from_private.inputs["sourceSecurityGroupId"],
        json!("${aws:ec2:SecurityGroup::dev-private-sg.id}")
    );
    let from_public = planned(&plan, SECURITY_GROUP_RULE, "dev-private-ingress-from-public");
    assert_eq!(
        from_public.inputs["securityGroupId"],
        json!("${aws:ec2:SecurityGroup::dev-private-sg.id}")
    );
    assert_eq!(
        from_public.inputs["sourceSecurityGroupId"],
        json!("${aws:ec2:SecurityGroup::dev-public-sg.id}")
    );

    let ssh = planned(&plan, SECURITY_GROUP_RULE, "dev-public-ingress-from-current-ip");
    assert_eq!(ssh.inputs["cidrBlocks"], json!(["203.0.113.7/32"]));
    assert_eq!(ssh.inputs["protocol"], json!("tcp"));
    assert_eq!(ssh.inputs["fromPort"], json!(22));
    assert_eq!(ssh.inputs["toPort"], json!(22));

    // Ports are recorded but never turned into rules.
    let component = planned(&plan, NETWORK_COMPONENT, "dev");
    assert_eq!(component.inputs["portList"], json!([22, 443]));
    assert!(plan
        .of_kind(SECURITY_GROUP_RULE)
        .all(|rule| rule.inputs["fromPort"] != json!(443)));
}

#[tokio::test]
async fn everything_belongs_to_the_network() {
    let lookup = MockLookup::new();
    let mut stack = Stack::new("test");
    let network = build_network(&mut stack, Lookups::from_one(&lookup), &config(3))
        .await
        .unwrap();
    let component = Urn::new(NETWORK_COMPONENT, "dev");
    assert_eq!(network.urn(), &component);
    assert_eq!(stack.children(&component).count(), stack.len() - 1);

    let layers = stack.creation_order().unwrap();
    assert_eq!(layers[0], vec![component]);
}
