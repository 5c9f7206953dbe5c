pub(crate) mod mock;

use infra_components::constants::INSTANCE;
use infra_components::{build_instance, InstanceArgs, Lookups};
use infra_model::{Stack, State, Urn};
use infra_types::{InstanceConfig, InstanceRole};
use maplit::btreemap;
use mock::{planned, MockLookup, IMAGE_ID};
use serde_json::json;

fn args(role: Option<&str>, private_key: Option<&str>) -> InstanceArgs {
    let mut tags = btreemap! {"Name".to_string() => "dev-server".to_string()};
    if let Some(role) = role {
        tags.insert("type".to_string(), role.to_string());
    }
    InstanceArgs::from_config(InstanceConfig {
        name: "dev-server".to_string(),
        security_groups: vec!["sg-1".to_string()],
        tags,
        subnet_id: Some("subnet-1".to_string()),
        key: Some("dev-keypair".to_string()),
        private_key: private_key.map(str::to_string),
        ..InstanceConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn bastion_writes_its_key_on_boot() {
    let lookup = MockLookup::new();
    for role in ["bastion", "Bastion"] {
        let mut stack = Stack::new("test");
        let instance = build_instance(
            &mut stack,
            Lookups::from_one(&lookup),
            args(Some(role), Some("private_key")),
        )
        .await
        .unwrap();
        assert_eq!(instance.role, InstanceRole::Bastion);
        assert_eq!(
            instance.user_data.as_deref(),
            Some("#!/bin/bash\necho private_key > bastion.pem")
        );

        let plan = stack.plan().unwrap();
        let server = planned(&plan, INSTANCE, "dev-server");
        assert_eq!(
            server.inputs["userData"],
            json!("#!/bin/bash\necho private_key > bastion.pem")
        );
        assert_eq!(server.inputs["associatePublicIpAddress"], json!(true));
        assert_eq!(server.inputs["ami"], json!(IMAGE_ID));
        assert_eq!(server.inputs["instanceType"], json!("t2.micro"));
        assert_eq!(server.inputs["vpcSecurityGroupIds"], json!(["sg-1"]));
        assert_eq!(server.inputs["subnetId"], json!("subnet-1"));
        assert_eq!(server.inputs["keyName"], json!("dev-keypair"));
    }
    let queries = lookup.queries();
    assert_eq!(queries[0].name_pattern, "amzn-ami-hvm-*");
    assert_eq!(queries[0].owners, vec!["amazon".to_string()]);
}

#[tokio::test]
async fn private_instance_never_gets_user_data() {
    let lookup = MockLookup::new();
    for role in ["private", "Private"] {
        let mut stack = Stack::new("test");
        let instance = build_instance(
            &mut stack,
            Lookups::from_one(&lookup),
            args(Some(role), Some("private_key")),
        )
        .await
        .unwrap();
        assert_eq!(instance.role, InstanceRole::Private);
        assert!(instance.user_data.is_none());

        let plan = stack.plan().unwrap();
        let server = planned(&plan, INSTANCE, "dev-server");
        assert!(!server.inputs.contains_key("userData"));
        assert_eq!(server.inputs["associatePublicIpAddress"], json!(false));
    }
}

#[tokio::test]
async fn bastion_without_a_key_has_no_user_data() {
    let lookup = MockLookup::new();
    let mut stack = Stack::new("test");
    let instance = build_instance(
        &mut stack,
        Lookups::from_one(&lookup),
        args(Some("bastion"), None),
    )
    .await
    .unwrap();
    assert!(instance.user_data.is_none());
}

#[tokio::test]
async fn role_tag_is_required_and_exact() {
    let lookup = MockLookup::new();
    let mut stack = Stack::new("test");
    let err = build_instance(&mut stack, Lookups::from_one(&lookup), args(None, None))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("'type'"));

    for role in ["BASTION", "worker", ""] {
        let err = build_instance(
            &mut stack,
            Lookups::from_one(&lookup),
            args(Some(role), None),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains(&format!("'{}'", role)));
    }
    assert!(stack.is_empty());
    assert!(lookup.queries().is_empty());
}

#[tokio::test]
async fn image_lookup_failure_describes_nothing() {
    let lookup = MockLookup::without_images();
    let mut stack = Stack::new("test");
    assert!(build_instance(
        &mut stack,
        Lookups::from_one(&lookup),
        args(Some("bastion"), None)
    )
    .await
    .is_err());
    assert!(stack.is_empty());
}

#[tokio::test]
async fn addresses_come_from_the_engine() {
    let lookup = MockLookup::new();
    let mut stack = Stack::new("test");
    let instance = build_instance(
        &mut stack,
        Lookups::from_one(&lookup),
        args(Some("bastion"), None),
    )
    .await
    .unwrap();
    assert!(instance.public_dns.resolve(&State::default()).is_err());
    let state = State::default().with(
        Urn::new(INSTANCE, "dev-server"),
        json!({"publicDns": "ec2-203-0-113-9.compute-1.amazonaws.com", "privateIp": "10.0.0.12"}),
    );
    assert_eq!(
        instance.public_dns.resolve(&state).unwrap(),
        "ec2-203-0-113-9.compute-1.amazonaws.com"
    );
    assert_eq!(instance.private_ip.resolve(&state).unwrap(), "10.0.0.12");
}
