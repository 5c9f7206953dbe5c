use assert_cmd::Command;
use std::path::PathBuf;

fn samples_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("types")
        .join("samples")
}

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
}

/// A command that never needs to reach AWS or the internet.
fn infra() -> Command {
    let mut cmd = Command::cargo_bin("infra").unwrap();
    cmd.args(&[
        "--ami",
        "ami-0123456789abcdef0",
        "--zone-id",
        "usw2-az1",
        "--zone-id",
        "usw2-az2",
        "--zone-id",
        "usw2-az3",
        "--workstation-ip",
        "203.0.113.7",
    ]);
    cmd
}

fn kinds(plan: &serde_json::Value) -> Vec<String> {
    plan["resources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|resource| resource["kind"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn network_plan() {
    let output = infra()
        .arg("network")
        .arg(samples_dir().join("network.yaml"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["stack"], "dev");
    let kinds = kinds(&plan);
    assert_eq!(kinds[0], "infra:network:Network");
    assert_eq!(kinds.iter().filter(|k| *k == "aws:ec2:Subnet").count(), 3);
    assert_eq!(kinds.iter().filter(|k| *k == "aws:ec2:NatGateway").count(), 1);
}

#[test]
fn unsupported_subnet_count_fails() {
    let mut cmd = infra();
    cmd.arg("network")
        .arg(data_dir().join("unsupported-network.yaml"));
    let output = cmd.output().unwrap();
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("Unsupported amount of subnets! 2 or 3 supported. 4 entered"));
}

#[test]
fn cluster_plan_as_yaml() {
    let output = infra()
        .args(&["--format", "yaml", "cluster"])
        .arg(samples_dir().join("cluster.yaml"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let plan: serde_yaml::Value = serde_yaml::from_slice(&output.stdout).unwrap();
    let resources = plan["resources"].as_sequence().unwrap();
    assert!(resources
        .iter()
        .any(|resource| resource["urn"] == serde_yaml::Value::from("aws:eks:Cluster::dev-cluster")));
}

#[test]
fn instance_plan() {
    let output = infra()
        .arg("instance")
        .arg(samples_dir().join("instance.yaml"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let instance = plan["resources"]
        .as_array()
        .unwrap()
        .iter()
        .find(|resource| resource["kind"] == "aws:ec2:Instance")
        .unwrap();
    assert_eq!(instance["inputs"]["associatePublicIpAddress"], true);
    assert_eq!(instance["inputs"]["ami"], "ami-0123456789abcdef0");
}

#[test]
fn stack_plan() {
    let output = infra()
        .arg("stack")
        .arg(samples_dir().join("stack.yaml"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["stack"], "demo");
    let kinds = kinds(&plan);
    assert_eq!(kinds[0], "infra:stack:Stack");
    assert!(kinds.contains(&"aws:ec2:KeyPair".to_string()));
    assert!(kinds.contains(&"aws:eks:Cluster".to_string()));
}

#[test]
fn stack_name_flag_overrides_the_configured_name() {
    let output = infra()
        .args(&["--stack-name", "staging", "stack"])
        .arg(samples_dir().join("stack.yaml"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["stack"], "staging");
}

#[test]
fn stack_name_flag_names_a_network() {
    let output = infra()
        .args(&["--stack-name", "staging", "network"])
        .arg(samples_dir().join("network.yaml"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["stack"], "staging");
}

#[test]
fn public_key_only() {
    let mut cmd = Command::cargo_bin("infra").unwrap();
    cmd.args(&["keypair", "--public-only"]);
    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("ssh-rsa "));
    assert_eq!(stdout.lines().count(), 1);
}
