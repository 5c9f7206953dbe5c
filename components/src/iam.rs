use crate::constants::{INSTANCE_PROFILE, POLICY_ARN_PREFIX, ROLE, ROLE_POLICY_ATTACHMENT};
use infra_model::{ResourceDescription, Urn};
use serde_json::{json, Value};

/// A trust policy that lets `service` assume a role.
pub(crate) fn assume_role_policy(service: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": {
                "Service": service
            },
            "Action": "sts:AssumeRole"
        }]
    })
}

pub(crate) fn role(name: &str, description: &str, service: &str) -> ResourceDescription {
    ResourceDescription::new(ROLE, name)
        .input("name", name)
        .input("description", description)
        .input("assumeRolePolicy", assume_role_policy(service))
}

/// Attach the AWS managed policy `policy` to `role`.
pub(crate) fn policy_attachment(role: &Urn, policy: &str) -> ResourceDescription {
    ResourceDescription::new(
        ROLE_POLICY_ATTACHMENT,
        format!("{}-{}", role.name(), policy),
    )
    .input("role", role.output::<String>("name"))
    .input("policyArn", format!("{}{}", POLICY_ARN_PREFIX, policy))
}

pub(crate) fn instance_profile(name: &str, role: &Urn) -> ResourceDescription {
    ResourceDescription::new(INSTANCE_PROFILE, name)
        .input("name", name)
        .input("role", role.output::<String>("name"))
}
