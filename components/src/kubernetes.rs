use crate::constants::{AWS_AUTH_NAME, AWS_AUTH_NAMESPACE, CONFIG_MAP, NODE_GROUPS, NODE_USERNAME};
use infra_model::{Output, ResourceDescription};
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::Resource;
use maplit::btreemap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

/// One entry of the `mapRoles` document in the `aws-auth` config map.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MapRole {
    pub rolearn: String,
    pub username: String,
    pub groups: Vec<String>,
}

pub fn aws_auth_metadata() -> ObjectMeta {
    ObjectMeta {
        name: Some(AWS_AUTH_NAME.to_string()),
        namespace: Some(AWS_AUTH_NAMESPACE.to_string()),
        ..ObjectMeta::default()
    }
}

/// The data of the `aws-auth` config map that lets nodes using `worker_role_arn` join the cluster.
pub fn aws_auth_data(worker_role_arn: &str) -> Result<BTreeMap<String, String>, serde_yaml::Error> {
    let map_roles = vec![MapRole {
        rolearn: worker_role_arn.to_string(),
        username: NODE_USERNAME.to_string(),
        groups: NODE_GROUPS.iter().map(|group| group.to_string()).collect(),
    }];
    Ok(btreemap! {
        "mapRoles".to_string() => to_yaml(&map_roles)?,
    })
}

/// Describe the `aws-auth` config map as `name`. Its data is deferred until the worker role exists.
pub fn aws_auth_config_map(name: &str, worker_role_arn: &Output<String>) -> ResourceDescription {
    ResourceDescription::new(CONFIG_MAP, name)
        .input("apiVersion", ConfigMap::API_VERSION)
        .input("kind", ConfigMap::KIND)
        .input("metadata", Output::known(aws_auth_metadata()))
        .input(
            "data",
            worker_role_arn
                .clone()
                .try_map(|arn| aws_auth_data(&arn)),
        )
}

/// A kubeconfig for the cluster that authenticates with `aws eks get-token`.
pub fn kubeconfig(
    cluster_name: &str,
    endpoint: &str,
    certificate_authority: &str,
) -> Result<String, serde_yaml::Error> {
    to_yaml(&json!({
        "apiVersion": "v1",
        "kind": "Config",
        "clusters": [{
            "name": cluster_name,
            "cluster": {
                "server": endpoint,
                "certificate-authority-data": certificate_authority,
            },
        }],
        "contexts": [{
            "name": cluster_name,
            "context": {
                "cluster": cluster_name,
                "user": cluster_name,
            },
        }],
        "current-context": cluster_name,
        "preferences": {},
        "users": [{
            "name": cluster_name,
            "user": {
                "exec": {
                    "apiVersion": "client.authentication.k8s.io/v1beta1",
                    "command": "aws",
                    "args": ["eks", "get-token", "--cluster-name", cluster_name],
                },
            },
        }],
    }))
}

fn to_yaml<T: Serialize>(value: &T) -> Result<String, serde_yaml::Error> {
    let yaml = serde_yaml::to_string(value)?;
    Ok(yaml.trim_start_matches("---\n").to_string())
}
