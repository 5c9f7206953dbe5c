use crate::constants::BASTION_KEY_FILE;
use infra_model::Output;

/// The boot script of a bastion that writes `private_key` to `bastion.pem`. The key is inserted
/// verbatim.
pub fn bastion_key_writer(private_key: &str) -> String {
    format!("#!/bin/bash\necho {} > {}", private_key, BASTION_KEY_FILE)
}

/// The boot script of a worker node that joins it to `cluster_name`.
pub fn worker_bootstrap(endpoint: &str, certificate_authority: &str, cluster_name: &str) -> String {
    format!(
        "#!/bin/bash\nset -o xtrace\n/etc/eks/bootstrap.sh --apiserver-endpoint {} --b64-cluster-ca {} {}\n",
        endpoint, certificate_authority, cluster_name
    )
}

/// [`worker_bootstrap`] deferred until the cluster's endpoint and certificate authority exist.
pub fn worker_user_data(
    endpoint: Output<String>,
    certificate_authority: Output<String>,
    cluster_name: &str,
) -> Output<String> {
    let cluster_name = cluster_name.to_string();
    endpoint
        .zip(certificate_authority)
        .map(move |(endpoint, ca)| worker_bootstrap(&endpoint, &ca, &cluster_name))
}
