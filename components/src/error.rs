use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Unable to look up the '{}' image: {}", name_pattern, source))]
    ImageLookup {
        name_pattern: String,
        source: infra_utils::Error,
    },

    #[snafu(display("Instance '{}' has an invalid role: {}", name, message))]
    InstanceRole { name: String, message: String },

    #[snafu(display("Unable to generate an RSA key: {}", source))]
    KeypairGenerate { source: rsa::Error },

    #[snafu(display("Unable to encode the private key as PKCS#8 PEM: {}", source))]
    KeypairPrivate { source: rsa::pkcs8::Error },

    #[snafu(display("Unable to encode the public key in OpenSSH format: {}", source))]
    KeypairPublic { source: ssh_key::Error },

    #[snafu(display("'{}' requires '{}' when it is described on its own", component, field))]
    MissingField { component: String, field: String },

    #[snafu(display(
        "Attempted to describe '{}' before its {} was described",
        resource,
        prerequisite
    ))]
    MissingPrerequisite {
        resource: String,
        prerequisite: String,
    },

    #[snafu(display("Instance '{}' is missing the required '{}' tag", name, tag))]
    MissingTag { name: String, tag: String },

    #[snafu(display("{}", source))]
    Model { source: infra_model::Error },

    #[snafu(display(
        "{} subnets need {} availability zones but only {} were found",
        wanted,
        wanted,
        found
    ))]
    NotEnoughZones { wanted: usize, found: usize },

    #[snafu(display("Unsupported amount of subnets! 2 or 3 supported. {} entered", count))]
    SubnetCount { count: u32 },

    #[snafu(display("Invalid Kubernetes version for cluster '{}': {}", name, message))]
    Version { name: String, message: String },

    #[snafu(display("Unable to look up the workstation IP: {}", source))]
    WorkstationIp { source: infra_utils::Error },

    #[snafu(display("Unable to look up availability zones: {}", source))]
    ZoneLookup { source: infra_utils::Error },
}

impl From<infra_model::Error> for Error {
    fn from(source: infra_model::Error) -> Self {
        Error::Model { source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
