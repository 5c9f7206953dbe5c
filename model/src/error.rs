use snafu::Snafu;

#[derive(Debug, Snafu)]
pub struct Error(OpaqueError);
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum OpaqueError {
    #[snafu(display("Error deserializing configuration: {}", source))]
    ConfigDeserialization { source: serde_json::Error },

    #[snafu(display("Error serializing configuration: {}", source))]
    ConfigSerialization { source: serde_json::Error },

    #[snafu(display(
        "Error serializing configuration: expected Value::Object type but got something else."
    ))]
    ConfigWrongValueType {},

    #[snafu(display(
        "Dependency cycle detected, {} resources could not be ordered",
        remaining
    ))]
    Cycle { remaining: usize },

    #[snafu(display("Unable to deserialize '{}': {}", reference, source))]
    Deserialize {
        reference: String,
        source: serde_json::Error,
    },

    #[snafu(display("Resource '{}' has already been described", urn))]
    DuplicateResource { urn: String },

    #[snafu(display("Unable to serialize output value: {}", source))]
    Serialize { source: serde_json::Error },

    #[snafu(display("Unable to transform output value: {}", source))]
    Transform {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[snafu(display(
        "Resource '{}' depends on '{}' which has not been described",
        resource,
        dependency
    ))]
    UnknownDependency { resource: String, dependency: String },

    #[snafu(display("Resource '{}' has not been described", urn))]
    UnknownResource { urn: String },

    #[snafu(display("'{}' has not been resolved", reference))]
    Unresolved { reference: String },

    #[snafu(display("'{}' is not a valid URN, expected 'kind::name'", value))]
    UrnParse { value: String },
}
