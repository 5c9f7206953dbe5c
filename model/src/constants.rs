/// Helper macro to avoid retyping the namespace of our component kinds. When given no parameters,
/// this returns the namespace. When given a string literal parameter it adds `:parameter` to the
/// end.
macro_rules! infra {
    () => {
        "infra"
    };
    ($s:literal) => {
        concat!(infra!(), ":", $s)
    };
}

// Component kinds
pub const NETWORK_COMPONENT: &str = infra!("network:Network");
pub const CLUSTER_COMPONENT: &str = infra!("compute:Cluster");
pub const INSTANCE_COMPONENT: &str = infra!("compute:Instance");
pub const STACK_COMPONENT: &str = infra!("stack:Stack");

/// The separator between a resource's kind and its name in a URN.
pub const URN_SEPARATOR: &str = "::";

/// The stack name used when none is given.
pub const DEFAULT_STACK_NAME: &str = "dev";
