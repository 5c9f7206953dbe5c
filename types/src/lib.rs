/*!

This library provides the parameter structures that infrastructure components are described from.
They are normally read from YAML documents. Some of the samples in the `samples` directory show
what these documents look like.

!*/

pub mod component_config;

pub use component_config::{
    ClusterConfig, InstanceConfig, InstanceRole, K8sVersion, NetworkConfig, StackConfig,
};
