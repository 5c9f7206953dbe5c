/*!

Builders that describe AWS infrastructure into an [`infra_model::Stack`]: a network with public and
private subnets, a managed Kubernetes cluster with a fixed size worker pool, single EC2 instances,
and a full environment composed of all three. Builders never call the cloud for anything other than
lookups; everything they describe is handed to an external engine through the stack's plan.

!*/

pub mod cluster;
pub mod composition;
pub mod constants;
pub mod error;
pub mod instance;
pub mod keypair;
pub mod kubernetes;
pub mod network;
mod iam;
mod security_group;
pub mod userdata;

pub use cluster::{build_cluster, Cluster, ClusterArgs};
pub use composition::{build_stack, Environment};
pub use error::{Error, Result};
pub use instance::{build_instance, Instance, InstanceArgs};
pub use keypair::Keypair;
pub use network::{build_network, Network, SubnetPlan, SubnetRole};

use infra_utils::{ImageLookup, WorkstationIp, ZoneLookup};

/// The external collaborators a builder may consult while describing resources.
#[derive(Clone, Copy)]
pub struct Lookups<'a> {
    pub images: &'a dyn ImageLookup,
    pub zones: &'a dyn ZoneLookup,
    pub workstation: &'a dyn WorkstationIp,
}

impl<'a> Lookups<'a> {
    pub fn new(
        images: &'a dyn ImageLookup,
        zones: &'a dyn ZoneLookup,
        workstation: &'a dyn WorkstationIp,
    ) -> Self {
        Self {
            images,
            zones,
            workstation,
        }
    }

    /// Use a single implementation for every lookup.
    pub fn from_one<L>(lookup: &'a L) -> Self
    where
        L: ImageLookup + ZoneLookup + WorkstationIp,
    {
        Self::new(lookup, lookup, lookup)
    }
}
