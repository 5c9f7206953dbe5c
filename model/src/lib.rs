/*!

This library provides the declarative resource graph that infrastructure components are described
with. Resources are recorded with their inputs, parent and dependencies; values that the cloud
assigns later (ids, endpoints, certificates) are represented as deferred [`Output`] handles that
can only be read once an external engine supplies a [`State`].

!*/

#![deny(
    clippy::expect_used,
    clippy::get_unwrap,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::panicking_unwrap,
    clippy::unwrap_in_result,
    clippy::unwrap_used
)]

pub use configuration::Configuration;
pub use error::{Error, Result};
pub use output::{Output, Reference};
pub use plan::{Plan, PlannedResource};
pub use resource::{Describe, Input, ResourceDescription, Urn};
pub use stack::{Scope, Stack};
pub use state::State;

mod configuration;
pub mod constants;
mod error;
mod output;
mod plan;
mod resource;
mod stack;
mod state;
