/*!

This test module provides mock lookups so that builders can be tested without AWS. The mocks answer
from fixed values and remember the image queries they were asked.

!*/

use infra_model::{Plan, PlannedResource, Urn};
use infra_utils::{ImageLookup, ImageQuery, Result, StaticLookup, WorkstationIp, ZoneLookup};
use std::net::Ipv4Addr;
use std::sync::Mutex;

pub(crate) const IMAGE_ID: &str = "ami-0123456789abcdef0";
pub(crate) const WORKSTATION_IP: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 7);
pub(crate) const ZONE_IDS: [&str; 3] = ["usw2-az1", "usw2-az2", "usw2-az3"];

/// Answers every lookup and records the image queries it receives.
pub(crate) struct MockLookup {
    answers: StaticLookup,
    queries: Mutex<Vec<ImageQuery>>,
}

impl MockLookup {
    pub(crate) fn new() -> Self {
        Self::from_static(
            StaticLookup::default()
                .with_image_id(IMAGE_ID)
                .with_zone_ids(ZONE_IDS)
                .with_workstation_ip(WORKSTATION_IP),
        )
    }

    /// A lookup that knows zones and the workstation IP but finds no images.
    pub(crate) fn without_images() -> Self {
        Self::from_static(
            StaticLookup::default()
                .with_zone_ids(ZONE_IDS)
                .with_workstation_ip(WORKSTATION_IP),
        )
    }

    /// A lookup that only knows about a single availability zone.
    pub(crate) fn with_one_zone() -> Self {
        Self::from_static(
            StaticLookup::default()
                .with_image_id(IMAGE_ID)
                .with_zone_ids(["usw2-az1"])
                .with_workstation_ip(WORKSTATION_IP),
        )
    }

    /// A lookup that cannot tell where the operator is.
    pub(crate) fn without_workstation_ip() -> Self {
        Self::from_static(
            StaticLookup::default()
                .with_image_id(IMAGE_ID)
                .with_zone_ids(ZONE_IDS),
        )
    }

    fn from_static(answers: StaticLookup) -> Self {
        Self {
            answers,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn queries(&self) -> Vec<ImageQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ImageLookup for MockLookup {
    async fn most_recent_image(&self, query: &ImageQuery) -> Result<String> {
        self.queries.lock().unwrap().push(query.clone());
        self.answers.most_recent_image(query).await
    }
}

#[async_trait::async_trait]
impl ZoneLookup for MockLookup {
    async fn zone_ids(&self) -> Result<Vec<String>> {
        self.answers.zone_ids().await
    }
}

#[async_trait::async_trait]
impl WorkstationIp for MockLookup {
    async fn workstation_ip(&self) -> Result<Ipv4Addr> {
        self.answers.workstation_ip().await
    }
}

/// The planned resource `kind::name`, panicking if it was not described.
pub(crate) fn planned<'a>(plan: &'a Plan, kind: &str, name: &str) -> &'a PlannedResource {
    plan.get(&Urn::new(kind, name))
        .unwrap_or_else(|| panic!("'{}::{}' was not described", kind, name))
}
