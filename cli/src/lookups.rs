use infra_components::Lookups;
use infra_utils::aws::{sdk_config, Ec2Lookup};
use infra_utils::{
    CheckIpLookup, ImageLookup, ImageQuery, Result, StaticLookup, WorkstationIp, ZoneLookup,
};
use log::debug;
use std::net::Ipv4Addr;

/// Values that replace lookups against AWS and checkip.amazonaws.com.
#[derive(Debug, clap::Args)]
pub(crate) struct LookupOverrides {
    /// The AWS region to look up images and availability zones in. The default provider chain's
    /// region is used if this is not provided.
    #[clap(long)]
    region: Option<String>,

    /// Use this image instead of looking up the most recent one.
    #[clap(long)]
    ami: Option<String>,

    /// Use these availability zone ids instead of looking them up. May be repeated.
    #[clap(long = "zone-id")]
    zone_ids: Vec<String>,

    /// Use this address instead of asking checkip.amazonaws.com.
    #[clap(long = "workstation-ip")]
    workstation_ip: Option<Ipv4Addr>,
}

/// Answers lookups from command line overrides where they were given, and from AWS otherwise. An
/// EC2 client is only created when an override is missing.
pub(crate) struct CliLookup {
    overrides: StaticLookup,
    ec2: Option<Ec2Lookup>,
    checkip: CheckIpLookup,
}

impl CliLookup {
    pub(crate) async fn new(args: &LookupOverrides) -> Self {
        let overrides = StaticLookup {
            image_id: args.ami.clone(),
            zone_ids: args.zone_ids.clone(),
            workstation_ip: args.workstation_ip,
        };
        let ec2 = if overrides.image_id.is_none() || overrides.zone_ids.is_empty() {
            Some(Ec2Lookup::new(&sdk_config(args.region.as_deref()).await))
        } else {
            debug!("Images and availability zones were given, not creating an EC2 client");
            None
        };
        Self {
            overrides,
            ec2,
            checkip: CheckIpLookup::default(),
        }
    }

    pub(crate) fn lookups(&self) -> Lookups<'_> {
        Lookups::from_one(self)
    }
}

#[async_trait::async_trait]
impl ImageLookup for CliLookup {
    async fn most_recent_image(&self, query: &ImageQuery) -> Result<String> {
        match (&self.overrides.image_id, &self.ec2) {
            (None, Some(ec2)) => ec2.most_recent_image(query).await,
            _ => self.overrides.most_recent_image(query).await,
        }
    }
}

#[async_trait::async_trait]
impl ZoneLookup for CliLookup {
    async fn zone_ids(&self) -> Result<Vec<String>> {
        match (self.overrides.zone_ids.is_empty(), &self.ec2) {
            (true, Some(ec2)) => ec2.zone_ids().await,
            _ => self.overrides.zone_ids().await,
        }
    }
}

#[async_trait::async_trait]
impl WorkstationIp for CliLookup {
    async fn workstation_ip(&self) -> Result<Ipv4Addr> {
        match self.overrides.workstation_ip {
            Some(_) => self.overrides.workstation_ip().await,
            None => self.checkip.workstation_ip().await,
        }
    }
}
