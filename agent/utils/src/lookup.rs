use crate::constants::CHECKIP_URL;
use crate::error::{self, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt};
use std::net::Ipv4Addr;

/// A search for the newest machine image published by one of `owners` whose name matches
/// `name_pattern` (`*` is a wildcard).
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageQuery {
    pub owners: Vec<String>,
    pub name_pattern: String,
}

crate::impl_display_as_json!(ImageQuery);

impl ImageQuery {
    pub fn new<O, P>(owner: O, name_pattern: P) -> Self
    where
        O: Into<String>,
        P: Into<String>,
    {
        Self {
            owners: vec![owner.into()],
            name_pattern: name_pattern.into(),
        }
    }
}

/// Finds machine images.
#[async_trait::async_trait]
pub trait ImageLookup: Send + Sync {
    /// The id of the most recently created image matching `query`. No match is an error.
    async fn most_recent_image(&self, query: &ImageQuery) -> Result<String>;
}

/// Lists the availability zones of the current region.
#[async_trait::async_trait]
pub trait ZoneLookup: Send + Sync {
    async fn zone_ids(&self) -> Result<Vec<String>>;
}

/// Finds the public address of the operator's workstation so that ingress rules can be scoped to
/// it. Failures must never be replaced with an open CIDR.
#[async_trait::async_trait]
pub trait WorkstationIp: Send + Sync {
    async fn workstation_ip(&self) -> Result<Ipv4Addr>;
}

/// Asks a "what is my IP" service for the workstation's public address.
#[derive(Clone, Debug)]
pub struct CheckIpLookup {
    client: reqwest::Client,
    url: String,
}

impl Default for CheckIpLookup {
    fn default() -> Self {
        Self::new(CHECKIP_URL)
    }
}

impl CheckIpLookup {
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait::async_trait]
impl WorkstationIp for CheckIpLookup {
    async fn workstation_ip(&self) -> Result<Ipv4Addr> {
        info!("Looking up the workstation IP from '{}'", self.url);
        let body = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .context(error::WorkstationIpRequestSnafu { url: &self.url })?
            .text()
            .await
            .context(error::WorkstationIpRequestSnafu { url: &self.url })?;
        parse_ip(&body)
    }
}

/// Parse a response body holding a single dotted-quad address.
pub fn parse_ip(body: &str) -> Result<Ipv4Addr> {
    let trimmed = body.trim();
    let ip = trimmed
        .parse::<Ipv4Addr>()
        .context(error::WorkstationIpParseSnafu { body: trimmed })?;
    debug!("Workstation IP is '{}'", ip);
    Ok(ip)
}

/// Answers every lookup from fixed values. Useful when the operator already knows them, and in
/// tests.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StaticLookup {
    pub image_id: Option<String>,
    pub zone_ids: Vec<String>,
    pub workstation_ip: Option<Ipv4Addr>,
}

impl StaticLookup {
    pub fn with_image_id<S: Into<String>>(mut self, image_id: S) -> Self {
        self.image_id = Some(image_id.into());
        self
    }

    pub fn with_zone_ids<I, S>(mut self, zone_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.zone_ids = zone_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_workstation_ip(mut self, ip: Ipv4Addr) -> Self {
        self.workstation_ip = Some(ip);
        self
    }
}

#[async_trait::async_trait]
impl ImageLookup for StaticLookup {
    async fn most_recent_image(&self, query: &ImageQuery) -> Result<String> {
        debug!("Using the configured image for '{}'", query.name_pattern);
        self.image_id
            .clone()
            .context(error::MissingSnafu { what: "image id" })
    }
}

#[async_trait::async_trait]
impl ZoneLookup for StaticLookup {
    async fn zone_ids(&self) -> Result<Vec<String>> {
        if self.zone_ids.is_empty() {
            return error::MissingSnafu {
                what: "availability zone id",
            }
            .fail();
        }
        Ok(self.zone_ids.clone())
    }
}

#[async_trait::async_trait]
impl WorkstationIp for StaticLookup {
    async fn workstation_ip(&self) -> Result<Ipv4Addr> {
        self.workstation_ip.context(error::MissingSnafu {
            what: "workstation IP",
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_ip_trims_the_body() {
        assert_eq!(
            parse_ip("203.0.113.7\n").unwrap(),
            Ipv4Addr::new(203, 0, 113, 7)
        );
    }

    #[test]
    fn parse_ip_rejects_garbage() {
        assert!(parse_ip("<html>rate limited</html>").is_err());
        assert!(parse_ip("2001:db8::1").is_err());
        assert!(parse_ip("").is_err());
    }

    #[tokio::test]
    async fn static_lookup_fails_when_unset() {
        let lookup = StaticLookup::default();
        assert!(lookup
            .most_recent_image(&ImageQuery::new("amazon", "amzn-ami-hvm-*"))
            .await
            .is_err());
        assert!(lookup.zone_ids().await.is_err());
        assert!(lookup.workstation_ip().await.is_err());
    }

    #[tokio::test]
    async fn static_lookup_answers_with_its_values() {
        let lookup = StaticLookup::default()
            .with_image_id("ami-123")
            .with_zone_ids(["usw2-az1", "usw2-az2"])
            .with_workstation_ip(Ipv4Addr::new(198, 51, 100, 1));
        assert_eq!(
            lookup
                .most_recent_image(&ImageQuery::new("amazon", "amzn-ami-hvm-*"))
                .await
                .unwrap(),
            "ami-123"
        );
        assert_eq!(lookup.zone_ids().await.unwrap(), vec!["usw2-az1", "usw2-az2"]);
        assert_eq!(
            lookup.workstation_ip().await.unwrap(),
            Ipv4Addr::new(198, 51, 100, 1)
        );
    }
}
