use crate::error::{self, Result};
use crate::lookup::{ImageLookup, ImageQuery, ZoneLookup};
use aws_sdk_ec2::model::Filter;
use aws_types::region::Region;
use aws_types::SdkConfig;
use log::{debug, info};
use snafu::{OptionExt, ResultExt};

/// Load the aws config from the environment, using `region` if one is provided and the default
/// provider chain's region otherwise.
pub async fn sdk_config(region: Option<&str>) -> SdkConfig {
    let mut config_loader = aws_config::from_env();
    if let Some(region) = region {
        info!(
            "Creating a custom region provider for '{}' to be used in the aws config.",
            region
        );
        config_loader = config_loader.region(Region::new(region.to_string()));
    }
    config_loader.load().await
}

/// Answers image and availability zone lookups with EC2 API calls.
#[derive(Clone, Debug)]
pub struct Ec2Lookup {
    client: aws_sdk_ec2::Client,
}

impl Ec2Lookup {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_ec2::Client::new(config),
        }
    }
}

#[async_trait::async_trait]
impl ImageLookup for Ec2Lookup {
    async fn most_recent_image(&self, query: &ImageQuery) -> Result<String> {
        info!("Looking up the most recent image for query:\n{}", query);
        let images = self
            .client
            .describe_images()
            .set_owners(Some(query.owners.clone()))
            .filters(
                Filter::builder()
                    .name("name")
                    .values(&query.name_pattern)
                    .build(),
            )
            .send()
            .await
            .context(error::DescribeImagesSnafu {
                name_pattern: &query.name_pattern,
            })?
            .images
            .unwrap_or_default();
        let image_id = newest(images.iter().filter_map(|image| {
            Some((image.creation_date()?, image.image_id()?))
        }))
        .context(error::NoImageSnafu {
            owners: query.owners.clone(),
            name_pattern: &query.name_pattern,
        })?;
        debug!("'{}' resolved to '{}'", query.name_pattern, image_id);
        Ok(image_id.to_string())
    }
}

#[async_trait::async_trait]
impl ZoneLookup for Ec2Lookup {
    async fn zone_ids(&self) -> Result<Vec<String>> {
        let zone_ids: Vec<String> = self
            .client
            .describe_availability_zones()
            .send()
            .await
            .context(error::DescribeAvailabilityZonesSnafu)?
            .availability_zones
            .unwrap_or_default()
            .into_iter()
            .filter_map(|zone| zone.zone_id)
            .collect();
        if zone_ids.is_empty() {
            return error::NoZonesSnafu.fail();
        }
        debug!("Availability zones: {:?}", zone_ids);
        Ok(zone_ids)
    }
}

/// Pick the id of the newest image from `(creation date, image id)` pairs. Creation dates are ISO
/// 8601 timestamps, so they order lexically.
pub(crate) fn newest<'a, I>(images: I) -> Option<&'a str>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    images
        .into_iter()
        .max_by(|(left, _), (right, _)| left.cmp(right))
        .map(|(_, image_id)| image_id)
}
