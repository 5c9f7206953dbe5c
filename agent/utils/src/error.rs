use aws_sdk_ec2::error::{DescribeAvailabilityZonesError, DescribeImagesError};
use aws_sdk_ec2::types::SdkError;
use snafu::Snafu;
use std::net::AddrParseError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[allow(clippy::large_enum_variant)]
pub enum Error {
    #[snafu(display("Unable to describe availability zones: {}", source))]
    DescribeAvailabilityZones {
        source: SdkError<DescribeAvailabilityZonesError>,
    },

    #[snafu(display("Unable to describe images matching '{}': {}", name_pattern, source))]
    DescribeImages {
        name_pattern: String,
        source: SdkError<DescribeImagesError>,
    },

    #[snafu(display("No {} was configured", what))]
    Missing { what: String },

    #[snafu(display(
        "No image owned by '{}' matches '{}'",
        owners.join(", "),
        name_pattern
    ))]
    NoImage {
        owners: Vec<String>,
        name_pattern: String,
    },

    #[snafu(display("No availability zones were returned"))]
    NoZones,

    #[snafu(display("Unable to request '{}': {}", url, source))]
    WorkstationIpRequest { url: String, source: reqwest::Error },

    #[snafu(display("'{}' is not a dotted-quad IPv4 address: {}", body, source))]
    WorkstationIpParse {
        body: String,
        source: AddrParseError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
