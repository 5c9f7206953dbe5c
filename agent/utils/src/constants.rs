use log::LevelFilter;

pub const DEFAULT_LEVEL_FILTER: LevelFilter = LevelFilter::Info;

/// Returns the caller's public IPv4 address as the response body.
pub const CHECKIP_URL: &str = "https://checkip.amazonaws.com";

/// The owner alias of images published by AWS.
pub const AMAZON_OWNER: &str = "amazon";
