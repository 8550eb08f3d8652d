use anyhow::bail;
use serde::{Deserialize, Serialize};
use stratus_aws_core::tags::Tags;

pub const DX_CONNECTION_TYPE: &str = "aws_dx_connection";

/// Port speeds Direct Connect offers for dedicated and hosted connections.
pub const VALID_BANDWIDTHS: &[&str] = &[
    "1Gbps", "2Gbps", "5Gbps", "10Gbps", "100Gbps", "400Gbps", "50Mbps", "100Mbps", "200Mbps", "300Mbps", "400Mbps",
    "500Mbps",
];

pub mod connection_state {
    pub const ORDERING: &str = "ordering";
    pub const REQUESTED: &str = "requested";
    pub const PENDING: &str = "pending";
    pub const AVAILABLE: &str = "available";
    pub const DOWN: &str = "down";
    pub const DELETING: &str = "deleting";
    pub const DELETED: &str = "deleted";
    pub const REJECTED: &str = "rejected";
    pub const UNKNOWN: &str = "unknown";
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct DxConnectionConfig {
    pub name: String,
    pub bandwidth: String,
    pub location: String,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub tags: Tags,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct DxConnectionState {
    pub id: String,
    pub arn: String,
    pub name: String,
    pub bandwidth: String,
    pub location: String,
    pub provider_name: Option<String>,
    pub connection_state: String,
    pub aws_device: Option<String>,
    pub jumbo_frame_capable: bool,
    pub has_logical_redundancy: Option<String>,
    pub tags: Tags,
}

pub fn validate_dx_connection(config: &DxConnectionConfig) -> anyhow::Result<()> {
    if config.name.is_empty() {
        bail!("name must not be empty");
    }
    if config.location.is_empty() {
        bail!("location must not be empty");
    }
    if !VALID_BANDWIDTHS.contains(&config.bandwidth.as_str()) {
        bail!(
            "bandwidth {:?} is not one of {}",
            config.bandwidth,
            VALID_BANDWIDTHS.join(", ")
        );
    }
    Ok(())
}
