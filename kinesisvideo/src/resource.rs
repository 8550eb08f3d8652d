use anyhow::bail;
use serde::{Deserialize, Serialize};
use stratus_aws_core::tags::Tags;

pub const KINESIS_VIDEO_STREAM_TYPE: &str = "aws_kinesis_video_stream";

pub mod stream_status {
    pub const CREATING: &str = "CREATING";
    pub const ACTIVE: &str = "ACTIVE";
    pub const UPDATING: &str = "UPDATING";
    pub const DELETING: &str = "DELETING";
    /// Never reported by the service. Stands in for a stream that is gone.
    pub const DELETED: &str = "DELETED";
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct KinesisVideoStreamConfig {
    pub name: String,
    /// `0` keeps no media.
    #[serde(default)]
    pub data_retention_in_hours: i32,
    #[serde(default)]
    pub device_name: Option<String>,
    /// Defaults to the `aws/kinesisvideo` managed key when unset.
    #[serde(default)]
    pub kms_key_id: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub tags: Tags,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct KinesisVideoStreamState {
    pub name: String,
    pub arn: String,
    pub data_retention_in_hours: i32,
    pub device_name: Option<String>,
    pub kms_key_id: Option<String>,
    pub media_type: Option<String>,
    pub version: String,
    pub creation_time: Option<String>,
    pub tags: Tags,
}

pub fn validate_kinesis_video_stream(config: &KinesisVideoStreamConfig) -> anyhow::Result<()> {
    if config.name.is_empty() || config.name.len() > 256 {
        bail!("stream name must be between 1 and 256 characters, got {}", config.name.len());
    }
    if let Some(c) = config
        .name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
    {
        bail!("stream name {:?} contains invalid character {c:?}", config.name);
    }
    if config.data_retention_in_hours < 0 {
        bail!("data_retention_in_hours must not be negative");
    }
    if let Some(device_name) = &config.device_name {
        if device_name.is_empty() || device_name.len() > 128 {
            bail!("device_name must be between 1 and 128 characters");
        }
    }
    if let Some(media_type) = &config.media_type {
        if !media_type.contains('/') {
            bail!("media_type {media_type:?} is not a MIME type");
        }
    }
    Ok(())
}
