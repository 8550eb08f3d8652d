use async_trait::async_trait;
use aws_sdk_kinesisvideo::{Client, types::UpdateDataRetentionOperation};
use aws_smithy_types::date_time::Format;
use stratus_aws_core::{error::AwsError, tags::Tags};

use crate::resource::KinesisVideoStreamConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct StreamDescription {
    pub name: String,
    pub arn: String,
    pub status: String,
    pub version: String,
    pub data_retention_in_hours: i32,
    pub device_name: Option<String>,
    pub kms_key_id: Option<String>,
    pub media_type: Option<String>,
    pub creation_time: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionChange {
    Increase(i32),
    Decrease(i32),
}

/// Every mutating call except tagging takes the stream's current version and
/// fails if another change landed in between.
#[async_trait]
pub trait KinesisVideoApi: Send + Sync {
    /// Returns the new stream's ARN.
    async fn create_stream(&self, config: &KinesisVideoStreamConfig) -> Result<String, AwsError>;
    async fn describe_stream(&self, arn: &str) -> Result<Option<StreamDescription>, AwsError>;
    async fn list_tags_for_stream(&self, arn: &str) -> Result<Tags, AwsError>;
    async fn update_stream(
        &self,
        arn: &str,
        version: &str,
        device_name: Option<&str>,
        media_type: Option<&str>,
    ) -> Result<(), AwsError>;
    async fn update_data_retention(&self, arn: &str, version: &str, change: RetentionChange) -> Result<(), AwsError>;
    async fn tag_stream(&self, arn: &str, tags: &Tags) -> Result<(), AwsError>;
    async fn untag_stream(&self, arn: &str, keys: &[String]) -> Result<(), AwsError>;
    async fn delete_stream(&self, arn: &str, version: &str) -> Result<(), AwsError>;
}

#[async_trait]
impl KinesisVideoApi for Client {
    async fn create_stream(&self, config: &KinesisVideoStreamConfig) -> Result<String, AwsError> {
        let out = self
            .create_stream()
            .stream_name(&config.name)
            .data_retention_in_hours(config.data_retention_in_hours)
            .set_device_name(config.device_name.clone())
            .set_kms_key_id(config.kms_key_id.clone())
            .set_media_type(config.media_type.clone())
            .set_tags(config.tags.to_optional_map())
            .send()
            .await
            .map_err(AwsError::from_sdk)?;

        out.stream_arn
            .ok_or_else(|| AwsError::other("CreateStream returned no stream ARN"))
    }

    async fn describe_stream(&self, arn: &str) -> Result<Option<StreamDescription>, AwsError> {
        let out = self
            .describe_stream()
            .stream_arn(arn)
            .send()
            .await
            .map_err(AwsError::from_sdk)?;

        let Some(info) = out.stream_info else {
            return Ok(None);
        };

        Ok(Some(StreamDescription {
            name: info.stream_name.unwrap_or_default(),
            arn: info.stream_arn.unwrap_or_else(|| arn.to_string()),
            status: info.status.map(|s| s.as_str().to_string()).unwrap_or_default(),
            version: info.version.unwrap_or_default(),
            data_retention_in_hours: info.data_retention_in_hours.unwrap_or_default(),
            device_name: info.device_name,
            kms_key_id: info.kms_key_id,
            media_type: info.media_type,
            creation_time: info.creation_time.and_then(|t| t.fmt(Format::DateTime).ok()),
        }))
    }

    async fn list_tags_for_stream(&self, arn: &str) -> Result<Tags, AwsError> {
        let mut tags = Tags::new();
        let mut next_token = None;
        loop {
            let out = self
                .list_tags_for_stream()
                .stream_arn(arn)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(AwsError::from_sdk)?;

            for (k, v) in out.tags.unwrap_or_default() {
                tags.insert(k, v);
            }

            next_token = out.next_token;
            if next_token.is_none() {
                break;
            }
        }
        Ok(tags)
    }

    async fn update_stream(
        &self,
        arn: &str,
        version: &str,
        device_name: Option<&str>,
        media_type: Option<&str>,
    ) -> Result<(), AwsError> {
        self.update_stream()
            .stream_arn(arn)
            .current_version(version)
            .set_device_name(device_name.map(String::from))
            .set_media_type(media_type.map(String::from))
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        Ok(())
    }

    async fn update_data_retention(&self, arn: &str, version: &str, change: RetentionChange) -> Result<(), AwsError> {
        let (operation, hours) = match change {
            RetentionChange::Increase(hours) => (UpdateDataRetentionOperation::IncreaseDataRetention, hours),
            RetentionChange::Decrease(hours) => (UpdateDataRetentionOperation::DecreaseDataRetention, hours),
        };

        self.update_data_retention()
            .stream_arn(arn)
            .current_version(version)
            .operation(operation)
            .data_retention_change_in_hours(hours)
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        Ok(())
    }

    async fn tag_stream(&self, arn: &str, tags: &Tags) -> Result<(), AwsError> {
        self.tag_stream()
            .stream_arn(arn)
            .set_tags(Some(tags.to_hash_map()))
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        Ok(())
    }

    async fn untag_stream(&self, arn: &str, keys: &[String]) -> Result<(), AwsError> {
        self.untag_stream()
            .stream_arn(arn)
            .set_tag_key_list(Some(keys.to_vec()))
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        Ok(())
    }

    async fn delete_stream(&self, arn: &str, version: &str) -> Result<(), AwsError> {
        self.delete_stream()
            .stream_arn(arn)
            .current_version(version)
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        Ok(())
    }
}
