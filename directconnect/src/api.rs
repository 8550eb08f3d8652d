use async_trait::async_trait;
use aws_sdk_directconnect::{Client, types::Tag};
use stratus_aws_core::{error::AwsError, tags::Tags};

use crate::resource::DxConnectionConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionDescription {
    pub id: String,
    pub name: String,
    pub state: String,
    pub bandwidth: String,
    pub location: String,
    pub provider_name: Option<String>,
    pub aws_device: Option<String>,
    pub jumbo_frame_capable: bool,
    pub has_logical_redundancy: Option<String>,
    pub tags: Tags,
}

#[async_trait]
pub trait DirectConnectApi: Send + Sync {
    /// Returns the new connection's ID.
    async fn create_connection(&self, config: &DxConnectionConfig) -> Result<String, AwsError>;
    /// `Ok(None)` when the describe call returns no connection.
    async fn describe_connection(&self, id: &str) -> Result<Option<ConnectionDescription>, AwsError>;
    async fn update_connection_name(&self, id: &str, name: &str) -> Result<(), AwsError>;
    async fn tag_resource(&self, arn: &str, tags: &Tags) -> Result<(), AwsError>;
    async fn untag_resource(&self, arn: &str, keys: &[String]) -> Result<(), AwsError>;
    async fn delete_connection(&self, id: &str) -> Result<(), AwsError>;
}

fn to_sdk_tags(tags: &Tags) -> Result<Vec<Tag>, AwsError> {
    tags.iter()
        .map(|(k, v)| {
            Tag::builder()
                .key(k)
                .value(v)
                .build()
                .map_err(|e| AwsError::other(e.to_string()))
        })
        .collect()
}

#[async_trait]
impl DirectConnectApi for Client {
    async fn create_connection(&self, config: &DxConnectionConfig) -> Result<String, AwsError> {
        let tags = if config.tags.is_empty() {
            None
        } else {
            Some(to_sdk_tags(&config.tags)?)
        };

        let out = self
            .create_connection()
            .connection_name(&config.name)
            .bandwidth(&config.bandwidth)
            .location(&config.location)
            .set_provider_name(config.provider_name.clone())
            .set_tags(tags)
            .send()
            .await
            .map_err(AwsError::from_sdk)?;

        out.connection_id
            .ok_or_else(|| AwsError::other("CreateConnection returned no connection ID"))
    }

    async fn describe_connection(&self, id: &str) -> Result<Option<ConnectionDescription>, AwsError> {
        let out = self
            .describe_connections()
            .connection_id(id)
            .send()
            .await
            .map_err(AwsError::from_sdk)?;

        let Some(connection) = out.connections.unwrap_or_default().into_iter().next() else {
            return Ok(None);
        };

        Ok(Some(ConnectionDescription {
            id: connection.connection_id.unwrap_or_else(|| id.to_string()),
            name: connection.connection_name.unwrap_or_default(),
            state: connection
                .connection_state
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
            bandwidth: connection.bandwidth.unwrap_or_default(),
            location: connection.location.unwrap_or_default(),
            provider_name: connection.provider_name,
            aws_device: connection.aws_device,
            jumbo_frame_capable: connection.jumbo_frame_capable.unwrap_or(false),
            has_logical_redundancy: connection.has_logical_redundancy.map(|r| r.as_str().to_string()),
            tags: connection
                .tags
                .unwrap_or_default()
                .into_iter()
                .map(|t| (t.key, t.value.unwrap_or_default()))
                .collect(),
        }))
    }

    async fn update_connection_name(&self, id: &str, name: &str) -> Result<(), AwsError> {
        self.update_connection()
            .connection_id(id)
            .connection_name(name)
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        Ok(())
    }

    async fn tag_resource(&self, arn: &str, tags: &Tags) -> Result<(), AwsError> {
        self.tag_resource()
            .resource_arn(arn)
            .set_tags(Some(to_sdk_tags(tags)?))
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        Ok(())
    }

    async fn untag_resource(&self, arn: &str, keys: &[String]) -> Result<(), AwsError> {
        self.untag_resource()
            .resource_arn(arn)
            .set_tag_keys(Some(keys.to_vec()))
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        Ok(())
    }

    async fn delete_connection(&self, id: &str) -> Result<(), AwsError> {
        self.delete_connection()
            .connection_id(id)
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        Ok(())
    }
}
