use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::Client;
use stratus_aws_core::{error::AwsError, tags::Tags};

use crate::resource::{MetricFilter, MetricTransformation};

#[derive(Debug, Clone, PartialEq)]
pub struct LogGroupDescription {
    pub name: String,
    pub arn: String,
    pub retention_in_days: Option<i32>,
    pub kms_key_id: Option<String>,
}

/// The CloudWatch Logs calls the log group and metric filter connectors make.
#[async_trait]
pub trait LogsApi: Send + Sync {
    async fn create_log_group(&self, name: &str, kms_key_id: Option<&str>, tags: &Tags) -> Result<(), AwsError>;
    /// `Ok(None)` when no log group has exactly this name.
    async fn describe_log_group(&self, name: &str) -> Result<Option<LogGroupDescription>, AwsError>;
    async fn list_tags(&self, arn: &str) -> Result<Tags, AwsError>;
    async fn put_retention_policy(&self, name: &str, retention_in_days: i32) -> Result<(), AwsError>;
    async fn delete_retention_policy(&self, name: &str) -> Result<(), AwsError>;
    async fn associate_kms_key(&self, name: &str, kms_key_id: &str) -> Result<(), AwsError>;
    async fn disassociate_kms_key(&self, name: &str) -> Result<(), AwsError>;
    async fn tag_resource(&self, arn: &str, tags: &Tags) -> Result<(), AwsError>;
    async fn untag_resource(&self, arn: &str, keys: &[String]) -> Result<(), AwsError>;
    async fn delete_log_group(&self, name: &str) -> Result<(), AwsError>;

    async fn put_metric_filter(&self, filter: &MetricFilter) -> Result<(), AwsError>;
    async fn describe_metric_filter(&self, log_group_name: &str, name: &str) -> Result<Option<MetricFilter>, AwsError>;
    async fn delete_metric_filter(&self, log_group_name: &str, name: &str) -> Result<(), AwsError>;
}

#[async_trait]
impl LogsApi for Client {
    async fn create_log_group(&self, name: &str, kms_key_id: Option<&str>, tags: &Tags) -> Result<(), AwsError> {
        self.create_log_group()
            .log_group_name(name)
            .set_kms_key_id(kms_key_id.map(String::from))
            .set_tags(tags.to_optional_map())
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        Ok(())
    }

    async fn describe_log_group(&self, name: &str) -> Result<Option<LogGroupDescription>, AwsError> {
        let mut next_token = None;
        loop {
            let out = self
                .describe_log_groups()
                .log_group_name_prefix(name)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(AwsError::from_sdk)?;

            let found = out.log_groups().iter().find(|g| g.log_group_name() == Some(name));
            if let Some(group) = found {
                return Ok(Some(LogGroupDescription {
                    name: name.to_string(),
                    arn: group.arn().unwrap_or_default().to_string(),
                    retention_in_days: group.retention_in_days(),
                    kms_key_id: group.kms_key_id().map(String::from),
                }));
            }

            next_token = out.next_token;
            if next_token.is_none() {
                return Ok(None);
            }
        }
    }

    async fn list_tags(&self, arn: &str) -> Result<Tags, AwsError> {
        let out = self
            .list_tags_for_resource()
            .resource_arn(arn)
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        Ok(Tags::from(out.tags))
    }

    async fn put_retention_policy(&self, name: &str, retention_in_days: i32) -> Result<(), AwsError> {
        self.put_retention_policy()
            .log_group_name(name)
            .retention_in_days(retention_in_days)
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        Ok(())
    }

    async fn delete_retention_policy(&self, name: &str) -> Result<(), AwsError> {
        self.delete_retention_policy()
            .log_group_name(name)
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        Ok(())
    }

    async fn associate_kms_key(&self, name: &str, kms_key_id: &str) -> Result<(), AwsError> {
        self.associate_kms_key()
            .log_group_name(name)
            .kms_key_id(kms_key_id)
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        Ok(())
    }

    async fn disassociate_kms_key(&self, name: &str) -> Result<(), AwsError> {
        self.disassociate_kms_key()
            .log_group_name(name)
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        Ok(())
    }

    async fn tag_resource(&self, arn: &str, tags: &Tags) -> Result<(), AwsError> {
        self.tag_resource()
            .resource_arn(arn)
            .set_tags(Some(tags.to_hash_map()))
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

    async fn delete_log_group(&self, name: &str) -> Result<(), AwsError> {
        self.delete_log_group()
            .log_group_name(name)
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        Ok(())
    }

    async fn put_metric_filter(&self, filter: &MetricFilter) -> Result<(), AwsError> {
        let t = &filter.metric_transformation;
        let transformation = aws_sdk_cloudwatchlogs::types::MetricTransformation::builder()
            .metric_name(&t.name)
            .metric_namespace(&t.namespace)
            .metric_value(&t.value)
            .set_default_value(t.default_value)
            .build()
            .map_err(|e| AwsError::other(e.to_string()))?;

        self.put_metric_filter()
            .log_group_name(&filter.log_group_name)
            .filter_name(&filter.name)
            .filter_pattern(&filter.pattern)
            .metric_transformations(transformation)
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        Ok(())
    }

    async fn describe_metric_filter(&self, log_group_name: &str, name: &str) -> Result<Option<MetricFilter>, AwsError> {
        let out = self
            .describe_metric_filters()
            .log_group_name(log_group_name)
            .filter_name_prefix(name)
            .send()
            .await
            .map_err(AwsError::from_sdk)?;

        let Some(filter) = out.metric_filters().iter().find(|f| f.filter_name() == Some(name)) else {
            return Ok(None);
        };
        let Some(t) = filter.metric_transformations().first() else {
            return Err(AwsError::other(format!(
                "metric filter {log_group_name}:{name} has no metric transformation"
            )));
        };

        Ok(Some(MetricFilter {
            name: name.to_string(),
            log_group_name: log_group_name.to_string(),
            pattern: filter.filter_pattern().unwrap_or_default().to_string(),
            metric_transformation: MetricTransformation {
                name: t.metric_name().to_string(),
                namespace: t.metric_namespace().to_string(),
                value: t.metric_value().to_string(),
                default_value: t.default_value(),
            },
        }))
    }

    async fn delete_metric_filter(&self, log_group_name: &str, name: &str) -> Result<(), AwsError> {
        self.delete_metric_filter()
            .log_group_name(log_group_name)
            .filter_name(name)
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        Ok(())
    }
}
