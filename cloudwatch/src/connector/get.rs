use anyhow::Context;
use stratus_aws_core::error::AwsError;

use crate::{
    addr::MetricFilterId,
    api::LogsApi,
    resource::{LogGroupState, MetricFilter},
};

use super::{LogGroupConnector, MetricFilterConnector};

/// DescribeLogGroups reports ARNs with a trailing `:*`; tagging APIs want it without.
pub(crate) fn trim_log_group_arn(arn: &str) -> &str {
    arn.strip_suffix(":*").unwrap_or(arn)
}

impl<A: LogsApi> LogGroupConnector<A> {
    pub(crate) async fn get_log_group(&self, name: &str) -> anyhow::Result<Option<LogGroupState>> {
        let group = match self.api.describe_log_group(name).await {
            Ok(Some(group)) => group,
            Ok(None) => {
                tracing::info!("CloudWatch log group {} not found", name);
                return Ok(None);
            }
            Err(e) if e.is_not_found() => {
                tracing::info!("CloudWatch log group {} not found", name);
                return Ok(None);
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to describe CloudWatch log group {name}")),
        };

        let arn = trim_log_group_arn(&group.arn).to_string();

        let tags = match self.api.list_tags(&arn).await {
            Ok(tags) => tags,
            Err(e) if e.is_not_found() => {
                tracing::info!("CloudWatch log group {} disappeared while reading tags", name);
                return Ok(None);
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to list tags for CloudWatch log group {name}")),
        };

        Ok(Some(LogGroupState {
            name: group.name,
            arn,
            retention_in_days: group.retention_in_days.unwrap_or(0),
            kms_key_id: group.kms_key_id,
            tags,
        }))
    }
}

impl<A: LogsApi> MetricFilterConnector<A> {
    pub(crate) async fn get_metric_filter(&self, id: &MetricFilterId) -> anyhow::Result<Option<MetricFilter>> {
        match self.api.describe_metric_filter(&id.log_group_name, &id.name).await {
            Ok(Some(filter)) => Ok(Some(filter)),
            Ok(None) => {
                tracing::info!("CloudWatch log metric filter {} not found", id);
                Ok(None)
            }
            Err(e) if AwsError::is_not_found(&e) => {
                tracing::info!("CloudWatch log group for metric filter {} not found", id);
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to describe CloudWatch log metric filter {id}")),
        }
    }
}
