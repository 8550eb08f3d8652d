use anyhow::bail;
use serde::{Deserialize, Serialize};
use stratus_aws_core::tags::Tags;

pub const LOG_GROUP_TYPE: &str = "aws_cloudwatch_log_group";
pub const METRIC_FILTER_TYPE: &str = "aws_cloudwatch_log_metric_filter";

/// Retention periods CloudWatch Logs accepts. `0` means never expire.
pub const VALID_RETENTION_DAYS: &[i32] = &[
    0, 1, 3, 5, 7, 14, 30, 60, 90, 120, 150, 180, 365, 400, 545, 731, 1096, 1827, 2192, 2557, 2922, 3288, 3653,
];

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct LogGroupConfig {
    /// Conflicts with `name_prefix`. Generated when both are absent.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_prefix: Option<String>,
    #[serde(default)]
    pub retention_in_days: i32,
    #[serde(default)]
    pub kms_key_id: Option<String>,
    #[serde(default)]
    pub tags: Tags,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct LogGroupState {
    pub name: String,
    pub arn: String,
    pub retention_in_days: i32,
    pub kms_key_id: Option<String>,
    pub tags: Tags,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct MetricTransformation {
    pub name: String,
    pub namespace: String,
    pub value: String,
    #[serde(default)]
    pub default_value: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct MetricFilter {
    pub name: String,
    pub log_group_name: String,
    pub pattern: String,
    pub metric_transformation: MetricTransformation,
}

pub fn validate_log_group_name(name: &str) -> anyhow::Result<()> {
    if name.is_empty() || name.len() > 512 {
        bail!("log group name must be between 1 and 512 characters, got {}", name.len());
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '/' | '#')))
    {
        bail!("log group name {name:?} contains invalid character {c:?}");
    }
    Ok(())
}

pub fn validate_log_group(config: &LogGroupConfig) -> anyhow::Result<()> {
    match (&config.name, &config.name_prefix) {
        (Some(_), Some(_)) => bail!("only one of name and name_prefix may be set"),
        (Some(name), None) => validate_log_group_name(name)?,
        (None, Some(prefix)) => {
            if prefix.len() > 483 {
                bail!("name_prefix must be at most 483 characters");
            }
            validate_log_group_name(prefix)?
        }
        (None, None) => {}
    }

    if !VALID_RETENTION_DAYS.contains(&config.retention_in_days) {
        bail!(
            "retention_in_days must be one of {:?}, got {}",
            VALID_RETENTION_DAYS,
            config.retention_in_days
        );
    }
    Ok(())
}

pub fn validate_metric_filter(filter: &MetricFilter) -> anyhow::Result<()> {
    if filter.name.is_empty() || filter.name.len() > 512 || filter.name.contains(':') || filter.name.contains('*') {
        bail!("metric filter name must be 1-512 characters without ':' or '*'");
    }
    validate_log_group_name(&filter.log_group_name)?;
    if filter.pattern.len() > 1024 {
        bail!("metric filter pattern must be at most 1024 characters");
    }
    let t = &filter.metric_transformation;
    if t.name.is_empty() || t.name.len() > 255 || t.name.contains(':') || t.name.contains('$') {
        bail!("metric name must be 1-255 characters without ':' or '$'");
    }
    if t.namespace.is_empty() || t.namespace.len() > 255 || t.namespace.contains(':') || t.namespace.contains('$') {
        bail!("metric namespace must be 1-255 characters without ':' or '$'");
    }
    if t.value.is_empty() || t.value.len() > 100 {
        bail!("metric value must be 1-100 characters");
    }
    Ok(())
}
