use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use stratus_aws_core::{
    connector::{ResourceConnector, ResourceData, ensure_in_place, require_state},
    util::{diff_ron_values, prefixed_unique_id, unique_id},
};

use crate::{
    addr::MetricFilterId,
    api::LogsApi,
    resource::{
        LOG_GROUP_TYPE, LogGroupConfig, LogGroupState, METRIC_FILTER_TYPE, MetricFilter, validate_log_group,
        validate_metric_filter,
    },
};

mod get;
mod op_exec;
mod plan;

pub use plan::plan_log_group_update;

pub struct LogGroupConnector<A> {
    api: Arc<A>,
}

impl<A: LogsApi> LogGroupConnector<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }
}

fn resolve_log_group_name(config: &LogGroupConfig) -> String {
    match (&config.name, &config.name_prefix) {
        (Some(name), _) => name.clone(),
        (None, Some(prefix)) => prefixed_unique_id(prefix),
        (None, None) => unique_id(),
    }
}

#[async_trait]
impl<A: LogsApi> ResourceConnector for LogGroupConnector<A> {
    type Id = String;
    type Config = LogGroupConfig;
    type State = LogGroupState;

    fn type_name(&self) -> &'static str {
        LOG_GROUP_TYPE
    }

    fn validate(&self, config: &LogGroupConfig) -> anyhow::Result<()> {
        validate_log_group(config)
    }

    fn replacement_fields(&self, current: &LogGroupState, desired: &LogGroupConfig) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if let Some(name) = &desired.name {
            if *name != current.name {
                fields.push("name");
            }
        }
        if let Some(prefix) = &desired.name_prefix {
            if !current.name.starts_with(prefix.as_str()) {
                fields.push("name_prefix");
            }
        }
        fields
    }

    async fn create(&self, config: &LogGroupConfig) -> anyhow::Result<ResourceData<String, LogGroupState>> {
        let name = resolve_log_group_name(config);
        tracing::info!("Creating CloudWatch log group {}", name);

        self.api
            .create_log_group(&name, config.kms_key_id.as_deref(), &config.tags)
            .await
            .with_context(|| format!("Failed to create CloudWatch log group {name}"))?;

        if config.retention_in_days > 0 {
            self.api
                .put_retention_policy(&name, config.retention_in_days)
                .await
                .with_context(|| format!("Failed to set retention policy for CloudWatch log group {name}"))?;
        }

        let state = require_state(self.read(&name).await?, LOG_GROUP_TYPE, &name, "create")?;
        Ok(ResourceData { id: name, state })
    }

    async fn read(&self, id: &String) -> anyhow::Result<Option<LogGroupState>> {
        self.get_log_group(id).await
    }

    async fn update(&self, id: &String, current: &LogGroupState, desired: &LogGroupConfig) -> anyhow::Result<LogGroupState> {
        ensure_in_place(LOG_GROUP_TYPE, id, &self.replacement_fields(current, desired))?;

        let ops = plan_log_group_update(id, current, desired);
        for planned in &ops {
            tracing::info!(resource = LOG_GROUP_TYPE, "{}", planned.friendly_message);
            self.exec_log_group_op(id, &current.arn, &planned.op)
                .await
                .with_context(|| format!("{}: {}", LOG_GROUP_TYPE, planned.friendly_message))?;
        }

        require_state(self.read(id).await?, LOG_GROUP_TYPE, id, "update")
    }

    async fn delete(&self, id: &String) -> anyhow::Result<()> {
        tracing::info!("Deleting CloudWatch log group {}", id);
        match self.api.delete_log_group(id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::info!("CloudWatch log group {} already gone", id);
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to delete CloudWatch log group {id}")),
        }
    }
}

pub struct MetricFilterConnector<A> {
    api: Arc<A>,
}

impl<A: LogsApi> MetricFilterConnector<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<A: LogsApi> ResourceConnector for MetricFilterConnector<A> {
    type Id = MetricFilterId;
    type Config = MetricFilter;
    type State = MetricFilter;

    fn type_name(&self) -> &'static str {
        METRIC_FILTER_TYPE
    }

    fn validate(&self, config: &MetricFilter) -> anyhow::Result<()> {
        validate_metric_filter(config)
    }

    fn replacement_fields(&self, current: &MetricFilter, desired: &MetricFilter) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if current.name != desired.name {
            fields.push("name");
        }
        if current.log_group_name != desired.log_group_name {
            fields.push("log_group_name");
        }
        fields
    }

    async fn create(&self, config: &MetricFilter) -> anyhow::Result<ResourceData<MetricFilterId, MetricFilter>> {
        let id = MetricFilterId::new(&config.log_group_name, &config.name);
        tracing::info!("Creating CloudWatch log metric filter {}", id);

        self.api
            .put_metric_filter(config)
            .await
            .with_context(|| format!("Failed to create CloudWatch log metric filter {id}"))?;

        let state = require_state(self.read(&id).await?, METRIC_FILTER_TYPE, &id, "create")?;
        Ok(ResourceData { id, state })
    }

    async fn read(&self, id: &MetricFilterId) -> anyhow::Result<Option<MetricFilter>> {
        self.get_metric_filter(id).await
    }

    async fn update(&self, id: &MetricFilterId, current: &MetricFilter, desired: &MetricFilter) -> anyhow::Result<MetricFilter> {
        ensure_in_place(METRIC_FILTER_TYPE, id, &self.replacement_fields(current, desired))?;

        if current != desired {
            let diff = diff_ron_values(current, desired).unwrap_or_default();
            tracing::info!("Updating CloudWatch log metric filter {}\n{}", id, diff);
            self.api
                .put_metric_filter(desired)
                .await
                .with_context(|| format!("Failed to update CloudWatch log metric filter {id}"))?;
        }

        require_state(self.read(id).await?, METRIC_FILTER_TYPE, id, "update")
    }

    async fn delete(&self, id: &MetricFilterId) -> anyhow::Result<()> {
        tracing::info!("Deleting CloudWatch log metric filter {}", id);
        match self.api.delete_metric_filter(&id.log_group_name, &id.name).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::info!("CloudWatch log metric filter {} already gone", id);
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to delete CloudWatch log metric filter {id}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use stratus_aws_core::{connector::ResourceId, tags::Tags};

    use super::*;
    use crate::{fake::FakeLogs, resource::MetricTransformation};

    fn connector() -> (Arc<FakeLogs>, LogGroupConnector<FakeLogs>) {
        let api = Arc::new(FakeLogs::default());
        (api.clone(), LogGroupConnector::new(api))
    }

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs.iter().copied().collect()
    }

    #[tokio::test]
    async fn create_with_prefix_and_retention() {
        let (api, connector) = connector();

        let data = connector
            .create(&LogGroupConfig {
                name_prefix: Some("app-".into()),
                retention_in_days: 30,
                tags: tags(&[("env", "test")]),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(data.id.starts_with("app-"));
        assert_eq!(data.state.name, data.id);
        assert_eq!(data.state.retention_in_days, 30);
        assert_eq!(data.state.tags, tags(&[("env", "test")]));
        assert!(!data.state.arn.ends_with(":*"), "{}", data.state.arn);
        assert_eq!(api.calls(), vec!["create_log_group", "put_retention_policy"]);
    }

    #[tokio::test]
    async fn read_is_idempotent() {
        let (api, connector) = connector();
        api.insert_log_group("app", 7, Some("key-1"), tags(&[("a", "1")]));

        let first = connector.read(&"app".to_string()).await.unwrap();
        let second = connector.read(&"app".to_string()).await.unwrap();
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn read_missing_is_not_an_error() {
        let (_, connector) = connector();
        assert_eq!(connector.read(&"gone".to_string()).await.unwrap(), None);
        assert!(connector.import("gone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_runs_field_groups_in_order() {
        let (api, connector) = connector();
        api.insert_log_group("app", 7, None, tags(&[("old", "x"), ("keep", "1")]));
        let current = connector.read(&"app".to_string()).await.unwrap().unwrap();

        let state = connector
            .update(&"app".to_string(), &current, &LogGroupConfig {
                name: Some("app".into()),
                retention_in_days: 0,
                kms_key_id: Some("key-2".into()),
                tags: tags(&[("keep", "1"), ("new", "y")]),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(api.calls(), vec![
            "delete_retention_policy",
            "associate_kms_key",
            "untag_resource",
            "tag_resource"
        ]);
        assert_eq!(state.retention_in_days, 0);
        assert_eq!(state.kms_key_id.as_deref(), Some("key-2"));
        assert_eq!(state.tags, tags(&[("keep", "1"), ("new", "y")]));
    }

    #[tokio::test]
    async fn partial_update_is_not_rolled_back() {
        let (api, connector) = connector();
        api.insert_log_group("app", 7, None, Tags::new());
        let current = connector.read(&"app".to_string()).await.unwrap().unwrap();
        api.fail_on("associate_kms_key");

        let err = connector
            .update(&"app".to_string(), &current, &LogGroupConfig {
                name: Some("app".into()),
                retention_in_days: 90,
                kms_key_id: Some("key-2".into()),
                tags: tags(&[("new", "y")]),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("Associate KMS key key-2"), "{err:#}");
        let after = connector.read(&"app".to_string()).await.unwrap().unwrap();
        assert_eq!(after.retention_in_days, 90);
        assert_eq!(after.kms_key_id, None);
        assert!(after.tags.is_empty());
    }

    #[tokio::test]
    async fn rename_requires_replacement() {
        let (api, connector) = connector();
        api.insert_log_group("app", 0, None, Tags::new());
        let current = connector.read(&"app".to_string()).await.unwrap().unwrap();

        let err = connector
            .update(&"app".to_string(), &current, &LogGroupConfig {
                name: Some("other".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(err.to_string().contains("requires replacing"));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn delete_tolerates_missing_group() {
        let (api, connector) = connector();
        api.insert_log_group("app", 0, None, Tags::new());

        connector.delete(&"app".to_string()).await.unwrap();
        connector.delete(&"app".to_string()).await.unwrap();
        assert_eq!(connector.read(&"app".to_string()).await.unwrap(), None);
    }

    fn errors_filter() -> MetricFilter {
        MetricFilter {
            name: "errors".into(),
            log_group_name: "app".into(),
            pattern: "ERROR".into(),
            metric_transformation: MetricTransformation {
                name: "ErrorCount".into(),
                namespace: "App".into(),
                value: "1".into(),
                default_value: None,
            },
        }
    }

    #[tokio::test]
    async fn metric_filter_lifecycle() {
        let api = Arc::new(FakeLogs::default());
        api.insert_log_group("app", 0, None, Tags::new());
        let connector = MetricFilterConnector::new(api.clone());

        let data = connector.create(&errors_filter()).await.unwrap();
        assert_eq!(data.id.to_string(), "app:errors");

        let imported = connector.import("app:errors").await.unwrap().unwrap();
        assert_eq!(imported.state, data.state);

        let mut desired = errors_filter();
        desired.pattern = "FATAL".into();
        let state = connector.update(&data.id, &data.state, &desired).await.unwrap();
        assert_eq!(state.pattern, "FATAL");

        connector.delete(&data.id).await.unwrap();
        connector.delete(&data.id).await.unwrap();
        assert_eq!(connector.read(&data.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn metric_filter_on_missing_group_has_vanished() {
        let connector = MetricFilterConnector::new(Arc::new(FakeLogs::default()));
        let id = MetricFilterId::parse("deleted-group:errors").unwrap();
        assert_eq!(connector.read(&id).await.unwrap(), None);
    }
}
