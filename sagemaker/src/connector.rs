use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use stratus_aws_core::{
    connector::{ResourceConnector, ResourceData, ensure_in_place, require_state},
    util::{diff_ron_values, unique_id},
};

use crate::{
    api::SageMakerApi,
    resource::{LIFECYCLE_CONFIG_TYPE, LifecycleConfig, LifecycleConfigState, validate_lifecycle_config},
};

pub struct LifecycleConfigConnector<A> {
    api: Arc<A>,
}

impl<A: SageMakerApi> LifecycleConfigConnector<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<A: SageMakerApi> ResourceConnector for LifecycleConfigConnector<A> {
    type Id = String;
    type Config = LifecycleConfig;
    type State = LifecycleConfigState;

    fn type_name(&self) -> &'static str {
        LIFECYCLE_CONFIG_TYPE
    }

    fn validate(&self, config: &LifecycleConfig) -> anyhow::Result<()> {
        validate_lifecycle_config(config)
    }

    fn replacement_fields(&self, current: &LifecycleConfigState, desired: &LifecycleConfig) -> Vec<&'static str> {
        match &desired.name {
            Some(name) if *name != current.name => vec!["name"],
            _ => Vec::new(),
        }
    }

    async fn create(&self, config: &LifecycleConfig) -> anyhow::Result<ResourceData<String, LifecycleConfigState>> {
        let name = config.name.clone().unwrap_or_else(unique_id);

        tracing::info!("Creating SageMaker notebook instance lifecycle configuration {}", name);
        self.api
            .create_notebook_instance_lifecycle_config(&name, config.on_create.as_deref(), config.on_start.as_deref())
            .await
            .with_context(|| format!("Failed to create SageMaker notebook instance lifecycle configuration {name}"))?;

        let state = require_state(self.read(&name).await?, LIFECYCLE_CONFIG_TYPE, &name, "create")?;
        Ok(ResourceData { id: name, state })
    }

    async fn read(&self, name: &String) -> anyhow::Result<Option<LifecycleConfigState>> {
        match self.api.describe_notebook_instance_lifecycle_config(name).await {
            Ok(description) => Ok(Some(LifecycleConfigState {
                name: description.name,
                arn: description.arn,
                on_create: description.on_create,
                on_start: description.on_start,
            })),
            Err(e) if e.is_not_found() => {
                tracing::info!("SageMaker notebook instance lifecycle configuration {} not found", name);
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| {
                format!("Failed to describe SageMaker notebook instance lifecycle configuration {name}")
            }),
        }
    }

    async fn update(&self, name: &String, current: &LifecycleConfigState, desired: &LifecycleConfig) -> anyhow::Result<LifecycleConfigState> {
        ensure_in_place(LIFECYCLE_CONFIG_TYPE, name, &self.replacement_fields(current, desired))?;

        let wanted = LifecycleConfigState {
            on_create: desired.on_create.clone(),
            on_start: desired.on_start.clone(),
            ..current.clone()
        };
        if wanted == *current {
            return Ok(current.clone());
        }

        tracing::info!(
            resource = LIFECYCLE_CONFIG_TYPE,
            "Update hooks for SageMaker notebook instance lifecycle configuration `{}`\n{}",
            name,
            diff_ron_values(current, &wanted).unwrap_or_default()
        );
        self.api
            .update_notebook_instance_lifecycle_config(name, desired.on_create.as_deref(), desired.on_start.as_deref())
            .await
            .with_context(|| format!("Failed to update SageMaker notebook instance lifecycle configuration {name}"))?;

        require_state(self.read(name).await?, LIFECYCLE_CONFIG_TYPE, name, "update")
    }

    async fn delete(&self, name: &String) -> anyhow::Result<()> {
        tracing::info!("Deleting SageMaker notebook instance lifecycle configuration {}", name);
        match self.api.delete_notebook_instance_lifecycle_config(name).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::info!("SageMaker notebook instance lifecycle configuration {} already gone", name);
                Ok(())
            }
            Err(e) => Err(e).with_context(|| {
                format!("Failed to delete SageMaker notebook instance lifecycle configuration {name}")
            }),
        }
    }
}
