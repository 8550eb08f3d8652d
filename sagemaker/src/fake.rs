use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use stratus_aws_core::error::{AwsError, classify_aws_error};

use crate::api::{LifecycleConfigDescription, SageMakerApi};

#[derive(Default)]
struct Inner {
    configs: BTreeMap<String, LifecycleConfigDescription>,
    calls: Vec<String>,
}

/// In-memory SageMaker lifecycle configurations. Missing configurations
/// fail the way the service does, with a `ValidationException`.
#[derive(Default)]
pub struct FakeSageMaker {
    inner: Mutex<Inner>,
}

fn validation_exception(message: String) -> AwsError {
    let kind = classify_aws_error(Some("ValidationException"), Some(&message));
    AwsError::new(kind, Some("ValidationException"), message)
}

fn missing(name: &str) -> AwsError {
    validation_exception(format!("Unable to describe Notebook Instance Lifecycle Config '{name}'"))
}

impl FakeSageMaker {
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    fn mutate(&self, call: &str) -> MutexGuard<'_, Inner> {
        let mut inner = self.lock();
        inner.calls.push(call.to_string());
        inner
    }
}

#[async_trait]
impl SageMakerApi for FakeSageMaker {
    async fn create_notebook_instance_lifecycle_config(
        &self,
        name: &str,
        on_create: Option<&str>,
        on_start: Option<&str>,
    ) -> Result<String, AwsError> {
        let mut inner = self.mutate("create_notebook_instance_lifecycle_config");
        if inner.configs.contains_key(name) {
            return Err(validation_exception(format!(
                "Unable to create Notebook Instance Lifecycle Config {name}: it already exists"
            )));
        }
        let arn = format!("arn:aws:sagemaker:us-east-1:123456789012:notebook-instance-lifecycle-config/{name}");
        inner.configs.insert(name.to_string(), LifecycleConfigDescription {
            name: name.to_string(),
            arn: arn.clone(),
            on_create: on_create.map(String::from),
            on_start: on_start.map(String::from),
        });
        Ok(arn)
    }

    async fn describe_notebook_instance_lifecycle_config(&self, name: &str) -> Result<LifecycleConfigDescription, AwsError> {
        self.lock().configs.get(name).cloned().ok_or_else(|| missing(name))
    }

    async fn update_notebook_instance_lifecycle_config(
        &self,
        name: &str,
        on_create: Option<&str>,
        on_start: Option<&str>,
    ) -> Result<(), AwsError> {
        let mut inner = self.mutate("update_notebook_instance_lifecycle_config");
        let config = inner.configs.get_mut(name).ok_or_else(|| missing(name))?;
        config.on_create = on_create.map(String::from);
        config.on_start = on_start.map(String::from);
        Ok(())
    }

    async fn delete_notebook_instance_lifecycle_config(&self, name: &str) -> Result<(), AwsError> {
        let mut inner = self.mutate("delete_notebook_instance_lifecycle_config");
        inner.configs.remove(name).ok_or_else(|| missing(name))?;
        Ok(())
    }
}
