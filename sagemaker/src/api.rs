use async_trait::async_trait;
use aws_sdk_sagemaker::{Client, types::NotebookInstanceLifecycleHook};
use stratus_aws_core::error::AwsError;

#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleConfigDescription {
    pub name: String,
    pub arn: String,
    pub on_create: Option<String>,
    pub on_start: Option<String>,
}

/// SageMaker reports a missing lifecycle configuration as a
/// `ValidationException`, which classifies as not found.
#[async_trait]
pub trait SageMakerApi: Send + Sync {
    /// Returns the new configuration's ARN.
    async fn create_notebook_instance_lifecycle_config(
        &self,
        name: &str,
        on_create: Option<&str>,
        on_start: Option<&str>,
    ) -> Result<String, AwsError>;
    async fn describe_notebook_instance_lifecycle_config(&self, name: &str) -> Result<LifecycleConfigDescription, AwsError>;
    /// Both hook lists are always sent, so an absent script clears the hook.
    async fn update_notebook_instance_lifecycle_config(
        &self,
        name: &str,
        on_create: Option<&str>,
        on_start: Option<&str>,
    ) -> Result<(), AwsError>;
    async fn delete_notebook_instance_lifecycle_config(&self, name: &str) -> Result<(), AwsError>;
}

fn hooks(script: Option<&str>) -> Vec<NotebookInstanceLifecycleHook> {
    script
        .map(|content| NotebookInstanceLifecycleHook::builder().content(content).build())
        .into_iter()
        .collect()
}

fn first_hook(hooks: Option<Vec<NotebookInstanceLifecycleHook>>) -> Option<String> {
    hooks?.into_iter().next().and_then(|hook| hook.content)
}

#[async_trait]
impl SageMakerApi for Client {
    async fn create_notebook_instance_lifecycle_config(
        &self,
        name: &str,
        on_create: Option<&str>,
        on_start: Option<&str>,
    ) -> Result<String, AwsError> {
        let out = self
            .create_notebook_instance_lifecycle_config()
            .notebook_instance_lifecycle_config_name(name)
            .set_on_create(Some(hooks(on_create)))
            .set_on_start(Some(hooks(on_start)))
            .send()
            .await
            .map_err(AwsError::from_sdk)?;

        out.notebook_instance_lifecycle_config_arn
            .ok_or_else(|| AwsError::other("CreateNotebookInstanceLifecycleConfig returned no ARN"))
    }

    async fn describe_notebook_instance_lifecycle_config(&self, name: &str) -> Result<LifecycleConfigDescription, AwsError> {
        let out = self
            .describe_notebook_instance_lifecycle_config()
            .notebook_instance_lifecycle_config_name(name)
            .send()
            .await
            .map_err(AwsError::from_sdk)?;

        Ok(LifecycleConfigDescription {
            name: out
                .notebook_instance_lifecycle_config_name
                .unwrap_or_else(|| name.to_string()),
            arn: out.notebook_instance_lifecycle_config_arn.unwrap_or_default(),
            on_create: first_hook(out.on_create),
            on_start: first_hook(out.on_start),
        })
    }

    async fn update_notebook_instance_lifecycle_config(
        &self,
        name: &str,
        on_create: Option<&str>,
        on_start: Option<&str>,
    ) -> Result<(), AwsError> {
        self.update_notebook_instance_lifecycle_config()
            .notebook_instance_lifecycle_config_name(name)
            .set_on_create(Some(hooks(on_create)))
            .set_on_start(Some(hooks(on_start)))
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        Ok(())
    }

    async fn delete_notebook_instance_lifecycle_config(&self, name: &str) -> Result<(), AwsError> {
        self.delete_notebook_instance_lifecycle_config()
            .notebook_instance_lifecycle_config_name(name)
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        Ok(())
    }
}
