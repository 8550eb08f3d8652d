use anyhow::{Context, bail};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

pub const LIFECYCLE_CONFIG_TYPE: &str = "aws_sagemaker_notebook_instance_lifecycle_configuration";

pub const MAX_NAME_LEN: usize = 63;
pub const MAX_SCRIPT_LEN: usize = 16384;

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct LifecycleConfig {
    /// Generated when absent.
    #[serde(default)]
    pub name: Option<String>,
    /// Base64-encoded shell script run once when the notebook instance is created.
    #[serde(default)]
    pub on_create: Option<String>,
    /// Base64-encoded shell script run on every start.
    #[serde(default)]
    pub on_start: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct LifecycleConfigState {
    pub name: String,
    pub arn: String,
    pub on_create: Option<String>,
    pub on_start: Option<String>,
}

pub fn validate_lifecycle_config_name(name: &str) -> anyhow::Result<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        bail!("name must be between 1 and {MAX_NAME_LEN} characters, got {}", name.len());
    }
    if let Some(c) = name.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '-')) {
        bail!("name {name:?} may only contain alphanumerics and hyphens, found {c:?}");
    }
    Ok(())
}

fn validate_script(field: &str, script: &str) -> anyhow::Result<()> {
    if script.len() > MAX_SCRIPT_LEN {
        bail!("{field} must be at most {MAX_SCRIPT_LEN} characters, got {}", script.len());
    }
    STANDARD
        .decode(script)
        .with_context(|| format!("{field} is not valid base64"))?;
    Ok(())
}

pub fn validate_lifecycle_config(config: &LifecycleConfig) -> anyhow::Result<()> {
    if let Some(name) = &config.name {
        validate_lifecycle_config_name(name)?;
    }
    if let Some(on_create) = &config.on_create {
        validate_script("on_create", on_create)?;
    }
    if let Some(on_start) = &config.on_start {
        validate_script("on_start", on_start)?;
    }
    Ok(())
}
