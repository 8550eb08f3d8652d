use std::{fmt, time::Duration};

use anyhow::bail;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::config::TimeoutConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("resource ID is empty")]
    Empty,
    #[error("malformed resource ID '{id}', expected {expected}")]
    Malformed { id: String, expected: &'static str },
}

/// The remote identity of one resource instance. `Display` and `parse` are
/// inverses and together form the persisted ID format.
pub trait ResourceId: Sized + Clone + fmt::Display + fmt::Debug + Send + Sync {
    fn parse(s: &str) -> Result<Self, IdError>;
}

impl ResourceId for String {
    fn parse(s: &str) -> Result<Self, IdError> {
        if s.trim().is_empty() {
            return Err(IdError::Empty);
        }
        Ok(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceData<I, S> {
    pub id:    I,
    pub state: S,
}

/// Budgets for the state-change polls of each verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceTimeouts {
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl ResourceTimeouts {
    pub const fn new(create: Duration, update: Duration, delete: Duration) -> Self {
        Self { create, update, delete }
    }

    pub const fn uniform(timeout: Duration) -> Self {
        Self::new(timeout, timeout, timeout)
    }

    pub fn with_overrides(self, config: &TimeoutConfig) -> Self {
        Self {
            create: config.create_secs.map(Duration::from_secs).unwrap_or(self.create),
            update: config.update_secs.map(Duration::from_secs).unwrap_or(self.update),
            delete: config.delete_secs.map(Duration::from_secs).unwrap_or(self.delete),
        }
    }
}

impl Default for ResourceTimeouts {
    fn default() -> Self {
        Self::uniform(Duration::from_secs(10 * 60))
    }
}

/// One step of an update, with a human-readable description for logs.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedOp<O> {
    pub op: O,
    pub friendly_message: String,
}

#[macro_export]
macro_rules! connector_op {
    ($op:expr, $msg:expr) => {
        $crate::connector::PlannedOp {
            op: $op,
            friendly_message: $msg,
        }
    };
}

/// Create / Read / Update / Delete / Import for a single AWS resource type.
#[async_trait]
pub trait ResourceConnector: Send + Sync {
    type Id: ResourceId;
    type Config: Serialize + DeserializeOwned + fmt::Debug + Send + Sync;
    type State: Serialize + DeserializeOwned + fmt::Debug + Clone + PartialEq + Send + Sync;

    fn type_name(&self) -> &'static str;

    fn validate(&self, _config: &Self::Config) -> anyhow::Result<()> {
        Ok(())
    }

    /// Fields that differ between `current` and `desired` and can only be
    /// changed by destroying and recreating the resource.
    fn replacement_fields(&self, current: &Self::State, desired: &Self::Config) -> Vec<&'static str>;

    async fn create(&self, config: &Self::Config) -> anyhow::Result<ResourceData<Self::Id, Self::State>>;

    /// `Ok(None)` when the resource no longer exists.
    async fn read(&self, id: &Self::Id) -> anyhow::Result<Option<Self::State>>;

    async fn update(&self, id: &Self::Id, current: &Self::State, desired: &Self::Config) -> anyhow::Result<Self::State>;

    /// Succeeds when the resource is already gone.
    async fn delete(&self, id: &Self::Id) -> anyhow::Result<()>;

    async fn import(&self, import_id: &str) -> anyhow::Result<Option<ResourceData<Self::Id, Self::State>>> {
        let id = Self::Id::parse(import_id)?;
        let state = self.read(&id).await?;
        Ok(state.map(|state| ResourceData { id, state }))
    }
}

/// Fails the update when any force-new field changed.
pub fn ensure_in_place(type_name: &str, id: &impl fmt::Display, fields: &[&'static str]) -> anyhow::Result<()> {
    if !fields.is_empty() {
        bail!(
            "{} {}: changing {} requires replacing the resource",
            type_name,
            id,
            fields.join(", ")
        );
    }
    Ok(())
}

/// Turns the Read that closes a Create or Update into a hard requirement.
pub fn require_state<S>(state: Option<S>, type_name: &str, id: &impl fmt::Display, after: &str) -> anyhow::Result<S> {
    match state {
        Some(state) => Ok(state),
        None => bail!("{} {} not found after {}", type_name, id, after),
    }
}
