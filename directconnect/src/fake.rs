use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use stratus_aws_core::{
    error::{AwsError, AwsErrorKind},
    tags::Tags,
};

use crate::{
    api::{ConnectionDescription, DirectConnectApi},
    resource::{DxConnectionConfig, connection_state},
};

#[derive(Default)]
struct Inner {
    connections: BTreeMap<String, ConnectionDescription>,
    next_id: u32,
    calls: Vec<String>,
    describe_calls: u32,
    /// Lookups that still report `deleting` after DeleteConnection.
    deleting_lookups: u32,
    describe_error: Option<AwsError>,
}

/// In-memory Direct Connect. New connections start in `requested`.
#[derive(Default)]
pub struct FakeDirectConnect {
    inner: Mutex<Inner>,
}

fn not_found(id: &str) -> AwsError {
    AwsError::new(
        AwsErrorKind::NotFound,
        Some("DirectConnectClientException"),
        format!("Could not find Connection with ID {id}"),
    )
}

fn arn_id(arn: &str) -> &str {
    arn.rsplit('/').next().unwrap_or(arn)
}

impl FakeDirectConnect {
    pub fn set_state(&self, id: &str, state: &str) {
        if let Some(c) = self.lock().connections.get_mut(id) {
            c.state = state.to_string();
        }
    }

    /// After DeleteConnection, the next `lookups` describes report `deleting`
    /// before the connection disappears.
    pub fn stay_deleting_for(&self, lookups: u32) {
        self.lock().deleting_lookups = lookups;
    }

    pub fn fail_describe(&self, error: AwsError) {
        self.lock().describe_error = Some(error);
    }

    pub fn describe_calls(&self) -> u32 {
        self.lock().describe_calls
    }

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
impl DirectConnectApi for FakeDirectConnect {
    async fn create_connection(&self, config: &DxConnectionConfig) -> Result<String, AwsError> {
        let mut inner = self.mutate("create_connection");
        inner.next_id += 1;
        let id = format!("dxcon-{:08x}", inner.next_id);
        inner.connections.insert(id.clone(), ConnectionDescription {
            id: id.clone(),
            name: config.name.clone(),
            state: connection_state::REQUESTED.to_string(),
            bandwidth: config.bandwidth.clone(),
            location: config.location.clone(),
            provider_name: config.provider_name.clone(),
            aws_device: None,
            jumbo_frame_capable: false,
            has_logical_redundancy: Some("unknown".into()),
            tags: config.tags.clone(),
        });
        Ok(id)
    }

    async fn describe_connection(&self, id: &str) -> Result<Option<ConnectionDescription>, AwsError> {
        let mut inner = self.lock();
        inner.describe_calls += 1;
        if let Some(e) = &inner.describe_error {
            return Err(e.clone());
        }

        let deleting = inner
            .connections
            .get(id)
            .is_some_and(|c| c.state == connection_state::DELETING);
        if deleting {
            if inner.deleting_lookups == 0 {
                inner.connections.remove(id);
                return Ok(None);
            }
            inner.deleting_lookups -= 1;
        }

        Ok(inner.connections.get(id).cloned())
    }

    async fn update_connection_name(&self, id: &str, name: &str) -> Result<(), AwsError> {
        let mut inner = self.mutate("update_connection");
        let connection = inner.connections.get_mut(id).ok_or_else(|| not_found(id))?;
        connection.name = name.to_string();
        Ok(())
    }

    async fn tag_resource(&self, arn: &str, tags: &Tags) -> Result<(), AwsError> {
        let mut inner = self.mutate("tag_resource");
        let id = arn_id(arn);
        let connection = inner.connections.get_mut(id).ok_or_else(|| not_found(id))?;
        for (k, v) in tags.iter() {
            connection.tags.insert(k.clone(), v.clone());
        }
        Ok(())
    }

    async fn untag_resource(&self, arn: &str, keys: &[String]) -> Result<(), AwsError> {
        let mut inner = self.mutate("untag_resource");
        let id = arn_id(arn);
        let connection = inner.connections.get_mut(id).ok_or_else(|| not_found(id))?;
        connection.tags = connection
            .tags
            .iter()
            .filter(|(k, _)| !keys.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(())
    }

    async fn delete_connection(&self, id: &str) -> Result<(), AwsError> {
        let mut inner = self.mutate("delete_connection");
        let connection = inner.connections.get_mut(id).ok_or_else(|| not_found(id))?;
        connection.state = connection_state::DELETING.to_string();
        Ok(())
    }
}
