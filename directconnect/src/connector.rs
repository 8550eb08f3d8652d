use std::{sync::Arc, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use stratus_aws_core::{
    connector::{ResourceConnector, ResourceData, ResourceTimeouts, ensure_in_place, require_state},
    tags::tag_diff,
    util::AccountContext,
    wait::{Observed, StateChangeConf},
};

use crate::{
    api::{ConnectionDescription, DirectConnectApi},
    op::DxConnectionOp,
    resource::{DX_CONNECTION_TYPE, DxConnectionConfig, DxConnectionState, connection_state, validate_dx_connection},
};

mod plan;

pub use plan::plan_dx_connection_update;

pub const DEFAULT_TIMEOUTS: ResourceTimeouts =
    ResourceTimeouts::new(Duration::from_secs(10 * 60), Duration::from_secs(10 * 60), Duration::from_secs(10 * 60));

pub struct DxConnectionConnector<A> {
    api: Arc<A>,
    account: AccountContext,
    timeouts: ResourceTimeouts,
}

impl<A: DirectConnectApi> DxConnectionConnector<A> {
    pub fn new(api: Arc<A>, account: AccountContext, timeouts: ResourceTimeouts) -> Self {
        Self { api, account, timeouts }
    }

    fn connection_arn(&self, id: &str) -> String {
        self.account.arn("directconnect", &format!("dxcon/{id}"))
    }

    fn to_state(&self, connection: ConnectionDescription) -> DxConnectionState {
        DxConnectionState {
            arn: self.connection_arn(&connection.id),
            id: connection.id,
            name: connection.name,
            bandwidth: connection.bandwidth,
            location: connection.location,
            provider_name: connection.provider_name,
            connection_state: connection.state,
            aws_device: connection.aws_device,
            jumbo_frame_capable: connection.jumbo_frame_capable,
            has_logical_redundancy: connection.has_logical_redundancy,
            tags: connection.tags,
        }
    }

    /// Status lookup for deletion: a connection the describe call no longer
    /// returns is reported as `deleted`.
    async fn deletion_status(&self, id: &str) -> anyhow::Result<Option<Observed<()>>> {
        match self.api.describe_connection(id).await {
            Ok(Some(connection)) => Ok(Some(Observed::new((), connection.state))),
            Ok(None) => Ok(Some(Observed::new((), connection_state::DELETED))),
            Err(e) if e.is_not_found() => Ok(Some(Observed::new((), connection_state::DELETED))),
            Err(e) => Err(e).with_context(|| format!("Failed to describe Direct Connect connection {id}")),
        }
    }

    async fn exec_op(&self, id: &str, arn: &str, op: &DxConnectionOp) -> anyhow::Result<()> {
        match op {
            DxConnectionOp::UpdateName { name } => {
                self.api.update_connection_name(id, name).await?;
            }
            DxConnectionOp::UpdateTags(old_tags, new_tags) => {
                let (remove_keys, upsert) = tag_diff(old_tags, new_tags);
                if !remove_keys.is_empty() {
                    self.api.untag_resource(arn, &remove_keys).await?;
                }
                if !upsert.is_empty() {
                    self.api.tag_resource(arn, &upsert).await?;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<A: DirectConnectApi> ResourceConnector for DxConnectionConnector<A> {
    type Id = String;
    type Config = DxConnectionConfig;
    type State = DxConnectionState;

    fn type_name(&self) -> &'static str {
        DX_CONNECTION_TYPE
    }

    fn validate(&self, config: &DxConnectionConfig) -> anyhow::Result<()> {
        validate_dx_connection(config)
    }

    fn replacement_fields(&self, current: &DxConnectionState, desired: &DxConnectionConfig) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if current.bandwidth != desired.bandwidth {
            fields.push("bandwidth");
        }
        if current.location != desired.location {
            fields.push("location");
        }
        if desired.provider_name.is_some() && current.provider_name != desired.provider_name {
            fields.push("provider_name");
        }
        fields
    }

    async fn create(&self, config: &DxConnectionConfig) -> anyhow::Result<ResourceData<String, DxConnectionState>> {
        tracing::info!("Creating Direct Connect connection {}", config.name);
        let id = self
            .api
            .create_connection(config)
            .await
            .with_context(|| format!("Failed to create Direct Connect connection {}", config.name))?;

        let state = require_state(self.read(&id).await?, DX_CONNECTION_TYPE, &id, "create")?;
        Ok(ResourceData { id, state })
    }

    async fn read(&self, id: &String) -> anyhow::Result<Option<DxConnectionState>> {
        let connection = match self.api.describe_connection(id).await {
            Ok(Some(connection)) => connection,
            Ok(None) => {
                tracing::info!("Direct Connect connection {} not found", id);
                return Ok(None);
            }
            Err(e) if e.is_not_found() => {
                tracing::info!("Direct Connect connection {} not found", id);
                return Ok(None);
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to describe Direct Connect connection {id}")),
        };

        if connection.state == connection_state::DELETED || connection.state == connection_state::REJECTED {
            tracing::info!("Direct Connect connection {} is {}", id, connection.state);
            return Ok(None);
        }

        Ok(Some(self.to_state(connection)))
    }

    async fn update(&self, id: &String, current: &DxConnectionState, desired: &DxConnectionConfig) -> anyhow::Result<DxConnectionState> {
        ensure_in_place(DX_CONNECTION_TYPE, id, &self.replacement_fields(current, desired))?;

        for planned in plan_dx_connection_update(id, current, desired) {
            tracing::info!(resource = DX_CONNECTION_TYPE, "{}", planned.friendly_message);
            self.exec_op(id, &current.arn, &planned.op)
                .await
                .with_context(|| format!("{}: {}", DX_CONNECTION_TYPE, planned.friendly_message))?;
        }

        require_state(self.read(id).await?, DX_CONNECTION_TYPE, id, "update")
    }

    async fn delete(&self, id: &String) -> anyhow::Result<()> {
        tracing::info!("Deleting Direct Connect connection {}", id);
        match self.api.delete_connection(id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::info!("Direct Connect connection {} already gone", id);
                return Ok(());
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to delete Direct Connect connection {id}")),
        }

        StateChangeConf::new(
            &[
                connection_state::PENDING,
                connection_state::ORDERING,
                connection_state::AVAILABLE,
                connection_state::REQUESTED,
                connection_state::DELETING,
            ],
            &[connection_state::DELETED],
            self.timeouts.delete,
        )
        .delay(Duration::from_secs(10))
        .min_timeout(Duration::from_secs(5))
        .wait_for_state(id, || self.deletion_status(id))
        .await
        .with_context(|| format!("Failed waiting for Direct Connect connection {id} to be deleted"))?;

        Ok(())
    }
}
