use std::{sync::Arc, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use stratus_aws_core::{
    connector::{ResourceConnector, ResourceData, ResourceTimeouts, ensure_in_place, require_state},
    wait::StateChangeConf,
};

use crate::{
    api::{KinesisVideoApi, StreamDescription},
    resource::{
        KINESIS_VIDEO_STREAM_TYPE, KinesisVideoStreamConfig, KinesisVideoStreamState, stream_status,
        validate_kinesis_video_stream,
    },
};

mod get;
mod op_exec;
mod plan;

pub use plan::plan_stream_update;

pub const DEFAULT_TIMEOUTS: ResourceTimeouts = ResourceTimeouts::new(
    Duration::from_secs(5 * 60),
    Duration::from_secs(120 * 60),
    Duration::from_secs(120 * 60),
);

const POLL_DELAY: Duration = Duration::from_secs(10);
const POLL_MIN_TIMEOUT: Duration = Duration::from_secs(3);

pub struct KinesisVideoStreamConnector<A> {
    api: Arc<A>,
    timeouts: ResourceTimeouts,
}

impl<A: KinesisVideoApi> KinesisVideoStreamConnector<A> {
    pub fn new(api: Arc<A>, timeouts: ResourceTimeouts) -> Self {
        Self { api, timeouts }
    }

    /// Waits for the stream to settle in `ACTIVE` and returns the settled
    /// description, whose version is the one the next mutation must send.
    async fn wait_active(&self, arn: &str, pending: &str, timeout: Duration) -> anyhow::Result<StreamDescription> {
        let stream = StateChangeConf::new(&[pending], &[stream_status::ACTIVE], timeout)
            .delay(POLL_DELAY)
            .min_timeout(POLL_MIN_TIMEOUT)
            .wait_for_state(arn, || self.stream_status(arn))
            .await?;
        Ok(stream)
    }
}

#[async_trait]
impl<A: KinesisVideoApi> ResourceConnector for KinesisVideoStreamConnector<A> {
    type Id = String;
    type Config = KinesisVideoStreamConfig;
    type State = KinesisVideoStreamState;

    fn type_name(&self) -> &'static str {
        KINESIS_VIDEO_STREAM_TYPE
    }

    fn validate(&self, config: &KinesisVideoStreamConfig) -> anyhow::Result<()> {
        validate_kinesis_video_stream(config)
    }

    fn replacement_fields(&self, current: &KinesisVideoStreamState, desired: &KinesisVideoStreamConfig) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if current.name != desired.name {
            fields.push("name");
        }
        if desired.kms_key_id.is_some() && current.kms_key_id != desired.kms_key_id {
            fields.push("kms_key_id");
        }
        fields
    }

    async fn create(
        &self,
        config: &KinesisVideoStreamConfig,
    ) -> anyhow::Result<ResourceData<String, KinesisVideoStreamState>> {
        tracing::info!("Creating Kinesis Video stream {}", config.name);
        let arn = self
            .api
            .create_stream(config)
            .await
            .with_context(|| format!("Failed to create Kinesis Video stream {}", config.name))?;

        self.wait_active(&arn, stream_status::CREATING, self.timeouts.create)
            .await
            .with_context(|| format!("Failed waiting for Kinesis Video stream {} to become active", config.name))?;

        let state = require_state(self.read(&arn).await?, KINESIS_VIDEO_STREAM_TYPE, &arn, "create")?;
        Ok(ResourceData { id: arn, state })
    }

    async fn read(&self, arn: &String) -> anyhow::Result<Option<KinesisVideoStreamState>> {
        self.get_stream(arn).await
    }

    async fn update(
        &self,
        arn: &String,
        current: &KinesisVideoStreamState,
        desired: &KinesisVideoStreamConfig,
    ) -> anyhow::Result<KinesisVideoStreamState> {
        ensure_in_place(KINESIS_VIDEO_STREAM_TYPE, arn, &self.replacement_fields(current, desired))?;

        let mut version = current.version.clone();
        for planned in plan_stream_update(&current.name, current, desired) {
            tracing::info!(resource = KINESIS_VIDEO_STREAM_TYPE, "{}", planned.friendly_message);
            if let Some(settled) = self
                .exec_stream_op(arn, &version, &planned.op)
                .await
                .with_context(|| format!("{}: {}", KINESIS_VIDEO_STREAM_TYPE, planned.friendly_message))?
            {
                version = settled.version;
            }
        }

        require_state(self.read(arn).await?, KINESIS_VIDEO_STREAM_TYPE, arn, "update")
    }

    async fn delete(&self, arn: &String) -> anyhow::Result<()> {
        let version = match self.api.describe_stream(arn).await {
            Ok(Some(stream)) => stream.version,
            Ok(None) => {
                tracing::info!("Kinesis Video stream {} already gone", arn);
                return Ok(());
            }
            Err(e) if e.is_not_found() => {
                tracing::info!("Kinesis Video stream {} already gone", arn);
                return Ok(());
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to describe Kinesis Video stream {arn}")),
        };

        tracing::info!("Deleting Kinesis Video stream {}", arn);
        match self.api.delete_stream(arn, &version).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(e).with_context(|| format!("Failed to delete Kinesis Video stream {arn}")),
        }

        StateChangeConf::new(&[stream_status::DELETING], &[stream_status::DELETED], self.timeouts.delete)
            .delay(POLL_DELAY)
            .min_timeout(POLL_MIN_TIMEOUT)
            .wait_for_state(arn, || self.deletion_status(arn))
            .await
            .with_context(|| format!("Failed waiting for Kinesis Video stream {arn} to be deleted"))?;

        Ok(())
    }
}
