use anyhow::Context;
use stratus_aws_core::wait::Observed;

use crate::{
    api::{KinesisVideoApi, StreamDescription},
    resource::{KinesisVideoStreamState, stream_status},
};

use super::KinesisVideoStreamConnector;

impl<A: KinesisVideoApi> KinesisVideoStreamConnector<A> {
    pub(crate) async fn get_stream(&self, arn: &str) -> anyhow::Result<Option<KinesisVideoStreamState>> {
        let stream = match self.api.describe_stream(arn).await {
            Ok(Some(stream)) => stream,
            Ok(None) => {
                tracing::info!("Kinesis Video stream {} not found", arn);
                return Ok(None);
            }
            Err(e) if e.is_not_found() => {
                tracing::info!("Kinesis Video stream {} not found", arn);
                return Ok(None);
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to describe Kinesis Video stream {arn}")),
        };

        let tags = self
            .api
            .list_tags_for_stream(arn)
            .await
            .with_context(|| format!("Failed to list tags for Kinesis Video stream {arn}"))?;

        Ok(Some(KinesisVideoStreamState {
            name: stream.name,
            arn: stream.arn,
            data_retention_in_hours: stream.data_retention_in_hours,
            device_name: stream.device_name,
            kms_key_id: stream.kms_key_id,
            media_type: stream.media_type,
            version: stream.version,
            creation_time: stream.creation_time,
            tags,
        }))
    }

    pub(crate) async fn stream_status(&self, arn: &str) -> anyhow::Result<Option<Observed<StreamDescription>>> {
        match self.api.describe_stream(arn).await {
            Ok(Some(stream)) => {
                let status = stream.status.clone();
                Ok(Some(Observed::new(stream, status)))
            }
            Ok(None) => Ok(None),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to describe Kinesis Video stream {arn}")),
        }
    }

    /// Like `stream_status`, but a stream that can no longer be found is
    /// reported as `DELETED`.
    pub(crate) async fn deletion_status(&self, arn: &str) -> anyhow::Result<Option<Observed<()>>> {
        match self.api.describe_stream(arn).await {
            Ok(Some(stream)) => Ok(Some(Observed::new((), stream.status))),
            Ok(None) => Ok(Some(Observed::new((), stream_status::DELETED))),
            Err(e) if e.is_not_found() => Ok(Some(Observed::new((), stream_status::DELETED))),
            Err(e) => Err(e).with_context(|| format!("Failed to describe Kinesis Video stream {arn}")),
        }
    }
}
