use anyhow::Context;
use stratus_aws_core::tags::tag_diff;

use crate::{
    api::{KinesisVideoApi, RetentionChange, StreamDescription},
    op::KinesisVideoStreamOp,
    resource::stream_status,
};

use super::KinesisVideoStreamConnector;

impl<A: KinesisVideoApi> KinesisVideoStreamConnector<A> {
    /// Runs one op against `version`. Versioned ops wait for the stream to
    /// settle and return the settled description.
    pub(crate) async fn exec_stream_op(
        &self,
        arn: &str,
        version: &str,
        op: &KinesisVideoStreamOp,
    ) -> anyhow::Result<Option<StreamDescription>> {
        match op {
            KinesisVideoStreamOp::UpdateStream { device_name, media_type } => {
                self.api
                    .update_stream(arn, version, device_name.as_deref(), media_type.as_deref())
                    .await?;
            }
            KinesisVideoStreamOp::IncreaseDataRetention { hours } => {
                self.api
                    .update_data_retention(arn, version, RetentionChange::Increase(*hours))
                    .await?;
            }
            KinesisVideoStreamOp::DecreaseDataRetention { hours } => {
                self.api
                    .update_data_retention(arn, version, RetentionChange::Decrease(*hours))
                    .await?;
            }
            KinesisVideoStreamOp::UpdateTags(old_tags, new_tags) => {
                let (remove_keys, upsert) = tag_diff(old_tags, new_tags);
                if !remove_keys.is_empty() {
                    self.api.untag_stream(arn, &remove_keys).await?;
                }
                if !upsert.is_empty() {
                    self.api.tag_stream(arn, &upsert).await?;
                }
                return Ok(None);
            }
        }

        let settled = self
            .wait_active(arn, stream_status::UPDATING, self.timeouts.update)
            .await
            .with_context(|| format!("Failed waiting for Kinesis Video stream {arn} to finish updating"))?;
        Ok(Some(settled))
    }
}
