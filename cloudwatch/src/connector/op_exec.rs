use stratus_aws_core::tags::tag_diff;

use crate::{api::LogsApi, op::LogGroupOp};

use super::LogGroupConnector;

impl<A: LogsApi> LogGroupConnector<A> {
    pub(crate) async fn exec_log_group_op(&self, name: &str, arn: &str, op: &LogGroupOp) -> anyhow::Result<()> {
        match op {
            LogGroupOp::PutRetention { retention_in_days } => {
                self.api.put_retention_policy(name, *retention_in_days).await?;
            }
            LogGroupOp::DeleteRetention => {
                self.api.delete_retention_policy(name).await?;
            }
            LogGroupOp::AssociateKmsKey { kms_key_id } => {
                self.api.associate_kms_key(name, kms_key_id).await?;
            }
            LogGroupOp::DisassociateKmsKey => {
                self.api.disassociate_kms_key(name).await?;
            }
            LogGroupOp::UpdateTags(old_tags, new_tags) => {
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
