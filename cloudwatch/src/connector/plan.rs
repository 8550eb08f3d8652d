use stratus_aws_core::{
    connector::PlannedOp,
    connector_op,
    util::diff_ron_values,
};

use crate::{
    op::LogGroupOp,
    resource::{LogGroupConfig, LogGroupState},
};

/// Computes the ordered operations that take log group `name` from `current`
/// to `desired`: retention, then KMS association, then tags.
pub fn plan_log_group_update(name: &str, current: &LogGroupState, desired: &LogGroupConfig) -> Vec<PlannedOp<LogGroupOp>> {
    let mut ops = Vec::new();

    if current.retention_in_days != desired.retention_in_days {
        if desired.retention_in_days > 0 {
            ops.push(connector_op!(
                LogGroupOp::PutRetention {
                    retention_in_days: desired.retention_in_days,
                },
                format!(
                    "Set retention for CloudWatch log group `{}` to {} days",
                    name, desired.retention_in_days
                )
            ));
        } else {
            ops.push(connector_op!(
                LogGroupOp::DeleteRetention,
                format!("Remove retention policy from CloudWatch log group `{}`", name)
            ));
        }
    }

    if current.kms_key_id != desired.kms_key_id {
        match &desired.kms_key_id {
            Some(kms_key_id) => ops.push(connector_op!(
                LogGroupOp::AssociateKmsKey {
                    kms_key_id: kms_key_id.clone(),
                },
                format!("Associate KMS key {} with CloudWatch log group `{}`", kms_key_id, name)
            )),
            None => ops.push(connector_op!(
                LogGroupOp::DisassociateKmsKey,
                format!("Disassociate KMS key from CloudWatch log group `{}`", name)
            )),
        }
    }

    if current.tags != desired.tags {
        let diff = diff_ron_values(&current.tags, &desired.tags).unwrap_or_default();
        ops.push(connector_op!(
            LogGroupOp::UpdateTags(current.tags.clone(), desired.tags.clone()),
            format!("Modify tags for CloudWatch log group `{}`\n{}", name, diff)
        ));
    }

    ops
}
