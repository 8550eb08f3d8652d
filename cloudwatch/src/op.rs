use serde::{Deserialize, Serialize};
use stratus_aws_core::tags::Tags;

/// One field-group change to an existing log group. Ops run in the order
/// they are planned; each maps to one CloudWatch Logs call (two for tags).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LogGroupOp {
    PutRetention { retention_in_days: i32 },
    DeleteRetention,
    AssociateKmsKey { kms_key_id: String },
    DisassociateKmsKey,
    UpdateTags(Tags, Tags),
}
