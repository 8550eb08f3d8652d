use serde::{Deserialize, Serialize};
use stratus_aws_core::tags::Tags;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DxConnectionOp {
    UpdateName { name: String },
    UpdateTags(Tags, Tags),
}
