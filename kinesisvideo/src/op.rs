use serde::{Deserialize, Serialize};
use stratus_aws_core::tags::Tags;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum KinesisVideoStreamOp {
    UpdateStream {
        device_name: Option<String>,
        media_type:  Option<String>,
    },
    IncreaseDataRetention {
        hours: i32,
    },
    DecreaseDataRetention {
        hours: i32,
    },
    UpdateTags(Tags, Tags),
}
