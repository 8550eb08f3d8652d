use std::cmp::Ordering;

use stratus_aws_core::{connector::PlannedOp, connector_op, util::diff_ron_values};

use crate::{
    op::KinesisVideoStreamOp,
    resource::{KinesisVideoStreamConfig, KinesisVideoStreamState},
};

/// Stream attributes, then data retention, then tags.
pub fn plan_stream_update(
    name: &str,
    current: &KinesisVideoStreamState,
    desired: &KinesisVideoStreamConfig,
) -> Vec<PlannedOp<KinesisVideoStreamOp>> {
    let mut ops = Vec::new();

    if current.device_name != desired.device_name || current.media_type != desired.media_type {
        ops.push(connector_op!(
            KinesisVideoStreamOp::UpdateStream {
                device_name: desired.device_name.clone(),
                media_type:  desired.media_type.clone(),
            },
            format!(
                "Update Kinesis Video stream `{}` device name {:?} and media type {:?}",
                name, desired.device_name, desired.media_type
            )
        ));
    }

    let delta = desired.data_retention_in_hours - current.data_retention_in_hours;
    match delta.cmp(&0) {
        Ordering::Greater => ops.push(connector_op!(
            KinesisVideoStreamOp::IncreaseDataRetention { hours: delta },
            format!(
                "Increase data retention for Kinesis Video stream `{}` by {} hours to {}",
                name, delta, desired.data_retention_in_hours
            )
        )),
        Ordering::Less => ops.push(connector_op!(
            KinesisVideoStreamOp::DecreaseDataRetention { hours: -delta },
            format!(
                "Decrease data retention for Kinesis Video stream `{}` by {} hours to {}",
                name, -delta, desired.data_retention_in_hours
            )
        )),
        Ordering::Equal => {}
    }

    if current.tags != desired.tags {
        let diff = diff_ron_values(&current.tags, &desired.tags).unwrap_or_default();
        ops.push(connector_op!(
            KinesisVideoStreamOp::UpdateTags(current.tags.clone(), desired.tags.clone()),
            format!("Modify tags for Kinesis Video stream `{}`\n{}", name, diff)
        ));
    }

    ops
}
