use stratus_aws_core::{connector::PlannedOp, connector_op, util::diff_ron_values};

use crate::{
    op::DxConnectionOp,
    resource::{DxConnectionConfig, DxConnectionState},
};

/// Name first, then tags. Bandwidth, location and provider changes are
/// rejected before planning.
pub fn plan_dx_connection_update(
    id: &str,
    current: &DxConnectionState,
    desired: &DxConnectionConfig,
) -> Vec<PlannedOp<DxConnectionOp>> {
    let mut ops = Vec::new();

    if current.name != desired.name {
        ops.push(connector_op!(
            DxConnectionOp::UpdateName {
                name: desired.name.clone(),
            },
            format!(
                "Rename Direct Connect connection {} from `{}` to `{}`",
                id, current.name, desired.name
            )
        ));
    }

    if current.tags != desired.tags {
        let diff = diff_ron_values(&current.tags, &desired.tags).unwrap_or_default();
        ops.push(connector_op!(
            DxConnectionOp::UpdateTags(current.tags.clone(), desired.tags.clone()),
            format!("Modify tags for Direct Connect connection {}\n{}", id, diff)
        ));
    }

    ops
}
