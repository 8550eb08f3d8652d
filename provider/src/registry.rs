use stratus_aws_cloudwatch::{
    LogGroupConnector, MetricFilterConnector,
    resource::{LOG_GROUP_TYPE, METRIC_FILTER_TYPE},
};
use stratus_aws_core::{
    config::ProviderConfig,
    protocol::{FailureKind, Request, Response, classify_failure, dispatch},
    util::AccountContext,
};
use stratus_aws_directconnect::{DxConnectionConnector, resource::DX_CONNECTION_TYPE};
use stratus_aws_kinesisvideo::{KinesisVideoStreamConnector, resource::KINESIS_VIDEO_STREAM_TYPE};
use stratus_aws_s3::{BucketPolicyConnector, resource::BUCKET_POLICY_TYPE};
use stratus_aws_sagemaker::{LifecycleConfigConnector, resource::LIFECYCLE_CONFIG_TYPE};

use crate::clients::ClientCache;

pub const RESOURCE_TYPES: &[&str] = &[
    LOG_GROUP_TYPE,
    METRIC_FILTER_TYPE,
    DX_CONNECTION_TYPE,
    KINESIS_VIDEO_STREAM_TYPE,
    BUCKET_POLICY_TYPE,
    LIFECYCLE_CONFIG_TYPE,
];

/// Routes requests to the connector for their resource type, building the
/// regional clients on first use.
pub struct Provider {
    config: ProviderConfig,
    account_id: String,
    clients: ClientCache,
}

fn invalid(message: String) -> Response {
    Response::Failed {
        kind: FailureKind::Invalid,
        message,
    }
}

impl Provider {
    pub fn new(config: ProviderConfig, account_id: String) -> Self {
        Self {
            clients: ClientCache::new(config.clone()),
            config,
            account_id,
        }
    }

    pub async fn handle(&self, request: Request) -> Response {
        let Request {
            resource_type,
            region,
            verb,
        } = request;

        if !RESOURCE_TYPES.contains(&resource_type.as_str()) {
            return invalid(format!("Unsupported resource type {resource_type}"));
        }
        if let Err(e) = self.config.ensure_region_enabled(&region) {
            return invalid(format!("{e:#}"));
        }

        let clients = match self.clients.get_or_init(&region).await {
            Ok(clients) => clients,
            Err(e) => {
                return Response::Failed {
                    kind: classify_failure(&e),
                    message: format!("{e:#}"),
                };
            }
        };

        tracing::info!(resource = %resource_type, %region, verb = verb.name(), "Handling request");

        let timeouts = self.config.timeouts();
        match resource_type.as_str() {
            LOG_GROUP_TYPE => dispatch(&LogGroupConnector::new(clients.logs.clone()), verb).await,
            METRIC_FILTER_TYPE => dispatch(&MetricFilterConnector::new(clients.logs.clone()), verb).await,
            DX_CONNECTION_TYPE => {
                let connector = DxConnectionConnector::new(
                    clients.directconnect.clone(),
                    AccountContext::new(&region, &self.account_id),
                    stratus_aws_directconnect::connector::DEFAULT_TIMEOUTS.with_overrides(&timeouts),
                );
                dispatch(&connector, verb).await
            }
            KINESIS_VIDEO_STREAM_TYPE => {
                let connector = KinesisVideoStreamConnector::new(
                    clients.kinesisvideo.clone(),
                    stratus_aws_kinesisvideo::connector::DEFAULT_TIMEOUTS.with_overrides(&timeouts),
                );
                dispatch(&connector, verb).await
            }
            BUCKET_POLICY_TYPE => dispatch(&BucketPolicyConnector::new(clients.s3.clone()), verb).await,
            LIFECYCLE_CONFIG_TYPE => dispatch(&LifecycleConfigConnector::new(clients.sagemaker.clone()), verb).await,
            other => invalid(format!("Unsupported resource type {other}")),
        }
    }
}
