use std::{sync::Arc, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use stratus_aws_core::{
    connector::{ResourceConnector, ResourceData, ensure_in_place, require_state},
    error::{AwsError, AwsErrorKind},
    retry::{RetryConfig, retry_when},
};

use crate::{
    api::S3Api,
    resource::{BUCKET_POLICY_TYPE, BucketPolicy, normalize_policy, policies_equivalent, validate_bucket_policy},
};

mod get;

/// How long PutBucketPolicy is retried while IAM principals propagate or a
/// freshly created bucket becomes visible.
pub const PUT_POLICY_RETRY_TIMEOUT: Duration = Duration::from_secs(2 * 60);

/// `MalformedPolicy: Invalid principal` and `NoSuchBucket` both clear up on
/// their own shortly after the principal or bucket is created.
fn put_policy_is_retryable(err: &AwsError) -> bool {
    matches!(err.kind(), AwsErrorKind::Transient | AwsErrorKind::NotFound | AwsErrorKind::Throttled)
}

pub struct BucketPolicyConnector<A> {
    api: Arc<A>,
    retry: RetryConfig,
}

impl<A: S3Api> BucketPolicyConnector<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            retry: RetryConfig::with_timeout(PUT_POLICY_RETRY_TIMEOUT),
        }
    }

    async fn put_policy(&self, bucket: &str, policy: &str) -> anyhow::Result<()> {
        retry_when(
            &self.retry,
            "PutBucketPolicy",
            || self.api.put_bucket_policy(bucket, policy),
            put_policy_is_retryable,
        )
        .await
        .with_context(|| format!("Failed to put policy on S3 bucket {bucket}"))
    }
}

#[async_trait]
impl<A: S3Api> ResourceConnector for BucketPolicyConnector<A> {
    type Id = String;
    type Config = BucketPolicy;
    type State = BucketPolicy;

    fn type_name(&self) -> &'static str {
        BUCKET_POLICY_TYPE
    }

    fn validate(&self, config: &BucketPolicy) -> anyhow::Result<()> {
        validate_bucket_policy(config)
    }

    fn replacement_fields(&self, current: &BucketPolicy, desired: &BucketPolicy) -> Vec<&'static str> {
        if current.bucket != desired.bucket { vec!["bucket"] } else { vec![] }
    }

    async fn create(&self, config: &BucketPolicy) -> anyhow::Result<ResourceData<String, BucketPolicy>> {
        let policy = normalize_policy(&config.policy)?;
        tracing::info!("Putting policy on S3 bucket {}", config.bucket);
        self.put_policy(&config.bucket, &policy).await?;

        let id = config.bucket.clone();
        let state = require_state(self.read(&id).await?, BUCKET_POLICY_TYPE, &id, "create")?;
        Ok(ResourceData { id, state })
    }

    async fn read(&self, id: &String) -> anyhow::Result<Option<BucketPolicy>> {
        self.get_bucket_policy(id).await
    }

    async fn update(&self, id: &String, current: &BucketPolicy, desired: &BucketPolicy) -> anyhow::Result<BucketPolicy> {
        ensure_in_place(BUCKET_POLICY_TYPE, id, &self.replacement_fields(current, desired))?;

        if !policies_equivalent(&current.policy, &desired.policy) {
            let policy = normalize_policy(&desired.policy)?;
            tracing::info!("Updating policy on S3 bucket {}", id);
            self.put_policy(id, &policy).await?;
        }

        require_state(self.read(id).await?, BUCKET_POLICY_TYPE, id, "update")
    }

    async fn delete(&self, id: &String) -> anyhow::Result<()> {
        tracing::info!("Deleting policy from S3 bucket {}", id);
        match self.api.delete_bucket_policy(id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::info!("S3 bucket {} already has no policy", id);
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to delete policy from S3 bucket {id}")),
        }
    }
}
