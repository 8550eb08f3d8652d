use anyhow::Context;

use crate::{
    api::S3Api,
    resource::{BucketPolicy, normalize_policy},
};

use super::BucketPolicyConnector;

impl<A: S3Api> BucketPolicyConnector<A> {
    pub(crate) async fn get_bucket_policy(&self, bucket: &str) -> anyhow::Result<Option<BucketPolicy>> {
        let policy = match self.api.get_bucket_policy(bucket).await {
            Ok(policy) => policy,
            Err(e) if e.is_not_found() => {
                tracing::info!("S3 bucket {} has no policy ({})", bucket, e.code.as_deref().unwrap_or("not found"));
                return Ok(None);
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to get policy for S3 bucket {bucket}")),
        };

        Ok(Some(BucketPolicy {
            bucket: bucket.to_string(),
            policy: normalize_policy(&policy)
                .with_context(|| format!("S3 bucket {bucket} returned an unreadable policy"))?,
        }))
    }
}
