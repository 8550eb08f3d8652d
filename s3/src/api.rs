use async_trait::async_trait;
use aws_sdk_s3::Client;
use stratus_aws_core::error::AwsError;

#[async_trait]
pub trait S3Api: Send + Sync {
    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), AwsError>;
    /// Fails with a not-found error when the bucket or its policy is missing.
    async fn get_bucket_policy(&self, bucket: &str) -> Result<String, AwsError>;
    async fn delete_bucket_policy(&self, bucket: &str) -> Result<(), AwsError>;
}

#[async_trait]
impl S3Api for Client {
    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), AwsError> {
        self.put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        Ok(())
    }

    async fn get_bucket_policy(&self, bucket: &str) -> Result<String, AwsError> {
        let out = self
            .get_bucket_policy()
            .bucket(bucket)
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        out.policy
            .ok_or_else(|| AwsError::other(format!("GetBucketPolicy for {bucket} returned no policy")))
    }

    async fn delete_bucket_policy(&self, bucket: &str) -> Result<(), AwsError> {
        self.delete_bucket_policy()
            .bucket(bucket)
            .send()
            .await
            .map_err(AwsError::from_sdk)?;
        Ok(())
    }
}
