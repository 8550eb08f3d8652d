use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use stratus_aws_core::error::{AwsError, AwsErrorKind};

use crate::api::S3Api;

struct InjectedFailure {
    remaining: u32,
    kind: AwsErrorKind,
    code: &'static str,
    message: &'static str,
}

#[derive(Default)]
struct Inner {
    /// Bucket name to policy text.
    buckets: BTreeMap<String, Option<String>>,
    put_attempts: u32,
    put_failure: Option<InjectedFailure>,
}

#[derive(Default)]
pub struct FakeS3 {
    inner: Mutex<Inner>,
}

impl FakeS3 {
    pub fn with_bucket(bucket: &str) -> Self {
        let fake = Self::default();
        fake.lock().buckets.insert(bucket.to_string(), None);
        fake
    }

    /// The next `times` PutBucketPolicy calls fail with the given error.
    pub fn fail_puts(&self, times: u32, kind: AwsErrorKind, code: &'static str, message: &'static str) {
        self.lock().put_failure = Some(InjectedFailure {
            remaining: times,
            kind,
            code,
            message,
        });
    }

    pub fn put_attempts(&self) -> u32 {
        self.lock().put_attempts
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }
}

fn no_such_bucket() -> AwsError {
    AwsError::new(AwsErrorKind::NotFound, Some("NoSuchBucket"), "The specified bucket does not exist")
}

#[async_trait]
impl S3Api for FakeS3 {
    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), AwsError> {
        let mut inner = self.lock();
        inner.put_attempts += 1;

        if let Some(failure) = inner.put_failure.as_mut() {
            if failure.remaining > 0 {
                failure.remaining -= 1;
                return Err(AwsError::new(failure.kind, Some(failure.code), failure.message));
            }
        }

        match inner.buckets.get_mut(bucket) {
            Some(slot) => {
                *slot = Some(policy.to_string());
                Ok(())
            }
            None => Err(no_such_bucket()),
        }
    }

    async fn get_bucket_policy(&self, bucket: &str) -> Result<String, AwsError> {
        match self.lock().buckets.get(bucket) {
            Some(Some(policy)) => Ok(policy.clone()),
            Some(None) => Err(AwsError::new(
                AwsErrorKind::NotFound,
                Some("NoSuchBucketPolicy"),
                "The bucket policy does not exist",
            )),
            None => Err(no_such_bucket()),
        }
    }

    async fn delete_bucket_policy(&self, bucket: &str) -> Result<(), AwsError> {
        match self.lock().buckets.get_mut(bucket) {
            // S3 answers 204 whether or not a policy was attached.
            Some(slot) => {
                *slot = None;
                Ok(())
            }
            None => Err(no_such_bucket()),
        }
    }
}
