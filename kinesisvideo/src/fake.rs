use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use stratus_aws_core::{
    error::{AwsError, AwsErrorKind},
    tags::Tags,
};

use crate::{
    api::{KinesisVideoApi, RetentionChange, StreamDescription},
    resource::{KinesisVideoStreamConfig, stream_status},
};

const DEFAULT_KMS_KEY: &str = "arn:aws:kms:us-east-1:123456789012:alias/aws/kinesisvideo";

struct Stream {
    description: StreamDescription,
    tags: Tags,
    /// Describes left before a transitional status settles.
    lookups_left: u32,
    version: u32,
}

struct Inner {
    streams: BTreeMap<String, Stream>,
    created: u32,
    transition_lookups: u32,
    calls: Vec<String>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            streams: BTreeMap::new(),
            created: 0,
            transition_lookups: 1,
            calls: Vec::new(),
        }
    }
}

/// In-memory Kinesis Video Streams. Every versioned mutation moves the
/// stream into a transitional status that settles after a configurable
/// number of describes.
#[derive(Default)]
pub struct FakeKinesisVideo {
    inner: Mutex<Inner>,
}

fn not_found(arn: &str) -> AwsError {
    AwsError::new(
        AwsErrorKind::NotFound,
        Some("ResourceNotFoundException"),
        format!("The requested stream {arn} is not found or not active."),
    )
}

impl FakeKinesisVideo {
    pub fn set_transition_lookups(&self, lookups: u32) {
        self.lock().transition_lookups = lookups;
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    fn mutate(&self, call: String) -> MutexGuard<'_, Inner> {
        let mut inner = self.lock();
        inner.calls.push(call);
        inner
    }

    /// Checks the version and status, then bumps the version and starts a
    /// transition to `status`.
    fn versioned_change(
        &self,
        call: String,
        arn: &str,
        version: &str,
        status: &str,
        change: impl FnOnce(&mut StreamDescription),
    ) -> Result<(), AwsError> {
        let mut inner = self.mutate(call);
        let lookups = inner.transition_lookups;
        let stream = inner.streams.get_mut(arn).ok_or_else(|| not_found(arn))?;

        if stream.description.version != version {
            return Err(AwsError::new(
                AwsErrorKind::Other,
                Some("VersionMismatchException"),
                format!("The stream version {version} is not the latest version"),
            ));
        }
        if stream.description.status != stream_status::ACTIVE {
            return Err(AwsError::new(
                AwsErrorKind::Other,
                Some("ResourceInUseException"),
                format!("The stream is {}", stream.description.status),
            ));
        }

        change(&mut stream.description);
        stream.version += 1;
        stream.description.version = stream.version.to_string();
        stream.description.status = status.to_string();
        stream.lookups_left = lookups;
        Ok(())
    }
}

#[async_trait]
impl KinesisVideoApi for FakeKinesisVideo {
    async fn create_stream(&self, config: &KinesisVideoStreamConfig) -> Result<String, AwsError> {
        let mut inner = self.mutate("create_stream".into());
        inner.created += 1;
        let arn = format!(
            "arn:aws:kinesisvideo:us-east-1:123456789012:stream/{}/{}",
            config.name, inner.created
        );
        let lookups_left = inner.transition_lookups;
        inner.streams.insert(arn.clone(), Stream {
            description: StreamDescription {
                name: config.name.clone(),
                arn: arn.clone(),
                status: stream_status::CREATING.to_string(),
                version: "1".into(),
                data_retention_in_hours: config.data_retention_in_hours,
                device_name: config.device_name.clone(),
                kms_key_id: Some(config.kms_key_id.clone().unwrap_or_else(|| DEFAULT_KMS_KEY.into())),
                media_type: config.media_type.clone(),
                creation_time: Some("2026-01-01T00:00:00Z".into()),
            },
            tags: config.tags.clone(),
            lookups_left,
            version: 1,
        });
        Ok(arn)
    }

    async fn describe_stream(&self, arn: &str) -> Result<Option<StreamDescription>, AwsError> {
        let mut inner = self.lock();
        let stream = inner.streams.get_mut(arn).ok_or_else(|| not_found(arn))?;

        let mut gone = false;
        if stream.description.status != stream_status::ACTIVE {
            if stream.lookups_left > 0 {
                stream.lookups_left -= 1;
            } else if stream.description.status == stream_status::DELETING {
                gone = true;
            } else {
                stream.description.status = stream_status::ACTIVE.to_string();
            }
        }
        let description = stream.description.clone();

        if gone {
            inner.streams.remove(arn);
            return Err(not_found(arn));
        }
        Ok(Some(description))
    }

    async fn list_tags_for_stream(&self, arn: &str) -> Result<Tags, AwsError> {
        let inner = self.lock();
        Ok(inner.streams.get(arn).ok_or_else(|| not_found(arn))?.tags.clone())
    }

    async fn update_stream(
        &self,
        arn: &str,
        version: &str,
        device_name: Option<&str>,
        media_type: Option<&str>,
    ) -> Result<(), AwsError> {
        self.versioned_change("update_stream".into(), arn, version, stream_status::UPDATING, |d| {
            d.device_name = device_name.map(String::from);
            d.media_type = media_type.map(String::from);
        })
    }

    async fn update_data_retention(&self, arn: &str, version: &str, change: RetentionChange) -> Result<(), AwsError> {
        let delta = match change {
            RetentionChange::Increase(hours) => hours,
            RetentionChange::Decrease(hours) => -hours,
        };
        self.versioned_change(
            format!("update_data_retention({delta:+})"),
            arn,
            version,
            stream_status::UPDATING,
            |d| d.data_retention_in_hours += delta,
        )
    }

    async fn tag_stream(&self, arn: &str, tags: &Tags) -> Result<(), AwsError> {
        let mut inner = self.mutate("tag_stream".into());
        let stream = inner.streams.get_mut(arn).ok_or_else(|| not_found(arn))?;
        for (k, v) in tags.iter() {
            stream.tags.insert(k.clone(), v.clone());
        }
        Ok(())
    }

    async fn untag_stream(&self, arn: &str, keys: &[String]) -> Result<(), AwsError> {
        let mut inner = self.mutate("untag_stream".into());
        let stream = inner.streams.get_mut(arn).ok_or_else(|| not_found(arn))?;
        stream.tags = stream
            .tags
            .iter()
            .filter(|(k, _)| !keys.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(())
    }

    async fn delete_stream(&self, arn: &str, version: &str) -> Result<(), AwsError> {
        self.versioned_change("delete_stream".into(), arn, version, stream_status::DELETING, |_| {})
    }
}
