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
    api::{LogGroupDescription, LogsApi},
    resource::MetricFilter,
};

struct Group {
    arn: String,
    retention_in_days: Option<i32>,
    kms_key_id: Option<String>,
    tags: Tags,
}

#[derive(Default)]
struct Inner {
    groups: BTreeMap<String, Group>,
    filters: BTreeMap<(String, String), MetricFilter>,
    calls: Vec<String>,
    fail_on: Option<String>,
}

/// In-memory CloudWatch Logs. Records every mutating call by name.
#[derive(Default)]
pub struct FakeLogs {
    inner: Mutex<Inner>,
}

fn not_found(what: &str) -> AwsError {
    AwsError::new(
        AwsErrorKind::NotFound,
        Some("ResourceNotFoundException"),
        format!("The specified {what} does not exist."),
    )
}

impl FakeLogs {
    pub fn insert_log_group(&self, name: &str, retention_in_days: i32, kms_key_id: Option<&str>, tags: Tags) {
        self.lock().groups.insert(name.to_string(), Group {
            arn: format!("arn:aws:logs:us-east-1:123456789012:log-group:{name}:*"),
            retention_in_days: (retention_in_days > 0).then_some(retention_in_days),
            kms_key_id: kms_key_id.map(String::from),
            tags,
        });
    }

    /// Makes the named call fail from now on.
    pub fn fail_on(&self, call: &str) {
        self.lock().fail_on = Some(call.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    fn mutate(&self, call: &str) -> Result<MutexGuard<'_, Inner>, AwsError> {
        let mut inner = self.lock();
        inner.calls.push(call.to_string());
        if inner.fail_on.as_deref() == Some(call) {
            return Err(AwsError::new(
                AwsErrorKind::Other,
                Some("InternalFailure"),
                format!("injected failure in {call}"),
            ));
        }
        Ok(inner)
    }
}

fn group_mut<'a>(inner: &'a mut Inner, name: &str) -> Result<&'a mut Group, AwsError> {
    inner.groups.get_mut(name).ok_or_else(|| not_found("log group"))
}

fn group_by_arn_mut<'a>(inner: &'a mut Inner, arn: &str) -> Result<&'a mut Group, AwsError> {
    inner
        .groups
        .values_mut()
        .find(|g| g.arn.strip_suffix(":*") == Some(arn))
        .ok_or_else(|| not_found("resource"))
}

#[async_trait]
impl LogsApi for FakeLogs {
    async fn create_log_group(&self, name: &str, kms_key_id: Option<&str>, tags: &Tags) -> Result<(), AwsError> {
        let exists = self.lock().groups.contains_key(name);
        if exists {
            return Err(AwsError::new(
                AwsErrorKind::AlreadyExists,
                Some("ResourceAlreadyExistsException"),
                "The specified log group already exists",
            ));
        }
        drop(self.mutate("create_log_group")?);
        self.insert_log_group(name, 0, kms_key_id, tags.clone());
        Ok(())
    }

    async fn describe_log_group(&self, name: &str) -> Result<Option<LogGroupDescription>, AwsError> {
        Ok(self.lock().groups.get(name).map(|g| LogGroupDescription {
            name: name.to_string(),
            arn: g.arn.clone(),
            retention_in_days: g.retention_in_days,
            kms_key_id: g.kms_key_id.clone(),
        }))
    }

    async fn list_tags(&self, arn: &str) -> Result<Tags, AwsError> {
        let mut inner = self.lock();
        Ok(group_by_arn_mut(&mut inner, arn)?.tags.clone())
    }

    async fn put_retention_policy(&self, name: &str, retention_in_days: i32) -> Result<(), AwsError> {
        let mut inner = self.mutate("put_retention_policy")?;
        group_mut(&mut inner, name)?.retention_in_days = Some(retention_in_days);
        Ok(())
    }

    async fn delete_retention_policy(&self, name: &str) -> Result<(), AwsError> {
        let mut inner = self.mutate("delete_retention_policy")?;
        group_mut(&mut inner, name)?.retention_in_days = None;
        Ok(())
    }

    async fn associate_kms_key(&self, name: &str, kms_key_id: &str) -> Result<(), AwsError> {
        let mut inner = self.mutate("associate_kms_key")?;
        group_mut(&mut inner, name)?.kms_key_id = Some(kms_key_id.to_string());
        Ok(())
    }

    async fn disassociate_kms_key(&self, name: &str) -> Result<(), AwsError> {
        let mut inner = self.mutate("disassociate_kms_key")?;
        group_mut(&mut inner, name)?.kms_key_id = None;
        Ok(())
    }

    async fn tag_resource(&self, arn: &str, tags: &Tags) -> Result<(), AwsError> {
        let mut inner = self.mutate("tag_resource")?;
        let group = group_by_arn_mut(&mut inner, arn)?;
        for (k, v) in tags.iter() {
            group.tags.insert(k.clone(), v.clone());
        }
        Ok(())
    }

    async fn untag_resource(&self, arn: &str, keys: &[String]) -> Result<(), AwsError> {
        let mut inner = self.mutate("untag_resource")?;
        let group = group_by_arn_mut(&mut inner, arn)?;
        group.tags = group
            .tags
            .iter()
            .filter(|(k, _)| !keys.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(())
    }

    async fn delete_log_group(&self, name: &str) -> Result<(), AwsError> {
        let mut inner = self.mutate("delete_log_group")?;
        inner.groups.remove(name).ok_or_else(|| not_found("log group"))?;
        inner.filters.retain(|(group, _), _| group != name);
        Ok(())
    }

    async fn put_metric_filter(&self, filter: &MetricFilter) -> Result<(), AwsError> {
        let mut inner = self.mutate("put_metric_filter")?;
        group_mut(&mut inner, &filter.log_group_name)?;
        inner
            .filters
            .insert((filter.log_group_name.clone(), filter.name.clone()), filter.clone());
        Ok(())
    }

    async fn describe_metric_filter(&self, log_group_name: &str, name: &str) -> Result<Option<MetricFilter>, AwsError> {
        let inner = self.lock();
        if !inner.groups.contains_key(log_group_name) {
            return Err(not_found("log group"));
        }
        Ok(inner
            .filters
            .get(&(log_group_name.to_string(), name.to_string()))
            .cloned())
    }

    async fn delete_metric_filter(&self, log_group_name: &str, name: &str) -> Result<(), AwsError> {
        let mut inner = self.mutate("delete_metric_filter")?;
        inner
            .filters
            .remove(&(log_group_name.to_string(), name.to_string()))
            .ok_or_else(|| not_found("filter"))?;
        Ok(())
    }
}
