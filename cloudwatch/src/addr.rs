use std::fmt;

use stratus_aws_core::connector::{IdError, ResourceId};

type LogGroupName = String;
type FilterName = String;

/// `<log_group_name>:<filter_name>`
///
/// Log group names may not contain `:`, so the first colon splits the two.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricFilterId {
    pub log_group_name: LogGroupName,
    pub name: FilterName,
}

impl MetricFilterId {
    pub fn new(log_group_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            log_group_name: log_group_name.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for MetricFilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.log_group_name, self.name)
    }
}

impl ResourceId for MetricFilterId {
    fn parse(s: &str) -> Result<Self, IdError> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        match s.split_once(':') {
            Some((group, name)) if !group.is_empty() && !name.is_empty() => Ok(Self::new(group, name)),
            _ => Err(IdError::Malformed {
                id: s.to_string(),
                expected: "log_group_name:filter_name",
            }),
        }
    }
}
