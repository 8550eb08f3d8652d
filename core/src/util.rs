use std::fmt::Write;

use lazy_static::lazy_static;
use ron::extensions::Extensions;
pub use ron::ser::PrettyConfig;
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use uuid::Uuid;

lazy_static! {
    pub static ref RON: ron::Options = ron::Options::default().with_default_extension(Extensions::IMPLICIT_SOME);
}

/// Renders both values as pretty RON and returns a unified, line-based diff.
/// Used for logging the field groups an update is about to touch.
pub fn diff_ron_values<T: Serialize>(old: &T, new: &T) -> anyhow::Result<String> {
    let old = RON.to_string_pretty(old, PrettyConfig::default())?;
    let new = RON.to_string_pretty(new, PrettyConfig::default())?;

    let mut out = String::new();
    for change in TextDiff::from_lines(&old, &new).iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        write!(out, "{sign}{change}")?;
        if change.missing_newline() {
            out.push('\n');
        }
    }
    Ok(out)
}

pub fn prefixed_unique_id(prefix: &str) -> String {
    format!("{}{}", prefix, Uuid::new_v4().simple())
}

pub fn unique_id() -> String {
    prefixed_unique_id("stratus-")
}

pub fn partition_for_region(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        "aws-cn"
    } else if region.starts_with("us-gov-") {
        "aws-us-gov"
    } else if region.starts_with("us-isob-") {
        "aws-iso-b"
    } else if region.starts_with("us-iso-") {
        "aws-iso"
    } else {
        "aws"
    }
}

/// The account/region pair a connector operates in. Needed by services whose
/// describe calls don't return ARNs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountContext {
    pub partition:  String,
    pub region:     String,
    pub account_id: String,
}

impl AccountContext {
    pub fn new(region: &str, account_id: &str) -> Self {
        Self {
            partition:  partition_for_region(region).to_string(),
            region:     region.to_string(),
            account_id: account_id.to_string(),
        }
    }

    pub fn arn(&self, service: &str, resource: &str) -> String {
        format!(
            "arn:{}:{}:{}:{}:{}",
            self.partition, service, self.region, self.account_id, resource
        )
    }
}
