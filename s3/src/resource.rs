use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

pub const BUCKET_POLICY_TYPE: &str = "aws_s3_bucket_policy";

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct BucketPolicy {
    pub bucket: String,
    /// The policy document as JSON text.
    pub policy: String,
}

/// Parses a policy document, URL-decoding it first if it isn't plain JSON.
pub fn parse_policy(policy: &str) -> anyhow::Result<serde_json::Value> {
    let value: serde_json::Value = match serde_json::from_str(policy) {
        Ok(value) => value,
        Err(_) => {
            let decoded = urlencoding::decode(policy).context("Policy is neither JSON nor URL-encoded JSON")?;
            serde_json::from_str(&decoded).context("Failed to parse bucket policy as JSON")?
        }
    };
    if !value.is_object() {
        bail!("Bucket policy must be a JSON object");
    }
    Ok(value)
}

/// Canonical text for a policy: compact, with object keys sorted.
pub fn normalize_policy(policy: &str) -> anyhow::Result<String> {
    Ok(serde_json::to_string(&parse_policy(policy)?)?)
}

/// True when both documents parse to the same JSON value. Unparseable
/// documents are only equivalent when byte-identical.
pub fn policies_equivalent(a: &str, b: &str) -> bool {
    match (parse_policy(a), parse_policy(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

pub fn validate_bucket_policy(config: &BucketPolicy) -> anyhow::Result<()> {
    if config.bucket.is_empty() || config.bucket.len() > 63 {
        bail!("bucket must be between 1 and 63 characters");
    }
    if config.policy.len() > 20 * 1024 {
        bail!("bucket policy must be at most 20 KB");
    }
    parse_policy(&config.policy)?;
    Ok(())
}
