use std::{path::Path, time::Duration};

use anyhow::{Context, bail};
use aws_config::{BehaviorVersion, Region, SdkConfig, meta::region::RegionProviderChain};
use serde::{Deserialize, Serialize};

use crate::util::RON;

const DEFAULT_SDK_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TimeoutConfig {
    #[serde(default)]
    pub connect_secs:   Option<u64>,
    #[serde(default)]
    pub operation_secs: Option<u64>,
    /// Overrides for the per-resource verb budgets used by the state-change poller.
    #[serde(default)]
    pub create_secs:    Option<u64>,
    #[serde(default)]
    pub update_secs:    Option<u64>,
    #[serde(default)]
    pub delete_secs:    Option<u64>,
}

impl TimeoutConfig {
    fn to_sdk(&self) -> aws_config::timeout::TimeoutConfig {
        let connect = self.connect_secs.map(Duration::from_secs).unwrap_or(DEFAULT_SDK_TIMEOUT);
        let operation = self.operation_secs.map(Duration::from_secs).unwrap_or(DEFAULT_SDK_TIMEOUT);

        aws_config::timeout::TimeoutConfig::builder()
            .connect_timeout(connect)
            .operation_timeout(operation)
            .operation_attempt_timeout(operation)
            .read_timeout(operation)
            .build()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ProviderConfig {
    pub account_id:      Option<String>,
    pub endpoint_url:    Option<String>,
    pub timeout_config:  Option<TimeoutConfig>,
    pub sts_region:      String,
    pub enabled_regions: Vec<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            account_id:      Default::default(),
            endpoint_url:    Default::default(),
            timeout_config:  Default::default(),
            sts_region:      String::from("us-east-1"),
            enabled_regions: ["eu-west-1", "eu-west-2", "us-east-1", "us-east-2", "us-west-1", "us-west-2"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ProviderConfig {
    pub fn try_load(prefix: &Path) -> anyhow::Result<ProviderConfig> {
        let config_path = prefix.join("aws/config.ron");
        if config_path.is_file() {
            tracing::info!("Loading provider config file at {:?}", config_path);
            let body = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            Self::from_ron(&body).with_context(|| format!("Failed to parse {}", config_path.display()))
        } else {
            tracing::info!("Provider config file at {:?} not present, using defaults.", config_path);
            Ok(ProviderConfig::default())
        }
    }

    pub fn from_ron(body: &str) -> anyhow::Result<ProviderConfig> {
        Ok(RON.from_str(body)?)
    }

    pub fn timeouts(&self) -> TimeoutConfig {
        self.timeout_config.clone().unwrap_or_default()
    }

    pub fn ensure_region_enabled(&self, region: &str) -> anyhow::Result<()> {
        if !self.enabled_regions.iter().any(|r| r == region) {
            bail!(
                "Region {} is not enabled. Enabled regions: {}",
                region,
                self.enabled_regions.join(", ")
            );
        }
        Ok(())
    }

    /// Builds an SDK config for `region` with the configured timeouts and
    /// endpoint override.
    pub async fn sdk_config(&self, region: &str) -> SdkConfig {
        let region = RegionProviderChain::first_try(Region::new(region.to_owned()));

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .timeout_config(self.timeouts().to_sdk());

        if let Some(endpoint_url) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        loader.load().await
    }

    /// Calls sts:GetCallerIdentity and returns the caller's account ID,
    /// failing if it doesn't match the configured `account_id`.
    pub async fn verify_sts(&self) -> anyhow::Result<String> {
        let sts_config = self.sdk_config(&self.sts_region).await;

        let sts_client = aws_sdk_sts::Client::new(&sts_config);
        let caller_identity = sts_client.get_caller_identity().send().await;

        match caller_identity {
            Ok(caller_identity) => {
                let Some(caller_account_id) = caller_identity.account else {
                    bail!("Failed to get current account ID!");
                };
                check_account_id(self.account_id.as_deref(), &caller_account_id)?;
                Ok(caller_account_id)
            }
            Err(e) => {
                tracing::error!("Failed to call sts:GetCallerIdentity: {}", e);
                Err(e.into())
            }
        }
    }
}

fn check_account_id(configured: Option<&str>, caller_account_id: &str) -> anyhow::Result<()> {
    match configured {
        Some(account_id) if account_id != caller_account_id => bail!(
            "AWS: Account ID mismatch. Configured to use account ID {account_id}, \nbut credentials provided are for account ID {caller_account_id}."
        ),
        _ => Ok(()),
    }
}
