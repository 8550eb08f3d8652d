use std::{collections::HashMap, sync::Arc};

use anyhow::bail;
use aws_config::SdkConfig;
use stratus_aws_core::config::ProviderConfig;
use tokio::sync::Mutex;

/// One client per service, all built from the same regional SDK config.
pub struct RegionClients {
    pub logs:          Arc<aws_sdk_cloudwatchlogs::Client>,
    pub directconnect: Arc<aws_sdk_directconnect::Client>,
    pub kinesisvideo:  Arc<aws_sdk_kinesisvideo::Client>,
    pub s3:            Arc<aws_sdk_s3::Client>,
    pub sagemaker:     Arc<aws_sdk_sagemaker::Client>,
}

impl RegionClients {
    pub fn new(config: &SdkConfig, path_style_s3: bool) -> Self {
        let s3_config = aws_sdk_s3::config::Builder::from(config)
            .force_path_style(path_style_s3)
            .build();

        Self {
            logs:          Arc::new(aws_sdk_cloudwatchlogs::Client::new(config)),
            directconnect: Arc::new(aws_sdk_directconnect::Client::new(config)),
            kinesisvideo:  Arc::new(aws_sdk_kinesisvideo::Client::new(config)),
            s3:            Arc::new(aws_sdk_s3::Client::from_conf(s3_config)),
            sagemaker:     Arc::new(aws_sdk_sagemaker::Client::new(config)),
        }
    }
}

pub struct ClientCache {
    config: ProviderConfig,
    cache:  Mutex<HashMap<String, Arc<RegionClients>>>,
}

impl ClientCache {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_or_init(&self, region: &str) -> anyhow::Result<Arc<RegionClients>> {
        self.config.ensure_region_enabled(region)?;

        let mut cache = self.cache.lock().await;

        if !cache.contains_key(region) {
            tracing::debug!(region, "Building AWS clients");
            let sdk_config = self.config.sdk_config(region).await;
            // Custom endpoints (localstack and friends) rarely serve virtual-hosted buckets.
            let clients = RegionClients::new(&sdk_config, self.config.endpoint_url.is_some());
            cache.insert(region.to_string(), Arc::new(clients));
        };

        let Some(clients) = cache.get(region) else {
            bail!("Failed to get clients for region {}", region);
        };

        Ok(clients.clone())
    }
}
