//! Wasabi. Path-style, Strategy B (a single non-redirect-following HEAD
//! against a universal endpoint) for existence, then a per-region client
//! for `scan`/`enumerate` once the redirect (or lack of one) reveals the
//! real region.

use async_trait::async_trait;

use crate::bucket::{Bucket, Existence};
use crate::client_registry::ClientRegistry;
use crate::enumerate::enumerate_list_objects_v2;
use crate::error::{Result, ScanError};
use crate::existence::{non_redirecting_client, redirect_301};
use crate::permission::check_permissions;

use super::{AddressStyle, StorageProvider, new_non_aws_client};

const UNIVERSAL_ENDPOINT: &str = "https://s3.wasabisys.com";
const ASSUMED_REGION: &str = "us-east-1";
const REGION_ENDPOINT_FORMAT: &str = "https://s3.$REGION.wasabisys.com";

/// Every region `ProviderRegions["wasabi"]` lists upstream.
#[allow(dead_code)]
const REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-central-1",
    "us-west-1",
    "eu-central-1",
    "eu-central-2",
    "eu-west-1",
    "eu-west-2",
    "ap-northeast-1",
    "ap-northeast-2",
];

pub struct WasabiProvider {
    http_client: std::sync::Arc<reqwest::Client>,
    registry: ClientRegistry,
}

impl WasabiProvider {
    pub fn new() -> Self {
        Self {
            http_client: non_redirecting_client(false),
            registry: ClientRegistry::new(),
        }
    }

    fn region_client(&self, region: &str) -> Result<std::sync::Arc<aws_sdk_s3::Client>> {
        if let Some(client) = self.registry.get(region, false) {
            return Ok(client);
        }
        let endpoint = REGION_ENDPOINT_FORMAT.replace("$REGION", region);
        let client = std::sync::Arc::new(new_non_aws_client(false, &endpoint, true)?);
        self.registry.set(region.to_string(), false, client.clone());
        Ok(client)
    }
}

impl Default for WasabiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageProvider for WasabiProvider {
    fn insecure(&self) -> bool {
        false
    }

    fn address_style(&self) -> AddressStyle {
        AddressStyle::PathStyle
    }

    fn name(&self) -> &'static str {
        "wasabi"
    }

    async fn bucket_exists(&self, bucket: &mut Bucket) -> Result<()> {
        let (exists, region) = redirect_301(&self.http_client, UNIVERSAL_ENDPOINT, ASSUMED_REGION, &bucket.name).await?;
        bucket.exists = if exists { Existence::Exists } else { Existence::DoesNotExist };
        bucket.region = region;
        Ok(())
    }

    async fn scan(&self, bucket: &mut Bucket, destructive: bool) -> Result<()> {
        let client = self.region_client(&bucket.region)?;
        check_permissions(&client, None, bucket, destructive).await
    }

    async fn enumerate(&self, bucket: &mut Bucket) -> Result<()> {
        if bucket.exists != Existence::Exists {
            return Err(ScanError::Enumerate {
                bucket: bucket.name.clone(),
                source: Box::new(std::io::Error::other("enumerate called on a bucket not confirmed to exist")),
            });
        }
        let client = self.region_client(&bucket.region)?;
        enumerate_list_objects_v2(&client, bucket).await
    }
}
