//! A fully config-driven S3-compatible provider, for self-hosted or
//! unlisted services. Grounds on `provider/custom.go`: every detail this
//! adapter needs is supplied at runtime via the `providers.custom` config
//! section rather than compiled in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::bucket::{Bucket, Existence};
use crate::client_registry::ClientRegistry;
use crate::enumerate::enumerate_list_objects_v2;
use crate::error::{Result, ScanError};
use crate::existence::scan_all_regions;
use crate::permission::check_permissions;

use super::{AddressStyle, StorageProvider, build_region_registry};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomAddressStyle {
    Path,
    Vhost,
}

impl From<CustomAddressStyle> for AddressStyle {
    fn from(style: CustomAddressStyle) -> Self {
        match style {
            CustomAddressStyle::Path => AddressStyle::PathStyle,
            CustomAddressStyle::Vhost => AddressStyle::VirtualHostStyle,
        }
    }
}

/// `providers.custom` config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomProviderConfig {
    pub insecure: bool,
    pub endpoint_format: String,
    pub regions: Vec<String>,
    pub address_style: CustomAddressStyle,
}

pub struct CustomProvider {
    address_style: AddressStyle,
    insecure: bool,
    registry: ClientRegistry,
}

impl CustomProvider {
    pub fn new(cfg: &CustomProviderConfig) -> Result<Self> {
        let regions: Vec<&str> = cfg.regions.iter().map(String::as_str).collect();
        let path_style = matches!(cfg.address_style, CustomAddressStyle::Path);
        Ok(Self {
            address_style: cfg.address_style.clone().into(),
            insecure: cfg.insecure,
            registry: build_region_registry(&regions, &cfg.endpoint_format, path_style, cfg.insecure)?,
        })
    }
}

#[async_trait]
impl StorageProvider for CustomProvider {
    fn insecure(&self) -> bool {
        self.insecure
    }

    fn address_style(&self) -> AddressStyle {
        self.address_style
    }

    fn name(&self) -> &'static str {
        "custom"
    }

    async fn bucket_exists(&self, bucket: &mut Bucket) -> Result<()> {
        let (exists, region) = scan_all_regions(&self.registry, &bucket.name).await?;
        bucket.exists = if exists { Existence::Exists } else { Existence::DoesNotExist };
        bucket.region = region;
        Ok(())
    }

    async fn scan(&self, bucket: &mut Bucket, destructive: bool) -> Result<()> {
        let client = self.registry.get(&bucket.region, false).ok_or_else(|| unknown_region(bucket))?;
        check_permissions(&client, None, bucket, destructive).await
    }

    async fn enumerate(&self, bucket: &mut Bucket) -> Result<()> {
        if bucket.exists != Existence::Exists {
            return Err(ScanError::Enumerate {
                bucket: bucket.name.clone(),
                source: Box::new(std::io::Error::other("enumerate called on a bucket not confirmed to exist")),
            });
        }
        let client = self.registry.get(&bucket.region, false).ok_or_else(|| unknown_region(bucket))?;
        enumerate_list_objects_v2(&client, bucket).await
    }
}

fn unknown_region(bucket: &Bucket) -> ScanError {
    ScanError::Existence {
        bucket: bucket.name.clone(),
        source: Box::new(std::io::Error::other(format!("no client for region '{}'", bucket.region))),
    }
}
