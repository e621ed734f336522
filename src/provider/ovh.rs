//! OVHcloud Object Storage. Virtual-host-style addressing, Strategy A over
//! a static region list.

use async_trait::async_trait;

use crate::bucket::{Bucket, Existence};
use crate::client_registry::ClientRegistry;
use crate::enumerate::enumerate_list_objects_v2;
use crate::error::{Result, ScanError};
use crate::existence::scan_all_regions;
use crate::permission::check_permissions;

use super::{AddressStyle, StorageProvider, build_region_registry};

const REGIONS: &[&str] = &["de", "gra", "sbg", "uk", "waw"];
const ENDPOINT_FORMAT: &str = "https://s3.$REGION.io.cloud.ovh.us";

pub struct OvhProvider {
    registry: ClientRegistry,
}

impl OvhProvider {
    pub fn new() -> Result<Self> {
        Ok(Self {
            registry: build_region_registry(REGIONS, ENDPOINT_FORMAT, false, false)?,
        })
    }
}

#[async_trait]
impl StorageProvider for OvhProvider {
    fn insecure(&self) -> bool {
        false
    }

    fn address_style(&self) -> AddressStyle {
        AddressStyle::VirtualHostStyle
    }

    fn name(&self) -> &'static str {
        "ovh"
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
