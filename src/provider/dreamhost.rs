//! DreamHost DreamObjects. Path-style, a single region, Strategy A — plus
//! a quirk grounded on the upstream `forbiddenBuckets` list: the literal
//! name `auth` collides with an internal DreamObjects path and must never
//! reach the network.

use async_trait::async_trait;

use crate::bucket::{Bucket, Existence};
use crate::client_registry::ClientRegistry;
use crate::enumerate::enumerate_list_objects_v2;
use crate::error::{Result, ScanError};
use crate::existence::scan_all_regions;
use crate::permission::check_permissions;

use super::{AddressStyle, StorageProvider, build_region_registry};

const REGIONS: &[&str] = &["us-east-1"];
const ENDPOINT_FORMAT: &str = "https://objects-$REGION.dream.io";
const FORBIDDEN_BUCKETS: &[&str] = &["auth"];

pub struct DreamhostProvider {
    registry: ClientRegistry,
}

impl DreamhostProvider {
    pub fn new() -> Result<Self> {
        Ok(Self {
            registry: build_region_registry(REGIONS, ENDPOINT_FORMAT, true, false)?,
        })
    }
}

#[async_trait]
impl StorageProvider for DreamhostProvider {
    fn insecure(&self) -> bool {
        false
    }

    fn address_style(&self) -> AddressStyle {
        AddressStyle::PathStyle
    }

    fn name(&self) -> &'static str {
        "dreamhost"
    }

    async fn bucket_exists(&self, bucket: &mut Bucket) -> Result<()> {
        if FORBIDDEN_BUCKETS.contains(&bucket.name.to_lowercase().as_str()) {
            bucket.exists = Existence::DoesNotExist;
            return Ok(());
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn forbidden_bucket_never_hits_network() {
        let provider = DreamhostProvider::new().unwrap();
        let mut bucket = Bucket::new("auth");
        provider.bucket_exists(&mut bucket).await.unwrap();
        assert_eq!(bucket.exists, Existence::DoesNotExist);

        let mut bucket = Bucket::new("aUtH");
        provider.bucket_exists(&mut bucket).await.unwrap();
        assert_eq!(bucket.exists, Existence::DoesNotExist);
    }
}
