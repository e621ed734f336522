//! Scaleway Object Storage. Path-style, Strategy A — but existence is
//! confirmed with a one-key `ListObjectsV2` call per region rather than
//! `GetBucketLocation`, because Scaleway's servers return 200 for
//! location-style probes against the wrong region too. A list call (even
//! an empty or access-denied one) only succeeds against the region that
//! actually holds the bucket. Races that probe across every region client
//! the same way every other adapter races `GetBucketLocation`.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use futures::future::BoxFuture;

use crate::bucket::{Bucket, Existence};
use crate::client_registry::ClientRegistry;
use crate::enumerate::enumerate_list_objects_v2;
use crate::error::{Result, ScanError};
use crate::existence::{RegionProbe, scan_all_regions_with};
use crate::permission::check_permissions;

use super::{AddressStyle, StorageProvider, build_region_registry};

const REGIONS: &[&str] = &["fr-par", "nl-ams", "pl-waw"];
const ENDPOINT_FORMAT: &str = "https://s3.$REGION.scw.cloud";

pub struct ScalewayProvider {
    registry: ClientRegistry,
}

impl ScalewayProvider {
    pub fn new() -> Result<Self> {
        Ok(Self {
            registry: build_region_registry(REGIONS, ENDPOINT_FORMAT, true, false)?,
        })
    }
}

async fn probe_one_key(client: &Client, bucket_name: &str) -> Result<RegionProbe> {
    match client.list_objects_v2().bucket(bucket_name).max_keys(1).send().await {
        Ok(_) => Ok(RegionProbe::Exists { region: String::new() }),
        Err(err) => {
            let status = err.raw_response().map(|r| r.status().as_u16());
            match status {
                Some(403) => Ok(RegionProbe::Exists { region: String::new() }),
                Some(404) => Ok(RegionProbe::NotExists),
                _ => {
                    if matches!(
                        err.as_service_error(),
                        Some(aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Error::NoSuchBucket(_))
                    ) {
                        Ok(RegionProbe::NotExists)
                    } else {
                        Err(ScanError::Existence {
                            bucket: bucket_name.to_string(),
                            source: Box::new(err),
                        })
                    }
                }
            }
        }
    }
}

fn probe_one_key_boxed(client: Arc<Client>, region: String, bucket_name: String) -> BoxFuture<'static, Result<RegionProbe>> {
    Box::pin(async move {
        match probe_one_key(&client, &bucket_name).await? {
            RegionProbe::Exists { .. } => Ok(RegionProbe::Exists { region }),
            RegionProbe::NotExists => Ok(RegionProbe::NotExists),
        }
    })
}

#[async_trait]
impl StorageProvider for ScalewayProvider {
    fn insecure(&self) -> bool {
        false
    }

    fn address_style(&self) -> AddressStyle {
        AddressStyle::PathStyle
    }

    fn name(&self) -> &'static str {
        "scaleway"
    }

    async fn bucket_exists(&self, bucket: &mut Bucket) -> Result<()> {
        let (exists, region) = scan_all_regions_with(&self.registry, &bucket.name, probe_one_key_boxed).await?;
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
