//! Google Cloud Storage's S3-compatible XML API. Grounds on
//! `provider/gcp.go`: one fixed endpoint, path-style, and — oddly, but
//! preserved rather than special-cased — the multi-region racing machinery
//! reused over a registry that only ever has one entry.

use async_trait::async_trait;

use crate::bucket::{Bucket, Existence};
use crate::client_registry::ClientRegistry;
use crate::enumerate::enumerate_list_objects_v2;
use crate::error::Result;
use crate::existence::scan_all_regions;
use crate::permission::check_permissions;

use super::{AddressStyle, StorageProvider, new_non_aws_client};

const ENDPOINT: &str = "https://storage.googleapis.com";
const REGION: &str = "auto";

pub struct GcpProvider {
    registry: ClientRegistry,
}

impl GcpProvider {
    pub fn new() -> Result<Self> {
        let client = new_non_aws_client(false, ENDPOINT, true)?;
        let registry = ClientRegistry::new();
        registry.set(REGION, false, std::sync::Arc::new(client));
        Ok(Self { registry })
    }
}

#[async_trait]
impl StorageProvider for GcpProvider {
    fn insecure(&self) -> bool {
        false
    }

    fn address_style(&self) -> AddressStyle {
        AddressStyle::PathStyle
    }

    fn name(&self) -> &'static str {
        "gcp"
    }

    async fn bucket_exists(&self, bucket: &mut Bucket) -> Result<()> {
        let (exists, region) = scan_all_regions(&self.registry, &bucket.name).await?;
        bucket.exists = if exists { Existence::Exists } else { Existence::DoesNotExist };
        bucket.region = region;
        Ok(())
    }

    async fn scan(&self, bucket: &mut Bucket, destructive: bool) -> Result<()> {
        let client = self.registry.get(REGION, false).expect("gcp registry always has one entry");
        check_permissions(&client, None, bucket, destructive).await
    }

    async fn enumerate(&self, bucket: &mut Bucket) -> Result<()> {
        let client = self.registry.get(REGION, false).expect("gcp registry always has one entry");
        enumerate_list_objects_v2(&client, bucket).await
    }
}
