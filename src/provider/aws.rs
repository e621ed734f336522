//! The AWS provider: the only adapter that talks to more than one region
//! and the only one with an optional credentialed branch.

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use tokio::sync::Mutex as AsyncMutex;

use crate::bucket::Bucket;
use crate::client_registry::ClientRegistry;
use crate::enumerate::enumerate_list_objects_v2;
use crate::error::Result;
use crate::existence::get_bucket_location;
use crate::permission::check_permissions;

use super::{AddressStyle, StorageProvider, anonymous_credentials};

/// Every region AWS S3 can return from `GetBucketLocation`, used to seed
/// the registry lazily: the scanner only ever builds a client for a region
/// once it's actually named by a response, starting from `us-east-1`.
const SEED_REGION: &str = "us-east-1";

pub struct AwsProvider {
    /// No-region anonymous client, used only for the initial
    /// `get_bucket_location` call against `us-west-2` (the Go source's
    /// default "exists client" region — any region works for this call,
    /// since `GetBucketLocation` redirects to the bucket's true region
    /// internally).
    exists_client: Client,
    registry: ClientRegistry,
    has_credentials: bool,
    cred_registry: AsyncMutex<ClientRegistry>,
}

impl AwsProvider {
    pub fn new(has_credentials: bool) -> Self {
        let exists_cfg = S3ConfigBuilder::new()
            .region(Region::new("us-west-2"))
            .credentials_provider(anonymous_credentials())
            .behavior_version(aws_config::BehaviorVersion::latest())
            .build();
        let exists_client = Client::from_conf(exists_cfg);

        let registry = ClientRegistry::new();
        registry.set(SEED_REGION, false, Arc::new(anon_client_for(SEED_REGION)));

        Self {
            exists_client,
            registry,
            has_credentials,
            cred_registry: AsyncMutex::new(ClientRegistry::new()),
        }
    }

    async fn credentialed_client(&self, region: &str) -> Option<Client> {
        if !self.has_credentials {
            return None;
        }
        let mut cred_registry = self.cred_registry.lock().await;
        if let Some(client) = cred_registry.get(region, true) {
            return Some((*client).clone());
        }
        let cfg = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        let client = Client::new(&cfg);
        cred_registry.set(region, true, Arc::new(client.clone()));
        Some(client)
    }
}

fn anon_client_for(region: &str) -> Client {
    let cfg = S3ConfigBuilder::new()
        .region(Region::new(region.to_string()))
        .credentials_provider(anonymous_credentials())
        .behavior_version(aws_config::BehaviorVersion::latest())
        .build();
    Client::from_conf(cfg)
}

#[async_trait]
impl StorageProvider for AwsProvider {
    fn insecure(&self) -> bool {
        false
    }

    fn address_style(&self) -> AddressStyle {
        AddressStyle::VirtualHostStyle
    }

    fn name(&self) -> &'static str {
        "aws"
    }

    fn supports_auth_users_enumerate(&self) -> bool {
        self.has_credentials
    }

    async fn bucket_exists(&self, bucket: &mut Bucket) -> Result<()> {
        let (exists, region) = get_bucket_location(&self.exists_client, "us-west-2", &bucket.name).await?;
        if exists {
            bucket.exists = crate::bucket::Existence::Exists;
            bucket.region = region.clone();
            if self.registry.get(&region, false).is_none() {
                self.registry.set(region.clone(), false, Arc::new(anon_client_for(&region)));
            }
        } else {
            bucket.exists = crate::bucket::Existence::DoesNotExist;
        }
        Ok(())
    }

    async fn scan(&self, bucket: &mut Bucket, destructive: bool) -> Result<()> {
        let region = bucket.region.clone();
        let anon = match self.registry.get(&region, false) {
            Some(c) => c,
            None => {
                let client = Arc::new(anon_client_for(&region));
                self.registry.set(region.clone(), false, client.clone());
                client
            }
        };
        let cred = self.credentialed_client(&region).await;
        check_permissions(&anon, cred.as_ref(), bucket, destructive).await
    }

    async fn enumerate(&self, bucket: &mut Bucket) -> Result<()> {
        let region = bucket.region.clone();
        let client = match self.registry.get(&region, false) {
            Some(c) => c,
            None => Arc::new(anon_client_for(&region)),
        };
        enumerate_list_objects_v2(&client, bucket).await
    }
}
