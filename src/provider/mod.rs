//! Provider adapters: one implementation of [`StorageProvider`] per
//! S3-compatible service this scanner knows how to talk to.
//!
//! The non-uniformity between adapters (different existence strategies,
//! different enumerate-gating rules) is real upstream behavior, not an
//! oversight here — see each adapter module for its grounding.

pub mod aws;
pub mod custom;
pub mod digitalocean;
pub mod dreamhost;
pub mod gcp;
pub mod linode;
pub mod ovh;
pub mod scaleway;
pub mod wasabi;

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Builder as S3ConfigBuilder, Credentials, SharedCredentialsProvider};

use crate::bucket::Bucket;
use crate::client_registry::ClientRegistry;
use crate::error::Result;

/// How a provider addresses a bucket in its endpoint URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressStyle {
    PathStyle,
    VirtualHostStyle,
}

/// The operations every provider adapter must implement. `bucket_exists`,
/// `scan`, and `enumerate` are meant to be called in that order by the
/// pipeline; nothing here enforces the order, callers own that.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Whether this provider's client should skip TLS certificate
    /// verification. Only ever true for self-hosted/custom endpoints.
    fn insecure(&self) -> bool;

    fn address_style(&self) -> AddressStyle;

    fn name(&self) -> &'static str;

    /// Whether `enumerate` can be driven by an AuthUsers-READ grant alone
    /// (via a credentialed client) when AllUsers-READ is denied. Only AWS
    /// supports this today, since it's the only adapter with an optional
    /// credentialed branch.
    fn supports_auth_users_enumerate(&self) -> bool {
        false
    }

    /// Determines whether `bucket` exists and, if so, its region. Mutates
    /// `bucket.exists` and `bucket.region` in place.
    async fn bucket_exists(&self, bucket: &mut Bucket) -> Result<()>;

    /// Runs the permission-inference procedure against a bucket already
    /// known to exist.
    async fn scan(&self, bucket: &mut Bucket, destructive: bool) -> Result<()>;

    /// Enumerates every object in the bucket. Some providers refuse this
    /// call when the bucket isn't known to exist; see the adapter.
    async fn enumerate(&self, bucket: &mut Bucket) -> Result<()>;
}

/// Builds an anonymous client against a fixed, non-AWS endpoint.
///
/// Grounded on `providers.go::newNonAWSClient`: fixed region (the actual
/// region value doesn't matter to most S3-compatible servers once the
/// endpoint is pinned, but the SDK requires one), anonymous credentials,
/// path- or virtual-host-style addressing per the caller's provider.
/// `insecure` is recorded by callers that also drive a `reqwest` client
/// (the 301-redirect existence probe) where TLS-verification bypass is
/// actually wired; the S3 SDK client itself always verifies certificates.
pub fn new_non_aws_client(_insecure: bool, endpoint: &str, path_style: bool) -> Result<Client> {
    let cfg = S3ConfigBuilder::new()
        .region(Region::new("us-east-1"))
        .endpoint_url(endpoint)
        .force_path_style(path_style)
        .credentials_provider(anonymous_credentials())
        .behavior_version(aws_config::BehaviorVersion::latest())
        .build();
    Ok(Client::from_conf(cfg))
}

/// Anonymous-style credentials for unauthenticated probes. Public buckets
/// and HEAD/GetBucketLocation-style checks don't require a valid signature
/// to return useful status codes, so a fixed placeholder identity is fine.
pub fn anonymous_credentials() -> SharedCredentialsProvider {
    SharedCredentialsProvider::new(Credentials::new("anonymous", "anonymous", None, None, "s3lurk-anonymous"))
}

/// Seeds a [`ClientRegistry`] with one anonymous client per region, each
/// endpoint built by substituting `$REGION` into `endpoint_format`. Shared
/// by every provider whose existence strategy is "race a client per
/// static region" (DigitalOcean, Linode, OVH, and the fully config-driven
/// `custom` provider).
pub fn build_region_registry(regions: &[&str], endpoint_format: &str, path_style: bool, insecure: bool) -> Result<ClientRegistry> {
    let registry = ClientRegistry::new();
    for region in regions {
        let endpoint = endpoint_format.replace("$REGION", region);
        let client = new_non_aws_client(insecure, &endpoint, path_style)?;
        registry.set(*region, false, std::sync::Arc::new(client));
    }
    Ok(registry)
}
