//! Per-bucket scan orchestration, shared by both the file-backed worker
//! pool and the broker consumer. Consolidates what the upstream source
//! duplicates almost verbatim between its plain worker loop and its MQ
//! worker loop.

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::bucket::{Bucket, Existence};
use crate::error::ScanError;
use crate::persistence::ResultStore;
use crate::provider::StorageProvider;

/// What happened to one bucket, for the two call sites to render or act on
/// differently (a human/JSON log line vs. a broker ack/reject/DLQ
/// decision) without re-deriving pipeline internals.
pub enum PipelineOutcome {
    DoesNotExist(Bucket),
    Scanned(Bucket),
    Error { bucket_name: String, error: ScanError },
}

pub struct ScanOptions {
    pub enumerate: bool,
    pub destructive: bool,
}

/// What a worker pool does with a finished [`PipelineOutcome`]: emit it
/// (both call sites always do) and, if persistence is enabled, store it.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn handle(&self, outcome: &PipelineOutcome);
}

/// A sink that emits nothing extra (logging already happened inside
/// `scan_bucket`) and persists scanned/does-not-exist buckets through a
/// [`ResultStore`] when one is configured.
pub struct StoreSink {
    pub store: Option<std::sync::Arc<dyn ResultStore>>,
}

#[async_trait]
impl ResultSink for StoreSink {
    async fn handle(&self, outcome: &PipelineOutcome) {
        let Some(store) = &self.store else { return };
        let bucket = match outcome {
            PipelineOutcome::DoesNotExist(b) | PipelineOutcome::Scanned(b) => b,
            PipelineOutcome::Error { .. } => return,
        };
        if let Err(error) = store.store(bucket).await {
            error!(bucket = %bucket.name, %error, "failed to persist scan result");
        }
    }
}

/// Runs the full per-bucket procedure: confirm existence, infer
/// permissions, optionally enumerate objects. Existence and scan errors
/// are both terminal for this bucket; an enumerate error is logged and
/// the bucket is still returned with whatever grants were already found.
pub async fn scan_bucket(provider: &dyn StorageProvider, mut bucket: Bucket, opts: &ScanOptions) -> PipelineOutcome {
    if !crate::bucket::is_valid_s3_bucket_name(&bucket.name) {
        return PipelineOutcome::Error {
            bucket_name: bucket.name,
            error: ScanError::InvalidName("rejected again at pipeline entry".to_string()),
        };
    }
    bucket.name = bucket.name.to_lowercase();
    bucket.provider = Some(provider.name().to_string());

    if let Err(error) = provider.bucket_exists(&mut bucket).await {
        error!(bucket = %bucket.name, %error, "existence check failed");
        return PipelineOutcome::Error { bucket_name: bucket.name, error };
    }

    if bucket.exists != Existence::Exists {
        info!(bucket = %bucket.name, "bucket does not exist");
        return PipelineOutcome::DoesNotExist(bucket);
    }

    if let Err(error) = provider.scan(&mut bucket, opts.destructive).await {
        error!(bucket = %bucket.name, %error, "permission scan failed");
        return PipelineOutcome::Error { bucket_name: bucket.name, error };
    }

    let publicly_readable = bucket.perm_all_users.read.is_allowed()
        || (provider.supports_auth_users_enumerate() && bucket.perm_auth_users.read.is_allowed());

    if opts.enumerate && publicly_readable {
        if let Err(error) = provider.enumerate(&mut bucket).await {
            warn!(bucket = %bucket.name, %error, "enumeration failed, continuing with partial result");
        }
    }

    let (auth_users, all_users) = bucket.permissions_display();
    info!(
        bucket = %bucket.name,
        region = %bucket.region,
        auth_users = %auth_users,
        all_users = %all_users,
        size = %bytesize::ByteSize(bucket.bucket_size),
        "scan complete"
    );

    PipelineOutcome::Scanned(bucket)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeProvider {
        exists: bool,
        grant_all_users_read: bool,
        enumerate_calls: AtomicUsize,
    }

    #[async_trait]
    impl StorageProvider for FakeProvider {
        fn insecure(&self) -> bool {
            false
        }
        fn address_style(&self) -> crate::provider::AddressStyle {
            crate::provider::AddressStyle::PathStyle
        }
        fn name(&self) -> &'static str {
            "fake"
        }
        async fn bucket_exists(&self, bucket: &mut Bucket) -> crate::error::Result<()> {
            bucket.exists = if self.exists { Existence::Exists } else { Existence::DoesNotExist };
            bucket.region = "fake-region".to_string();
            Ok(())
        }
        async fn scan(&self, bucket: &mut Bucket, _destructive: bool) -> crate::error::Result<()> {
            bucket.perm_all_users.read = if self.grant_all_users_read {
                crate::bucket::Permission::Allowed
            } else {
                crate::bucket::Permission::Denied
            };
            Ok(())
        }
        async fn enumerate(&self, _bucket: &mut Bucket) -> crate::error::Result<()> {
            self.enumerate_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn does_not_exist_short_circuits_before_scan() {
        let provider = FakeProvider { exists: false, grant_all_users_read: false, enumerate_calls: AtomicUsize::new(0) };
        let opts = ScanOptions { enumerate: true, destructive: false };
        let outcome = scan_bucket(&provider, Bucket::new("somebucket"), &opts).await;
        assert!(matches!(outcome, PipelineOutcome::DoesNotExist(_)));
        assert_eq!(provider.enumerate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn enumerate_only_runs_when_requested() {
        let provider = FakeProvider { exists: true, grant_all_users_read: true, enumerate_calls: AtomicUsize::new(0) };
        let opts = ScanOptions { enumerate: false, destructive: false };
        let outcome = scan_bucket(&provider, Bucket::new("somebucket"), &opts).await;
        assert!(matches!(outcome, PipelineOutcome::Scanned(_)));
        assert_eq!(provider.enumerate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn enumerate_skipped_without_all_users_read_even_when_requested() {
        let provider = FakeProvider { exists: true, grant_all_users_read: false, enumerate_calls: AtomicUsize::new(0) };
        let opts = ScanOptions { enumerate: true, destructive: false };
        let outcome = scan_bucket(&provider, Bucket::new("somebucket"), &opts).await;
        assert!(matches!(outcome, PipelineOutcome::Scanned(_)));
        assert_eq!(provider.enumerate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_name_is_rejected_before_any_provider_call() {
        let provider = FakeProvider { exists: true, grant_all_users_read: false, enumerate_calls: AtomicUsize::new(0) };
        let opts = ScanOptions { enumerate: false, destructive: false };
        let outcome = scan_bucket(&provider, Bucket::new("AB"), &opts).await;
        assert!(matches!(outcome, PipelineOutcome::Error { .. }));
    }
}
