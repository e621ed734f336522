//! Cross-region existence and region discovery.
//!
//! Two independent strategies reconcile the divergent "does this bucket
//! exist, and where" signals S3-compatible servers give back. Each
//! provider adapter picks the strategy that matches its server's actual
//! behavior; this module just implements both without trying to unify
//! them, since the 301-redirect, 200-on-wrong-region, and
//! bucket-not-found semantics are genuinely different per provider.

use std::sync::Arc;

use aws_sdk_s3::Client;
use aws_sdk_s3::operation::get_bucket_location::GetBucketLocationError;
use futures::future::BoxFuture;
use reqwest::StatusCode;
use tracing::debug;

use crate::bucket::is_valid_s3_bucket_name;
use crate::client_registry::ClientRegistry;
use crate::error::{Result, ScanError};

pub(crate) enum RegionProbe {
    Exists { region: String },
    NotExists,
}

/// A per-region existence probe, parameterized so `scan_all_regions_with`
/// can race any probe strategy (not just `GetBucketLocation`) across a
/// registry's clients. Takes owned values rather than references since the
/// probe runs inside a spawned task.
pub(crate) type ProbeFn = fn(Arc<Client>, String, String) -> BoxFuture<'static, Result<RegionProbe>>;

fn probe_region_boxed(client: Arc<Client>, region: String, bucket_name: String) -> BoxFuture<'static, Result<RegionProbe>> {
    Box::pin(async move { probe_region(&client, &region, &bucket_name).await })
}

fn normalize_region(region: Option<&str>) -> String {
    // AWS returns an empty LocationConstraint for the us-east-1 region.
    match region {
        None | Some("") => "us-east-1".to_string(),
        Some(r) => r.to_string(),
    }
}

/// Strategy A: race a region-location request against every client in the
/// registry. The first "exists" result wins; if every region reports
/// not-exists, the bucket doesn't exist. Any other error fails the whole
/// probe fast.
pub async fn scan_all_regions(registry: &ClientRegistry, bucket_name: &str) -> Result<(bool, String)> {
    scan_all_regions_with(registry, bucket_name, probe_region_boxed).await
}

/// Same race as [`scan_all_regions`], parameterized over the per-region
/// probe. Lets adapters whose existence signal isn't `GetBucketLocation`
/// (e.g. Scaleway's one-key `ListObjectsV2`) still race every region's
/// client concurrently instead of hand-rolling a sequential loop.
pub(crate) async fn scan_all_regions_with(registry: &ClientRegistry, bucket_name: &str, probe: ProbeFn) -> Result<(bool, String)> {
    if !is_valid_s3_bucket_name(bucket_name) {
        return Err(ScanError::InvalidName(bucket_name.to_string()));
    }

    let total = registry.len();
    if total == 0 {
        return Ok((false, String::new()));
    }

    let (result_tx, mut result_rx) = tokio::sync::mpsc::channel::<RegionProbe>(total);
    let (err_tx, mut err_rx) = tokio::sync::mpsc::channel::<ScanError>(1);

    let mut clients = Vec::new();
    registry.each(|region, _credentialed, client| clients.push((region.to_string(), client.clone())));

    for (region, client) in clients {
        let bucket_name = bucket_name.to_string();
        let result_tx = result_tx.clone();
        let err_tx = err_tx.clone();
        tokio::spawn(async move {
            match probe(client, region, bucket_name).await {
                Ok(RegionProbe::Exists { region }) => {
                    let _ = result_tx.send(RegionProbe::Exists { region }).await;
                }
                Ok(RegionProbe::NotExists) => {
                    let _ = result_tx.send(RegionProbe::NotExists).await;
                }
                Err(e) => {
                    let _ = err_tx.send(e).await;
                }
            }
        });
    }
    drop(result_tx);
    drop(err_tx);

    for _ in 0..total {
        tokio::select! {
            biased;
            Some(err) = err_rx.recv() => return Err(err),
            Some(res) = result_rx.recv() => {
                if let RegionProbe::Exists { region } = res {
                    return Ok((true, region));
                }
            }
            else => break,
        }
    }
    Ok((false, String::new()))
}

/// A single region's `GetBucketLocation` probe, exposed directly for the
/// AWS adapter, which only ever needs one call (AWS resolves the bucket's
/// true region for you — no need to race every region like the non-AWS
/// providers do).
pub async fn get_bucket_location(client: &Client, assumed_region: &str, bucket_name: &str) -> Result<(bool, String)> {
    if !is_valid_s3_bucket_name(bucket_name) {
        return Err(ScanError::InvalidName(bucket_name.to_string()));
    }
    match probe_region(client, assumed_region, bucket_name).await? {
        RegionProbe::Exists { region } => Ok((true, region)),
        RegionProbe::NotExists => Ok((false, String::new())),
    }
}

async fn probe_region(client: &Client, region: &str, bucket_name: &str) -> Result<RegionProbe> {
    match client.get_bucket_location().bucket(bucket_name).send().await {
        Ok(output) => {
            let resolved = normalize_region(output.location_constraint().map(|c| c.as_str()));
            debug!(bucket_name, region, "bucket exists (no error)");
            Ok(RegionProbe::Exists {
                region: if resolved.is_empty() { region.to_string() } else { resolved },
            })
        }
        Err(err) => {
            if matches!(err.as_service_error(), Some(GetBucketLocationError::NoSuchBucket(_))) {
                Ok(RegionProbe::NotExists)
            } else if err.raw_response().map(|r| r.status().as_u16()) == Some(403) {
                Ok(RegionProbe::Exists { region: region.to_string() })
            } else {
                Err(ScanError::Existence {
                    bucket: bucket_name.to_string(),
                    source: Box::new(err),
                })
            }
        }
    }
}

/// Strategy B: a single HEAD against a universal endpoint, using a client
/// that does not follow redirects. 200 or 403 both mean "exists in the
/// assumed region"; 301 means exists, region taken from the
/// `x-amz-bucket-region` response header; 404 means not-exists.
pub async fn redirect_301(
    http_client: &reqwest::Client,
    universal_endpoint: &str,
    assumed_region: &str,
    bucket_name: &str,
) -> Result<(bool, String)> {
    if !is_valid_s3_bucket_name(bucket_name) {
        return Err(ScanError::InvalidName(bucket_name.to_string()));
    }

    let url = format!("{universal_endpoint}/{bucket_name}");
    let response = http_client
        .head(&url)
        .send()
        .await
        .map_err(|e| ScanError::Existence {
            bucket: bucket_name.to_string(),
            source: Box::new(e),
        })?;

    match response.status() {
        StatusCode::OK => Ok((true, assumed_region.to_string())),
        StatusCode::MOVED_PERMANENTLY => {
            let region = response
                .headers()
                .get("x-amz-bucket-region")
                .and_then(|v| v.to_str().ok())
                .unwrap_or(assumed_region)
                .to_string();
            Ok((true, region))
        }
        StatusCode::FORBIDDEN => Ok((true, assumed_region.to_string())),
        StatusCode::NOT_FOUND => Ok((false, String::new())),
        other => Err(ScanError::Existence {
            bucket: bucket_name.to_string(),
            source: Box::new(std::io::Error::other(format!("unexpected status: {other}"))),
        }),
    }
}

/// Builds the non-redirect-following HTTP client Strategy B needs.
/// `insecure` skips TLS certificate verification, for self-hosted
/// `custom` endpoints without a valid certificate chain.
pub fn non_redirecting_client(insecure: bool) -> Arc<reqwest::Client> {
    Arc::new(
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(insecure)
            .build()
            .expect("building a plain HTTP client should never fail"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_empty_location_to_us_east_1() {
        assert_eq!(normalize_region(None), "us-east-1");
        assert_eq!(normalize_region(Some("")), "us-east-1");
        assert_eq!(normalize_region(Some("eu-west-1")), "eu-west-1");
    }

    #[tokio::test]
    async fn invalid_name_short_circuits_before_network() {
        let registry = ClientRegistry::new();
        let err = scan_all_regions(&registry, "AB").await.unwrap_err();
        assert!(matches!(err, ScanError::InvalidName(_)));
    }
}
