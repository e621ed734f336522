//! Grant inference: reads bucket ACLs and falls back to behavioral probes
//! (HEAD, PUT, DELETE, PutACL) to fill in the grants a successful ACL read
//! didn't settle, with the short-circuit order in the permission design.

use std::time::{SystemTime, UNIX_EPOCH};

use aws_sdk_s3::Client;
use aws_sdk_s3::types::{Grant, Grantee, Permission as AwsPermission, Type as GranteeType};
use chrono::Utc;
use tracing::debug;

use crate::bucket::{Bucket, Permission, PermissionKind, PrincipalGroup};
use crate::error::{Result, ScanError};
use crate::groups::{ALL_USERS_URI, AUTHENTICATED_USERS_URI};

/// Classifies an operation error as a specific HTTP status, if the SDK
/// surfaced one. Centralizes the `ProvideErrorMetadata` dance used by every
/// probe below.
fn status_of<E>(err: &aws_sdk_s3::error::SdkError<E, aws_smithy_runtime_api::http::Response>) -> Option<u16>
where
    E: std::error::Error,
{
    err.raw_response().map(|r| r.status().as_u16())
}

fn boxed<E: std::error::Error + Send + Sync + 'static>(e: E) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(e)
}

/// `GetBucketAcl` probe. On success, every grant for both principal groups
/// is authoritatively known (denied unless the ACL says otherwise). On a
/// 403, only the read_acp grant for `group` is set to denied; other
/// statuses are scan-level errors.
async fn check_read_acl(client: &Client, bucket: &mut Bucket, group: PrincipalGroup) -> Result<bool> {
    match client.get_bucket_acl().bucket(&bucket.name).send().await {
        Ok(output) => {
            let owner_id = output.owner().and_then(|o| o.id()).unwrap_or_default().to_string();
            let owner_name = output.owner().and_then(|o| o.display_name()).map(str::to_string);
            let mut grants = Vec::new();
            for g in output.grants() {
                if let Some((group, kind)) = classify_grant(g) {
                    grants.push((group, kind));
                }
            }
            bucket.apply_acl(&owner_id, owner_name.as_deref(), &grants);
            Ok(true)
        }
        Err(err) => {
            if status_of(&err) == Some(403) {
                bucket.set_permission(group, PermissionKind::ReadAcp, Permission::Denied);
                debug!(bucket = %bucket.name, "GetBucketAcl denied");
                Ok(false)
            } else {
                Err(ScanError::Permission {
                    bucket: bucket.name.clone(),
                    region: bucket.region.clone(),
                    source: boxed(err),
                })
            }
        }
    }
}

fn classify_grant(grant: &Grant) -> Option<(PrincipalGroup, PermissionKind)> {
    let grantee = grant.grantee()?;
    if grantee.r#type() != &GranteeType::Group {
        return None;
    }
    let uri = grantee.uri()?;
    let group = PrincipalGroup::from_uri(uri)?;
    let kind = match grant.permission()? {
        AwsPermission::Read => PermissionKind::Read,
        AwsPermission::Write => PermissionKind::Write,
        AwsPermission::ReadAcp => PermissionKind::ReadAcp,
        AwsPermission::WriteAcp => PermissionKind::WriteAcp,
        AwsPermission::FullControl => PermissionKind::FullControl,
        _ => return None,
    };
    Some((group, kind))
}

async fn check_read(client: &Client, bucket: &mut Bucket, group: PrincipalGroup) -> Result<()> {
    match client.head_bucket().bucket(&bucket.name).send().await {
        Ok(_) => {
            bucket.set_permission(group, PermissionKind::Read, Permission::Allowed);
            Ok(())
        }
        Err(err) => {
            if status_of(&err) == Some(403) {
                bucket.set_permission(group, PermissionKind::Read, Permission::Denied);
                Ok(())
            } else {
                Err(ScanError::Permission {
                    bucket: bucket.name.clone(),
                    region: bucket.region.clone(),
                    source: boxed(err),
                })
            }
        }
    }
}

/// WRITE probe: attempt to `PutObject` a uniquely-named empty object, then
/// clean it up immediately on success. Only ever probes the `AllUsers`
/// grant, mirroring the behavior this is grounded on — the destructive
/// probes were never extended to the authenticated principal upstream.
async fn check_write(client: &Client, bucket: &mut Bucket) -> Result<()> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    let key = format!("{now}_{}.txt", bucket.name);

    match client
        .put_object()
        .bucket(&bucket.name)
        .key(&key)
        .body(Vec::new().into())
        .send()
        .await
    {
        Ok(_) => {
            bucket.set_permission(PrincipalGroup::AllUsers, PermissionKind::Write, Permission::Allowed);
            if let Err(cleanup_err) = client.delete_object().bucket(&bucket.name).key(&key).send().await {
                // The WRITE result stands even if cleanup failed; surface
                // the cleanup failure but don't overturn the grant.
                debug!(bucket = %bucket.name, key = %key, error = %cleanup_err, "failed to clean up WRITE probe object");
            }
            Ok(())
        }
        Err(err) => {
            if status_of(&err) == Some(403) {
                bucket.set_permission(PrincipalGroup::AllUsers, PermissionKind::Write, Permission::Denied);
                Ok(())
            } else {
                Err(ScanError::Permission {
                    bucket: bucket.name.clone(),
                    region: bucket.region.clone(),
                    source: boxed(err),
                })
            }
        }
    }
}

/// WRITE_ACP probe: mirror every currently-allowed grant back as a
/// `PutBucketAcl` call, so a successful call is idempotent in the steady
/// state (replaying it shouldn't change anything on a rescan).
async fn check_write_acl(client: &Client, bucket: &mut Bucket) -> Result<()> {
    let mut full_control = Vec::new();
    let mut write_acp = Vec::new();
    let mut write = Vec::new();
    let mut read_acp = Vec::new();
    let mut read = Vec::new();

    for (group, set) in [
        (PrincipalGroup::AuthenticatedUsers, &bucket.perm_auth_users),
        (PrincipalGroup::AllUsers, &bucket.perm_all_users),
    ] {
        let uri = format!("uri={}", group.uri());
        if set.full_control.is_allowed() {
            full_control.push(uri.clone());
        }
        if set.write_acp.is_allowed() {
            write_acp.push(uri.clone());
        }
        if set.write.is_allowed() {
            write.push(uri.clone());
        }
        if set.read_acp.is_allowed() {
            read_acp.push(uri.clone());
        }
        if set.read.is_allowed() {
            read.push(uri);
        }
    }

    let result = client
        .put_bucket_acl()
        .bucket(&bucket.name)
        .grant_full_control(full_control.join(","))
        .grant_write_acp(write_acp.join(","))
        .grant_write(write.join(","))
        .grant_read_acp(read_acp.join(","))
        .grant_read(read.join(","))
        .send()
        .await;

    match result {
        Ok(_) => {
            bucket.set_permission(PrincipalGroup::AllUsers, PermissionKind::WriteAcp, Permission::Allowed);
            Ok(())
        }
        Err(err) => match status_of(&err) {
            Some(400) | Some(403) => {
                bucket.set_permission(PrincipalGroup::AllUsers, PermissionKind::WriteAcp, Permission::Denied);
                Ok(())
            }
            _ => Err(ScanError::Permission {
                bucket: bucket.name.clone(),
                region: bucket.region.clone(),
                source: boxed(err),
            }),
        },
    }
}

/// Runs the full permission-inference procedure against a bucket already
/// known to exist. `cred_client`, when present, additionally probes the
/// `AuthenticatedUsers` grants.
pub async fn check_permissions(
    anon_client: &Client,
    cred_client: Option<&Client>,
    bucket: &mut Bucket,
    destructive: bool,
) -> Result<()> {
    bucket.date_scanned = Some(Utc::now());

    check_read_acl(anon_client, bucket, PrincipalGroup::AllUsers).await?;

    if let Some(cred_client) = cred_client {
        check_read_acl(cred_client, bucket, PrincipalGroup::AuthenticatedUsers).await?;
    }

    // Short-circuit: FULL_CONTROL for AuthUsers implies everything else is
    // already knowable from the ACL read, so skip the rest of the probes.
    if bucket.perm_auth_users.full_control.is_allowed() {
        return Ok(());
    }

    check_read(anon_client, bucket, PrincipalGroup::AllUsers).await?;
    if let Some(cred_client) = cred_client {
        check_read(cred_client, bucket, PrincipalGroup::AuthenticatedUsers).await?;
    }

    if destructive {
        check_write(anon_client, bucket).await?;
        check_write_acl(anon_client, bucket).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_grant_recognizes_known_groups() {
        let grant = Grant::builder()
            .grantee(
                Grantee::builder()
                    .r#type(GranteeType::Group)
                    .uri(ALL_USERS_URI)
                    .build()
                    .unwrap(),
            )
            .permission(AwsPermission::Read)
            .build();
        let (group, kind) = classify_grant(&grant).expect("should classify");
        assert_eq!(group, PrincipalGroup::AllUsers);
        assert_eq!(kind, PermissionKind::Read);
    }

    #[test]
    fn classify_grant_ignores_canonical_user_grantees() {
        let grant = Grant::builder()
            .grantee(
                Grantee::builder()
                    .r#type(GranteeType::CanonicalUser)
                    .id("some-owner-id")
                    .build()
                    .unwrap(),
            )
            .permission(AwsPermission::FullControl)
            .build();
        assert!(classify_grant(&grant).is_none());
    }

    #[test]
    fn authenticated_users_uri_is_distinct_from_all_users() {
        assert_ne!(ALL_USERS_URI, AUTHENTICATED_USERS_URI);
    }
}
