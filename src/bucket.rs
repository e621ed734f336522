//! The core data model: a probed [`Bucket`] and its enumerated [`Object`]s.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::groups::{ALL_USERS_URI, AUTHENTICATED_USERS_URI};

/// Whether a bucket name has been confirmed to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Existence {
    Unknown,
    Exists,
    DoesNotExist,
}

impl Default for Existence {
    fn default() -> Self {
        Self::Unknown
    }
}

impl Existence {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Exists => "exists",
            Self::DoesNotExist => "does_not_exist",
        }
    }
}

/// A single grant outcome: allowed, denied, or not yet determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Unknown,
    Allowed,
    Denied,
}

impl Default for Permission {
    fn default() -> Self {
        Self::Unknown
    }
}

impl Permission {
    pub fn from_bool(allowed: bool) -> Self {
        if allowed { Self::Allowed } else { Self::Denied }
    }

    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Allowed => "allowed",
            Self::Denied => "denied",
        }
    }
}

/// A well-known S3 ACL grantee group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalGroup {
    AllUsers,
    AuthenticatedUsers,
}

impl PrincipalGroup {
    pub fn uri(self) -> &'static str {
        match self {
            Self::AllUsers => ALL_USERS_URI,
            Self::AuthenticatedUsers => AUTHENTICATED_USERS_URI,
        }
    }

    pub fn from_uri(uri: &str) -> Option<Self> {
        if uri == ALL_USERS_URI {
            Some(Self::AllUsers)
        } else if uri == AUTHENTICATED_USERS_URI {
            Some(Self::AuthenticatedUsers)
        } else {
            None
        }
    }
}

/// The five discrete S3 ACL permissions tracked per principal group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionKind {
    Read,
    Write,
    ReadAcp,
    WriteAcp,
    FullControl,
}

impl PermissionKind {
    /// The literal name used in the human-readable result line.
    pub fn label(self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::ReadAcp => "READ_ACP",
            Self::WriteAcp => "WRITE_ACP",
            Self::FullControl => "FULL_CONTROL",
        }
    }
}

/// The five grants for one principal group.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PermissionSet {
    pub read: Permission,
    pub write: Permission,
    pub read_acp: Permission,
    pub write_acp: Permission,
    pub full_control: Permission,
}

impl PermissionSet {
    fn deny_all() -> Self {
        Self {
            read: Permission::Denied,
            write: Permission::Denied,
            read_acp: Permission::Denied,
            write_acp: Permission::Denied,
            full_control: Permission::Denied,
        }
    }

    fn set(&mut self, kind: PermissionKind, perm: Permission) {
        match kind {
            PermissionKind::Read => self.read = perm,
            PermissionKind::Write => self.write = perm,
            PermissionKind::ReadAcp => self.read_acp = perm,
            PermissionKind::WriteAcp => self.write_acp = perm,
            PermissionKind::FullControl => self.full_control = perm,
        }
    }

    fn get(&self, kind: PermissionKind) -> Permission {
        match kind {
            PermissionKind::Read => self.read,
            PermissionKind::Write => self.write,
            PermissionKind::ReadAcp => self.read_acp,
            PermissionKind::WriteAcp => self.write_acp,
            PermissionKind::FullControl => self.full_control,
        }
    }

    /// Permission kinds currently marked `Allowed`, in the canonical
    /// READ/WRITE/READ_ACP/WRITE_ACP/FULL_CONTROL display order.
    fn allowed_kinds(&self) -> Vec<PermissionKind> {
        [
            PermissionKind::Read,
            PermissionKind::Write,
            PermissionKind::ReadAcp,
            PermissionKind::WriteAcp,
            PermissionKind::FullControl,
        ]
        .into_iter()
        .filter(|k| self.get(*k).is_allowed())
        .collect()
    }
}

/// An object key discovered during enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    pub key: String,
    pub size: u64,
}

/// A probed bucket: the unit of work that flows from an input source,
/// through the worker pool, to the log sink and optional persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    pub provider: Option<String>,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub exists: Existence,
    pub date_scanned: Option<DateTime<Utc>>,
    #[serde(default)]
    pub objects: Vec<Object>,
    #[serde(default)]
    pub objects_enumerated: bool,
    #[serde(default)]
    pub num_objects: u32,
    #[serde(default)]
    pub bucket_size: u64,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub owner_display_name: String,
    #[serde(default)]
    pub perm_all_users: PermissionSet,
    #[serde(default)]
    pub perm_auth_users: PermissionSet,
}

impl Bucket {
    /// Creates a fresh bucket with only a name: existence unknown, all ten
    /// grants unknown, per the lifecycle described in the data model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: None,
            region: String::new(),
            exists: Existence::Unknown,
            date_scanned: None,
            objects: Vec::new(),
            objects_enumerated: false,
            num_objects: 0,
            bucket_size: 0,
            owner_id: String::new(),
            owner_display_name: String::new(),
            perm_all_users: PermissionSet::default(),
            perm_auth_users: PermissionSet::default(),
        }
    }

    pub fn permissions_for(&self, group: PrincipalGroup) -> &PermissionSet {
        match group {
            PrincipalGroup::AllUsers => &self.perm_all_users,
            PrincipalGroup::AuthenticatedUsers => &self.perm_auth_users,
        }
    }

    pub fn permissions_for_mut(&mut self, group: PrincipalGroup) -> &mut PermissionSet {
        match group {
            PrincipalGroup::AllUsers => &mut self.perm_all_users,
            PrincipalGroup::AuthenticatedUsers => &mut self.perm_auth_users,
        }
    }

    pub fn set_permission(&mut self, group: PrincipalGroup, kind: PermissionKind, perm: Permission) {
        self.permissions_for_mut(group).set(kind, perm);
    }

    /// Sets every grant for both principal groups to `Denied`. Called right
    /// before a successful ACL read is applied, so that the only fields
    /// left un-set afterward are the ones the ACL doesn't mention.
    pub fn deny_all(&mut self) {
        self.perm_all_users = PermissionSet::deny_all();
        self.perm_auth_users = PermissionSet::deny_all();
    }

    /// Applies a `GetBucketAcl` response: denies everything, then marks
    /// allowed whichever (group, permission) pairs the ACL actually grants.
    pub fn apply_acl(&mut self, owner_id: &str, owner_display_name: Option<&str>, grants: &[(PrincipalGroup, PermissionKind)]) {
        self.owner_id = owner_id.to_string();
        if let Some(name) = owner_display_name {
            self.owner_display_name = name.to_string();
        }
        self.deny_all();
        for (group, kind) in grants {
            self.set_permission(*group, *kind, Permission::Allowed);
        }
    }

    /// Renders the `AuthUsers: [...] | AllUsers: [...]` permission summary
    /// used in the human-readable result line.
    pub fn permissions_display(&self) -> (String, String) {
        let fmt = |set: &PermissionSet| -> String {
            set.allowed_kinds()
                .iter()
                .map(|k| k.label())
                .collect::<Vec<_>>()
                .join(", ")
        };
        (fmt(&self.perm_auth_users), fmt(&self.perm_all_users))
    }
}

/// S3 bucket-name syntax validator.
///
/// Valid iff: length in `[3, 63]`; only lowercase ASCII letters, digits,
/// dots, and hyphens; starts and ends with a letter or digit; does not
/// begin with `xn--`; does not end with `-s3alias`. IP-address-shaped
/// names are not rejected — a documented limitation carried from the
/// source this is modeled on.
pub fn is_valid_s3_bucket_name(name: &str) -> bool {
    if name.len() < 3 || name.len() > 63 {
        return false;
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'.' || b == b'-')
    {
        return false;
    }
    let first = name.as_bytes()[0];
    let last = name.as_bytes()[name.len() - 1];
    if !(first.is_ascii_lowercase() || first.is_ascii_digit()) {
        return false;
    }
    if !(last.is_ascii_lowercase() || last.is_ascii_digit()) {
        return false;
    }
    if name.starts_with("xn--") {
        return false;
    }
    if name.ends_with("-s3alias") {
        return false;
    }
    true
}

/// Reads candidate bucket names from any line-oriented reader: trims
/// whitespace, rejects invalid names (caller is expected to have logged
/// them via the returned `skipped` list), lowercases, and deduplicates
/// within this single read. Mirrors the upstream file reader's semantics,
/// generalized off a concrete file handle so it can be unit tested against
/// an in-memory buffer.
pub fn dedup_valid_names<R: std::io::BufRead>(reader: R) -> std::io::Result<(Vec<String>, Vec<String>)> {
    let mut accepted = Vec::new();
    let mut skipped = Vec::new();
    let mut seen = HashSet::new();
    for line in reader.lines() {
        let line = line?;
        let name = line.trim();
        if name.is_empty() {
            continue;
        }
        if !is_valid_s3_bucket_name(name) {
            skipped.push(name.to_string());
            continue;
        }
        let name = name.to_lowercase();
        if seen.insert(name.clone()) {
            accepted.push(name);
        }
    }
    Ok((accepted, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn boundary_lengths() {
        assert!(is_valid_s3_bucket_name("abc"));
        assert!(is_valid_s3_bucket_name(&"a".repeat(63)));
        assert!(!is_valid_s3_bucket_name("ab"));
        assert!(!is_valid_s3_bucket_name(&"a".repeat(64)));
    }

    #[test]
    fn rejects_known_invalid_examples() {
        assert!(!is_valid_s3_bucket_name("xn--abc"));
        assert!(!is_valid_s3_bucket_name("foo-s3alias"));
        assert!(!is_valid_s3_bucket_name("Has-Upper-Case"));
        assert!(!is_valid_s3_bucket_name("-leading-hyphen"));
        assert!(!is_valid_s3_bucket_name("trailing-hyphen-"));
        assert!(!is_valid_s3_bucket_name("under_score"));
    }

    #[test]
    fn accepts_dots() {
        assert!(is_valid_s3_bucket_name("flaws.cloud"));
    }

    #[test]
    fn new_bucket_has_all_unknown_grants() {
        let b = Bucket::new("example");
        assert_eq!(b.exists, Existence::Unknown);
        assert!(b.perm_all_users.read.is_unknown());
        assert!(b.perm_auth_users.full_control.is_unknown());
        assert_eq!(b.region, "");
    }

    #[test]
    fn apply_acl_leaves_no_unknowns_for_examined_principals() {
        let mut b = Bucket::new("example");
        b.apply_acl(
            "owner-1",
            Some("Owner One"),
            &[(PrincipalGroup::AllUsers, PermissionKind::Read)],
        );
        assert!(b.perm_all_users.read.is_allowed());
        assert_eq!(b.perm_all_users.write, Permission::Denied);
        assert_eq!(b.perm_auth_users.read, Permission::Denied);
        assert!(!b.perm_all_users.write.is_unknown());
    }

    #[test]
    fn permissions_display_matches_literal_labels() {
        let mut b = Bucket::new("example");
        b.apply_acl(
            "owner",
            None,
            &[
                (PrincipalGroup::AllUsers, PermissionKind::Read),
                (PrincipalGroup::AuthenticatedUsers, PermissionKind::FullControl),
            ],
        );
        let (auth, all) = b.permissions_display();
        assert_eq!(auth, "FULL_CONTROL");
        assert_eq!(all, "READ");
    }

    #[test]
    fn file_reader_dedups_and_skips_invalid() {
        let input = "MyBucket\nmybucket\nmybucket\n  \nxn--bad\nok-bucket\n";
        let (accepted, skipped) = dedup_valid_names(Cursor::new(input)).unwrap();
        assert_eq!(accepted, vec!["mybucket".to_string(), "ok-bucket".to_string()]);
        assert_eq!(skipped, vec!["MyBucket".to_string(), "xn--bad".to_string()]);
    }
}
