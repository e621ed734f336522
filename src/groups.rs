//! Well-known S3 ACL grantee group URIs.
//!
//! The upstream source this scanner is modeled on defines two of these
//! constants, but one of them is a copy-paste bug: its `AuthenticatedUsers`
//! constant actually points at the `AllUsers` URI. That's treated as a
//! defect, not intent — the two groups are distinct and must resolve to
//! distinct URIs here.

pub const ALL_USERS_URI: &str = "http://acs.amazonaws.com/groups/global/AllUsers";
pub const AUTHENTICATED_USERS_URI: &str =
    "http://acs.amazonaws.com/groups/global/AuthenticatedUsers";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_uris_are_distinct() {
        assert_ne!(ALL_USERS_URI, AUTHENTICATED_USERS_URI);
    }

    #[test]
    fn group_uris_match_spec() {
        assert_eq!(
            ALL_USERS_URI,
            "http://acs.amazonaws.com/groups/global/AllUsers"
        );
        assert_eq!(
            AUTHENTICATED_USERS_URI,
            "http://acs.amazonaws.com/groups/global/AuthenticatedUsers"
        );
    }
}
