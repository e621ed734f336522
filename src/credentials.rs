//! Credential detection for the scanner's own principal.
//!
//! Presence is inferred by successfully retrieving both an access key id
//! and a secret from the default AWS credential chain. An empty string
//! from either counts as "no credentials" regardless of what the
//! credential provider itself reports — this sidesteps IMDS declaring a
//! false positive after a 4-second timeout, so IMDS is disabled outright.

pub async fn has_credentials(profile: Option<&str>) -> bool {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .imds_client(
            aws_config::imds::Client::builder()
                .connect_timeout(std::time::Duration::from_millis(1))
                .build(),
        );
    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }
    let cfg = loader.load().await;

    let Some(provider) = cfg.credentials_provider() else {
        return false;
    };

    match provider.provide_credentials().await {
        Ok(creds) => !creds.access_key_id().is_empty() && !creds.secret_access_key().is_empty(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_profile_has_no_credentials() {
        // A profile name that can't possibly exist on the test host;
        // the credential chain should fail closed.
        let found = has_credentials(Some("s3lurk-test-profile-does-not-exist")).await;
        assert!(!found);
    }
}
