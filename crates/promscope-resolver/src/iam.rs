// crates/promscope-resolver/src/iam.rs
// ============================================================================
// Module: IAM Resolver
// Description: Namespace resolver backed by an external IAM service.
// Purpose: Map a caller token to the namespaces its teams may access.
// Dependencies: async-trait, promscope-core, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! The IAM resolver performs two calls per resolution: a credential
//! verification that exchanges the access token for a user identifier, and
//! a resource lookup that lists the namespaces the user's teams own. A
//! caller whose highest role is cluster administrator receives the
//! unbounded scope; everyone else receives exactly the listed namespaces.
//! Invariants:
//! - Every upstream failure, malformed response, or empty result denies
//!   access.
//! - The user identifier is validated before it is spliced into a URL path.
//!
//! Security posture: tokens and IAM responses are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use promscope_core::CallerCredential;
use promscope_core::NamespaceResolver;
use promscope_core::NamespaceScope;
use promscope_core::ResolveError;
use reqwest::Client;
use serde::Deserialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Credential verification path appended to the userinfo base URL.
const USERINFO_PATH: &str = "/v1/auth/userInfo";
/// Role granting access to every namespace.
const CLUSTER_ADMIN_ROLE: &str = "ClusterAdministrator";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Endpoint configuration for the IAM resolver.
#[derive(Debug, Clone)]
pub struct IamResolverConfig {
    /// Base URL of the credential-verification endpoint.
    pub userinfo_url: String,
    /// Base URL of the resource-lookup endpoint.
    pub resources_url: String,
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Credential verification response.
#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    /// Subject identifier of the authenticated user.
    sub: Option<String>,
}

/// One team resource entry from the resource lookup.
#[derive(Debug, Deserialize)]
struct TeamResource {
    /// Namespace the team owns.
    #[serde(rename = "namespaceId")]
    namespace_id: Option<String>,
    /// Highest role the user holds.
    #[serde(rename = "highestRole")]
    highest_role: Option<String>,
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Resolver backed by an external IAM service.
pub struct IamResolver {
    /// HTTP client with connect and request timeouts applied.
    client: Client,
    /// Endpoint configuration.
    config: IamResolverConfig,
}

impl IamResolver {
    /// Creates a resolver over an already-configured HTTP client.
    #[must_use]
    pub const fn new(client: Client, config: IamResolverConfig) -> Self {
        Self {
            client,
            config,
        }
    }

    /// Exchanges the access token for the caller's user identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::AccessDenied`] when the service rejects the
    /// token or omits the subject, and [`ResolveError::Upstream`] on
    /// transport failures.
    async fn fetch_user_id(&self, token: &str) -> Result<String, ResolveError> {
        let url = format!("{}{USERINFO_PATH}", self.config.userinfo_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .form(&[("access_token", token)])
            .send()
            .await
            .map_err(|err| ResolveError::Upstream(format!("userinfo request failed: {err}")))?;
        if !response.status().is_success() {
            return Err(ResolveError::AccessDenied);
        }
        let body = response
            .text()
            .await
            .map_err(|err| ResolveError::Upstream(format!("userinfo body read failed: {err}")))?;
        let info: UserInfoResponse =
            serde_json::from_str(&body).map_err(|_| ResolveError::AccessDenied)?;
        let uid = info.sub.ok_or(ResolveError::AccessDenied)?;
        if uid.is_empty() || !is_safe_path_segment(&uid) {
            return Err(ResolveError::AccessDenied);
        }
        Ok(uid)
    }

    /// Lists the namespaces accessible to `uid` and folds them into a scope.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::AccessDenied`] when the listing is empty,
    /// malformed, or carries no role, and [`ResolveError::Upstream`] on
    /// transport failures.
    async fn fetch_scope(&self, token: &str, uid: &str) -> Result<NamespaceScope, ResolveError> {
        let url = format!(
            "{}/identity/api/v1/users/{uid}/getTeamResources?resourceType=namespace",
            self.config.resources_url.trim_end_matches('/'),
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| ResolveError::Upstream(format!("resource lookup failed: {err}")))?;
        if !response.status().is_success() {
            return Err(ResolveError::AccessDenied);
        }
        let body = response
            .text()
            .await
            .map_err(|err| ResolveError::Upstream(format!("resource body read failed: {err}")))?;
        let resources = parse_team_resources(&body).ok_or(ResolveError::AccessDenied)?;
        scope_from_resources(&resources)
    }
}

#[async_trait]
impl NamespaceResolver for IamResolver {
    async fn resolve(&self, credential: &CallerCredential) -> Result<NamespaceScope, ResolveError> {
        let token = credential.token().ok_or(ResolveError::Unauthenticated)?;
        let uid = self.fetch_user_id(token).await?;
        self.fetch_scope(token, &uid).await
    }
}

// ============================================================================
// SECTION: Response Parsing
// ============================================================================

/// Parses the team resource listing, tolerating a doubly-encoded body where
/// the JSON array arrives wrapped in a JSON string.
fn parse_team_resources(body: &str) -> Option<Vec<TeamResource>> {
    if let Ok(resources) = serde_json::from_str::<Vec<TeamResource>>(body) {
        return Some(resources);
    }
    let inner: String = serde_json::from_str(body).ok()?;
    serde_json::from_str(&inner).ok()
}

/// Folds team resource entries into a namespace scope.
fn scope_from_resources(resources: &[TeamResource]) -> Result<NamespaceScope, ResolveError> {
    let role = resources
        .first()
        .and_then(|resource| resource.highest_role.as_deref())
        .unwrap_or_default();
    if role == CLUSTER_ADMIN_ROLE {
        return Ok(NamespaceScope::All);
    }
    if role.is_empty() {
        return Err(ResolveError::AccessDenied);
    }
    let names = resources
        .iter()
        .filter_map(|resource| resource.namespace_id.clone());
    NamespaceScope::named(names).ok_or(ResolveError::AccessDenied)
}

/// Returns true when `segment` may be spliced into a URL path unescaped.
fn is_safe_path_segment(segment: &str) -> bool {
    segment
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '@' | ':'))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions."
    )]

    use super::*;

    #[test]
    fn direct_array_body_parses() {
        let body = r#"[{"namespaceId":"foo","highestRole":"Viewer"}]"#;
        let resources = parse_team_resources(body).unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].namespace_id.as_deref(), Some("foo"));
    }

    #[test]
    fn doubly_encoded_body_parses() {
        let inner = r#"[{"namespaceId":"foo","highestRole":"Viewer"}]"#;
        let body = serde_json::to_string(inner).unwrap();
        let resources = parse_team_resources(&body).unwrap();
        assert_eq!(resources[0].highest_role.as_deref(), Some("Viewer"));
    }

    #[test]
    fn garbage_body_fails() {
        assert!(parse_team_resources("not json").is_none());
        assert!(parse_team_resources(r#""still not an array""#).is_none());
    }

    #[test]
    fn cluster_admin_role_grants_unbounded_scope() {
        let resources = vec![TeamResource {
            namespace_id: Some("foo".to_string()),
            highest_role: Some(CLUSTER_ADMIN_ROLE.to_string()),
        }];
        assert!(scope_from_resources(&resources).unwrap().is_all());
    }

    #[test]
    fn listed_namespaces_become_named_scope() {
        let resources = vec![
            TeamResource {
                namespace_id: Some("foo".to_string()),
                highest_role: Some("Viewer".to_string()),
            },
            TeamResource {
                namespace_id: Some("bar".to_string()),
                highest_role: Some("Viewer".to_string()),
            },
        ];
        let scope = scope_from_resources(&resources).unwrap();
        assert_eq!(scope.names().unwrap(), &["foo".to_string(), "bar".to_string()]);
    }

    #[test]
    fn missing_role_denies_access() {
        let resources = vec![TeamResource {
            namespace_id: Some("foo".to_string()),
            highest_role: None,
        }];
        assert!(matches!(scope_from_resources(&resources), Err(ResolveError::AccessDenied)));
    }

    #[test]
    fn empty_listing_denies_access() {
        assert!(matches!(scope_from_resources(&[]), Err(ResolveError::AccessDenied)));
    }

    #[test]
    fn hostile_user_ids_are_rejected() {
        assert!(is_safe_path_segment("user@example.com"));
        assert!(!is_safe_path_segment("../admin"));
        assert!(!is_safe_path_segment("a/b"));
        assert!(!is_safe_path_segment("a?x=1"));
    }
}
