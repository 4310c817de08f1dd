//! Data model for the CLA validation engine.
//!
//! These types mirror what the entity store persists (repo/org links,
//! user request caches) and what the version-control provider returns
//! (open pull requests). Pull request refs are ephemeral: fetched fresh
//! on every batch pass, never persisted by this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference to a CLA document.
///
/// `version` increases whenever the document content changes; a signature
/// recorded against an older version does not satisfy a newer one. Version
/// matching is enforced by the signature boundary, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub url: String,
    pub version: Option<String>,
}

impl DocumentRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            version: None,
        }
    }

    pub fn with_version(url: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            version: Some(version.into()),
        }
    }
}

/// A repository linked to a CLA document.
///
/// `document: None` means the repository is linked with a null CLA — a
/// valid terminal state, distinct from "document exists but unsigned".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoRecord {
    pub repo_id: i64,
    pub repo: String,
    pub owner: String,
    pub token: String,
    pub document: Option<DocumentRef>,
    #[serde(default)]
    pub shared_document: bool,
}

/// An organization linked to a CLA document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgRecord {
    pub org_id: i64,
    pub org: String,
    pub token: String,
    pub document: Option<DocumentRef>,
    #[serde(default)]
    pub shared_document: bool,
    /// Repository names the org-wide validation must skip.
    #[serde(default)]
    pub excluded_repos: Vec<String>,
}

impl OrgRecord {
    /// Whether org-wide validation must skip the named repository.
    pub fn is_repo_excluded(&self, repo: &str) -> bool {
        self.excluded_repos.iter().any(|r| r == repo)
    }
}

/// The entity governing a repository or organization at validation time.
///
/// Exactly one governs a given repository: the repository's own document
/// reference, if present, always wins over its organization's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LinkedItem {
    Repo(RepoRecord),
    Org(OrgRecord),
}

impl LinkedItem {
    pub fn document(&self) -> Option<&DocumentRef> {
        match self {
            LinkedItem::Repo(r) => r.document.as_ref(),
            LinkedItem::Org(o) => o.document.as_ref(),
        }
    }

    pub fn token(&self) -> &str {
        match self {
            LinkedItem::Repo(r) => &r.token,
            LinkedItem::Org(o) => &o.token,
        }
    }

    pub fn shared_document(&self) -> bool {
        match self {
            LinkedItem::Repo(r) => r.shared_document,
            LinkedItem::Org(o) => o.shared_document,
        }
    }

    /// Display name of the governing scope, for logs.
    pub fn scope_name(&self) -> String {
        match self {
            LinkedItem::Repo(r) => format!("{}/{}", r.owner, r.repo),
            LinkedItem::Org(o) => o.org.clone(),
        }
    }
}

/// An open pull request, as returned by the version-control boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub repo: String,
    pub owner: String,
    pub number: u64,
    pub head_sha: String,
}

/// Per-user breakdown attached to a check result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMap {
    pub signed: Vec<String>,
    pub not_signed: Vec<String>,
    pub unknown: Vec<String>,
}

/// Result of asking the document-check boundary about one pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub signed: bool,
    pub user_map: Option<UserMap>,
}

/// A recorded signature. Immutable once created; unique per
/// (document scope, user, document version).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub repo: Option<String>,
    pub owner: String,
    pub user: String,
    pub user_id: i64,
    pub document_version: Option<String>,
    pub custom_fields: Option<serde_json::Value>,
    pub signed_at: DateTime<Utc>,
}

/// Open pull request numbers a user is known to have authored in one
/// repository, cached so a fresh signature can be reflected without a
/// full repository scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestGroup {
    pub repo: String,
    pub owner: String,
    pub numbers: Vec<u64>,
}

/// Per-user record holding the cached pull request groups.
///
/// Groups whose (repo, owner) no longer resolves to any [`LinkedItem`]
/// are pruned when the cache is consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: i64,
    pub login: String,
    #[serde(default)]
    pub requests: Vec<PullRequestGroup>,
}

/// Input to [`crate::ClaEngine::sign`].
#[derive(Debug, Clone, Default)]
pub struct SignParams {
    pub user: String,
    pub user_id: i64,
    pub repo: Option<String>,
    pub owner: Option<String>,
    pub org: Option<String>,
    pub custom_fields: Option<serde_json::Value>,
}

impl SignParams {
    /// The owner or organization the signature is scoped to, if any.
    pub fn scope_owner(&self) -> Option<&str> {
        self.owner.as_deref().or(self.org.as_deref())
    }
}
