//! Contracts consumed from external collaborators.
//!
//! The engine owns none of these: persistence of repo/org/user records,
//! signature bookkeeping, the wrapped version-control REST client, and
//! the status/comment surface all live behind these seams. Production
//! wiring supplies real clients; tests supply recording doubles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::BoundaryError;
use crate::model::{
    CheckOutcome, DocumentRef, LinkedItem, OrgRecord, PullRequestRef, RepoRecord, Signature,
    UserRecord,
};

/// A user as known to the version-control provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsUser {
    pub id: i64,
    pub login: String,
}

/// Commit-status update for one pull request head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub repo: String,
    pub owner: String,
    pub number: u64,
    pub sha: String,
    pub signed: bool,
    pub token: Option<String>,
}

/// In-place edit of the engine's status comment on one pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentUpdate {
    pub repo: String,
    pub owner: String,
    pub number: u64,
    pub signed: bool,
    pub user_map: crate::model::UserMap,
    pub token: Option<String>,
}

/// Signature creation request handed to the signature boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureClaim {
    pub repo: Option<String>,
    pub owner: String,
    pub user: String,
    pub user_id: i64,
    pub custom_fields: Option<serde_json::Value>,
}

/// Document-check boundary: signature evaluation per pull request.
#[async_trait]
pub trait CheckService: Send + Sync {
    /// Whether the CLA obligation is satisfied for this pull request,
    /// with an optional per-user breakdown.
    async fn check(
        &self,
        item: &LinkedItem,
        pr: &PullRequestRef,
    ) -> Result<CheckOutcome, BoundaryError>;

    /// Whether a signed CLA is required for this pull request at all
    /// (allowlists, bot detection, file-path filters — decided outside
    /// this crate). Callers treat a failure here as "required".
    async fn is_cla_required(
        &self,
        item: &LinkedItem,
        pr: &PullRequestRef,
    ) -> Result<bool, BoundaryError>;
}

/// Signature bookkeeping boundary.
#[async_trait]
pub trait SignatureService: Send + Sync {
    /// Record a signature. Fails on a duplicate
    /// (scope, user, document version) — a legitimate terminal outcome.
    async fn sign(&self, claim: &SignatureClaim) -> Result<(), BoundaryError>;

    /// Whether `user` holds a signature satisfying the item's current
    /// document version.
    async fn has_signature(&self, item: &LinkedItem, user: &str) -> Result<bool, BoundaryError>;

    /// Most recent signature of `user` under the governing item.
    async fn last_signature(
        &self,
        item: &LinkedItem,
        user: &str,
    ) -> Result<Option<Signature>, BoundaryError>;

    /// All signatures recorded against the item's current document.
    async fn list(&self, item: &LinkedItem) -> Result<Vec<Signature>, BoundaryError>;

    /// Terminate `user`'s signature as of `end_date`.
    async fn terminate(
        &self,
        item: &LinkedItem,
        user: &str,
        end_date: DateTime<Utc>,
    ) -> Result<(), BoundaryError>;
}

/// Wrapped version-control provider.
#[async_trait]
pub trait VcsService: Send + Sync {
    async fn list_open_pull_requests(
        &self,
        repo: &str,
        owner: &str,
        token: Option<&str>,
    ) -> Result<Vec<PullRequestRef>, BoundaryError>;

    /// Fetch a single pull request, used by targeted updates where only
    /// the number is cached and a fresh head sha is needed.
    async fn get_pull_request(
        &self,
        repo: &str,
        owner: &str,
        number: u64,
        token: Option<&str>,
    ) -> Result<PullRequestRef, BoundaryError>;

    /// Names of the organization's repositories.
    async fn list_repositories(
        &self,
        org: &str,
        token: &str,
    ) -> Result<Vec<String>, BoundaryError>;

    async fn get_user(&self, username: &str, token: &str) -> Result<VcsUser, BoundaryError>;
}

/// Commit-status surface.
#[async_trait]
pub trait StatusService: Send + Sync {
    /// Set the pass/fail status for an evaluated pull request.
    async fn update(&self, update: &StatusUpdate) -> Result<(), BoundaryError>;

    /// Neutral status for a repository linked with a null CLA.
    async fn update_for_null_cla(&self, update: &StatusUpdate) -> Result<(), BoundaryError>;

    /// Status for a pull request the CLA does not apply to.
    async fn update_for_cla_not_required(
        &self,
        update: &StatusUpdate,
    ) -> Result<(), BoundaryError>;
}

/// Pull-request comment surface.
#[async_trait]
pub trait CommentService: Send + Sync {
    /// Edit the status comment in place; never appends a second one.
    async fn edit_comment(&self, update: &CommentUpdate) -> Result<(), BoundaryError>;

    async fn delete_comment(
        &self,
        repo: &str,
        owner: &str,
        number: u64,
    ) -> Result<(), BoundaryError>;
}

/// Entity store holding repo/org link records and the shared-document
/// graph. The graph is an explicit lookup query, not bidirectional links
/// embedded in each record.
#[async_trait]
pub trait EntityService: Send + Sync {
    async fn resolve_repo(
        &self,
        repo: &str,
        owner: &str,
    ) -> Result<Option<RepoRecord>, BoundaryError>;

    async fn resolve_org(&self, org: &str) -> Result<Option<OrgRecord>, BoundaryError>;

    /// All linked repo records under one owner, used to detect org-level
    /// overrides during organization-wide validation.
    async fn list_repos_by_owner(&self, owner: &str) -> Result<Vec<RepoRecord>, BoundaryError>;

    async fn find_repos_sharing_document(
        &self,
        document: &DocumentRef,
    ) -> Result<Vec<RepoRecord>, BoundaryError>;

    async fn find_orgs_sharing_document(
        &self,
        document: &DocumentRef,
    ) -> Result<Vec<OrgRecord>, BoundaryError>;
}

/// Store for per-user cached pull request groups.
#[async_trait]
pub trait UserService: Send + Sync {
    async fn find_user(&self, user_id: i64) -> Result<Option<UserRecord>, BoundaryError>;

    /// Persist the (possibly pruned) record after its cache is consumed.
    async fn save_user(&self, user: &UserRecord) -> Result<(), BoundaryError>;
}
