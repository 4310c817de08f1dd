//! `cla-engine` — CLA requirement evaluation and status-synchronization.
//!
//! Determines whether a contributor's CLA obligation is satisfied and
//! keeps every affected pull request's commit status and status comment
//! synchronized with that determination — for a single repository, an
//! entire organization, and sets of repositories/organizations that
//! intentionally share one CLA document.
//!
//! The engine owns no persistence, HTTP routing, or document storage;
//! those live behind the [`boundary`] traits. Every entry point bottoms
//! out in the per-PR synchronizer ([`ClaEngine::validate_pull_request`]),
//! the only component that talks to the requirement evaluator and the
//! status/comment surfaces.

use std::sync::Arc;

pub mod boundary;
pub mod config;
pub mod error;
pub mod model;
pub mod resolver;

mod batch;
mod propagation;
mod signing;
mod sync;

pub use batch::{OrgBatchSummary, OrgValidation, RepoBatchSummary};
pub use config::ThrottleConfig;
pub use error::{BoundaryError, EngineError};
pub use propagation::PropagationSummary;
pub use signing::SignOutcome;
pub use sync::PrOutcome;

use boundary::{
    CheckService, CommentService, EntityService, SignatureService, StatusService, UserService,
    VcsService,
};

/// External collaborators the engine is wired against.
pub struct Boundaries {
    pub entities: Arc<dyn EntityService>,
    pub vcs: Arc<dyn VcsService>,
    pub checks: Arc<dyn CheckService>,
    pub signatures: Arc<dyn SignatureService>,
    pub status: Arc<dyn StatusService>,
    pub comments: Arc<dyn CommentService>,
    pub users: Arc<dyn UserService>,
}

/// The validation engine. Cheap to clone; clones share the collaborators
/// and carry the same throttle policy.
#[derive(Clone)]
pub struct ClaEngine {
    entities: Arc<dyn EntityService>,
    vcs: Arc<dyn VcsService>,
    checks: Arc<dyn CheckService>,
    signatures: Arc<dyn SignatureService>,
    status: Arc<dyn StatusService>,
    comments: Arc<dyn CommentService>,
    users: Arc<dyn UserService>,
    throttle: ThrottleConfig,
}

impl ClaEngine {
    /// Engine with the default (unthrottled) schedule.
    pub fn new(boundaries: Boundaries) -> Self {
        Self::with_throttle(boundaries, ThrottleConfig::default())
    }

    /// Engine with an explicit block/delay schedule for organization
    /// validation. Concurrent engines with different policies do not
    /// coordinate; each respects its own schedule.
    pub fn with_throttle(boundaries: Boundaries, throttle: ThrottleConfig) -> Self {
        Self {
            entities: boundaries.entities,
            vcs: boundaries.vcs,
            checks: boundaries.checks,
            signatures: boundaries.signatures,
            status: boundaries.status,
            comments: boundaries.comments,
            users: boundaries.users,
            throttle,
        }
    }

    pub fn throttle(&self) -> ThrottleConfig {
        self.throttle
    }

    pub(crate) fn entities(&self) -> &dyn EntityService {
        self.entities.as_ref()
    }

    pub(crate) fn vcs(&self) -> &dyn VcsService {
        self.vcs.as_ref()
    }

    pub(crate) fn checks(&self) -> &dyn CheckService {
        self.checks.as_ref()
    }

    pub(crate) fn signatures(&self) -> &dyn SignatureService {
        self.signatures.as_ref()
    }

    pub(crate) fn status(&self) -> &dyn StatusService {
        self.status.as_ref()
    }

    pub(crate) fn comments(&self) -> &dyn CommentService {
        self.comments.as_ref()
    }

    pub(crate) fn users(&self) -> &dyn UserService {
        self.users.as_ref()
    }

    /// Resolve the governing [`model::LinkedItem`] for a repository.
    ///
    /// Thin wrapper over [`resolver::resolve_linked_item`], exposed so
    /// API layers can answer "what governs this repo" directly.
    pub async fn linked_item(
        &self,
        repo: &str,
        owner: &str,
    ) -> Result<Option<model::LinkedItem>, EngineError> {
        resolver::resolve_linked_item(self.entities(), repo, owner).await
    }
}
