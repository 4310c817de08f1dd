//! Per-PR status synchronizer.
//!
//! One pull request in, one of four terminal presentations out:
//!
//! 1. no document linked — neutral status, comment deleted
//! 2. CLA not required — pass status, comment deleted
//! 3. required and evaluated — pass/fail status, comment edited in place
//! 4. check boundary failed — status update skipped, siblings unaffected
//!
//! The status update and the comment edit are independent: a failure in
//! one is logged and never blocks the other, so a single malfunctioning
//! pull request cannot stall a batch. Re-running with identical inputs
//! converges to the same externally visible state; comments are edited,
//! never appended.

use tracing::{debug, error, warn};

use crate::ClaEngine;
use crate::boundary::{CommentUpdate, StatusUpdate};
use crate::error::EngineError;
use crate::model::{LinkedItem, PullRequestRef};
use crate::resolver;

/// Terminal presentation reached for one pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrOutcome {
    /// Nothing governs the repository, or it is linked with a null CLA.
    NoLinkedDocument,
    /// The requirement evaluator decided no signature is needed.
    NotRequired,
    /// The check ran and the commit status was pushed.
    Updated { signed: bool },
    /// The check boundary failed; this PR's status update was skipped.
    CheckFailed,
}

impl ClaEngine {
    /// Validate one pull request: resolve the governing item, evaluate
    /// the CLA requirement, and push status + comment.
    pub async fn validate_pull_request(
        &self,
        pr: &PullRequestRef,
    ) -> Result<PrOutcome, EngineError> {
        let item = resolver::resolve_linked_item(self.entities(), &pr.repo, &pr.owner).await?;
        Ok(self.sync_pull_request(item.as_ref(), pr).await)
    }

    /// Validate one pull request identified by number only, fetching a
    /// fresh head sha first. Used by targeted updates after a signature.
    pub async fn validate_pull_request_number(
        &self,
        item: &LinkedItem,
        repo: &str,
        owner: &str,
        number: u64,
    ) -> Result<PrOutcome, EngineError> {
        let pr = self
            .vcs()
            .get_pull_request(repo, owner, number, Some(item.token()))
            .await
            .map_err(|e| EngineError::UpstreamLookup(e.to_string()))?;
        Ok(self.sync_pull_request(Some(item), &pr).await)
    }

    /// Core synchronizer. The resolved item is passed in so batch passes
    /// resolve once per repository, not once per pull request.
    pub(crate) async fn sync_pull_request(
        &self,
        item: Option<&LinkedItem>,
        pr: &PullRequestRef,
    ) -> PrOutcome {
        let token = item.map(|i| i.token().to_string());

        let document = item.and_then(LinkedItem::document);
        if document.is_none() {
            debug!(
                repo = %pr.repo,
                owner = %pr.owner,
                number = pr.number,
                "no CLA document linked, clearing status"
            );
            self.push_neutral_status(pr, token, true).await;
            return PrOutcome::NoLinkedDocument;
        }
        // Safe: the null-document branch returned above.
        let Some(item) = item else {
            return PrOutcome::NoLinkedDocument;
        };

        let required = match self.checks().is_cla_required(item, pr).await {
            Ok(required) => required,
            Err(e) => {
                // Fail safe toward requiring a signature.
                warn!(
                    number = pr.number,
                    "CLA requirement evaluation failed, assuming required: {e}"
                );
                true
            }
        };
        if !required {
            self.push_neutral_status(pr, token, false).await;
            return PrOutcome::NotRequired;
        }

        let outcome = match self.checks().check(item, pr).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    repo = %pr.repo,
                    owner = %pr.owner,
                    number = pr.number,
                    "document check failed, skipping status update: {e}"
                );
                return PrOutcome::CheckFailed;
            }
        };

        let update = StatusUpdate {
            repo: pr.repo.clone(),
            owner: pr.owner.clone(),
            number: pr.number,
            sha: pr.head_sha.clone(),
            signed: outcome.signed,
            token: token.clone(),
        };
        if let Err(e) = self.status().update(&update).await {
            error!(number = pr.number, "commit status update failed: {e}");
        }

        if let Some(user_map) = outcome.user_map {
            let comment = CommentUpdate {
                repo: pr.repo.clone(),
                owner: pr.owner.clone(),
                number: pr.number,
                signed: outcome.signed,
                user_map,
                token,
            };
            if let Err(e) = self.comments().edit_comment(&comment).await {
                error!(number = pr.number, "status comment edit failed: {e}");
            }
        }

        PrOutcome::Updated {
            signed: outcome.signed,
        }
    }

    /// Shared tail of the two no-check branches: delete any status
    /// comment and set the corresponding neutral status. Both calls are
    /// independent and merely logged on failure.
    async fn push_neutral_status(
        &self,
        pr: &PullRequestRef,
        token: Option<String>,
        null_cla: bool,
    ) {
        if let Err(e) = self
            .comments()
            .delete_comment(&pr.repo, &pr.owner, pr.number)
            .await
        {
            warn!(number = pr.number, "status comment delete failed: {e}");
        }

        let update = StatusUpdate {
            repo: pr.repo.clone(),
            owner: pr.owner.clone(),
            number: pr.number,
            sha: pr.head_sha.clone(),
            signed: true,
            token,
        };
        let result = if null_cla {
            self.status().update_for_null_cla(&update).await
        } else {
            self.status().update_for_cla_not_required(&update).await
        };
        if let Err(e) = result {
            error!(number = pr.number, "neutral status update failed: {e}");
        }
    }
}
