//! Signature recording and targeted status updates.
//!
//! A fresh signature must be reflected on the signer's open pull
//! requests. When the per-user cache knows which PRs those are, only
//! they are re-validated; otherwise the engine falls back to a full
//! repository pass, an organization pass, or — for shared documents —
//! propagation across every sharing entity, so a first-time signer's
//! signature lands everywhere the document applies.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::ClaEngine;
use crate::batch::{OrgBatchSummary, RepoBatchSummary};
use crate::boundary::SignatureClaim;
use crate::error::EngineError;
use crate::model::{LinkedItem, SignParams, Signature};
use crate::propagation::PropagationSummary;
use crate::resolver;

/// How a recorded signature was reflected on open pull requests.
#[derive(Debug)]
pub enum SignOutcome {
    /// Only the pull requests cached for the signer were re-validated.
    Targeted { pull_requests: usize },
    /// No cache: full pass over the governing repository.
    RepoBatch(RepoBatchSummary),
    /// No cache: full pass over the governing organization.
    OrgBatch(OrgBatchSummary),
    /// No cache, shared document: propagation across sharing entities.
    Propagated(PropagationSummary),
}

impl ClaEngine {
    /// Record a signature and update the signer's pull requests.
    ///
    /// Signature creation failures (typically duplicate signatures) are
    /// logged and surfaced verbatim; they are a legitimate terminal
    /// outcome, never retried.
    pub async fn sign(&self, params: SignParams) -> Result<SignOutcome, EngineError> {
        validate_scope(&params)?;
        // validate_scope guarantees an owner or org.
        let owner = params
            .scope_owner()
            .ok_or_else(|| EngineError::Validation("owner".to_string()))?
            .to_string();

        let claim = SignatureClaim {
            repo: params.repo.clone(),
            owner: owner.clone(),
            user: params.user.clone(),
            user_id: params.user_id,
            custom_fields: params.custom_fields.clone(),
        };
        if let Err(e) = self.signatures().sign(&claim).await {
            error!(user = %params.user, owner = %owner, "signature recording failed: {e}");
            return Err(EngineError::SignatureConflict(e.to_string()));
        }
        info!(user = %params.user, owner = %owner, "signature recorded");

        let item = match &params.repo {
            Some(repo) => resolver::resolve_linked_item(self.entities(), repo, &owner).await?,
            None => resolver::resolve_org_item(self.entities(), &owner).await?,
        };
        let Some(item) = item else {
            warn!(owner = %owner, "signed scope is no longer linked, nothing to update");
            return Ok(SignOutcome::Targeted { pull_requests: 0 });
        };

        if let Some(count) = self.update_cached_pull_requests(&params).await {
            return Ok(SignOutcome::Targeted {
                pull_requests: count,
            });
        }

        // No cached requests: fall back to a full pass over the scope
        // the document governs.
        if item.shared_document() {
            let summary = self.validate_shared_document_items(item.document()).await?;
            return Ok(SignOutcome::Propagated(summary));
        }
        match &item {
            LinkedItem::Org(org) => {
                let validation = self.validate_org_pull_requests(&org.org).await?;
                Ok(SignOutcome::OrgBatch(validation.wait().await))
            }
            LinkedItem::Repo(repo) => {
                let summary = self
                    .validate_pull_requests(&repo.repo, &repo.owner, None)
                    .await?;
                Ok(SignOutcome::RepoBatch(summary))
            }
        }
    }

    /// Consume the signer's cached pull request groups.
    ///
    /// Returns `None` when no cache exists (caller falls back to a full
    /// pass). Groups whose (repo, owner) no longer resolves are pruned
    /// without a synchronizer call; consumed groups are removed and the
    /// pruned record persisted.
    async fn update_cached_pull_requests(&self, params: &SignParams) -> Option<usize> {
        let mut record = match self.users().find_user(params.user_id).await {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                warn!(user = %params.user, "user cache lookup failed: {e}");
                return None;
            }
        };
        if record.requests.is_empty() {
            return None;
        }

        let mut synced = 0;
        let mut remaining = Vec::new();
        let groups = std::mem::take(&mut record.requests);
        for group in groups {
            let item =
                match resolver::resolve_linked_item(self.entities(), &group.repo, &group.owner)
                    .await
                {
                    Ok(Some(item)) => item,
                    Ok(None) => {
                        debug!(
                            repo = %group.repo,
                            owner = %group.owner,
                            "cached request group no longer linked, pruning"
                        );
                        continue;
                    }
                    Err(e) => {
                        // Transient lookup failure: keep the group for a
                        // later sign rather than dropping updates.
                        warn!(repo = %group.repo, "cached group resolution failed: {e}");
                        remaining.push(group);
                        continue;
                    }
                };
            for &number in &group.numbers {
                match self
                    .validate_pull_request_number(&item, &group.repo, &group.owner, number)
                    .await
                {
                    Ok(_) => synced += 1,
                    Err(e) => {
                        warn!(repo = %group.repo, number, "targeted update failed: {e}");
                    }
                }
            }
        }

        record.requests = remaining;
        if let Err(e) = self.users().save_user(&record).await {
            warn!(user = %record.login, "user cache write-back failed: {e}");
        }
        Some(synced)
    }

    /// Bulk signature import: sign the CLA for a list of usernames on
    /// behalf of an administrator. Unknown users are skipped with a
    /// warning; duplicate rejections are logged, not fatal. No status
    /// fan-out happens here — callers follow up with a batch validation.
    pub async fn import_signatures(
        &self,
        repo: Option<&str>,
        owner: &str,
        usernames: &[String],
        admin_token: &str,
    ) -> Result<usize, EngineError> {
        if usernames.is_empty() {
            return Ok(0);
        }
        if owner.is_empty() {
            return Err(EngineError::Validation("owner".to_string()));
        }

        let mut imported = 0;
        for username in usernames {
            let user = match self.vcs().get_user(username, admin_token).await {
                Ok(user) => user,
                Err(e) => {
                    warn!(username = %username, "user lookup failed, skipping import: {e}");
                    continue;
                }
            };
            let claim = SignatureClaim {
                repo: repo.map(str::to_string),
                owner: owner.to_string(),
                user: user.login,
                user_id: user.id,
                custom_fields: None,
            };
            match self.signatures().sign(&claim).await {
                Ok(()) => imported += 1,
                Err(e) => warn!(username = %username, "signature import rejected: {e}"),
            }
        }
        info!(owner, imported, total = usernames.len(), "signature import finished");
        Ok(imported)
    }

    /// Whether `user` currently satisfies the CLA obligation for the
    /// governing item. `false` when nothing is linked or the item
    /// carries a null document.
    pub async fn has_signature(
        &self,
        params: &SignParams,
    ) -> Result<bool, EngineError> {
        validate_scope(params)?;
        let Some(item) = self.resolve_scope(params).await? else {
            return Ok(false);
        };
        if item.document().is_none() {
            return Ok(false);
        }
        self.signatures()
            .has_signature(&item, &params.user)
            .await
            .map_err(|e| EngineError::UpstreamLookup(e.to_string()))
    }

    /// Most recent signature of `user` under the governing item.
    pub async fn last_signature(
        &self,
        params: &SignParams,
    ) -> Result<Option<Signature>, EngineError> {
        validate_scope(params)?;
        let Some(item) = self.resolve_scope(params).await? else {
            return Err(EngineError::UpstreamLookup(
                "no linked repository or organization".to_string(),
            ));
        };
        self.signatures()
            .last_signature(&item, &params.user)
            .await
            .map_err(|e| EngineError::UpstreamLookup(e.to_string()))
    }

    /// Count signatures recorded against the governing item's current
    /// document. A null document is a validation error here: there is
    /// nothing to count signatures against.
    pub async fn count_signatures(&self, repo: &str, owner: &str) -> Result<usize, EngineError> {
        let item = resolver::resolve_linked_item(self.entities(), repo, owner).await?;
        let Some(item) = item else {
            return Err(EngineError::UpstreamLookup(
                "no linked repository or organization".to_string(),
            ));
        };
        if item.document().is_none() {
            return Err(EngineError::Validation(
                "no CLA document linked".to_string(),
            ));
        }
        let signatures = self
            .signatures()
            .list(&item)
            .await
            .map_err(|e| EngineError::UpstreamLookup(e.to_string()))?;
        Ok(signatures.len())
    }

    /// Terminate `user`'s signature as of `end_date`. Failures are
    /// logged and surfaced verbatim.
    pub async fn terminate_signature(
        &self,
        params: &SignParams,
        end_date: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        validate_scope(params)?;
        let Some(item) = self.resolve_scope(params).await? else {
            return Err(EngineError::UpstreamLookup(
                "no linked repository or organization".to_string(),
            ));
        };
        self.signatures()
            .terminate(&item, &params.user, end_date)
            .await
            .map_err(|e| {
                error!(user = %params.user, "signature termination failed: {e}");
                EngineError::UpstreamLookup(e.to_string())
            })
    }

    async fn resolve_scope(
        &self,
        params: &SignParams,
    ) -> Result<Option<LinkedItem>, EngineError> {
        match (&params.repo, params.scope_owner()) {
            (Some(repo), Some(owner)) => {
                resolver::resolve_linked_item(self.entities(), repo, owner).await
            }
            (None, Some(org)) => resolver::resolve_org_item(self.entities(), org).await,
            (_, None) => Ok(None),
        }
    }
}

/// A signature must identify its scope: repo + owner, or an org.
fn validate_scope(params: &SignParams) -> Result<(), EngineError> {
    let repo_scope = params.repo.is_some() && params.owner.is_some();
    if repo_scope || params.org.is_some() {
        Ok(())
    } else {
        Err(EngineError::Validation(
            "repo/owner or org is required".to_string(),
        ))
    }
}
