//! Repository and organization batch validators.
//!
//! A repository pass re-validates every open pull request of one repo;
//! an organization pass enumerates the org's repositories, filters
//! excluded and overridden ones, and drives repository passes in
//! fixed-size blocks with an optional inter-block delay. The delay is
//! the sole backpressure mechanism against the provider's rate limit;
//! block k+1 never starts before block k's dispatch completes and the
//! delay elapses. There is no cancellation: already-dispatched blocks
//! cannot be rolled back.

use std::collections::HashSet;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::ClaEngine;
use crate::error::EngineError;
use crate::model::{LinkedItem, OrgRecord};
use crate::resolver;
use crate::sync::PrOutcome;

/// Tally of one repository pass. Every open pull request is attempted;
/// single-PR failures are counted, never propagated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepoBatchSummary {
    pub attempted: usize,
    pub updated: usize,
    pub not_required: usize,
    pub null_cla: usize,
    pub check_failures: usize,
}

impl RepoBatchSummary {
    fn record(&mut self, outcome: PrOutcome) {
        self.attempted += 1;
        match outcome {
            PrOutcome::Updated { .. } => self.updated += 1,
            PrOutcome::NotRequired => self.not_required += 1,
            PrOutcome::NoLinkedDocument => self.null_cla += 1,
            PrOutcome::CheckFailed => self.check_failures += 1,
        }
    }
}

/// Aggregate tally of one organization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrgBatchSummary {
    pub repos_validated: usize,
    pub repos_failed: usize,
    pub pull_requests: RepoBatchSummary,
}

impl OrgBatchSummary {
    fn absorb(&mut self, result: &Result<RepoBatchSummary, EngineError>) {
        match result {
            Ok(summary) => {
                self.repos_validated += 1;
                self.pull_requests.attempted += summary.attempted;
                self.pull_requests.updated += summary.updated;
                self.pull_requests.not_required += summary.not_required;
                self.pull_requests.null_cla += summary.null_cla;
                self.pull_requests.check_failures += summary.check_failures;
            }
            Err(_) => self.repos_failed += 1,
        }
    }
}

/// Accepted organization validation. The batch has been queued; PR-level
/// updates continue in the background. Call [`OrgValidation::wait`] for a
/// genuine completion signal instead of polling.
#[derive(Debug)]
pub struct OrgValidation {
    pub org: String,
    /// Repositories scheduled after exclusion/override filtering.
    pub scheduled_repos: usize,
    handle: JoinHandle<OrgBatchSummary>,
}

impl OrgValidation {
    /// Wait for the last block to finish and return the aggregate tally.
    pub async fn wait(self) -> OrgBatchSummary {
        match self.handle.await {
            Ok(summary) => summary,
            Err(e) => {
                error!(org = %self.org, "organization validation task failed: {e}");
                OrgBatchSummary::default()
            }
        }
    }
}

impl ClaEngine {
    /// Re-validate all open pull requests of one repository.
    ///
    /// The governing item is resolved once and passed down; the per-PR
    /// requirement test runs once per pull request against that item.
    /// Completion is reported only after every pull request has been
    /// attempted. `token_override` substitutes for the item's token when
    /// the caller validates on behalf of a user.
    pub async fn validate_pull_requests(
        &self,
        repo: &str,
        owner: &str,
        token_override: Option<&str>,
    ) -> Result<RepoBatchSummary, EngineError> {
        let item = resolver::resolve_linked_item(self.entities(), repo, owner).await?;
        let token = token_override
            .map(str::to_string)
            .or_else(|| item.as_ref().map(|i| i.token().to_string()));

        let prs = self
            .vcs()
            .list_open_pull_requests(repo, owner, token.as_deref())
            .await
            .map_err(|e| EngineError::UpstreamLookup(e.to_string()))?;

        let outcomes = join_all(
            prs.iter()
                .map(|pr| self.sync_pull_request(item.as_ref(), pr)),
        )
        .await;

        let mut summary = RepoBatchSummary::default();
        for outcome in outcomes {
            summary.record(outcome);
        }
        info!(
            repo,
            owner,
            attempted = summary.attempted,
            updated = summary.updated,
            "repository validation pass finished"
        );
        Ok(summary)
    }

    /// Re-validate all open pull requests across one organization.
    ///
    /// Enumerates the organization's repositories, skips those excluded
    /// by the org record and those overriding the org document with
    /// their own (the latter are validated only via their repository
    /// path), then drives repository passes in blocks under the engine's
    /// [`crate::ThrottleConfig`]. Returns as soon as the batch is
    /// accepted; enumeration failures surface immediately with zero
    /// repository validations performed.
    pub async fn validate_org_pull_requests(
        &self,
        org: &str,
    ) -> Result<OrgValidation, EngineError> {
        let Some(LinkedItem::Org(record)) =
            resolver::resolve_org_item(self.entities(), org).await?
        else {
            return Err(EngineError::UpstreamLookup(format!(
                "organization {org} is not linked"
            )));
        };

        let names = self
            .vcs()
            .list_repositories(org, &record.token)
            .await
            .map_err(|e| EngineError::UpstreamLookup(e.to_string()))?;

        // Linked repo records with their own document override the org
        // document and are skipped here.
        let overridden: HashSet<String> = self
            .entities()
            .list_repos_by_owner(org)
            .await
            .map_err(|e| EngineError::UpstreamLookup(e.to_string()))?
            .into_iter()
            .filter(|r| r.document.is_some())
            .map(|r| r.repo)
            .collect();

        let scheduled: Vec<String> = names
            .into_iter()
            .filter(|name| {
                if record.is_repo_excluded(name) {
                    return false;
                }
                !overridden.contains(name)
            })
            .collect();

        info!(
            org,
            scheduled = scheduled.len(),
            "organization validation accepted"
        );

        let engine = self.clone();
        let org_name = record.org.clone();
        let scheduled_repos = scheduled.len();
        let handle = tokio::spawn(async move {
            engine.run_org_blocks(&record, scheduled).await
        });

        Ok(OrgValidation {
            org: org_name,
            scheduled_repos,
            handle,
        })
    }

    /// Drive repository passes block by block. Within a block the passes
    /// run concurrently; between blocks the configured delay elapses.
    async fn run_org_blocks(&self, record: &OrgRecord, repos: Vec<String>) -> OrgBatchSummary {
        let throttle = self.throttle();
        let mut summary = OrgBatchSummary::default();
        let block_count = repos.len().div_ceil(throttle.block_size);

        for (index, block) in repos.chunks(throttle.block_size).enumerate() {
            let results = join_all(
                block
                    .iter()
                    .map(|repo| self.validate_pull_requests(repo, &record.org, None)),
            )
            .await;
            for (repo, result) in block.iter().zip(&results) {
                if let Err(e) = result {
                    warn!(org = %record.org, repo = %repo, "repository validation failed: {e}");
                }
                summary.absorb(result);
            }

            let last = index + 1 == block_count;
            if !last && !throttle.time_to_wait.is_zero() {
                tokio::time::sleep(throttle.time_to_wait).await;
            }
        }

        info!(
            org = %record.org,
            repos_validated = summary.repos_validated,
            repos_failed = summary.repos_failed,
            "organization validation finished"
        );
        summary
    }
}
