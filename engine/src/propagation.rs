//! Shared-document propagation.
//!
//! One CLA document may govern many otherwise-unrelated repositories and
//! organizations. The relationship is a graph kept in the entity store
//! and answered by explicit lookup queries, so a re-sign or document
//! update ripples everywhere without bidirectional links in each record.

use futures::future::join_all;
use tracing::error;

use crate::ClaEngine;
use crate::batch::OrgBatchSummary;
use crate::error::EngineError;
use crate::model::DocumentRef;

/// Tally of one propagation pass across the sharing entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationSummary {
    pub repos_validated: usize,
    pub repos_failed: usize,
    pub orgs: OrgBatchSummary,
    pub orgs_accepted: usize,
    pub orgs_failed: usize,
}

impl ClaEngine {
    /// Re-validate every repository and organization sharing `document`.
    ///
    /// Requires a non-empty document reference and fails fast with a
    /// validation error before touching the network otherwise. The two
    /// sharing queries are independent: a failure in one is logged and
    /// that half skipped while the other half still proceeds.
    pub async fn validate_shared_document_items(
        &self,
        document: Option<&DocumentRef>,
    ) -> Result<PropagationSummary, EngineError> {
        let document = document.ok_or_else(|| {
            EngineError::Validation("shared document validation requires a document".to_string())
        })?;
        if document.url.is_empty() {
            return Err(EngineError::Validation(
                "shared document validation requires a document".to_string(),
            ));
        }

        let mut summary = PropagationSummary::default();

        match self.entities().find_repos_sharing_document(document).await {
            Ok(repos) => {
                let results = join_all(
                    repos
                        .iter()
                        .map(|r| self.validate_pull_requests(&r.repo, &r.owner, None)),
                )
                .await;
                for result in &results {
                    match result {
                        Ok(_) => summary.repos_validated += 1,
                        Err(e) => {
                            error!("shared-document repository validation failed: {e}");
                            summary.repos_failed += 1;
                        }
                    }
                }
            }
            Err(e) => {
                error!(document = %document.url, "shared-document repository query failed: {e}");
            }
        }

        match self.entities().find_orgs_sharing_document(document).await {
            Ok(orgs) => {
                for org in &orgs {
                    match self.validate_org_pull_requests(&org.org).await {
                        Ok(validation) => {
                            summary.orgs_accepted += 1;
                            let finished = validation.wait().await;
                            summary.orgs.repos_validated += finished.repos_validated;
                            summary.orgs.repos_failed += finished.repos_failed;
                            summary.orgs.pull_requests.attempted +=
                                finished.pull_requests.attempted;
                            summary.orgs.pull_requests.updated += finished.pull_requests.updated;
                            summary.orgs.pull_requests.not_required +=
                                finished.pull_requests.not_required;
                            summary.orgs.pull_requests.null_cla += finished.pull_requests.null_cla;
                            summary.orgs.pull_requests.check_failures +=
                                finished.pull_requests.check_failures;
                        }
                        Err(e) => {
                            error!(org = %org.org, "shared-document organization validation failed: {e}");
                            summary.orgs_failed += 1;
                        }
                    }
                }
            }
            Err(e) => {
                error!(document = %document.url, "shared-document organization query failed: {e}");
            }
        }

        Ok(summary)
    }
}
