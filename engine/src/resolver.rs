//! Linked-item resolution: which entity governs a repository or
//! organization at validation time.
//!
//! Resolution is repeatable and side-effect-free — every other component
//! calls it independently, with no shared transaction.

use crate::boundary::EntityService;
use crate::error::EngineError;
use crate::model::LinkedItem;

/// Resolve the entity governing `owner/repo`.
///
/// The repository's own record wins when it carries a document reference;
/// a record that is absent or linked with a null document falls back to
/// the owning organization. `Ok(None)` means nothing governs the
/// repository — a valid terminal state for the synchronizer, not an error.
pub async fn resolve_linked_item(
    entities: &dyn EntityService,
    repo: &str,
    owner: &str,
) -> Result<Option<LinkedItem>, EngineError> {
    let repo_record = entities
        .resolve_repo(repo, owner)
        .await
        .map_err(|e| EngineError::UpstreamLookup(e.to_string()))?;

    if let Some(record) = repo_record {
        if record.document.is_some() {
            return Ok(Some(LinkedItem::Repo(record)));
        }
        // Null document on the repo record: the org link, if any, governs.
        if let Some(org) = entities
            .resolve_org(owner)
            .await
            .map_err(|e| EngineError::UpstreamLookup(e.to_string()))?
        {
            return Ok(Some(LinkedItem::Org(org)));
        }
        return Ok(Some(LinkedItem::Repo(record)));
    }

    let org = entities
        .resolve_org(owner)
        .await
        .map_err(|e| EngineError::UpstreamLookup(e.to_string()))?;
    Ok(org.map(LinkedItem::Org))
}

/// Resolve an organization record directly.
pub async fn resolve_org_item(
    entities: &dyn EntityService,
    org: &str,
) -> Result<Option<LinkedItem>, EngineError> {
    let record = entities
        .resolve_org(org)
        .await
        .map_err(|e| EngineError::UpstreamLookup(e.to_string()))?;
    Ok(record.map(LinkedItem::Org))
}
