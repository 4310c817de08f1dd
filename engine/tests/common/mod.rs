//! Shared test doubles: recording implementations of every engine
//! boundary, plus a harness that wires them into a [`ClaEngine`].
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cla_engine::boundary::{
    CheckService, CommentService, CommentUpdate, EntityService, SignatureClaim, SignatureService,
    StatusService, StatusUpdate, UserService, VcsService, VcsUser,
};
use cla_engine::model::{
    CheckOutcome, DocumentRef, LinkedItem, OrgRecord, PullRequestRef, RepoRecord, Signature,
    UserMap, UserRecord,
};
use cla_engine::{Boundaries, BoundaryError, ClaEngine, ThrottleConfig};

pub const TEST_DOCUMENT: &str = "https://gist.github.com/aa5a315d61ae9438b18d";

pub fn hello_world_repo() -> RepoRecord {
    RepoRecord {
        repo_id: 1296269,
        repo: "Hello-World".to_string(),
        owner: "octocat".to_string(),
        token: "testToken".to_string(),
        document: Some(DocumentRef::new(TEST_DOCUMENT)),
        shared_document: false,
    }
}

pub fn octocat_org() -> OrgRecord {
    OrgRecord {
        org_id: 1,
        org: "octocat".to_string(),
        token: "orgToken".to_string(),
        document: Some(DocumentRef::new(TEST_DOCUMENT)),
        shared_document: false,
        excluded_repos: vec![],
    }
}

#[derive(Default)]
pub struct MockEntities {
    pub repos: Mutex<HashMap<(String, String), RepoRecord>>,
    pub orgs: Mutex<HashMap<String, OrgRecord>>,
    pub shared_repos: Mutex<Vec<RepoRecord>>,
    pub shared_orgs: Mutex<Vec<OrgRecord>>,
    pub fail_shared_repos: Mutex<bool>,
    pub fail_shared_orgs: Mutex<bool>,
    pub fail_by_owner: Mutex<bool>,
}

#[async_trait]
impl EntityService for MockEntities {
    async fn resolve_repo(
        &self,
        repo: &str,
        owner: &str,
    ) -> Result<Option<RepoRecord>, BoundaryError> {
        let key = (owner.to_string(), repo.to_string());
        Ok(self.repos.lock().unwrap().get(&key).cloned())
    }

    async fn resolve_org(&self, org: &str) -> Result<Option<OrgRecord>, BoundaryError> {
        Ok(self.orgs.lock().unwrap().get(org).cloned())
    }

    async fn list_repos_by_owner(&self, owner: &str) -> Result<Vec<RepoRecord>, BoundaryError> {
        if *self.fail_by_owner.lock().unwrap() {
            return Err(BoundaryError::new("any error of querying repo collection"));
        }
        Ok(self
            .repos
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect())
    }

    async fn find_repos_sharing_document(
        &self,
        _document: &DocumentRef,
    ) -> Result<Vec<RepoRecord>, BoundaryError> {
        if *self.fail_shared_repos.lock().unwrap() {
            return Err(BoundaryError::new("get shared gist repo failed"));
        }
        Ok(self.shared_repos.lock().unwrap().clone())
    }

    async fn find_orgs_sharing_document(
        &self,
        _document: &DocumentRef,
    ) -> Result<Vec<OrgRecord>, BoundaryError> {
        if *self.fail_shared_orgs.lock().unwrap() {
            return Err(BoundaryError::new("get shared gist org failed"));
        }
        Ok(self.shared_orgs.lock().unwrap().clone())
    }
}

pub struct MockVcs {
    /// Open pull requests per (owner, repo); repos without an entry get
    /// `default_numbers` materialized with generated shas.
    pub open_prs: Mutex<HashMap<(String, String), Vec<PullRequestRef>>>,
    pub default_numbers: Mutex<Vec<u64>>,
    pub org_repos: Mutex<HashMap<String, Vec<String>>>,
    pub known_users: Mutex<HashMap<String, VcsUser>>,
    pub fail_list_repositories: Mutex<bool>,
    pub list_open_calls: Mutex<Vec<(String, String)>>,
    pub get_pr_calls: Mutex<Vec<(String, String, u64)>>,
}

impl Default for MockVcs {
    fn default() -> Self {
        Self {
            open_prs: Mutex::new(HashMap::new()),
            default_numbers: Mutex::new(vec![1, 2]),
            org_repos: Mutex::new(HashMap::new()),
            known_users: Mutex::new(HashMap::new()),
            fail_list_repositories: Mutex::new(false),
            list_open_calls: Mutex::new(Vec::new()),
            get_pr_calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockVcs {
    fn materialize(&self, repo: &str, owner: &str) -> Vec<PullRequestRef> {
        let key = (owner.to_string(), repo.to_string());
        if let Some(prs) = self.open_prs.lock().unwrap().get(&key) {
            return prs.clone();
        }
        self.default_numbers
            .lock()
            .unwrap()
            .iter()
            .map(|&number| PullRequestRef {
                repo: repo.to_string(),
                owner: owner.to_string(),
                number,
                head_sha: format!("sha{number}"),
            })
            .collect()
    }
}

#[async_trait]
impl VcsService for MockVcs {
    async fn list_open_pull_requests(
        &self,
        repo: &str,
        owner: &str,
        _token: Option<&str>,
    ) -> Result<Vec<PullRequestRef>, BoundaryError> {
        self.list_open_calls
            .lock()
            .unwrap()
            .push((owner.to_string(), repo.to_string()));
        Ok(self.materialize(repo, owner))
    }

    async fn get_pull_request(
        &self,
        repo: &str,
        owner: &str,
        number: u64,
        _token: Option<&str>,
    ) -> Result<PullRequestRef, BoundaryError> {
        self.get_pr_calls
            .lock()
            .unwrap()
            .push((owner.to_string(), repo.to_string(), number));
        self.materialize(repo, owner)
            .into_iter()
            .find(|pr| pr.number == number)
            .ok_or_else(|| BoundaryError::new(format!("no such pull request #{number}")))
    }

    async fn list_repositories(&self, org: &str, _token: &str) -> Result<Vec<String>, BoundaryError> {
        if *self.fail_list_repositories.lock().unwrap() {
            return Err(BoundaryError::new("repository enumeration failed"));
        }
        Ok(self
            .org_repos
            .lock()
            .unwrap()
            .get(org)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_user(&self, username: &str, _token: &str) -> Result<VcsUser, BoundaryError> {
        self.known_users
            .lock()
            .unwrap()
            .get(username)
            .cloned()
            .ok_or_else(|| BoundaryError::new("not found"))
    }
}

pub struct MockChecks {
    pub required: Mutex<bool>,
    pub fail_required: Mutex<bool>,
    pub outcome: Mutex<CheckOutcome>,
    pub fail_check: Mutex<bool>,
    pub check_calls: Mutex<Vec<(String, u64)>>,
    pub required_calls: Mutex<usize>,
}

impl Default for MockChecks {
    fn default() -> Self {
        Self {
            required: Mutex::new(true),
            fail_required: Mutex::new(false),
            outcome: Mutex::new(CheckOutcome {
                signed: true,
                user_map: None,
            }),
            fail_check: Mutex::new(false),
            check_calls: Mutex::new(Vec::new()),
            required_calls: Mutex::new(0),
        }
    }
}

impl MockChecks {
    pub fn set_outcome(&self, signed: bool, user_map: Option<UserMap>) {
        *self.outcome.lock().unwrap() = CheckOutcome { signed, user_map };
    }

    pub fn check_count(&self) -> usize {
        self.check_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CheckService for MockChecks {
    async fn check(
        &self,
        _item: &LinkedItem,
        pr: &PullRequestRef,
    ) -> Result<CheckOutcome, BoundaryError> {
        if *self.fail_check.lock().unwrap() {
            return Err(BoundaryError::new("check boundary down"));
        }
        self.check_calls
            .lock()
            .unwrap()
            .push((pr.repo.clone(), pr.number));
        Ok(self.outcome.lock().unwrap().clone())
    }

    async fn is_cla_required(
        &self,
        _item: &LinkedItem,
        _pr: &PullRequestRef,
    ) -> Result<bool, BoundaryError> {
        *self.required_calls.lock().unwrap() += 1;
        if *self.fail_required.lock().unwrap() {
            return Err(BoundaryError::new("requirement evaluator down"));
        }
        Ok(*self.required.lock().unwrap())
    }
}

#[derive(Default)]
pub struct MockSignatures {
    pub sign_error: Mutex<Option<String>>,
    pub claims: Mutex<Vec<SignatureClaim>>,
    pub has: Mutex<bool>,
    pub last: Mutex<Option<Signature>>,
    pub listed: Mutex<Vec<Signature>>,
    pub terminate_error: Mutex<Option<String>>,
    pub terminated: Mutex<Vec<(String, DateTime<Utc>)>>,
}

#[async_trait]
impl SignatureService for MockSignatures {
    async fn sign(&self, claim: &SignatureClaim) -> Result<(), BoundaryError> {
        if let Some(msg) = self.sign_error.lock().unwrap().clone() {
            return Err(BoundaryError::new(msg));
        }
        self.claims.lock().unwrap().push(claim.clone());
        Ok(())
    }

    async fn has_signature(
        &self,
        _item: &LinkedItem,
        _user: &str,
    ) -> Result<bool, BoundaryError> {
        Ok(*self.has.lock().unwrap())
    }

    async fn last_signature(
        &self,
        _item: &LinkedItem,
        _user: &str,
    ) -> Result<Option<Signature>, BoundaryError> {
        Ok(self.last.lock().unwrap().clone())
    }

    async fn list(&self, _item: &LinkedItem) -> Result<Vec<Signature>, BoundaryError> {
        Ok(self.listed.lock().unwrap().clone())
    }

    async fn terminate(
        &self,
        _item: &LinkedItem,
        user: &str,
        end_date: DateTime<Utc>,
    ) -> Result<(), BoundaryError> {
        if let Some(msg) = self.terminate_error.lock().unwrap().clone() {
            return Err(BoundaryError::new(msg));
        }
        self.terminated
            .lock()
            .unwrap()
            .push((user.to_string(), end_date));
        Ok(())
    }
}

#[derive(Default)]
pub struct MockStatus {
    pub updates: Mutex<Vec<StatusUpdate>>,
    pub null_cla: Mutex<Vec<StatusUpdate>>,
    pub not_required: Mutex<Vec<StatusUpdate>>,
    pub fail_update: Mutex<bool>,
}

impl MockStatus {
    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }
}

#[async_trait]
impl StatusService for MockStatus {
    async fn update(&self, update: &StatusUpdate) -> Result<(), BoundaryError> {
        if *self.fail_update.lock().unwrap() {
            return Err(BoundaryError::new("status API unavailable"));
        }
        self.updates.lock().unwrap().push(update.clone());
        Ok(())
    }

    async fn update_for_null_cla(&self, update: &StatusUpdate) -> Result<(), BoundaryError> {
        self.null_cla.lock().unwrap().push(update.clone());
        Ok(())
    }

    async fn update_for_cla_not_required(
        &self,
        update: &StatusUpdate,
    ) -> Result<(), BoundaryError> {
        self.not_required.lock().unwrap().push(update.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MockComments {
    pub edits: Mutex<Vec<CommentUpdate>>,
    pub deletes: Mutex<Vec<(String, String, u64)>>,
    pub fail_edit: Mutex<bool>,
}

#[async_trait]
impl CommentService for MockComments {
    async fn edit_comment(&self, update: &CommentUpdate) -> Result<(), BoundaryError> {
        if *self.fail_edit.lock().unwrap() {
            return Err(BoundaryError::new("comment API unavailable"));
        }
        self.edits.lock().unwrap().push(update.clone());
        Ok(())
    }

    async fn delete_comment(
        &self,
        repo: &str,
        owner: &str,
        number: u64,
    ) -> Result<(), BoundaryError> {
        self.deletes
            .lock()
            .unwrap()
            .push((owner.to_string(), repo.to_string(), number));
        Ok(())
    }
}

#[derive(Default)]
pub struct MockUsers {
    pub record: Mutex<Option<UserRecord>>,
    pub saved: Mutex<Vec<UserRecord>>,
}

#[async_trait]
impl UserService for MockUsers {
    async fn find_user(&self, _user_id: i64) -> Result<Option<UserRecord>, BoundaryError> {
        Ok(self.record.lock().unwrap().clone())
    }

    async fn save_user(&self, user: &UserRecord) -> Result<(), BoundaryError> {
        self.saved.lock().unwrap().push(user.clone());
        Ok(())
    }
}

/// Wires the mocks into an engine and keeps handles for assertions.
pub struct Harness {
    pub entities: Arc<MockEntities>,
    pub vcs: Arc<MockVcs>,
    pub checks: Arc<MockChecks>,
    pub signatures: Arc<MockSignatures>,
    pub status: Arc<MockStatus>,
    pub comments: Arc<MockComments>,
    pub users: Arc<MockUsers>,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        Self {
            entities: Arc::new(MockEntities::default()),
            vcs: Arc::new(MockVcs::default()),
            checks: Arc::new(MockChecks::default()),
            signatures: Arc::new(MockSignatures::default()),
            status: Arc::new(MockStatus::default()),
            comments: Arc::new(MockComments::default()),
            users: Arc::new(MockUsers::default()),
        }
    }

    pub fn engine(&self) -> ClaEngine {
        ClaEngine::new(self.boundaries())
    }

    pub fn engine_with(&self, throttle: ThrottleConfig) -> ClaEngine {
        ClaEngine::with_throttle(self.boundaries(), throttle)
    }

    fn boundaries(&self) -> Boundaries {
        Boundaries {
            entities: self.entities.clone(),
            vcs: self.vcs.clone(),
            checks: self.checks.clone(),
            signatures: self.signatures.clone(),
            status: self.status.clone(),
            comments: self.comments.clone(),
            users: self.users.clone(),
        }
    }

    pub fn link_repo(&self, record: RepoRecord) {
        self.entities
            .repos
            .lock()
            .unwrap()
            .insert((record.owner.clone(), record.repo.clone()), record);
    }

    pub fn link_org(&self, record: OrgRecord) {
        self.entities
            .orgs
            .lock()
            .unwrap()
            .insert(record.org.clone(), record);
    }

    pub fn set_org_repos(&self, org: &str, names: &[&str]) {
        self.vcs.org_repos.lock().unwrap().insert(
            org.to_string(),
            names.iter().map(|n| (*n).to_string()).collect(),
        );
    }

    pub fn pull_request(&self, repo: &str, owner: &str, number: u64) -> PullRequestRef {
        PullRequestRef {
            repo: repo.to_string(),
            owner: owner.to_string(),
            number,
            head_sha: format!("sha{number}"),
        }
    }
}
