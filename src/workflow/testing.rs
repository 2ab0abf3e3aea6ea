//! In-process fakes for exercising the flows without a network or git.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ci::types::VariantTasks;
use crate::ci::PatchHost;
use crate::error::{AppError, GitError, PatchError, Result};
use crate::platform::types::*;
use crate::platform::CodeHost;
use crate::state::MemoryStore;
use crate::tracker::{IssueSummary, IssueTracker};
use crate::vcs::{DiffFormat, VersionControl};

use super::types::PullRequestContext;
use super::WorkflowSettings;

/// Ordered record of every call made to any fake.
///
/// One call can be armed to fail, which lets tests abort a flow at any step.
#[derive(Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
    fail_on: Arc<Mutex<Option<String>>>,
}

impl CallLog {
    /// Record a call, failing it with `Unknown` when it is the armed one.
    fn call(&self, entry: impl Into<String>) -> Result<()> {
        let entry = entry.into();
        let armed = self
            .fail_on
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|name| matches_call(&entry, name));
        self.entries.lock().unwrap().push(entry.clone());
        if armed {
            return Err(AppError::unknown(format!("{entry} failed")));
        }
        Ok(())
    }

    /// Make the call named `name` fail from now on.
    pub fn fail_on(&self, name: &str) {
        *self.fail_on.lock().unwrap() = Some(name.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    /// Index of the first call named `name`, ignoring recorded arguments.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries().iter().position(|e| matches_call(e, name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }
}

fn matches_call(entry: &str, name: &str) -> bool {
    entry == name || entry.starts_with(&format!("{name} "))
}

pub fn settings() -> WorkflowSettings {
    WorkflowSettings {
        trunk_branch: "master".to_string(),
        projects: HashMap::from([(
            "mms-automation".to_string(),
            "cloud-automation-master".to_string(),
        )]),
    }
}

pub fn open_pr(number: u64, branch: &str) -> PullRequest {
    PullRequest {
        number,
        title: format!("{branch}: Fix bug"),
        url: format!("https://github.example.com/10gen/mms/pull/{number}"),
        status: PullRequestStatus::Open,
        head_branch: branch.to_string(),
        base_branch: "master".to_string(),
    }
}

pub fn context() -> PullRequestContext {
    PullRequestContext {
        repo: RepositoryRef {
            owner: "10gen".to_string(),
            name: "mms".to_string(),
            permission: Permission::Write,
        },
        branch: "CLOUDP-100".to_string(),
        issue: IssueSummary {
            key: "CLOUDP-100".to_string(),
            title: "Fix bug".to_string(),
            description: "It breaks".to_string(),
        },
        pull_request: open_pr(42, "CLOUDP-100"),
        last_patch: None,
    }
}

pub struct Harness {
    pub log: CallLog,
    pub vcs: Arc<FakeVcs>,
    pub host: Arc<FakeHost>,
    pub tracker: Arc<FakeTracker>,
    pub ci: Arc<FakeCi>,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    pub fn new() -> Self {
        let log = CallLog::default();
        Self {
            vcs: Arc::new(FakeVcs::new(log.clone())),
            host: Arc::new(FakeHost::new(log.clone())),
            tracker: Arc::new(FakeTracker { log: log.clone() }),
            ci: Arc::new(FakeCi::new(log.clone())),
            store: Arc::new(MemoryStore::new()),
            log,
        }
    }
}

pub struct FakeVcs {
    log: CallLog,
    diff: Mutex<String>,
}

impl FakeVcs {
    fn new(log: CallLog) -> Self {
        Self {
            log,
            diff: Mutex::new("+hello\n".to_string()),
        }
    }

    pub fn set_diff(&self, diff: &str) {
        *self.diff.lock().unwrap() = diff.to_string();
    }
}

#[async_trait]
impl VersionControl for FakeVcs {
    async fn repository_path(&self, _dir: &Path) -> Result<String> {
        self.log.call("vcs.repository_path")?;
        Ok("10gen/mms".to_string())
    }

    async fn current_branch(&self, _dir: &Path) -> Result<String> {
        self.log.call("vcs.current_branch")?;
        Ok("CLOUDP-100".to_string())
    }

    async fn merge_base(&self, _dir: &Path, upstream_ref: &str, head_ref: &str) -> Result<String> {
        self.log
            .call(format!("vcs.merge_base {upstream_ref} {head_ref}"))?;
        Ok("base123".to_string())
    }

    async fn diff_since(&self, _dir: &Path, base: &str, format: DiffFormat) -> Result<Vec<u8>> {
        self.log.call(format!("vcs.diff_since {base} {format:?}"))?;
        let diff = self.diff.lock().unwrap().clone();
        if diff.is_empty() {
            return Err(GitError::EmptyDiff.into());
        }
        Ok(match format {
            DiffFormat::Unified => diff.into_bytes(),
            DiffFormat::Stat => b" hello.txt | 1 +\n".to_vec(),
        })
    }

    async fn commit_hash(&self, _dir: &Path) -> Result<String> {
        self.log.call("vcs.commit_hash")?;
        Ok("abc123".to_string())
    }
}

struct HostState {
    branch_pushed: bool,
    create_conflict: bool,
    pull_requests: Vec<PullRequest>,
    created: Vec<PullRequestDraft>,
    comments: Vec<(u64, String)>,
}

pub struct FakeHost {
    log: CallLog,
    state: Mutex<HostState>,
}

impl FakeHost {
    fn new(log: CallLog) -> Self {
        Self {
            log,
            state: Mutex::new(HostState {
                branch_pushed: true,
                create_conflict: false,
                pull_requests: Vec::new(),
                created: Vec::new(),
                comments: Vec::new(),
            }),
        }
    }

    pub fn set_branch_pushed(&self, pushed: bool) {
        self.state.lock().unwrap().branch_pushed = pushed;
    }

    pub fn set_create_conflict(&self, conflict: bool) {
        self.state.lock().unwrap().create_conflict = conflict;
    }

    pub fn insert_pull_request(&self, pr: PullRequest) {
        self.state.lock().unwrap().pull_requests.push(pr);
    }

    pub fn created(&self) -> Vec<PullRequestDraft> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn comments(&self) -> Vec<(u64, String)> {
        self.state.lock().unwrap().comments.clone()
    }
}

#[async_trait]
impl CodeHost for FakeHost {
    async fn authenticate(&self) -> Result<Principal> {
        self.log.call("host.authenticate")?;
        Ok(Principal {
            login: "dev".to_string(),
        })
    }

    async fn resolve_repository(
        &self,
        _principal: &Principal,
        repo_path: &str,
    ) -> Result<RepositoryRef> {
        self.log.call("host.resolve_repository")?;
        let (owner, name) = repo_path.split_once('/').unwrap_or(("", repo_path));
        Ok(RepositoryRef {
            owner: owner.to_string(),
            name: name.to_string(),
            permission: Permission::Write,
        })
    }

    async fn resolve_remote_branch(
        &self,
        _repo: &RepositoryRef,
        branch: &str,
    ) -> Result<RemoteBranch> {
        self.log.call("host.resolve_remote_branch")?;
        if !self.state.lock().unwrap().branch_pushed {
            return Err(GitError::RemoteBranchNotFound.into());
        }
        Ok(RemoteBranch {
            name: branch.to_string(),
            commit_sha: "abc123".to_string(),
        })
    }

    async fn find_open_pull_request(
        &self,
        _repo: &RepositoryRef,
        branch: &str,
    ) -> Result<Option<PullRequest>> {
        self.log.call("host.find_open_pull_request")?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .pull_requests
            .iter()
            .find(|pr| pr.is_open() && pr.head_branch == branch)
            .cloned())
    }

    async fn get_pull_request(&self, _repo: &RepositoryRef, number: u64) -> Result<PullRequest> {
        self.log.call("host.get_pull_request")?;
        self.state
            .lock()
            .unwrap()
            .pull_requests
            .iter()
            .find(|pr| pr.number == number)
            .cloned()
            .ok_or_else(|| GitError::PullRequestNotFound.into())
    }

    async fn create_pull_request(
        &self,
        _repo: &RepositoryRef,
        draft: &PullRequestDraft,
    ) -> Result<PullRequest> {
        self.log.call("host.create_pull_request")?;
        let mut state = self.state.lock().unwrap();
        if state.create_conflict {
            return Err(GitError::PullRequestAlreadyExists.into());
        }
        let number = 100 + state.created.len() as u64;
        let pr = PullRequest {
            number,
            title: draft.title.clone(),
            url: format!("https://github.example.com/10gen/mms/pull/{number}"),
            status: PullRequestStatus::Open,
            head_branch: draft.head_branch.clone(),
            base_branch: draft.base_branch.clone(),
        };
        state.created.push(draft.clone());
        state.pull_requests.push(pr.clone());
        Ok(pr)
    }

    async fn add_comment(&self, _repo: &RepositoryRef, number: u64, body: &str) -> Result<()> {
        self.log.call("host.add_comment")?;
        self.state
            .lock()
            .unwrap()
            .comments
            .push((number, body.to_string()));
        Ok(())
    }
}

pub struct FakeTracker {
    log: CallLog,
}

#[async_trait]
impl IssueTracker for FakeTracker {
    async fn fetch_issue(&self, key: &str) -> Result<IssueSummary> {
        self.log.call("tracker.fetch_issue")?;
        Ok(IssueSummary {
            key: key.to_string(),
            title: "Fix bug".to_string(),
            description: "It breaks".to_string(),
        })
    }

    fn browse_url(&self, key: &str) -> String {
        format!("https://jira.example.com/browse/{key}")
    }
}

struct CiState {
    aliases: HashMap<String, Vec<VariantTasks>>,
    finalize_ack: bool,
    patches: usize,
    configured: Vec<Vec<VariantTasks>>,
}

pub struct FakeCi {
    log: CallLog,
    state: Mutex<CiState>,
}

impl FakeCi {
    fn new(log: CallLog) -> Self {
        Self {
            log,
            state: Mutex::new(CiState {
                aliases: HashMap::new(),
                finalize_ack: true,
                patches: 0,
                configured: Vec::new(),
            }),
        }
    }

    pub fn define_alias(&self, alias: &str, selections: Vec<VariantTasks>) {
        self.state
            .lock()
            .unwrap()
            .aliases
            .insert(alias.to_string(), selections);
    }

    pub fn set_finalize_ack(&self, ack: bool) {
        self.state.lock().unwrap().finalize_ack = ack;
    }

    pub fn configured(&self) -> Vec<Vec<VariantTasks>> {
        self.state.lock().unwrap().configured.clone()
    }
}

#[async_trait]
impl PatchHost for FakeCi {
    async fn create_patch(
        &self,
        project: &str,
        base_commit: &str,
        _diff: &[u8],
    ) -> Result<String> {
        self.log
            .call(format!("ci.create_patch {project} {base_commit}"))?;
        let mut state = self.state.lock().unwrap();
        state.patches += 1;
        Ok(format!("patch-{}", state.patches))
    }

    async fn latest_version(&self, project: &str) -> Result<String> {
        self.log.call(format!("ci.latest_version {project}"))?;
        Ok("graph-1".to_string())
    }

    async fn expand_alias(
        &self,
        _project: &str,
        alias: &str,
        _version_id: &str,
    ) -> Result<Vec<VariantTasks>> {
        self.log.call(format!("ci.expand_alias {alias}"))?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .aliases
            .get(alias)
            .cloned()
            .unwrap_or_default())
    }

    async fn configure(&self, _patch_id: &str, selections: &[VariantTasks]) -> Result<String> {
        self.log.call("ci.configure")?;
        let mut state = self.state.lock().unwrap();
        state.configured.push(selections.to_vec());
        Ok(format!("version-{}", state.configured.len()))
    }

    async fn finalize(&self, _patch_id: &str) -> Result<()> {
        self.log.call("ci.finalize")?;
        if !self.state.lock().unwrap().finalize_ack {
            return Err(PatchError::FinalizeRejected.into());
        }
        Ok(())
    }

    fn patch_url(&self, patch_id: &str) -> String {
        format!("https://ci.example.com/version/{patch_id}")
    }
}
