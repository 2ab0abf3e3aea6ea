use crate::platform::types::{self, PullRequestStatus};

/// Merged wins over closed; anything not explicitly open counts as closed.
pub fn map_status(is_open: bool, is_merged: bool) -> PullRequestStatus {
    if is_merged {
        PullRequestStatus::Merged
    } else if is_open {
        PullRequestStatus::Open
    } else {
        PullRequestStatus::Closed
    }
}

/// Map octocrab PullRequest to our platform PullRequest type.
pub fn map_pull_request(pr: octocrab::models::pulls::PullRequest) -> types::PullRequest {
    let is_open = matches!(pr.state, Some(octocrab::models::IssueState::Open));
    let is_merged = pr.merged_at.is_some();

    types::PullRequest {
        number: pr.number,
        title: pr.title.clone().unwrap_or_default(),
        url: pr
            .html_url
            .as_ref()
            .map(|u| u.to_string())
            .unwrap_or_default(),
        status: map_status(is_open, is_merged),
        head_branch: pr.head.ref_field.clone(),
        base_branch: pr.base.ref_field.clone(),
    }
}
