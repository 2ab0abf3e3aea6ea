use crate::error::{AppError, GitError};

/// What the caller was doing when GitHub answered with an error.
///
/// The same status code means different things depending on the request: a
/// 404 on a branch lookup means the branch was never pushed, while a 404 on
/// a pull request lookup means the cached number is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Authenticate,
    ResolveRepository,
    ResolveBranch,
    FindPullRequest,
    GetPullRequest,
    CreatePullRequest,
    Comment,
}

/// Translate a GitHub error response into the typed taxonomy.
///
/// Every wording-dependent rule for GitHub lives here.
pub fn translate(operation: Operation, status: Option<u16>, text: &str) -> AppError {
    if text.contains("Bad credentials") {
        return GitError::BadCredentials.into();
    }

    match (operation, status) {
        (Operation::Authenticate, Some(401 | 403)) => GitError::InvalidCredentials.into(),
        (Operation::ResolveRepository, Some(403 | 404)) => GitError::NoWritePermission.into(),
        (Operation::ResolveBranch, Some(404)) => GitError::RemoteBranchNotFound.into(),
        (Operation::GetPullRequest, Some(404)) => GitError::PullRequestNotFound.into(),
        (Operation::CreatePullRequest, _) if text.contains("A pull request already exists") => {
            GitError::PullRequestAlreadyExists.into()
        }
        _ => {
            tracing::error!(
                operation = ?operation,
                status = ?status,
                response = text,
                "Unexpected GitHub API error"
            );
            AppError::unknown(format!("GitHub API error during {operation:?}: {text}"))
        }
    }
}

/// Translate an octocrab error, flattening GitHub's validation details into the text.
pub fn translate_octocrab(operation: Operation, err: &octocrab::Error) -> AppError {
    match err {
        octocrab::Error::GitHub { source, .. } => {
            let mut text = source.message.clone();
            if let Some(errors) = &source.errors {
                for detail in errors {
                    text.push('\n');
                    text.push_str(&detail.to_string());
                }
            }
            translate(operation, Some(source.status_code.as_u16()), &text)
        }
        other => translate(operation, None, &other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_credentials_wins_over_status() {
        let err = translate(Operation::Authenticate, Some(401), "Bad credentials");
        assert!(matches!(err, AppError::Git(GitError::BadCredentials)));
    }

    #[test]
    fn test_other_auth_failures_are_invalid_credentials() {
        let err = translate(Operation::Authenticate, Some(403), "Resource not accessible");
        assert!(matches!(err, AppError::Git(GitError::InvalidCredentials)));
    }

    #[test]
    fn test_missing_branch_is_distinct_from_network_failure() {
        let missing = translate(Operation::ResolveBranch, Some(404), "Branch not found");
        assert!(matches!(missing, AppError::Git(GitError::RemoteBranchNotFound)));

        let network = translate(Operation::ResolveBranch, None, "connection reset");
        assert!(matches!(network, AppError::Unknown(_)));
    }

    #[test]
    fn test_duplicate_pull_request_detected_from_validation_details() {
        let text = "Validation Failed\n{\"message\":\"A pull request already exists for owner:CLOUDP-100.\"}";
        let err = translate(Operation::CreatePullRequest, Some(422), text);
        assert!(matches!(err, AppError::Git(GitError::PullRequestAlreadyExists)));
    }

    #[test]
    fn test_other_validation_failures_are_unknown() {
        let err = translate(Operation::CreatePullRequest, Some(422), "Validation Failed");
        assert!(matches!(err, AppError::Unknown(_)));
    }

    #[test]
    fn test_stale_pull_request_number() {
        let err = translate(Operation::GetPullRequest, Some(404), "Not Found");
        assert!(matches!(err, AppError::Git(GitError::PullRequestNotFound)));
    }
}
