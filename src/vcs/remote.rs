//! Extract `owner/name` from the remote URLs `git remote -v` prints.

use url::Url;

/// Parse one `git remote -v` line, e.g. `origin\tgit@github.com:10gen/mms.git (fetch)`.
pub fn parse_remote_line(line: &str) -> Option<String> {
    let mut fields = line.split_whitespace();
    let _name = fields.next()?;
    let url = fields.next()?;
    parse_remote_url(url)
}

/// Accepts scp-style SSH (`git@host:owner/name.git`), `ssh://` and `http(s)://` URLs.
pub fn parse_remote_url(remote: &str) -> Option<String> {
    let remote = remote.trim();

    let path = if remote.contains("://") {
        let parsed = Url::parse(remote).ok()?;
        match parsed.scheme() {
            "ssh" | "git" | "http" | "https" => parsed.path().to_string(),
            _ => return None,
        }
    } else {
        // scp-like syntax: [user@]host:path
        let (host, path) = remote.split_once(':')?;
        if host.is_empty() || host.contains('/') {
            return None;
        }
        path.to_string()
    };

    owner_and_name(&path)
}

fn owner_and_name(path: &str) -> Option<String> {
    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    let mut segments = path.rsplitn(3, '/');
    let name = segments.next()?.trim();
    let owner = segments.next()?.trim();
    if owner.is_empty() || name.is_empty() {
        return None;
    }
    Some(format!("{owner}/{name}"))
}
