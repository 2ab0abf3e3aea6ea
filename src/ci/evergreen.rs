use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::config::EvergreenConfig;
use crate::credentials::EvergreenCredentials;
use crate::error::{AppError, PatchError, Result, ResultExt};

use super::types::VariantTasks;
use super::PatchHost;

const FINALIZE_ACK: &str = "patch finalized";

pub struct EvergreenClient {
    client: Client,
    api_user: String,
    api_key: String,
    api_base: String,
    legacy_api_base: String,
    ui_base: String,
}

impl EvergreenClient {
    pub fn new(
        config: &EvergreenConfig,
        credentials: &EvergreenCredentials,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .or_unknown("Failed to build Evergreen HTTP client")?;

        Ok(Self {
            client,
            api_user: credentials.user.clone(),
            api_key: credentials.api_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            legacy_api_base: config.legacy_api_base.trim_end_matches('/').to_string(),
            ui_base: config.ui_base.trim_end_matches('/').to_string(),
        })
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Api-User", &self.api_user)
            .header("Api-Key", &self.api_key)
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<String> {
        let response = self
            .authed(request)
            .send()
            .await
            .or_unknown(&format!("Evergreen {what} request failed"))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Evergreen {what} failed");
            return Err(AppError::unknown(format!(
                "Evergreen {what} returned {status}: {body}"
            )));
        }
        Ok(body)
    }
}

// --- Request types ---

#[derive(Debug, Serialize)]
struct CreatePatchRequest<'a> {
    project: &'a str,
    githash: &'a str,
    patch_bytes: String,
}

impl<'a> CreatePatchRequest<'a> {
    fn new(project: &'a str, githash: &'a str, diff: &[u8]) -> Self {
        Self {
            project,
            githash,
            patch_bytes: base64::engine::general_purpose::STANDARD.encode(diff),
        }
    }
}

#[derive(Debug, Serialize)]
struct ConfigureRequest<'a> {
    variants: &'a [VariantTasks],
}

#[derive(Debug, Serialize)]
struct FinalizeRequest<'a> {
    patch_id: &'a str,
    action: &'a str,
}

// --- Response types ---

#[derive(Debug, Deserialize)]
struct CreatePatchResponse {
    patch: CreatedPatch,
}

#[derive(Debug, Deserialize)]
struct CreatedPatch {
    #[serde(rename = "Id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    version_id: String,
}

#[derive(Debug, Deserialize)]
struct AliasSelection {
    #[serde(rename = "Variant")]
    variant: String,
    #[serde(rename = "Tasks", default)]
    tasks: Vec<String>,
}

fn parse_created_patch(body: &str) -> Result<String> {
    let parsed: CreatePatchResponse = serde_json::from_str(body)?;
    Ok(parsed.patch.id)
}

fn parse_latest_version(body: &str) -> Result<String> {
    let versions: Vec<VersionResponse> = serde_json::from_str(body)?;
    versions
        .into_iter()
        .next()
        .map(|v| v.version_id)
        .ok_or_else(|| AppError::unknown("Evergreen project has no versions"))
}

fn parse_alias_selections(body: &str) -> Result<Vec<VariantTasks>> {
    let selections: Vec<AliasSelection> = serde_json::from_str(body)?;
    Ok(selections
        .into_iter()
        .map(|s| VariantTasks::new(&s.variant, s.tasks))
        .collect())
}

fn parse_configured_version(body: &str) -> Result<String> {
    let parsed: VersionResponse = serde_json::from_str(body)?;
    Ok(parsed.version_id)
}

/// Evergreen acknowledges finalization with a fixed plain-text body.
fn check_finalize_ack(body: &str) -> Result<()> {
    if body.trim() != FINALIZE_ACK {
        tracing::error!(body = %body, "Unexpected finalize acknowledgement");
        return Err(PatchError::FinalizeRejected.into());
    }
    Ok(())
}

#[async_trait]
impl PatchHost for EvergreenClient {
    async fn create_patch(
        &self,
        project: &str,
        base_commit: &str,
        diff: &[u8],
    ) -> Result<String> {
        let url = format!("{}/patches/", self.legacy_api_base);
        let request = self
            .client
            .put(&url)
            .json(&CreatePatchRequest::new(project, base_commit, diff));

        let body = self.send(request, "create patch").await?;
        let patch_id = parse_created_patch(&body)?;
        tracing::info!(project, patch_id = %patch_id, "Created Evergreen patch");
        Ok(patch_id)
    }

    async fn latest_version(&self, project: &str) -> Result<String> {
        let url = format!(
            "{}/projects/{}/versions",
            self.api_base,
            urlencoding::encode(project)
        );
        let body = self.send(self.client.get(&url), "list versions").await?;
        parse_latest_version(&body)
    }

    async fn expand_alias(
        &self,
        project: &str,
        alias: &str,
        version_id: &str,
    ) -> Result<Vec<VariantTasks>> {
        let url = format!(
            "{}/projects/test_alias?include_deps=true&version={}&alias={}",
            self.api_base,
            urlencoding::encode(version_id),
            urlencoding::encode(alias)
        );
        let body = self.send(self.client.get(&url), "expand alias").await?;
        let selections = parse_alias_selections(&body)?;
        tracing::debug!(project, alias, variants = selections.len(), "Expanded alias");
        Ok(selections)
    }

    async fn configure(&self, patch_id: &str, selections: &[VariantTasks]) -> Result<String> {
        let url = format!(
            "{}/patches/{}/configure",
            self.api_base,
            urlencoding::encode(patch_id)
        );
        let request = self.client.post(&url).json(&ConfigureRequest {
            variants: selections,
        });
        let body = self.send(request, "configure patch").await?;
        parse_configured_version(&body)
    }

    async fn finalize(&self, patch_id: &str) -> Result<()> {
        let url = format!(
            "{}/patches/{}",
            self.legacy_api_base,
            urlencoding::encode(patch_id)
        );
        let request = self.client.post(&url).json(&FinalizeRequest {
            patch_id,
            action: "finalize",
        });
        let body = self.send(request, "finalize patch").await?;
        check_finalize_ack(&body)
    }

    fn patch_url(&self, patch_id: &str) -> String {
        format!("{}/version/{patch_id}", self.ui_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_patch_request_encodes_diff() {
        let request = CreatePatchRequest::new("mms", "abc123", b"+hello\n");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["project"], "mms");
        assert_eq!(json["githash"], "abc123");
        assert_eq!(json["patch_bytes"], "K2hlbGxvCg==");
    }

    #[test]
    fn test_empty_diff_is_accepted_by_request() {
        let request = CreatePatchRequest::new("mms", "abc123", b"");
        assert_eq!(request.patch_bytes, "");
    }

    #[test]
    fn test_non_utf8_diff_bytes_are_encoded_verbatim() {
        let request = CreatePatchRequest::new("mms", "abc123", b"\xe9");
        assert_eq!(request.patch_bytes, "6Q==");
    }

    #[test]
    fn test_parse_created_patch() {
        let body = r#"{"patch":{"Id":"5f1a","Project":"mms"},"message":""}"#;
        assert_eq!(parse_created_patch(body).unwrap(), "5f1a");
    }

    #[test]
    fn test_parse_latest_version() {
        let body = r#"[{"version_id":"mms_abc"},{"version_id":"mms_older"}]"#;
        assert_eq!(parse_latest_version(body).unwrap(), "mms_abc");
        assert!(parse_latest_version("[]").is_err());
    }

    #[test]
    fn test_parse_alias_selections_keeps_order() {
        let body = r#"[{"Variant":"linux","Tasks":["unit","compile"]},{"Variant":"windows","Tasks":["unit"]}]"#;
        let selections = parse_alias_selections(body).unwrap();
        assert_eq!(selections.len(), 2);
        assert_eq!(selections[0], VariantTasks::new("linux", ["compile", "unit"]));
        assert_eq!(selections[1].variant, "windows");
    }

    #[test]
    fn test_configure_request_shape() {
        let selections = vec![VariantTasks::new("linux", ["unit"])];
        let json = serde_json::to_string(&ConfigureRequest {
            variants: &selections,
        })
        .unwrap();
        assert_eq!(json, r#"{"variants":[{"id":"linux","tasks":["unit"]}]}"#);
    }

    #[test]
    fn test_finalize_ack() {
        assert!(check_finalize_ack("patch finalized").is_ok());
        assert!(check_finalize_ack("patch finalized\n").is_ok());
        assert!(matches!(
            check_finalize_ack("patch already finalized"),
            Err(AppError::Patch(PatchError::FinalizeRejected))
        ));
    }

    #[test]
    fn test_patch_url() {
        let client = EvergreenClient::new(
            &EvergreenConfig::default(),
            &EvergreenCredentials {
                user: "u".to_string(),
                api_key: "k".to_string(),
            },
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.patch_url("5f1a"), "https://spruce.mongodb.com/version/5f1a");
    }
}
