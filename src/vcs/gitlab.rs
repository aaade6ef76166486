//! GitLab repository compare API client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{DiffEntry, DiffSource};
use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
struct CompareResponse {
    #[serde(default)]
    diffs: Vec<DiffEntry>,
}

/// Client for `GET /api/v4/projects/{id}/repository/compare`
pub struct GitLabClient {
    client: Client,
    base_url: String,
    project_id: u64,
    token: String,
}

impl GitLabClient {
    pub fn new(
        base_url: impl Into<String>,
        project_id: u64,
        token: impl Into<String>,
    ) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::Validation(
                "a GitLab access token is required for diff mode".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Diff(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            project_id,
            token,
        })
    }

    fn compare_url(&self) -> String {
        format!(
            "{}/api/v4/projects/{}/repository/compare",
            self.base_url.trim_end_matches('/'),
            self.project_id
        )
    }
}

#[async_trait]
impl DiffSource for GitLabClient {
    async fn compare(&self, base: &str, head: &str) -> Result<Vec<DiffEntry>> {
        let url = self.compare_url();
        debug!("Comparing {}..{} via {}", base, head, url);

        let response = self
            .client
            .get(&url)
            .header("PRIVATE-TOKEN", &self.token)
            .query(&[("from", base), ("to", head)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::Diff(format!(
                "compare {base}..{head} failed with status {status}: {body}"
            )));
        }

        let body = response.text().await?;
        let compare: CompareResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Diff(format!("Failed to parse compare response: {e}")))?;

        debug!("{} changed file(s) between {} and {}", compare.diffs.len(), base, head);
        Ok(compare.diffs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const PATH: &str = "/api/v4/projects/39439064/repository/compare";

    #[tokio::test]
    async fn test_compare_returns_diff_entries() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", PATH)
            .match_header("PRIVATE-TOKEN", "secret")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("from".into(), "main".into()),
                Matcher::UrlEncoded("to".into(), "feature/sg".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "commit": {"id": "abc"},
                    "diffs": [
                        {"old_path": "terraform/modules/networking/sg/main.tf", "new_path": "terraform/modules/networking/sg/main.tf", "renamed_file": false, "deleted_file": false, "new_file": false},
                        {"old_path": "terraform/modules/storage/s3/old.tf", "renamed_file": true, "deleted_file": false}
                    ]
                }"#,
            )
            .expect(1)
            .create_async()
            .await;

        let client = GitLabClient::new(server.url(), 39439064, "secret").unwrap();
        let entries = client.compare("main", "feature/sg").await.unwrap();

        mock.assert_async().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].old_path, "terraform/modules/networking/sg/main.tf");
        assert!(!entries[0].renamed_file);
        assert!(entries[1].renamed_file);
    }

    #[tokio::test]
    async fn test_compare_non_success_is_diff_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", PATH)
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"message":"401 Unauthorized"}"#)
            .create_async()
            .await;

        let client = GitLabClient::new(server.url(), 39439064, "bad").unwrap();
        match client.compare("main", "topic").await {
            Err(Error::Diff(message)) => assert!(message.contains("401")),
            other => panic!("Expected diff error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_compare_empty_diff() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"diffs": []}"#)
            .create_async()
            .await;

        let client = GitLabClient::new(format!("{}/", server.url()), 39439064, "t").unwrap();
        assert!(client.compare("main", "main").await.unwrap().is_empty());
    }

    #[test]
    fn test_requires_token() {
        assert!(matches!(
            GitLabClient::new("https://gitlab.com", 1, "  "),
            Err(Error::Validation(_))
        ));
    }
}
