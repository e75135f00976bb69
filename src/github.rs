//! Work-tracker client (§6 "Work tracker"): the HTTP+JSON surface the loop
//! and tools call through. Named `github` since the reference work tracker
//! this spec targets is GitHub Issues/PRs, but the shape is generic enough
//! for any tracker exposing comments/issues/pull-requests over HTTP.

use crate::error::{Error, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PullRequestRequest<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub head: &'a str,
    pub base: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
}

pub struct TrackerClient {
    client: Client,
    base_url: String,
    token: SecretString,
}

impl TrackerClient {
    pub fn new(base_url: impl Into<String>, token: SecretString) -> Self {
        TrackerClient {
            client: Client::new(),
            base_url: base_url.into(),
            token,
        }
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }

    pub async fn get_issue(&self, owner: &str, repo: &str, number: u64) -> Result<Issue> {
        let url = format!("{}/repos/{}/{}/issues/{}", self.base_url, owner, repo, number);
        let resp = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Error::ProviderApi(format!("GET {} returned {}", url, resp.status())));
        }
        resp.json().await.map_err(|e| Error::Network(e.to_string()))
    }

    pub async fn post_comment(&self, owner: &str, repo: &str, issue_number: u64, body: &str) -> Result<()> {
        let url = format!("{}/repos/{}/{}/issues/{}/comments", self.base_url, owner, repo, issue_number);
        let resp = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&json!({ "body": body }))
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Error::ProviderApi(format!("POST {} returned {}", url, resp.status())));
        }
        Ok(())
    }

    pub async fn open_pull_request(&self, owner: &str, repo: &str, request: &PullRequestRequest<'_>) -> Result<PullRequest> {
        let url = format!("{}/repos/{}/{}/pulls", self.base_url, owner, repo);
        let resp = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Error::ProviderApi(format!("POST {} returned {}", url, resp.status())));
        }
        resp.json().await.map_err(|e| Error::Network(e.to_string()))
    }
}
