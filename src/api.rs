use std::time::Duration;

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api/comments/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

static SHARED_HTTP: Lazy<HttpClient> = Lazy::new(|| {
    HttpClient::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .expect("create http client")
});

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("comments api: network failure: {0}")]
    NetworkFailure(String),
    #[error("comments api: not found: {0}")]
    NotFound(String),
    #[error("comments api: validation failure: {0}")]
    ValidationFailure(String),
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub user_agent: String,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub http_client: Option<HttpClient>,
}

pub struct Client {
    http: HttpClient,
    user_agent: String,
    base_url: Url,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            bail!("comments api: client user agent required");
        }
        let base = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&base)?;
        let http = match (config.http_client, config.timeout) {
            (Some(client), _) => client,
            (None, Some(timeout)) => HttpClient::builder().timeout(timeout).build()?,
            (None, None) => SHARED_HTTP.clone(),
        };

        Ok(Client {
            http,
            user_agent: config.user_agent,
            base_url,
        })
    }

    pub fn threads(&self, filename: &str) -> Result<Vec<Thread>> {
        let params = vec![("filename".to_string(), filename.to_string())];
        let resp = self.request::<()>(Method::GET, "threads", &params, None)?;
        let listing: Listing<Thread> = decode(resp)?;
        Ok(listing.list)
    }

    pub fn create_thread(
        &self,
        filename: &str,
        title: &str,
        body: &str,
        section: &str,
    ) -> Result<Thread> {
        if title.trim().is_empty() {
            bail!(ApiError::ValidationFailure(
                "thread title is required".into()
            ));
        }
        let payload = NewThread {
            title: title.to_string(),
            body: body.to_string(),
            context: ThreadContext {
                filename: filename.to_string(),
                section: section.to_string(),
            },
        };
        let resp = self.request(Method::POST, "threads", &[], Some(&payload))?;
        decode(resp)
    }

    pub fn comments(&self, number: i64) -> Result<Vec<Comment>> {
        let path = format!("threads/{}/comments", number);
        let resp = self.request::<()>(Method::GET, &path, &[], None)?;
        let listing: Listing<Comment> = decode(resp)?;
        Ok(listing.list)
    }

    pub fn create_comment(&self, number: i64, body: &str) -> Result<Comment> {
        if body.trim().is_empty() {
            bail!(ApiError::ValidationFailure(
                "comment body is required".into()
            ));
        }
        let payload = NewComment {
            body: body.to_string(),
        };
        let path = format!("threads/{}/comments", number);
        let resp = self.request(Method::POST, &path, &[], Some(&payload))?;
        decode(resp)
    }

    fn request<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        body: Option<&B>,
    ) -> Result<Response> {
        let mut url = self.base_url.join(path)?;
        if !params.is_empty() {
            {
                let mut pairs = url.query_pairs_mut();
                for (k, v) in params {
                    pairs.append_pair(k, v);
                }
            }
        }

        let mut req = self.http.request(method, url);
        req = req.header(USER_AGENT, self.user_agent.clone());
        if let Some(payload) = body {
            req = req.header(CONTENT_TYPE, "application/json");
            req = req.json(payload);
        }

        let resp = req
            .send()
            .map_err(|err| ApiError::NetworkFailure(err.to_string()))?;
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status();
            let text = resp.text().unwrap_or_default();
            match status.as_u16() {
                404 => Err(ApiError::NotFound(text).into()),
                400 | 422 => Err(ApiError::ValidationFailure(text).into()),
                _ => Err(ApiError::NetworkFailure(format!("{}: {}", status, text)).into()),
            }
        }
    }
}

fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    resp.json()
        .map_err(|err| ApiError::NetworkFailure(format!("malformed response: {}", err)).into())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: i64,
    pub number: i64,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub context: ThreadContext,
    #[serde(default)]
    pub comments: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    #[serde(default)]
    pub thread: i64,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub user: User,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub urls: UserUrls,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUrls {
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub profile: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadContext {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub section: String,
}

#[derive(Debug, Clone, Serialize)]
struct NewThread {
    title: String,
    body: String,
    context: ThreadContext,
}

#[derive(Debug, Clone, Serialize)]
struct NewComment {
    body: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Listing<T> {
    list: Vec<T>,
}
