// src/github.rs

//! Authenticated GitHub REST requests with round-robin token rotation.
//!
//! Every request uses the token under the pool cursor. The cursor only moves
//! after a request returned 200 with a JSON body, so a failing token is used
//! again by the next request before the pool rotates.

use crate::error::{ConfigError, FetchError};
use crate::model::RepoId;
use serde_json::Value;
use tracing::{debug, warn};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("file-touches/", env!("CARGO_PKG_VERSION"));

/// Bearer tokens used round-robin
#[derive(Debug, Clone)]
pub struct TokenPool {
    tokens: Vec<String>,
    cursor: usize,
}

impl TokenPool {
    /// Blank entries are dropped; an empty pool is rejected.
    pub fn new<I, S>(tokens: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens
            .into_iter()
            .map(Into::into)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            return Err(ConfigError::NoTokens);
        }
        Ok(TokenPool { tokens, cursor: 0 })
    }

    /// Index of the token the next request will use
    pub fn position(&self) -> usize {
        self.cursor % self.tokens.len()
    }

    pub fn current(&self) -> &str {
        &self.tokens[self.position()]
    }

    /// Moves to the next token. Call only after a successful request.
    pub fn advance(&mut self) {
        self.cursor = (self.position() + 1) % self.tokens.len();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }
}

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// One blocking GET with a bearer token.
///
/// Any status code is a successful exchange here; only connection-level
/// failures are errors.
pub trait Transport {
    fn get(&self, url: &str, token: &str) -> Result<RawResponse, FetchError>;
}

/// Production transport over a shared `ureq` agent
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::config::Config::builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        UreqTransport { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str, token: &str) -> Result<RawResponse, FetchError> {
        let response = self
            .agent
            .get(url)
            .header("Authorization", &format!("Bearer {}", token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        // Commit details carry every patch; ureq's 10 MiB default would drop them
        let status = response.status().as_u16();
        let body = response
            .into_body()
            .with_config()
            .limit(u64::MAX)
            .read_to_string()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(RawResponse { status, body })
    }
}

pub struct GithubClient<T = UreqTransport> {
    transport: T,
    tokens: TokenPool,
    api_base: String,
}

impl GithubClient<UreqTransport> {
    pub fn new(tokens: TokenPool, api_base: impl Into<String>) -> Self {
        Self::with_transport(UreqTransport::new(), tokens, api_base)
    }
}

impl<T: Transport> GithubClient<T> {
    pub fn with_transport(transport: T, tokens: TokenPool, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        GithubClient {
            transport,
            tokens,
            api_base,
        }
    }

    #[cfg(test)]
    pub fn tokens(&self) -> &TokenPool {
        &self.tokens
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn commits_page_url(&self, repo: &RepoId, page: u32, per_page: u32) -> String {
        format!(
            "{}/repos/{}/{}/commits?page={}&per_page={}",
            self.api_base, repo.owner, repo.name, page, per_page
        )
    }

    pub fn commit_url(&self, repo: &RepoId, sha: &str) -> String {
        format!(
            "{}/repos/{}/{}/commits/{}",
            self.api_base, repo.owner, repo.name, sha
        )
    }

    /// GETs `url` and decodes the body as JSON.
    ///
    /// Failures are logged and returned; the token cursor advances only on
    /// success.
    pub fn get_json(&mut self, url: &str) -> Result<Value, FetchError> {
        let token_index = self.tokens.position();
        let response = match self.transport.get(url, self.tokens.current()) {
            Ok(response) => response,
            Err(e) => {
                warn!(%url, error = %e, "Error during GitHub API request");
                return Err(e);
            }
        };

        if response.status != 200 {
            warn!(%url, status = response.status, body = %response.body, "GitHub API error");
            return Err(FetchError::Status {
                status: response.status,
                body: response.body,
            });
        }

        let payload: Value = serde_json::from_str(&response.body).map_err(|e| {
            warn!(%url, error = %e, "Error decoding GitHub API response");
            FetchError::Parse(e.to_string())
        })?;

        debug!(%url, token_index, "GitHub API request succeeded");
        self.tokens.advance();
        Ok(payload)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays scripted responses in order and records every call
    #[derive(Default)]
    pub struct ScriptedTransport {
        responses: RefCell<VecDeque<Result<RawResponse, FetchError>>>,
        pub calls: RefCell<Vec<(String, String)>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn ok(self, body: &str) -> Self {
            self.status(200, body)
        }

        pub fn status(self, status: u16, body: &str) -> Self {
            self.responses.borrow_mut().push_back(Ok(RawResponse {
                status,
                body: body.to_string(),
            }));
            self
        }

        pub fn fail(self, message: &str) -> Self {
            self.responses
                .borrow_mut()
                .push_back(Err(FetchError::Transport(message.to_string())));
            self
        }

        pub fn urls(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|(u, _)| u.clone()).collect()
        }

        pub fn tokens_used(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|(_, t)| t.clone()).collect()
        }
    }

    impl Transport for ScriptedTransport {
        fn get(&self, url: &str, token: &str) -> Result<RawResponse, FetchError> {
            self.calls
                .borrow_mut()
                .push((url.to_string(), token.to_string()));
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Transport("script exhausted".to_string())))
        }
    }
}
