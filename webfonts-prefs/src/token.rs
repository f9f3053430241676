//! Options API contract and single-use token handling.
//!
//! Writes to the server need an options token. The client caches the last
//! token it fetched:
//!
//! ```text
//!   NoToken ──fetch ok──▸ Cached(t)
//!   Cached(t) ──post rejected as stale──▸ NoToken ──fetch──▸ Cached(t')
//! ```
//!
//! A request restarts at most once. A post made with a freshly fetched token
//! is never retried, whatever the server answers.

use std::future::Future;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server rejected the token as stale or invalid.
    #[error("Options token was rejected")]
    BadToken,
    /// The server answered without a usable token.
    #[error("Server returned no options token")]
    TokenMissing,
    #[error("Options request failed: {0}")]
    Request(String),
}

/// Server endpoints used to persist options for a named identity.
pub trait OptionsApi {
    /// Fetch a fresh options token.
    fn fetch_token(&self) -> impl Future<Output = Result<String, ApiError>> + Send;

    /// Store `value` under option `name`, authorised by `token`.
    fn post_option(
        &self,
        name: &str,
        value: &str,
        token: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Token cache state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TokenState {
    #[default]
    NoToken,
    Cached(String),
}

/// Options API wrapper owning the token cache. Share it with `Arc` so
/// every preference set for the same user reuses one token.
#[derive(Debug)]
pub struct OptionsClient<A> {
    api: A,
    token: Mutex<TokenState>,
}

impl<A: OptionsApi> OptionsClient<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            token: Mutex::new(TokenState::NoToken),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn token_state(&self) -> TokenState {
        self.token.lock().await.clone()
    }

    /// Post one option, refreshing a stale cached token once.
    pub async fn save_option(&self, name: &str, value: &str) -> Result<(), ApiError> {
        let state = self.token.lock().await.clone();
        match state {
            TokenState::NoToken => self.post_with_fresh_token(name, value).await,
            TokenState::Cached(token) => match self.api.post_option(name, value, &token).await {
                Err(ApiError::BadToken) => {
                    log::warn!("OptionsClient: cached token rejected, refreshing once");
                    *self.token.lock().await = TokenState::NoToken;
                    self.post_with_fresh_token(name, value).await
                }
                other => other,
            },
        }
    }

    async fn post_with_fresh_token(&self, name: &str, value: &str) -> Result<(), ApiError> {
        let token = self.api.fetch_token().await?;
        if token.is_empty() {
            return Err(ApiError::TokenMissing);
        }
        *self.token.lock().await = TokenState::Cached(token.clone());
        self.api.post_option(name, value, &token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted server: answers posts from a queue, counts calls.
    #[derive(Default)]
    struct Scripted {
        tokens_issued: AtomicUsize,
        posts: std::sync::Mutex<Vec<String>>,
        answers: std::sync::Mutex<VecDeque<Result<(), ApiError>>>,
    }

    impl Scripted {
        fn answering(answers: impl IntoIterator<Item = Result<(), ApiError>>) -> Self {
            Self {
                answers: std::sync::Mutex::new(answers.into_iter().collect()),
                ..Self::default()
            }
        }

        fn fetches(&self) -> usize {
            self.tokens_issued.load(Ordering::SeqCst)
        }

        fn posted_tokens(&self) -> Vec<String> {
            self.posts.lock().unwrap().clone()
        }
    }

    impl OptionsApi for Scripted {
        async fn fetch_token(&self) -> Result<String, ApiError> {
            let n = self.tokens_issued.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("token-{n}"))
        }

        async fn post_option(&self, _name: &str, _value: &str, token: &str) -> Result<(), ApiError> {
            self.posts.lock().unwrap().push(token.to_string());
            self.answers.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_first_save_fetches_token() {
        let client = OptionsClient::new(Scripted::default());
        client.save_option("uls-preferences", "{}").await.unwrap();
        assert_eq!(client.api().fetches(), 1);
        assert_eq!(client.token_state().await, TokenState::Cached("token-1".into()));
    }

    #[tokio::test]
    async fn test_cached_token_is_reused() {
        let client = OptionsClient::new(Scripted::default());
        client.save_option("a", "1").await.unwrap();
        client.save_option("a", "2").await.unwrap();
        assert_eq!(client.api().fetches(), 1);
        assert_eq!(client.api().posted_tokens(), vec!["token-1", "token-1"]);
    }

    #[tokio::test]
    async fn test_stale_token_refreshes_once() {
        let client = OptionsClient::new(Scripted::answering([Ok(()), Err(ApiError::BadToken), Ok(())]));
        client.save_option("a", "1").await.unwrap();
        client.save_option("a", "2").await.unwrap();

        assert_eq!(client.api().fetches(), 2);
        assert_eq!(client.api().posted_tokens(), vec!["token-1", "token-1", "token-2"]);
        assert_eq!(client.token_state().await, TokenState::Cached("token-2".into()));
    }

    #[tokio::test]
    async fn test_stale_retry_failure_is_surfaced() {
        let client = OptionsClient::new(Scripted::answering([
            Ok(()),
            Err(ApiError::BadToken),
            Err(ApiError::BadToken),
        ]));
        client.save_option("a", "1").await.unwrap();
        let result = client.save_option("a", "2").await;

        assert_eq!(result, Err(ApiError::BadToken));
        // One refresh, no loop.
        assert_eq!(client.api().fetches(), 2);
        assert_eq!(client.api().posted_tokens().len(), 3);
    }

    #[tokio::test]
    async fn test_fresh_token_failure_is_not_retried() {
        let client = OptionsClient::new(Scripted::answering([Err(ApiError::BadToken)]));
        let result = client.save_option("a", "1").await;
        assert_eq!(result, Err(ApiError::BadToken));
        assert_eq!(client.api().fetches(), 1);
        assert_eq!(client.api().posted_tokens().len(), 1);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let client = OptionsClient::new(Scripted::answering([
            Ok(()),
            Err(ApiError::Request("http 500".into())),
        ]));
        client.save_option("a", "1").await.unwrap();
        let result = client.save_option("a", "2").await;
        assert_eq!(result, Err(ApiError::Request("http 500".into())));
        assert_eq!(client.api().fetches(), 1);
    }

    struct NoTokens;

    impl OptionsApi for NoTokens {
        async fn fetch_token(&self) -> Result<String, ApiError> {
            Ok(String::new())
        }

        async fn post_option(&self, _: &str, _: &str, _: &str) -> Result<(), ApiError> {
            panic!("must not post without a token");
        }
    }

    #[tokio::test]
    async fn test_empty_token_is_missing() {
        let client = OptionsClient::new(NoTokens);
        assert_eq!(client.save_option("a", "1").await, Err(ApiError::TokenMissing));
        assert_eq!(client.token_state().await, TokenState::NoToken);
    }
}
