//! Access-token refresh
//!
//! The refresh strategy is injected into the request pipeline as a
//! [`TokenRefresher`]. [`RefreshCoordinator`] makes sure that callers racing
//! on a 401 share one in-flight refresh instead of each spending the refresh
//! token.

use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::token::{TokenPair, TokenStore};
use crate::error::{ClientError, Result};
use crate::http::request::{Method, OutboundRequest, RequestBody};
use crate::http::response::{http_error, Payload};
use crate::http::transport::{Transport, TransportError};

/// Refresh endpoint response; the refresh token is only sent when rotated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Strategy that trades a refresh token for a new access token
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens>;
}

/// Refresher that posts `{ refreshToken }` to the backend refresh endpoint
///
/// Talks to the transport directly, never through the pipeline, so a 401
/// from the refresh endpoint cannot trigger another refresh.
pub struct HttpTokenRefresher {
    transport: Arc<dyn Transport>,
    endpoint: String,
    timeout: Duration,
}

impl HttpTokenRefresher {
    pub fn new(
        transport: Arc<dyn Transport>,
        api_base_url: &str,
        refresh_path: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            endpoint: format!("{}{}", api_base_url.trim_end_matches('/'), refresh_path),
            timeout,
        }
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens> {
        let request = OutboundRequest {
            method: Method::Post,
            url: self.endpoint.clone(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: RequestBody::Json(json!({ "refreshToken": refresh_token })),
        };

        let response = tokio::time::timeout(self.timeout, self.transport.send(request))
            .await
            .map_err(|_| ClientError::Timeout(self.timeout))?
            .map_err(|e| match e {
                TransportError::Network(msg) => ClientError::Network(msg),
                TransportError::Other(msg) => ClientError::Unknown(msg),
            })?;

        match response.status {
            401 | 404 => Err(ClientError::Unauthorized(
                "Refresh token rejected".to_string(),
            )),
            status if !(200..300).contains(&status) => Err(http_error(&response)),
            _ => Payload::parse(&response)?.deserialize(),
        }
    }
}

type SharedRefresh = Shared<BoxFuture<'static, Option<TokenPair>>>;

/// Serializes refresh attempts behind a single shared future
pub struct RefreshCoordinator {
    refresher: Arc<dyn TokenRefresher>,
    in_flight: Mutex<Option<SharedRefresh>>,
}

impl RefreshCoordinator {
    pub fn new(refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            refresher,
            in_flight: Mutex::new(None),
        }
    }

    /// Refresh the stored tokens, joining an in-flight refresh if one exists.
    /// Returns the stored pair on success.
    pub async fn refresh(&self, tokens: &TokenStore) -> Option<TokenPair> {
        let shared = {
            let mut slot = self.in_flight.lock().await;
            match slot.as_ref() {
                Some(existing) => {
                    debug!("Joining in-flight token refresh");
                    existing.clone()
                }
                None => {
                    let refresh = run_refresh(Arc::clone(&self.refresher), tokens.clone())
                        .boxed()
                        .shared();
                    *slot = Some(refresh.clone());
                    refresh
                }
            }
        };

        let outcome = shared.clone().await;

        let mut slot = self.in_flight.lock().await;
        if slot
            .as_ref()
            .map(|current| current.ptr_eq(&shared))
            .unwrap_or(false)
        {
            *slot = None;
        }

        outcome
    }
}

async fn run_refresh(refresher: Arc<dyn TokenRefresher>, tokens: TokenStore) -> Option<TokenPair> {
    let refresh_token = match tokens.refresh_token() {
        Some(token) => token,
        None => {
            warn!("Token refresh skipped: no refresh token stored");
            return None;
        }
    };

    match refresher.refresh(&refresh_token).await {
        Ok(refreshed) => {
            let pair = TokenPair {
                access_token: refreshed.access_token,
                refresh_token: refreshed.refresh_token.unwrap_or(refresh_token),
            };
            tokens.set(&pair);
            info!("Access token refreshed");
            Some(pair)
        }
        Err(e) => {
            warn!("Token refresh failed: {}", e);
            None
        }
    }
}
