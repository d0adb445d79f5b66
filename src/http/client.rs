//! Authenticated request pipeline
//!
//! Every call goes through [`ApiClient::send`]: attach the bearer token,
//! enforce the timeout, recover from one 401 by refreshing the access
//! token, and turn every other failure into a [`ClientError`].

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use url::form_urlencoded;

use super::request::{Method, MultipartForm, OutboundRequest, RequestBody, RequestOptions};
use super::response::{http_error, ApiResponse, Payload, RawResponse};
use super::transport::{ReqwestTransport, Transport, TransportError};
use crate::auth::{AuthState, HttpTokenRefresher, RefreshCoordinator, TokenRefresher};
use crate::config::ClientConfig;
use crate::constants::{DEFAULT_REQUEST_TIMEOUT_MS, SESSION_EXPIRED_MESSAGE};
use crate::error::{ClientError, Result};
use crate::navigation::{HistoryNavigator, Navigation, Navigator, RedirectReason};
use crate::routes::paths;

/// Builder for [`ApiClient`]
pub struct ApiClientBuilder {
    base_url: String,
    auth: AuthState,
    default_timeout: Duration,
    transport: Option<Arc<dyn Transport>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl ApiClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Register the refresh strategy; without one every 401 ends the session
    pub fn refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn build(self) -> ApiClient {
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(ReqwestTransport::new()));
        debug!(
            "API client for {} using {} transport",
            self.base_url,
            transport.transport_name()
        );

        ApiClient {
            base_url: self.base_url,
            default_timeout: self.default_timeout,
            transport,
            auth: self.auth,
            refresh: self
                .refresher
                .map(|refresher| Arc::new(RefreshCoordinator::new(refresher))),
            navigator: self
                .navigator
                .unwrap_or_else(|| Arc::new(HistoryNavigator::default())),
        }
    }
}

/// HTTP client bound to one backend and one auth state
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    default_timeout: Duration,
    transport: Arc<dyn Transport>,
    auth: AuthState,
    refresh: Option<Arc<RefreshCoordinator>>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn builder(base_url: impl Into<String>, auth: AuthState) -> ApiClientBuilder {
        ApiClientBuilder {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            default_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            transport: None,
            refresher: None,
            navigator: None,
        }
    }

    /// Client over reqwest with the HTTP refresh strategy from `config`
    pub fn from_config(
        config: &ClientConfig,
        auth: AuthState,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new());
        let refresher = HttpTokenRefresher::new(
            Arc::clone(&transport),
            &config.api_base_url,
            &config.refresh_path,
            config.request_timeout,
        );

        Self::builder(config.api_base_url.clone(), auth)
            .timeout(config.request_timeout)
            .transport(transport)
            .refresher(Arc::new(refresher))
            .navigator(navigator)
            .build()
    }

    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T> {
        self.send(Method::Get, path, RequestBody::Empty, options)
            .await?
            .data
            .deserialize()
    }

    pub async fn post<T, B>(&self, path: &str, body: &B, options: RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = RequestBody::Json(serde_json::to_value(body)?);
        self.send(Method::Post, path, body, options)
            .await?
            .data
            .deserialize()
    }

    pub async fn put<T, B>(&self, path: &str, body: &B, options: RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = RequestBody::Json(serde_json::to_value(body)?);
        self.send(Method::Put, path, body, options)
            .await?
            .data
            .deserialize()
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B, options: RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = RequestBody::Json(serde_json::to_value(body)?);
        self.send(Method::Patch, path, body, options)
            .await?
            .data
            .deserialize()
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T> {
        self.send(Method::Delete, path, RequestBody::Empty, options)
            .await?
            .data
            .deserialize()
    }

    /// File upload; the transport sets the multipart Content-Type
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: MultipartForm,
        options: RequestOptions,
    ) -> Result<T> {
        self.send(Method::Post, path, RequestBody::Multipart(form), options)
            .await?
            .data
            .deserialize()
    }

    /// Execute one logical call, including at most one refresh-and-retry
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        let url = self.build_url(path, &options.params);
        let timeout = options.timeout.unwrap_or(self.default_timeout);

        let sent_token = if options.skip_auth {
            None
        } else {
            self.auth.tokens().access_token()
        };
        let request = Self::build_request(method, &url, &body, &options, sent_token.as_deref());
        let response = self.execute(request, timeout).await?;

        if response.status != 401 {
            return Self::finish(response);
        }

        // Opted-out calls (login with a bad password) report the 401 as is
        if options.skip_auth {
            return Self::finish(response);
        }

        // Without a token there is nothing to refresh
        let sent_token = match sent_token {
            Some(token) => token,
            None => return Err(self.force_logout()),
        };

        let retry_token = match self.recover_token(&sent_token).await {
            Some(token) => token,
            None => return Err(self.force_logout()),
        };

        debug!("Retrying {} {} with refreshed token", method, url);
        let request = Self::build_request(method, &url, &body, &options, Some(&retry_token));
        let response = self.execute(request, timeout).await?;

        if response.status == 401 {
            warn!("{} {} still unauthorized after token refresh", method, url);
            return Err(self.force_logout());
        }
        Self::finish(response)
    }

    /// Token to retry with after a 401, or `None` when the session is over
    async fn recover_token(&self, sent_token: &str) -> Option<String> {
        let tokens = self.auth.tokens();
        match tokens.access_token() {
            // Another call already refreshed while this one was in flight
            Some(current) if current != sent_token => return Some(current),
            Some(_) => {}
            None => return None,
        }

        let coordinator = match &self.refresh {
            Some(coordinator) => coordinator,
            None => {
                warn!("Received 401 and no token refresher is registered");
                return None;
            }
        };

        coordinator
            .refresh(tokens)
            .await
            .map(|pair| pair.access_token)
    }

    /// End the session after an unrecoverable 401 and send the user to login
    fn force_logout(&self) -> ClientError {
        warn!("Session expired, logging out");
        self.auth.logout();

        let location = self.navigator.current_location();
        if !location.starts_with(paths::LOGIN) {
            self.navigator
                .navigate(Navigation::login(location, RedirectReason::TokenExpired));
        }

        ClientError::Unauthorized(SESSION_EXPIRED_MESSAGE.to_string())
    }

    fn build_url(&self, path: &str, params: &[(String, String)]) -> String {
        let mut url = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };

        let mut query = form_urlencoded::Serializer::new(String::new());
        let mut has_params = false;
        for (key, value) in params.iter().filter(|(_, value)| !value.is_empty()) {
            query.append_pair(key, value);
            has_params = true;
        }

        if has_params {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query.finish());
        }
        url
    }

    fn build_request(
        method: Method,
        url: &str,
        body: &RequestBody,
        options: &RequestOptions,
        access_token: Option<&str>,
    ) -> OutboundRequest {
        let mut headers: Vec<(String, String)> = Vec::new();
        if !body.is_multipart() {
            set_header(&mut headers, "Content-Type", "application/json");
        }

        for (name, value) in &options.headers {
            if body.is_multipart() && name.eq_ignore_ascii_case("content-type") {
                continue;
            }
            set_header(&mut headers, name, value);
        }

        if let Some(token) = access_token {
            set_header(&mut headers, "Authorization", &format!("Bearer {}", token));
        }

        OutboundRequest {
            method,
            url: url.to_string(),
            headers,
            body: body.clone(),
        }
    }

    async fn execute(&self, request: OutboundRequest, timeout: Duration) -> Result<RawResponse> {
        let method = request.method;
        let url = request.url.clone();
        debug!("{} {}", method, url);

        match tokio::time::timeout(timeout, self.transport.send(request)).await {
            Err(_) => {
                warn!("{} {} timed out after {}ms", method, url, timeout.as_millis());
                Err(ClientError::Timeout(timeout))
            }
            Ok(Err(TransportError::Network(msg))) => Err(ClientError::Network(msg)),
            Ok(Err(TransportError::Other(msg))) => Err(ClientError::Unknown(msg)),
            Ok(Ok(response)) => Ok(response),
        }
    }

    fn finish(response: RawResponse) -> Result<ApiResponse> {
        if !response.is_success() {
            return Err(http_error(&response));
        }

        let data = Payload::parse(&response)?;
        Ok(ApiResponse {
            status: response.status,
            status_text: response.status_text,
            data,
        })
    }
}

/// Insert or replace a header, matching names case-insensitively
fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers
        .iter_mut()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
    {
        Some(entry) => entry.1 = value.to_string(),
        None => headers.push((name.to_string(), value.to_string())),
    }
}
