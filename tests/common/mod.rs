#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use medicrew_client::auth::{
    Account, AuthState, License, RefreshedTokens, Role, TokenPair, TokenRefresher, User,
};
use medicrew_client::error::{ClientError, Result};
use medicrew_client::http::{OutboundRequest, RawResponse, Transport, TransportError};
use medicrew_client::storage::MemoryStore;

type Responder = dyn Fn(&OutboundRequest) -> std::result::Result<RawResponse, TransportError>
    + Send
    + Sync;

/// Transport answering through a closure and recording every request
pub struct ScriptedTransport {
    responder: Box<Responder>,
    delay: Option<Duration>,
    requests: Mutex<Vec<OutboundRequest>>,
    completed: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&OutboundRequest) -> std::result::Result<RawResponse, TransportError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            responder: Box::new(responder),
            delay: None,
            requests: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(0),
        }
    }

    /// Answer 200 with `body` for tokens in `valid`, 401 otherwise
    pub fn accepting(valid: &[&str], body: &'static str) -> Self {
        let valid: Vec<String> = valid.iter().map(|token| format!("Bearer {}", token)).collect();
        Self::new(move |request| {
            let authorized = request
                .header("Authorization")
                .map(|header| valid.iter().any(|v| v == header))
                .unwrap_or(false);
            if authorized {
                Ok(json_response(200, body))
            } else {
                Ok(json_response(401, r#"{"message":"Unauthorized"}"#))
            }
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Sends that ran past their delay and produced a response
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        request: OutboundRequest,
    ) -> std::result::Result<RawResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        (self.responder)(&request)
    }

    fn transport_name(&self) -> &'static str {
        "scripted"
    }
}

/// Refresher returning a fixed outcome and counting calls
pub struct FakeRefresher {
    outcome: Option<RefreshedTokens>,
    delay: Duration,
    calls: AtomicUsize,
}

impl FakeRefresher {
    pub fn succeeding(access_token: &str) -> Self {
        Self {
            outcome: Some(RefreshedTokens {
                access_token: access_token.to_string(),
                refresh_token: None,
            }),
            delay: Duration::from_millis(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            outcome: None,
            delay: Duration::from_millis(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenRefresher for FakeRefresher {
    async fn refresh(&self, _refresh_token: &str) -> Result<RefreshedTokens> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.outcome
            .clone()
            .ok_or_else(|| ClientError::Unauthorized("Refresh token rejected".to_string()))
    }
}

pub fn json_response(status: u16, body: &str) -> RawResponse {
    RawResponse {
        status,
        status_text: String::new(),
        content_type: Some("application/json".to_string()),
        body: body.as_bytes().to_vec(),
    }
}

pub fn account(role: Role, license: &str) -> Account {
    Account {
        account_id: "acc_1".to_string(),
        organization_id: Some("ORG001".to_string()),
        organization_name: "Seoul National University Hospital".to_string(),
        role,
        license: License::new(license),
        license_type: None,
        is_active: true,
    }
}

pub fn user(role: Role, license: &str) -> User {
    User::new("minseo", "Park Minseo", account(role, license))
}

/// Hydrated in-memory auth state with an active session and tokens T1/R1
pub fn logged_in(role: Role, license: &str) -> AuthState {
    let auth = AuthState::hydrated(Arc::new(MemoryStore::new()));
    auth.login(user(role, license), Some(&TokenPair::new("T1", "R1")));
    auth
}
