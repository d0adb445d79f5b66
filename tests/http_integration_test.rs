// End-to-end tests against an in-process mock backend served by warp,
// driven through the reqwest transport.

use futures_util::TryStreamExt;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;
use warp::http::StatusCode;
use warp::multipart::FormData;
use warp::{Filter, Rejection};

use medicrew_client::auth::{AuthState, Role};
use medicrew_client::config::ClientConfig;
use medicrew_client::error::{ClientError, ErrorKind};
use medicrew_client::http::{ApiClient, MultipartForm, RequestOptions};
use medicrew_client::navigation::{HistoryNavigator, Navigator, RedirectReason};
use medicrew_client::services::AuthService;
use medicrew_client::storage::FileStore;

#[derive(Default)]
struct Backend {
    valid_token: Option<String>,
    refresh_enabled: bool,
    refresh_calls: usize,
}

type SharedBackend = Arc<Mutex<Backend>>;

fn extract_bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ").filter(|token| !token.is_empty())
}

fn authorized(backend: &SharedBackend, header: Option<String>) -> bool {
    let token = header.as_deref().and_then(extract_bearer_token);
    let backend = backend.lock().unwrap();
    token.is_some() && backend.valid_token.as_deref() == token
}

fn reply(body: Value, status: StatusCode) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(&body), status)
}

fn unauthorized() -> warp::reply::WithStatus<warp::reply::Json> {
    reply(json!({"message": "Unauthorized"}), StatusCode::UNAUTHORIZED)
}

// Start the mock backend on an ephemeral port
fn spawn_backend() -> (String, SharedBackend) {
    let backend: SharedBackend = Arc::new(Mutex::new(Backend {
        refresh_enabled: true,
        ..Default::default()
    }));
    let state = {
        let backend = backend.clone();
        warp::any().map(move || backend.clone())
    };

    let login = warp::post()
        .and(warp::path!("api" / "user" / "login"))
        .and(warp::body::json())
        .and(state.clone())
        .map(|body: Value, backend: SharedBackend| {
            if body["loginId"] == "minseo" && body["password"] == "secret" {
                backend.lock().unwrap().valid_token = Some("T1".to_string());
                reply(json!({"accessToken": "T1", "refreshToken": "R1"}), StatusCode::OK)
            } else {
                reply(json!({"message": "Invalid account"}), StatusCode::NOT_FOUND)
            }
        });

    let profile = warp::get()
        .and(warp::path!("api" / "user" / "profile"))
        .and(warp::header::optional::<String>("authorization"))
        .and(state.clone())
        .map(|header: Option<String>, backend: SharedBackend| {
            if !authorized(&backend, header) {
                return unauthorized();
            }
            reply(
                json!({
                    "id": 17,
                    "email": "minseo@example.com",
                    "realName": "Park Minseo",
                    "phoneNumber": null,
                    "profileImageUrl": null,
                    "role": 2,
                    "createdAt": "2025-03-02T09:00:00.000Z",
                    "organizationId": 3,
                    "organizationName": "Seoul National University Hospital"
                }),
                StatusCode::OK,
            )
        });

    let refresh = warp::post()
        .and(warp::path!("api" / "auth" / "access-token"))
        .and(warp::body::json())
        .and(state.clone())
        .map(|body: Value, backend: SharedBackend| {
            let mut backend = backend.lock().unwrap();
            backend.refresh_calls += 1;
            if backend.refresh_enabled && body["refreshToken"] == "R1" {
                backend.valid_token = Some("T2".to_string());
                reply(json!({"accessToken": "T2"}), StatusCode::OK)
            } else {
                unauthorized()
            }
        });

    let classes = warp::get()
        .and(warp::path!("api" / "master" / "classes"))
        .and(warp::query::<std::collections::HashMap<String, String>>())
        .and(warp::header::optional::<String>("authorization"))
        .and(state.clone())
        .map(
            |query: std::collections::HashMap<String, String>,
             header: Option<String>,
             backend: SharedBackend| {
                if !authorized(&backend, header) {
                    return unauthorized();
                }
                reply(
                    json!({"classes": [{"id": 1, "name": "ICU 101"}], "query": query}),
                    StatusCode::OK,
                )
            },
        );

    let upload = warp::post()
        .and(warp::path!("api" / "user" / "bulk-create"))
        .and(warp::header::<String>("content-type"))
        .and(warp::multipart::form().max_length(1024 * 1024))
        .and_then(|content_type: String, form: FormData| async move {
            // Each part must be released before multer yields the next one
            let names: Vec<String> = form
                .map_ok(|part| part.name().to_string())
                .try_collect()
                .await
                .map_err(|_| warp::reject())?;
            Ok::<_, Rejection>(warp::reply::json(
                &json!({"contentType": content_type, "parts": names}),
            ))
        });

    let routes = login.or(profile).or(refresh).or(classes).or(upload);
    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    (format!("http://{}/api", addr), backend)
}

struct Harness {
    client: ApiClient,
    auth: AuthState,
    navigator: Arc<HistoryNavigator>,
    backend: SharedBackend,
    _dir: tempfile::TempDir,
}

fn harness(location: &str) -> Harness {
    let (base_url, backend) = spawn_backend();
    let dir = tempdir().unwrap();
    let auth = AuthState::hydrated(Arc::new(FileStore::new(dir.path().join("storage.json"))));
    let navigator = Arc::new(HistoryNavigator::new(location));
    let config = ClientConfig::for_testing(&base_url);
    let client = ApiClient::from_config(&config, auth.clone(), navigator.clone());

    Harness {
        client,
        auth,
        navigator,
        backend,
        _dir: dir,
    }
}

#[tokio::test]
async fn test_login_then_expired_token_is_refreshed() {
    let h = harness("/login");
    let service = AuthService::new(h.client.clone());

    let user = service.login("minseo", "secret").await.unwrap();
    assert_eq!(user.role(), Role::Master);
    assert_eq!(user.license().as_str(), "pro_univ_master");
    assert_eq!(h.auth.tokens().access_token(), Some("T1".to_string()));
    assert!(h.auth.is_authenticated());

    // The backend forgets T1; only a refresh brings the session back
    h.backend.lock().unwrap().valid_token = None;
    h.navigator.set_location("/master/class-management");

    let body: Value = h
        .client
        .get(
            "/master/classes",
            RequestOptions::new().param("page", 1).param("search", ""),
        )
        .await
        .unwrap();

    assert_eq!(body["classes"][0]["name"], "ICU 101");
    assert_eq!(body["query"], json!({"page": "1"}));
    assert_eq!(h.auth.tokens().access_token(), Some("T2".to_string()));
    assert_eq!(h.auth.tokens().refresh_token(), Some("R1".to_string()));
    assert_eq!(h.backend.lock().unwrap().refresh_calls, 1);
    assert!(h.navigator.history().is_empty());
}

#[tokio::test]
async fn test_rejected_refresh_ends_session() {
    let h = harness("/login");
    AuthService::new(h.client.clone())
        .login("minseo", "secret")
        .await
        .unwrap();

    {
        let mut backend = h.backend.lock().unwrap();
        backend.valid_token = None;
        backend.refresh_enabled = false;
    }
    h.navigator.set_location("/master/class-management");

    let err = h
        .client
        .get::<Value>("/master/classes", RequestOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized(_)));
    assert!(!h.auth.is_authenticated());
    assert!(!h.auth.tokens().has());
    assert_eq!(h.navigator.last().unwrap().reason, RedirectReason::TokenExpired);
    assert_eq!(
        h.navigator.current_location(),
        "/login?redirect=%2Fmaster%2Fclass-management&reason=token_expired"
    );
}

#[tokio::test]
async fn test_wrong_password_is_http_error() {
    let h = harness("/login");

    let err = AuthService::new(h.client.clone())
        .login("minseo", "wrong")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Http);
    match err {
        ClientError::Http(failure) => {
            assert_eq!(failure.status, 404);
            assert_eq!(failure.server_message(), Some("Invalid account"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!h.auth.tokens().has());
    assert!(h.navigator.history().is_empty());
}

#[tokio::test]
async fn test_multipart_upload_uses_transport_boundary() {
    let h = harness("/admin/users");

    let form = MultipartForm::new()
        .file(
            "file",
            "students.csv",
            Some("text/csv"),
            b"name,email\nKim,kim@example.com\n".to_vec(),
        )
        .text("organizationId", "3");

    let body: Value = h
        .client
        .post_multipart("/user/bulk-create", form, RequestOptions::new())
        .await
        .unwrap();

    assert!(body["contentType"]
        .as_str()
        .unwrap()
        .starts_with("multipart/form-data; boundary="));
    assert_eq!(body["parts"], json!(["file", "organizationId"]));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let auth = AuthState::hydrated(Arc::new(medicrew_client::storage::MemoryStore::new()));
    let config = ClientConfig::for_testing(&format!("http://127.0.0.1:{}/api", port));
    let client = ApiClient::from_config(&config, auth, Arc::new(HistoryNavigator::default()));

    let err = client
        .get::<Value>("/health", RequestOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}
