//! Shared harness for API integration tests.
//!
//! Builds the full application router with the same middleware stack as
//! `main.rs`, backed by temp directories and a fake engine shell script so
//! the whole submit/poll/result flow can run in-process.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use scrappy_core::orchestrator::JobOrchestrator;
use scrappy_core::registry::JobRegistry;
use scrappy_core::runner::{EngineConfig, EngineRunner, ScrapPyRunner};

use scrappy_api::auth::jwt::JwtConfig;
use scrappy_api::auth::store::UserStore;
use scrappy_api::config::ServerConfig;
use scrappy_api::routes;
use scrappy_api::state::AppState;

pub const TEST_USER: &str = "admin";
pub const TEST_PASSWORD: &str = "password123";

/// A fully wired application plus the directories backing it.
pub struct TestApp {
    pub router: Router,
    pub upload_dir: PathBuf,
    _dirs: (tempfile::TempDir, tempfile::TempDir),
}

/// Build a test app whose engine is the given shell script body.
///
/// The script is invoked as `/bin/sh <script> -f <input> -m <mode> -o
/// <output>`, matching the production invocation contract.
pub fn build_test_app(engine_script: &str) -> TestApp {
    let engine_dir = tempfile::tempdir().expect("failed to create engine dir");
    let upload_tmp = tempfile::tempdir().expect("failed to create upload dir");
    let upload_dir = upload_tmp.path().to_path_buf();

    let script_path = engine_dir.path().join("engine.sh");
    {
        let mut f = std::fs::File::create(&script_path).expect("failed to write engine script");
        f.write_all(engine_script.as_bytes()).unwrap();
    }

    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:8000".to_string()],
        request_timeout_secs: 30,
        upload_dir: upload_dir.clone(),
        max_file_size_bytes: 10 * 1024 * 1024,
        jwt: JwtConfig {
            secret: "test-secret-key-minimum-32-characters-long".to_string(),
            token_expiry_mins: 30,
        },
        engine: EngineConfig {
            interpreter: PathBuf::from("/bin/sh"),
            engine_path: script_path,
            timeout: Duration::from_secs(5),
        },
    };

    let users = Arc::new(UserStore::with_user(TEST_USER, TEST_PASSWORD));
    let registry = Arc::new(JobRegistry::new());
    let runner: Arc<dyn EngineRunner> = Arc::new(ScrapPyRunner::new(config.engine.clone()));
    let orchestrator = JobOrchestrator::new(Arc::clone(&registry), runner);

    let state = AppState {
        config: Arc::new(config.clone()),
        users,
        registry: Arc::clone(&registry),
        orchestrator,
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:8000".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    let router = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(DefaultBodyLimit::max(config.max_file_size_bytes + 64 * 1024))
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state);

    TestApp {
        router,
        upload_dir,
        _dirs: (engine_dir, upload_tmp),
    }
}

/// Engine script that writes lines to the `-o` artifact, except metadata
/// mode which prints to stdout (matching the real engine's behavior).
pub const WELL_BEHAVED_ENGINE: &str = r#"
mode="$4"
out="$6"
if [ "$mode" = "metadata" ]; then
    echo "Title: Test"
else
    printf 'alpha\nbravo\n' > "$out"
fi
"#;

/// Engine script that fails with a diagnostic on stderr.
pub const FAILING_ENGINE: &str = r#"
echo "corrupt stream" >&2
exit 2
"#;

impl TestApp {
    /// Send one request through the router.
    pub async fn request(&self, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("router must not error");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to read body")
            .to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response must be JSON")
        };
        (status, json)
    }

    /// Log in with the test credentials and return a bearer token.
    pub async fn login(&self) -> String {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/auth/token")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!(
                "username={TEST_USER}&password={TEST_PASSWORD}"
            )))
            .unwrap();

        let (status, json) = self.request(req).await;
        assert_eq!(status, StatusCode::OK, "login must succeed: {json}");
        json["access_token"].as_str().unwrap().to_string()
    }
}

/// Multipart boundary used by [`multipart_submission`].
pub const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

/// Build a multipart job-submission body.
pub fn multipart_submission(
    mode: &str,
    consent: &str,
    filename: &str,
    content_type: &str,
    file: &[u8],
) -> Vec<u8> {
    let mut body = Vec::new();
    fn push(body: &mut Vec<u8>, s: &str) {
        body.extend_from_slice(s.as_bytes());
    }

    push(&mut body, &format!("--{BOUNDARY}\r\n"));
    push(&mut body, "Content-Disposition: form-data; name=\"mode\"\r\n\r\n");
    push(&mut body, &format!("{mode}\r\n"));

    push(&mut body, &format!("--{BOUNDARY}\r\n"));
    push(
        &mut body,
        "Content-Disposition: form-data; name=\"consent_acknowledged\"\r\n\r\n",
    );
    push(&mut body, &format!("{consent}\r\n"));

    push(&mut body, &format!("--{BOUNDARY}\r\n"));
    push(
        &mut body,
        &format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n"),
    );
    push(&mut body, &format!("Content-Type: {content_type}\r\n\r\n"));
    body.extend_from_slice(file);
    push(&mut body, "\r\n");

    push(&mut body, &format!("--{BOUNDARY}--\r\n"));
    body
}

/// Build an authenticated multipart submit request.
pub fn submit_request(token: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/jobs")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Build an authenticated GET request.
pub fn get_request(token: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

/// Poll the status endpoint until the job reaches a terminal state.
pub async fn wait_for_terminal(app: &TestApp, token: &str, job_id: &str) -> serde_json::Value {
    for _ in 0..500 {
        let (status, json) = app
            .request(get_request(token, &format!("/api/v1/jobs/{job_id}")))
            .await;
        assert_eq!(status, StatusCode::OK);

        let state = json["data"]["status"].as_str().unwrap().to_string();
        if state == "completed" || state == "failed" {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} did not reach a terminal state in time");
}

/// Count the files currently staged in the upload directory.
pub fn staged_uploads(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|rd| rd.count()).unwrap_or(0)
}
