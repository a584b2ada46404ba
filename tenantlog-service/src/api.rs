use axum::body::Body;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::json;
use tenantlog_core::errors::TenantLogError;
use tenantlog_protocol::log::LogEntry;
use tenantlog_protocol::request::{ErrorBody, LogsParams, PostLogParams, RegisterParams};
use tenantlog_protocol::tenant::Tenant;
use tower_http::trace::TraceLayer;
use tracing::{error, info_span, Span};

use crate::access::AccessService;

/// Builds the HTTP surface around an [`AccessService`].
pub fn router(service: AccessService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/register", post(register))
        .route("/postlog", put(post_log))
        .route("/logs", get(get_logs))
        .with_state(service)
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
}

/// Request span without the query string, which carries the api key.
fn request_span(request: &Request<Body>) -> Span {
    info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path()
    )
}

type AppResult<T> = Result<T, AppError>;

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn register(
    State(service): State<AccessService>,
    params: Result<Query<RegisterParams>, QueryRejection>,
) -> AppResult<Json<Tenant>> {
    let Query(params) = params?;
    let tenant = service.register(params.app_name).await?;
    Ok(Json(tenant))
}

async fn post_log(
    State(service): State<AccessService>,
    params: Result<Query<PostLogParams>, QueryRejection>,
) -> AppResult<StatusCode> {
    let Query(params) = params?;
    service.append(params).await?;
    Ok(StatusCode::OK)
}

async fn get_logs(
    State(service): State<AccessService>,
    params: Result<Query<LogsParams>, QueryRejection>,
) -> AppResult<Json<Vec<LogEntry>>> {
    let Query(params) = params?;
    let entries = service.query(params).await?;
    Ok(Json(entries))
}

#[derive(Debug, Clone)]
struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn new<M: Into<String>>(status: StatusCode, message: M) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<TenantLogError> for AppError {
    fn from(err: TenantLogError) -> Self {
        let status = match &err {
            TenantLogError::NameTaken(_) | TenantLogError::DuplicateName(_) => StatusCode::CONFLICT,
            TenantLogError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            TenantLogError::InvalidDate(_) => StatusCode::BAD_REQUEST,
            TenantLogError::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
            TenantLogError::Storage(_)
            | TenantLogError::WorkerFailed(_)
            | TenantLogError::Serialization(_)
            | TenantLogError::Config(_) => {
                error!(error = %err, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        AppError::new(status, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::directory::InMemoryTenantDirectory;
    use crate::log_store::InMemoryLogStore;
    use crate::pool::WorkerPoolConfig;
    use axum::http::Method;
    use chrono::NaiveDate;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let clock = FixedClock::new(
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        );
        let service = AccessService::builder(
            Arc::new(InMemoryTenantDirectory::new()),
            Arc::new(InMemoryLogStore::new()),
        )
        .clock(Arc::new(clock))
        .build();
        router(service)
    }

    async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    async fn register(app: &Router, name: &str) -> Tenant {
        let (status, body) = send(app, Method::POST, &format!("/register?appName={name}")).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&body).unwrap()
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn request_span_leaves_out_the_query_string() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let request = Request::builder()
                .method(Method::PUT)
                .uri("/postlog?apiKey=0123456789abcdef&appId=app-1&message=m")
                .body(Body::empty())
                .unwrap();
            let span = request_span(&request);
            let _entered = span.enter();
            tracing::info!("handled");
        });

        let output = String::from_utf8(captured.0.lock().clone()).unwrap();
        assert!(output.contains("path=/postlog"), "{output}");
        assert!(output.contains("method=PUT"), "{output}");
        assert!(!output.contains("0123456789abcdef"), "{output}");
        assert!(!output.contains("apiKey"), "{output}");
    }

    fn error_message(body: &[u8]) -> String {
        serde_json::from_slice::<ErrorBody>(body).unwrap().error
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = send(&app(), Method::GET, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&body).unwrap(),
            json!({ "status": "ok" })
        );
    }

    #[tokio::test]
    async fn register_returns_wire_credentials() {
        let app = app();
        let (status, body) = send(&app, Method::POST, "/register?appName=billing").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["appName"], "billing");
        assert!(json["appId"].as_str().is_some());
        assert_eq!(json["apiKey"].as_str().map(str::len), Some(32));
    }

    #[tokio::test]
    async fn duplicate_registration_is_a_conflict() {
        let app = app();
        register(&app, "billing").await;
        let (status, body) = send(&app, Method::POST, "/register?appName=billing").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(error_message(&body).contains("billing"));
    }

    #[tokio::test]
    async fn posted_log_is_returned_by_logs() {
        let app = app();
        let tenant = register(&app, "orders").await;
        let (status, body) = send(
            &app,
            Method::PUT,
            &format!(
                "/postlog?apiKey={}&appId={}&message=hello&className=MyClass",
                tenant.api_key, tenant.id
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/logs?apiKey={}&appId={}", tenant.api_key, tenant.id),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            json!([{
                "message": "hello",
                "ClassName": "MyClass",
                "logLevel": "info",
                "date": "2024-01-01",
                "time": "12:00:00",
            }])
        );
    }

    #[tokio::test]
    async fn script_tags_are_stripped_over_http() {
        let app = app();
        let tenant = register(&app, "web").await;
        let uri = format!(
            "/postlog?apiKey={}&appId={}&message=%3Cscript%3Ealert(1)%3C%2Fscript%3E&logLevel=error&className=Page",
            tenant.api_key, tenant.id
        );
        assert_eq!(send(&app, Method::PUT, &uri).await.0, StatusCode::OK);

        let (_, body) = send(
            &app,
            Method::GET,
            &format!("/logs?apiKey={}&appId={}&date=2024-01-01", tenant.api_key, tenant.id),
        )
        .await;
        let entries: Vec<LogEntry> = serde_json::from_slice(&body).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "alert(1)");
        assert_eq!(entries[0].log_level, "error");
    }

    #[tokio::test]
    async fn empty_log_level_is_stored_as_info() {
        let app = app();
        let tenant = register(&app, "levels").await;
        let uri = format!(
            "/postlog?apiKey={}&appId={}&message=m&logLevel=&className=C",
            tenant.api_key, tenant.id
        );
        assert_eq!(send(&app, Method::PUT, &uri).await.0, StatusCode::OK);

        let (_, body) = send(
            &app,
            Method::GET,
            &format!("/logs?apiKey={}&appId={}", tenant.api_key, tenant.id),
        )
        .await;
        let entries: Vec<LogEntry> = serde_json::from_slice(&body).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].log_level, "info");
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized() {
        let app = app();
        let tenant = register(&app, "orders").await;

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/postlog?apiKey=wrong&appId={}&message=m&className=C", tenant.id),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_message(&body), "invalid api key or app id");

        let (status, _) = send(&app, Method::GET, "/logs?apiKey=nope&appId=nope&date=garbage").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_date_is_bad_request() {
        let app = app();
        let tenant = register(&app, "orders").await;
        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/logs?apiKey={}&appId={}&date=01-01-2024", tenant.api_key, tenant.id),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error_message(&body).contains("01-01-2024"));
    }

    #[tokio::test]
    async fn missing_parameters_are_bad_request() {
        let app = app();
        let (status, body) = send(&app, Method::POST, "/register").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!error_message(&body).is_empty());

        let (status, _) = send(&app, Method::PUT, "/postlog?apiKey=k&appId=i").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn overload_maps_to_service_unavailable() {
        let err = AppError::from(TenantLogError::Overloaded);
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        let err = AppError::from(TenantLogError::Storage("down".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn saturated_pool_answers_503() {
        let service = AccessService::builder(
            Arc::new(InMemoryTenantDirectory::new()),
            Arc::new(InMemoryLogStore::new()),
        )
        .pool(WorkerPoolConfig {
            workers: 1,
            queue_capacity: 0,
        })
        .build();
        let pool = service.pool().clone();
        let app = router(service);

        let (release, wait) = tokio::sync::oneshot::channel::<()>();
        let blocker = {
            let pool = pool.clone();
            tokio::spawn(async move {
                pool.execute(async move {
                    let _ = wait.await;
                    Ok(())
                })
                .await
            })
        };
        while pool.in_flight() == 0 {
            tokio::task::yield_now().await;
        }

        let (status, body) = send(&app, Method::POST, "/register?appName=late").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(error_message(&body).contains("saturated"));

        let _ = release.send(());
        blocker.await.unwrap().unwrap();
        let (status, _) = send(&app, Method::POST, "/register?appName=late").await;
        assert_eq!(status, StatusCode::OK);
    }
}
