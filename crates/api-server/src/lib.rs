pub mod error;
pub mod settings;
pub mod users;

use axum::Router;
use sqlite::SqliteStore;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

pub use settings::Settings;

/// State shared by every request: a single store handle opened at startup.
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: Arc<SqliteStore>,
}

impl AppState {
    pub fn new(store: SqliteStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

pub fn app(state: AppState, settings: &Settings) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(settings.landing_page()))
        .merge(users::routes())
        .fallback_service(ServeDir::new(&settings.static_dir))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use chrono::Utc;
    use http_body_util::BodyExt;
    use rstest::{fixture, rstest};
    use serde_json::{json, Value};
    use sqlite::DBType;
    use std::path::PathBuf;
    use tokio::net::TcpListener;
    use tower::ServiceExt;
    use tracker::coerce::format_date;

    const UNKNOWN_USER: &str = "65a1b2c3d4e5f60718293a4b";

    fn repo_dir(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../..")
            .join(name)
    }

    #[fixture]
    fn settings() -> Settings {
        Settings {
            database_url: "sqlite::memory:".to_string(),
            port: 0,
            static_dir: repo_dir("public"),
            views_dir: repo_dir("views"),
            log_level: "debug".to_string(),
        }
    }

    async fn test_app(settings: &Settings) -> Router {
        let store = SqliteStore::new(DBType::Url(&settings.database_url))
            .await
            .unwrap();
        app(AppState::new(store), settings)
    }

    fn form_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, value)
    }

    async fn create_user(app: &Router, username: &str) -> String {
        let (status, body) = send(app, form_post("/api/users", &format!("username={username}"))).await;
        assert_eq!(status, StatusCode::OK);
        body["_id"].as_str().unwrap().to_string()
    }

    async fn add_exercise(app: &Router, user_id: &str, body: &str) -> (StatusCode, Value) {
        send(app, form_post(&format!("/api/users/{user_id}/exercises"), body)).await
    }

    #[rstest]
    #[tokio::test]
    async fn landing_page(settings: Settings) {
        let app = test_app(&settings).await;
        let response = app.oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&body).contains("Exercise tracker"));
    }

    #[rstest]
    #[tokio::test]
    async fn static_files_are_served(settings: Settings) {
        let app = test_app(&settings).await;
        let response = app.oneshot(get("/style.css")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[rstest]
    #[tokio::test]
    async fn create_user_then_list(settings: Settings) {
        let app = test_app(&settings).await;
        let (status, created) = send(&app, form_post("/api/users", "username=fcc_test")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["username"], "fcc_test");
        let id = created["_id"].as_str().unwrap();
        assert!(!id.is_empty());

        let (status, listed) = send(&app, get("/api/users")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed, json!([{ "username": "fcc_test", "_id": id }]));
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_usernames_are_accepted(settings: Settings) {
        let app = test_app(&settings).await;
        let first = create_user(&app, "fcc_test").await;
        let second = create_user(&app, "fcc_test").await;
        assert_ne!(first, second);

        let (_, listed) = send(&app, get("/api/users")).await;
        assert_eq!(listed.as_array().unwrap().len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn add_exercise_ok(settings: Settings) {
        let app = test_app(&settings).await;
        let user_id = create_user(&app, "fcc_test").await;

        let (status, body) = add_exercise(
            &app,
            &user_id,
            "description=run&duration=30&date=2023-01-15",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "username": "fcc_test",
                "description": "run",
                "duration": 30,
                "date": "Sun Jan 15 2023",
                "_id": user_id,
            })
        );
    }

    #[rstest]
    #[tokio::test]
    async fn add_exercise_without_date_uses_today(settings: Settings) {
        let app = test_app(&settings).await;
        let user_id = create_user(&app, "fcc_test").await;

        let before = format_date(&Utc::now());
        let (status, body) = add_exercise(&app, &user_id, "description=run&duration=30").await;
        let after = format_date(&Utc::now());
        assert_eq!(status, StatusCode::OK);
        let date = body["date"].as_str().unwrap();
        assert!(date == before || date == after);

        let (_, body) = add_exercise(&app, &user_id, "description=run&duration=30&date=").await;
        assert!(body["date"] == before || body["date"] == after);
    }

    #[rstest]
    #[tokio::test]
    async fn add_exercise_non_numeric_duration_is_null(settings: Settings) {
        let app = test_app(&settings).await;
        let user_id = create_user(&app, "fcc_test").await;

        let (status, body) =
            add_exercise(&app, &user_id, "description=run&duration=lots&date=2023-01-15").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["duration"], Value::Null);
    }

    #[rstest]
    #[tokio::test]
    async fn add_exercise_unknown_user(settings: Settings) {
        let app = test_app(&settings).await;
        let (status, body) = add_exercise(&app, UNKNOWN_USER, "description=run&duration=30").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "User not found" }));
    }

    #[rstest]
    #[tokio::test]
    async fn add_exercise_unknown_user_with_invalid_date(settings: Settings) {
        let app = test_app(&settings).await;
        let (status, body) =
            add_exercise(&app, UNKNOWN_USER, "description=run&duration=30&date=someday").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "User not found" }));
    }

    #[rstest]
    #[tokio::test]
    async fn add_exercise_malformed_user_id(settings: Settings) {
        let app = test_app(&settings).await;
        let (status, _) = add_exercise(&app, "not-an-id", "description=run&duration=30").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[rstest]
    #[tokio::test]
    async fn add_exercise_invalid_date(settings: Settings) {
        let app = test_app(&settings).await;
        let user_id = create_user(&app, "fcc_test").await;
        let (status, body) =
            add_exercise(&app, &user_id, "description=run&duration=30&date=someday").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal Server Error" }));
    }

    #[rstest]
    #[tokio::test]
    async fn exercise_log_filters_and_sorts(settings: Settings) {
        let app = test_app(&settings).await;
        let user_id = create_user(&app, "fcc_test").await;
        for (description, date) in [
            ("swim", "2023-01-20"),
            ("run", "2023-01-05"),
            ("late", "2023-02-01"),
            ("early", "2022-12-31"),
            ("bike", "2023-01-31"),
        ] {
            let (status, _) = add_exercise(
                &app,
                &user_id,
                &format!("description={description}&duration=30&date={date}"),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = send(
            &app,
            get(&format!("/api/users/{user_id}/logs?from=2023-01-01&to=2023-01-31")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "username": "fcc_test",
                "count": 3,
                "_id": user_id,
                "log": [
                    { "description": "run", "duration": 30, "date": "Thu Jan 05 2023" },
                    { "description": "swim", "duration": 30, "date": "Fri Jan 20 2023" },
                    { "description": "bike", "duration": 30, "date": "Tue Jan 31 2023" },
                ],
            })
        );
    }

    #[rstest]
    #[tokio::test]
    async fn exercise_log_limit(settings: Settings) {
        let app = test_app(&settings).await;
        let user_id = create_user(&app, "fcc_test").await;
        for date in ["2023-01-03", "2023-01-01", "2023-01-02"] {
            add_exercise(&app, &user_id, &format!("description=run&duration=30&date={date}")).await;
        }

        let (_, body) = send(&app, get(&format!("/api/users/{user_id}/logs?limit=1"))).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["log"].as_array().unwrap().len(), 1);
        assert_eq!(body["log"][0]["date"], "Sun Jan 01 2023");

        for limit in ["0", "-2", "many", ""] {
            let (_, body) =
                send(&app, get(&format!("/api/users/{user_id}/logs?limit={limit}"))).await;
            assert_eq!(body["count"], 3);
        }
    }

    #[rstest]
    #[tokio::test]
    async fn exercise_log_is_repeatable(settings: Settings) {
        let app = test_app(&settings).await;
        let user_id = create_user(&app, "fcc_test").await;
        add_exercise(&app, &user_id, "description=run&duration=30&date=2023-01-15").await;

        let uri = format!("/api/users/{user_id}/logs?from=2023-01-01");
        let first = send(&app, get(&uri)).await;
        let second = send(&app, get(&uri)).await;
        assert_eq!(first, second);
    }

    #[rstest]
    #[tokio::test]
    async fn exercise_log_unknown_user(settings: Settings) {
        let app = test_app(&settings).await;
        let (status, body) = send(&app, get(&format!("/api/users/{UNKNOWN_USER}/logs"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "User not found" }));
    }

    #[rstest]
    #[tokio::test]
    async fn exercise_log_unknown_user_with_invalid_bound(settings: Settings) {
        let app = test_app(&settings).await;
        let (status, body) =
            send(&app, get(&format!("/api/users/{UNKNOWN_USER}/logs?from=soon"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "User not found" }));
    }

    #[rstest]
    #[tokio::test]
    async fn exercise_log_malformed_user_id(settings: Settings) {
        let app = test_app(&settings).await;
        let (status, body) = send(&app, get("/api/users/not-an-id/logs")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal Server Error" }));
    }

    #[rstest]
    #[tokio::test]
    async fn exercise_log_invalid_bound(settings: Settings) {
        let app = test_app(&settings).await;
        let user_id = create_user(&app, "fcc_test").await;
        let (status, _) = send(&app, get(&format!("/api/users/{user_id}/logs?from=soon"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[rstest]
    #[tokio::test]
    async fn the_real_deal(settings: Settings) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = test_app(&settings).await;

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client =
            hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
                .build_http();

        let response = client
            .request(
                Request::builder()
                    .method(Method::POST)
                    .uri(format!("http://{addr}/api/users"))
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("username=fcc_test"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let created: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(created["username"], "fcc_test");
    }
}
