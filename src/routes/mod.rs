pub mod admin;
pub mod extract;
pub mod health;
pub mod player;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// HTTP surface: player endpoints, admin API and health checks
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health endpoints
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .route("/live", get(health::live))
        // Xtream player endpoints
        .route("/get.php", get(player::get_playlist))
        .route("/player_api.php", get(player::player_api))
        // Admin endpoints (ADMIN_KEY or Basic-Auth)
        .route("/admin/list_accounts", get(admin::list_accounts))
        .route("/admin/add_account", post(admin::add_account))
        .route("/admin/set_account_expiry", post(admin::set_account_expiry))
        .route("/admin/delete_account", post(admin::delete_account))
        .route("/admin/add_admin", post(admin::add_admin))
        .route("/admin/set_admin_credits", post(admin::set_admin_credits))
        .route("/admin/list_admins", get(admin::list_admins))
        .route(
            "/admin/settings",
            get(admin::get_settings).post(admin::update_settings),
        )
        .route("/admin/signup", post(admin::signup))
        .route("/license_status", get(admin::license_status))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::License;
    use crate::services::account_store::{AccountStore, NewAccount};
    use crate::services::auth::AdminIdentity;
    use crate::services::playlist_assembler::PlaylistAssembler;
    use crate::services::storage::LocalStorage;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use std::time::Instant;
    use tower::ServiceExt;

    const NEWS: &str = "#EXTM3U\n\
        #EXTINF:-1 tvg-id=\"cnn.us\" group-title=\"News\",CNN\nhttp://x/cnn.ts\n";
    const MOVIES: &str = "#EXTM3U\n\
        #EXTINF:-1 group-title=\"Cinema\",Matrix\nhttp://x/matrix.mp4\n";

    struct TestApp {
        _data: tempfile::TempDir,
        _playlists: tempfile::TempDir,
        app: Router,
        state: Arc<AppState>,
    }

    async fn test_app_with_license(license: License) -> TestApp {
        let data = tempfile::tempdir().unwrap();
        let playlists = tempfile::tempdir().unwrap();
        std::fs::write(playlists.path().join("news.m3u"), NEWS).unwrap();
        std::fs::write(playlists.path().join("movies.m3u"), MOVIES).unwrap();

        let config = Config::for_dirs(data.path(), playlists.path());
        let store = AccountStore::new(
            Arc::new(LocalStorage::new(data.path())),
            &config.master_username,
        );
        let state = Arc::new(AppState {
            assembler: PlaylistAssembler::new(&config.playlists_dir),
            config,
            store,
            license,
            start_time: Instant::now(),
        });

        TestApp {
            _data: data,
            _playlists: playlists,
            app: router(state.clone()),
            state,
        }
    }

    async fn test_app() -> TestApp {
        test_app_with_license(License::starting_at(Utc::now(), 30)).await
    }

    fn master() -> AdminIdentity {
        AdminIdentity {
            username: "admin".to_string(),
            is_master: true,
        }
    }

    async fn add_account(state: &AppState, username: &str, lists: &[&str], days: i64) {
        let now = Utc::now();
        state
            .store
            .create_account(
                &master(),
                NewAccount {
                    username: username.to_string(),
                    password: "pw".to_string(),
                    expires_at: Some(now + Duration::days(days)),
                    lists: lists.iter().map(|l| l.to_string()).collect(),
                    plan_label: None,
                },
                now,
            )
            .await
            .unwrap();
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, String) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn send_json(
        app: &Router,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, text) = send(app, method, uri, auth, body).await;
        (status, serde_json::from_str(&text).unwrap_or(json!({})))
    }

    fn basic(username: &str, password: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
    }

    #[tokio::test]
    async fn test_legacy_credentials_get_every_source() {
        let t = test_app().await;
        let (status, body) =
            send(&t.app, Method::GET, "/get.php?username=demo&password=demo", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.matches("#EXTM3U").count(), 1);
        assert!(body.starts_with("#EXTM3U\n"));
        assert!(body.contains("http://x/cnn.ts"));
        assert!(body.contains("http://x/matrix.mp4"));
    }

    #[tokio::test]
    async fn test_account_playlist_is_scoped_to_lists() {
        let t = test_app().await;
        add_account(&t.state, "alice", &["news"], 30).await;

        let (status, body) =
            send(&t.app, Method::GET, "/get.php?username=alice&password=pw", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("CNN"));
        assert!(!body.contains("Matrix"));
    }

    #[tokio::test]
    async fn test_player_denials() {
        let t = test_app().await;
        add_account(&t.state, "late", &[], -1).await;

        let (status, body) =
            send_json(&t.app, Method::GET, "/get.php?username=x&password=y", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "invalid_credentials");

        let (status, body) =
            send_json(&t.app, Method::GET, "/get.php?username=late&password=pw", None, None)
                .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "account_expired");

        let (status, body) = send_json(
            &t.app,
            Method::GET,
            "/player_api.php?username=late&password=pw",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["user_info"]["auth"], 0);
        assert_eq!(body["user_info"]["status"], "Expired");
    }

    #[tokio::test]
    async fn test_expired_license_blocks_legacy_credentials() {
        let past = Utc::now() - Duration::days(10);
        let t = test_app_with_license(License::starting_at(past, 1)).await;

        let (status, body) =
            send_json(&t.app, Method::GET, "/get.php?username=demo&password=demo", None, None)
                .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "license_expired");
    }

    #[tokio::test]
    async fn test_player_api_actions() {
        let t = test_app().await;
        let base = "/player_api.php?username=demo&password=demo";

        let (status, info) = send_json(&t.app, Method::GET, base, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(info["user_info"]["auth"], 1);
        assert_eq!(info["user_info"]["status"], "Active");
        assert_eq!(info["server_info"]["port"], "3000");

        let uri = format!("{}&action=get_live_categories", base);
        let (_, categories) = send_json(&t.app, Method::GET, &uri, None, None).await;
        let names: Vec<&str> = categories
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["category_name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Cinema", "News"]);

        let uri = format!("{}&action=get_live_streams&category_id=News", base);
        let (_, streams) = send_json(&t.app, Method::GET, &uri, None, None).await;
        let streams = streams.as_array().unwrap();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0]["name"], "CNN");
        assert_eq!(streams[0]["category_id"], "2");
        assert_eq!(streams[0]["epg_channel_id"], "cnn.us");

        let uri = format!("{}&action=get_vod_streams", base);
        let (_, vod) = send_json(&t.app, Method::GET, &uri, None, None).await;
        assert_eq!(vod.as_array().unwrap().len(), 1);
        assert_eq!(vod[0]["stream_type"], "movie");

        let uri = format!("{}&action=get_short_epg", base);
        let (status, body) = send_json(&t.app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Unsupported action: get_short_epg");
    }

    #[tokio::test]
    async fn test_admin_requires_credentials() {
        let t = test_app().await;

        let (status, body) =
            send_json(&t.app, Method::GET, "/admin/list_accounts", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "unauthorized");

        let (status, _) =
            send_json(&t.app, Method::GET, "/admin/list_accounts?key=wrong", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) =
            send_json(&t.app, Method::GET, "/admin/list_accounts?key=admin123", None, None)
                .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["accounts"], json!([]));

        let auth = basic("admin", "admin");
        let (status, _) =
            send_json(&t.app, Method::GET, "/license_status", Some(&auth), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_reseller_spends_credits() {
        let t = test_app().await;

        let (status, _) = send_json(
            &t.app,
            Method::POST,
            "/admin/add_admin?key=admin123",
            None,
            Some(json!({ "username": "bob", "password": "pw", "credits": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let bob = basic("bob", "pw");
        let (status, body) = send_json(
            &t.app,
            Method::POST,
            "/admin/add_account",
            Some(&bob),
            Some(json!({ "username": "c1", "password": "x", "days": 30, "lists": "news, movies" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["account"]["createdBy"], "bob");
        assert_eq!(body["account"]["lists"], json!(["news", "movies"]));

        let (status, body) = send_json(
            &t.app,
            Method::POST,
            "/admin/add_account",
            Some(&bob),
            Some(json!({ "username": "c2", "password": "x", "days": 30 })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "insufficient_credits");

        let (status, body) = send_json(
            &t.app,
            Method::POST,
            "/admin/add_account?key=admin123",
            None,
            Some(json!({ "username": "c1", "password": "y" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "account_exists");

        // Master-only listing
        let (status, _) =
            send_json(&t.app, Method::GET, "/admin/list_admins", Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_set_account_expiry_rejects_non_positive_days() {
        let t = test_app().await;
        add_account(&t.state, "alice", &[], 1).await;

        let (status, body) = send_json(
            &t.app,
            Method::POST,
            "/admin/set_account_expiry?key=admin123",
            None,
            Some(json!({ "username": "alice", "days": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_request");

        let (status, body) = send_json(
            &t.app,
            Method::POST,
            "/admin/set_account_expiry?key=admin123",
            None,
            Some(json!({ "username": "alice", "hours": 12, "lists": ["movies"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["account"]["lists"], json!(["movies"]));
    }

    #[tokio::test]
    async fn test_signup_follows_settings() {
        let t = test_app().await;
        let signup = json!({ "username": "eve", "password": "pw" });

        let (status, _) =
            send_json(&t.app, Method::POST, "/admin/signup", None, Some(signup.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send_json(
            &t.app,
            Method::POST,
            "/admin/settings?key=admin123",
            None,
            Some(json!({ "allowAdminSignup": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["settings"]["allowAdminSignup"], true);

        let (status, body) =
            send_json(&t.app, Method::POST, "/admin/signup", None, Some(signup)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["admin"]["credits"], 0);
    }

    #[tokio::test]
    async fn test_signup_cannot_claim_master_name() {
        let t = test_app().await;
        add_account(&t.state, "vip", &[], 30).await;
        send_json(
            &t.app,
            Method::POST,
            "/admin/settings?key=admin123",
            None,
            Some(json!({ "allowAdminSignup": true })),
        )
        .await;

        let (status, body) = send_json(
            &t.app,
            Method::POST,
            "/admin/signup",
            None,
            Some(json!({ "username": "admin", "password": "evil" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "admin_exists");

        let evil = basic("admin", "evil");
        let (status, _) =
            send_json(&t.app, Method::GET, "/admin/list_accounts", Some(&evil), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send_json(
            &t.app,
            Method::POST,
            "/admin/delete_account",
            Some(&evil),
            Some(json!({ "username": "vip" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(t.state.store.read_accounts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_huge_day_counts_are_rejected() {
        let t = test_app().await;
        add_account(&t.state, "alice", &[], 1).await;

        let (status, body) = send_json(
            &t.app,
            Method::POST,
            "/admin/add_account?key=admin123",
            None,
            Some(json!({ "username": "bob", "password": "x", "days": 1_000_000_000i64 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_request");

        let (status, body) = send_json(
            &t.app,
            Method::POST,
            "/admin/set_account_expiry?key=admin123",
            None,
            Some(json!({ "username": "alice", "hours": i64::MAX })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_request");
        assert_eq!(t.state.store.read_accounts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_body_gets_json_error() {
        let t = test_app().await;

        for body in [
            json!({ "password": "x" }),
            json!({ "username": "bob", "password": "x", "days": "ten" }),
        ] {
            let (status, text) = send(
                &t.app,
                Method::POST,
                "/admin/add_account?key=admin123",
                None,
                Some(body),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            let error: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(error["code"], "invalid_request");
            assert!(error["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_wrong_key_does_not_shadow_basic_auth() {
        let t = test_app().await;
        let auth = basic("admin", "admin");

        let (status, body) = send_json(
            &t.app,
            Method::GET,
            "/admin/list_accounts?key=stale",
            Some(&auth),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["accounts"], json!([]));
    }

    #[tokio::test]
    async fn test_health_reports_sources() {
        let t = test_app().await;
        let (status, body) = send_json(&t.app, Method::GET, "/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["sources"], 2);
    }
}
