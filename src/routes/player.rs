//! Xtream-compatible player endpoints (`get.php`, `player_api.php`)

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::AppError;
use crate::services::auth::{authorize_player, PlayerAccess};
use crate::services::metrics;
use crate::services::xtream::{
    Listing, XtreamAuthFailure, XtreamAuthResponse, XtreamCatalog, XtreamDeniedUserInfo,
    XtreamServerInfo, XtreamUserInfo,
};
use crate::AppState;

/// Query parameters shared by `get.php` and `player_api.php`
#[derive(Debug, Deserialize, Default)]
pub struct PlayerQuery {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub action: Option<String>,
    pub category_id: Option<String>,
}

async fn authorize(state: &AppState, query: &PlayerQuery) -> Result<PlayerAccess, AppError> {
    authorize_player(
        &state.config,
        &state.license,
        &state.store,
        &query.username,
        &query.password,
        Utc::now(),
    )
    .await
}

/// GET /get.php - Combined M3U for the account
pub async fn get_playlist(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PlayerQuery>,
) -> Result<impl IntoResponse, AppError> {
    let access = authorize(&state, &query).await?;
    let playlist = state.assembler.build_playlist(access.lists()).await;

    metrics::PLAYLIST_REQUESTS.inc();
    tracing::info!(
        "Serving playlist to {} ({} bytes)",
        access.username(),
        playlist.len()
    );

    Ok((
        [(header::CONTENT_TYPE, "text/x-mpegurl; charset=utf-8")],
        playlist,
    ))
}

/// GET /player_api.php - Xtream player API
pub async fn player_api(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PlayerQuery>,
) -> Response {
    let access = match authorize(&state, &query).await {
        Ok(access) => access,
        Err(e) => return auth_failure(e),
    };

    let action = query.action.as_deref().unwrap_or("").trim();
    let listing = match action {
        "" | "get_user_info" => {
            return Json(user_info(&state, &access, Utc::now())).into_response();
        }
        "get_live_categories" | "get_live_streams" => Listing::Live,
        "get_vod_categories" | "get_vod_streams" => Listing::Vod,
        "get_series_categories" | "get_series" => Listing::Series,
        other => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": format!("Unsupported action: {}", other) })),
            )
                .into_response();
        }
    };

    let categories = state.assembler.categories(access.lists()).await;
    let catalog = XtreamCatalog::new(&categories);

    if action.ends_with("_categories") {
        Json(catalog.categories(listing)).into_response()
    } else {
        Json(catalog.streams(listing, query.category_id.as_deref())).into_response()
    }
}

/// Xtream envelope for denied logins so players can show their own message
fn auth_failure(error: AppError) -> Response {
    let status = match error {
        AppError::LicenseExpired | AppError::AccountExpired => "Expired",
        AppError::InvalidCredentials => "Disabled",
        _ => return error.into_response(),
    };

    let body = XtreamAuthFailure {
        user_info: XtreamDeniedUserInfo {
            auth: 0,
            status: status.to_string(),
        },
        error: error.public_message(),
        code: error.code().to_string(),
    };
    (error.status(), Json(body)).into_response()
}

fn user_info(state: &AppState, access: &PlayerAccess, now: DateTime<Utc>) -> XtreamAuthResponse {
    let (created_at, expires_at) = match access {
        PlayerAccess::Legacy { .. } => (state.license.created_at, Some(state.license.expires_at)),
        PlayerAccess::Account(account) => (account.created_at, account.expires_at),
    };
    let config = &state.config;

    XtreamAuthResponse {
        user_info: XtreamUserInfo {
            username: access.username().to_string(),
            password: access.password().to_string(),
            message: String::new(),
            auth: 1,
            status: "Active".to_string(),
            exp_date: expires_at.map(|at| at.timestamp().to_string()),
            is_trial: "0".to_string(),
            active_cons: "0".to_string(),
            created_at: created_at.timestamp().to_string(),
            max_connections: "1".to_string(),
            allowed_output_formats: vec!["m3u8".to_string(), "ts".to_string()],
        },
        server_info: XtreamServerInfo {
            url: config.public_host.clone(),
            port: config.port.to_string(),
            https_port: "443".to_string(),
            server_protocol: config.server_protocol.clone(),
            rtmp_port: "0".to_string(),
            timezone: config.timezone.clone(),
            timestamp_now: now.timestamp(),
            time_now: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        },
    }
}
