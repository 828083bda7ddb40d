//! Admin/reseller management endpoints
//!
//! Every route except `/admin/signup` resolves the caller through the admin
//! gate: `x-admin-key` header, `?key=` query or `Authorization: Basic`.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{Account, AdminSummary, Settings};
use crate::services::account_store::{ExpiryChange, NewAccount, SettingsPatch};
use crate::services::auth::{authorize_admin, parse_basic_auth, AdminCredentials, AdminIdentity};
use crate::services::metrics;
use crate::AppState;

use super::extract::JsonBody;

/// Query params for admin operations
#[derive(Debug, Default, Deserialize)]
pub struct AdminQuery {
    /// Shared admin key (alternative to Basic-Auth)
    pub key: Option<String>,
}

/// Entitlement lists, as a JSON array or a comma-separated string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListsInput {
    Many(Vec<String>),
    Joined(String),
}

impl ListsInput {
    pub fn into_lists(self) -> Vec<String> {
        let raw = match self {
            ListsInput::Many(items) => items,
            ListsInput::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAccountRequest {
    pub username: String,
    pub password: String,
    pub days: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub lists: Option<ListsInput>,
    pub plan_label: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetExpiryRequest {
    pub username: String,
    pub days: Option<i64>,
    pub hours: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub lists: Option<ListsInput>,
}

#[derive(Debug, Deserialize)]
pub struct UsernameRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAdminRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub credits: u32,
    #[serde(default)]
    pub is_master: bool,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SetCreditsRequest {
    pub username: String,
    pub credits: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    pub global_account_limit: Option<u32>,
    pub allow_admin_signup: Option<bool>,
}

#[derive(Serialize)]
pub struct AccountsResponse {
    pub accounts: Vec<Account>,
}

#[derive(Serialize)]
pub struct AccountResponse {
    pub ok: bool,
    pub account: Account,
}

#[derive(Serialize)]
pub struct AdminResponse {
    pub ok: bool,
    pub admin: AdminSummary,
}

#[derive(Serialize)]
pub struct SettingsResponse {
    pub ok: bool,
    pub settings: Settings,
}

/// Resolve the calling admin from headers or the `key` query parameter.
///
/// Key candidates come first; valid Basic-Auth still wins over a wrong key.
async fn caller(
    state: &AppState,
    headers: &HeaderMap,
    query: &AdminQuery,
) -> AppResult<AdminIdentity> {
    let header_key = headers
        .get("x-admin-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let basic = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_basic_auth);

    let credentials: Vec<AdminCredentials> = header_key
        .into_iter()
        .chain(query.key.clone())
        .map(AdminCredentials::Key)
        .chain(basic)
        .collect();

    authorize_admin(&state.config, &state.store, &credentials).await
}

fn positive(value: i64, field: &str) -> AppResult<i64> {
    if value > 0 {
        Ok(value)
    } else {
        Err(AppError::Validation(format!("{} must be positive", field)))
    }
}

/// GET /admin/list_accounts - Accounts visible to the caller
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
) -> AppResult<impl IntoResponse> {
    let actor = caller(&state, &headers, &query).await?;
    let accounts = state.store.list_accounts(&actor).await;

    Ok(Json(AccountsResponse { accounts }))
}

/// POST /admin/add_account - Create an account
pub async fn add_account(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
    JsonBody(request): JsonBody<AddAccountRequest>,
) -> AppResult<impl IntoResponse> {
    let actor = caller(&state, &headers, &query).await?;
    let now = Utc::now();

    let expires_at = match (request.expires_at, request.days) {
        (Some(at), _) => Some(at),
        (None, Some(days)) => {
            let days = positive(days, "days")?;
            Some(ExpiryChange::ExtendDays(days).apply(None, now)?)
        }
        (None, None) => None,
    };

    let account = state
        .store
        .create_account(
            &actor,
            NewAccount {
                username: request.username,
                password: request.password,
                expires_at,
                lists: request.lists.map(ListsInput::into_lists).unwrap_or_default(),
                plan_label: request.plan_label,
            },
            now,
        )
        .await?;

    metrics::ADMIN_OPERATIONS.with_label_values(&["add_account"]).inc();
    Ok(Json(AccountResponse { ok: true, account }))
}

/// POST /admin/set_account_expiry - Change expiry and/or lists
pub async fn set_account_expiry(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
    JsonBody(request): JsonBody<SetExpiryRequest>,
) -> AppResult<impl IntoResponse> {
    let actor = caller(&state, &headers, &query).await?;

    let expiry = match (request.expires_at, request.days, request.hours) {
        (Some(at), _, _) => Some(ExpiryChange::SetAt(at)),
        (None, Some(days), _) => Some(ExpiryChange::ExtendDays(positive(days, "days")?)),
        (None, None, Some(hours)) => Some(ExpiryChange::ExtendHours(positive(hours, "hours")?)),
        (None, None, None) => None,
    };

    let account = state
        .store
        .update_account(
            &actor,
            &request.username,
            expiry,
            request.lists.map(ListsInput::into_lists),
            Utc::now(),
        )
        .await?;

    metrics::ADMIN_OPERATIONS
        .with_label_values(&["set_account_expiry"])
        .inc();
    Ok(Json(AccountResponse { ok: true, account }))
}

/// POST /admin/delete_account - Remove an account
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
    JsonBody(request): JsonBody<UsernameRequest>,
) -> AppResult<impl IntoResponse> {
    let actor = caller(&state, &headers, &query).await?;
    state.store.delete_account(&actor, &request.username).await?;

    metrics::ADMIN_OPERATIONS
        .with_label_values(&["delete_account"])
        .inc();
    Ok(Json(serde_json::json!({
        "ok": true,
        "username": request.username
    })))
}

/// POST /admin/add_admin - Create an admin/reseller (master only)
pub async fn add_admin(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
    JsonBody(request): JsonBody<AddAdminRequest>,
) -> AppResult<impl IntoResponse> {
    let actor = caller(&state, &headers, &query).await?;
    let admin = state
        .store
        .create_admin(
            &actor,
            &request.username,
            &request.password,
            request.credits,
            request.is_master,
            Utc::now(),
        )
        .await?;

    metrics::ADMIN_OPERATIONS.with_label_values(&["add_admin"]).inc();
    Ok(Json(AdminResponse {
        ok: true,
        admin: AdminSummary::from(&admin),
    }))
}

/// POST /admin/set_admin_credits - Set a reseller's credit balance (master only)
pub async fn set_admin_credits(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
    JsonBody(request): JsonBody<SetCreditsRequest>,
) -> AppResult<impl IntoResponse> {
    let actor = caller(&state, &headers, &query).await?;
    let admin = state
        .store
        .set_admin_credits(&actor, &request.username, request.credits)
        .await?;

    metrics::ADMIN_OPERATIONS
        .with_label_values(&["set_admin_credits"])
        .inc();
    Ok(Json(AdminResponse {
        ok: true,
        admin: AdminSummary::from(&admin),
    }))
}

/// GET /admin/list_admins - Resellers without passwords (master only)
pub async fn list_admins(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
) -> AppResult<impl IntoResponse> {
    let actor = caller(&state, &headers, &query).await?;
    actor.require_master()?;

    let admins: Vec<AdminSummary> = state
        .store
        .read_admins()
        .await
        .iter()
        .map(AdminSummary::from)
        .collect();

    Ok(Json(serde_json::json!({ "admins": admins })))
}

/// POST /admin/signup - Self-registration as a reseller, when enabled
pub async fn signup(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<SignupRequest>,
) -> AppResult<impl IntoResponse> {
    let admin = state
        .store
        .signup_admin(&request.username, &request.password, Utc::now())
        .await?;

    metrics::ADMIN_OPERATIONS.with_label_values(&["signup"]).inc();
    Ok(Json(AdminResponse {
        ok: true,
        admin: AdminSummary::from(&admin),
    }))
}

/// GET /admin/settings - Current global settings
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
) -> AppResult<impl IntoResponse> {
    caller(&state, &headers, &query).await?;
    Ok(Json(state.store.read_settings().await))
}

/// POST /admin/settings - Update global settings (master only)
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
    JsonBody(request): JsonBody<SettingsRequest>,
) -> AppResult<impl IntoResponse> {
    let actor = caller(&state, &headers, &query).await?;
    let settings = state
        .store
        .update_settings(
            &actor,
            SettingsPatch {
                global_account_limit: request.global_account_limit,
                allow_admin_signup: request.allow_admin_signup,
            },
        )
        .await?;

    metrics::ADMIN_OPERATIONS
        .with_label_values(&["update_settings"])
        .inc();
    Ok(Json(SettingsResponse { ok: true, settings }))
}

/// GET /license_status - Current license window
pub async fn license_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
) -> AppResult<impl IntoResponse> {
    caller(&state, &headers, &query).await?;
    let license = state.license;

    Ok(Json(serde_json::json!({
        "createdAt": license.created_at,
        "expiresAt": license.expires_at,
        "expired": license.is_expired(Utc::now()),
    })))
}
