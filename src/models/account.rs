use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// End-user account created by an admin or reseller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub username: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Playlist source identifiers; empty means every available source
    #[serde(default)]
    pub lists: Vec<String>,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_label: Option<String>,
}

impl Account {
    /// Expired only once `now` is strictly past `expires_at`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if now > expires_at)
    }
}

/// Admin or reseller identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub is_master: bool,
    #[serde(default)]
    pub credits: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Admin record without its password, for listings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    pub username: String,
    pub is_master: bool,
    pub credits: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&Admin> for AdminSummary {
    fn from(admin: &Admin) -> Self {
        Self {
            username: admin.username.clone(),
            is_master: admin.is_master,
            credits: admin.credits,
            created_at: admin.created_at,
        }
    }
}

/// Global settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Maximum number of accounts across all resellers (0 = unlimited)
    #[serde(default)]
    pub global_account_limit: u32,
    #[serde(default)]
    pub allow_admin_signup: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            global_account_limit: 0,
            allow_admin_signup: false,
        }
    }
}

pub const MAX_LICENSE_DAYS: i64 = 36_500;

/// Server-wide license window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl License {
    /// Window of `days` from `now`, capped at [`MAX_LICENSE_DAYS`]
    pub fn starting_at(now: DateTime<Utc>, days: i64) -> Self {
        let days = days.clamp(0, MAX_LICENSE_DAYS);
        Self {
            created_at: now,
            expires_at: now + Duration::days(days),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
