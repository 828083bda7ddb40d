//! Xtream Codes API Types
//!
//! Response shapes served by `player_api.php`, as Xtream-compatible players expect them.

use serde::Serialize;

// ============================================================================
// Authentication Response Types
// ============================================================================

/// Response for `get_user_info` (and `player_api.php` without action)
#[derive(Debug, Serialize, Clone)]
pub struct XtreamAuthResponse {
    pub user_info: XtreamUserInfo,
    pub server_info: XtreamServerInfo,
}

/// User account information
#[derive(Debug, Serialize, Clone)]
pub struct XtreamUserInfo {
    pub username: String,
    pub password: String,
    pub message: String,
    pub auth: u8,
    pub status: String,
    /// Unix timestamp as string, `null` when the account never expires
    pub exp_date: Option<String>,
    pub is_trial: String,
    pub active_cons: String,
    pub created_at: String,
    pub max_connections: String,
    pub allowed_output_formats: Vec<String>,
}

/// Server information
#[derive(Debug, Serialize, Clone)]
pub struct XtreamServerInfo {
    pub url: String,
    pub port: String,
    pub https_port: String,
    pub server_protocol: String,
    pub rtmp_port: String,
    pub timezone: String,
    pub timestamp_now: i64,
    pub time_now: String,
}

/// Failed authentication envelope (`auth: 0`)
#[derive(Debug, Serialize, Clone)]
pub struct XtreamAuthFailure {
    pub user_info: XtreamDeniedUserInfo,
    pub error: String,
    pub code: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct XtreamDeniedUserInfo {
    pub auth: u8,
    pub status: String,
}

// ============================================================================
// Category Types
// ============================================================================

/// Category for live, VOD, or series
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct XtreamCategory {
    pub category_id: String,
    pub category_name: String,
    pub parent_id: i32,
}

// ============================================================================
// Stream Types
// ============================================================================

/// Stream descriptor for live, VOD and series listings
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct XtreamStream {
    pub num: usize,
    pub name: String,
    pub stream_type: String,
    pub stream_id: u64,
    pub stream_icon: String,
    pub epg_channel_id: String,
    pub category_id: String,
    /// Original stream URL from the playlist
    pub direct_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
}
