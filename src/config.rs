use std::env;
use std::path::PathBuf;

/// Remote mirror settings (GitHub contents API)
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Repository in `owner/name` form
    pub repo: String,
    pub token: Option<String>,
    pub branch: String,
    /// Path prefix inside the repository (e.g. "state/")
    pub path: String,
    pub api_url: String,
    pub timeout_secs: u64,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub public_host: String,
    pub server_protocol: String,
    pub timezone: String,

    // Storage
    pub data_dir: PathBuf,
    pub playlists_dir: PathBuf,
    pub mirror: Option<MirrorConfig>,

    // Credentials
    pub legacy_username: String,
    pub legacy_password: String,
    pub master_username: String,
    pub master_password: String,
    pub admin_key: String,

    // License
    pub license_days: i64,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let mirror = env::var("MIRROR_REPO")
            .ok()
            .filter(|repo| !repo.trim().is_empty())
            .map(|repo| MirrorConfig {
                repo,
                token: env::var("MIRROR_TOKEN").ok().filter(|t| !t.is_empty()),
                branch: env::var("MIRROR_BRANCH").unwrap_or_else(|_| "main".to_string()),
                path: env::var("MIRROR_PATH").unwrap_or_default(),
                api_url: env::var("MIRROR_API_URL")
                    .unwrap_or_else(|_| "https://api.github.com".to_string()),
                timeout_secs: env::var("MIRROR_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            });

        Self {
            // Server
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            public_host: env::var("PUBLIC_HOST").unwrap_or_else(|_| "localhost".to_string()),
            server_protocol: env::var("SERVER_PROTOCOL").unwrap_or_else(|_| "http".to_string()),
            timezone: env::var("TIMEZONE").unwrap_or_else(|_| "UTC".to_string()),

            // Storage
            data_dir: PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string())),
            playlists_dir: PathBuf::from(
                env::var("PLAYLISTS_DIR").unwrap_or_else(|_| "playlists".to_string()),
            ),
            mirror,

            // Credentials
            legacy_username: env::var("XTREAM_USER").unwrap_or_else(|_| "demo".to_string()),
            legacy_password: env::var("XTREAM_PASS").unwrap_or_else(|_| "demo".to_string()),
            master_username: env::var("MASTER_USER").unwrap_or_else(|_| "admin".to_string()),
            master_password: env::var("MASTER_PASS").unwrap_or_else(|_| "admin".to_string()),
            admin_key: env::var("ADMIN_KEY").unwrap_or_else(|_| "admin123".to_string()),

            // License
            license_days: env::var("LICENSE_DAYS")
                .unwrap_or_else(|_| "365".to_string())
                .parse()
                .unwrap_or(365),
        }
    }

    /// Configuration rooted at the given directories, with built-in credentials.
    /// Used by tests so they never depend on the process environment.
    #[cfg(test)]
    pub fn for_dirs(data_dir: impl Into<PathBuf>, playlists_dir: impl Into<PathBuf>) -> Self {
        Self {
            port: 3000,
            public_host: "localhost".to_string(),
            server_protocol: "http".to_string(),
            timezone: "UTC".to_string(),
            data_dir: data_dir.into(),
            playlists_dir: playlists_dir.into(),
            mirror: None,
            legacy_username: "demo".to_string(),
            legacy_password: "demo".to_string(),
            master_username: "admin".to_string(),
            master_password: "admin".to_string(),
            admin_key: "admin123".to_string(),
            license_days: 365,
        }
    }
}
