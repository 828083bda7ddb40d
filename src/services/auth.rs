//! Player and admin authorization
//!
//! Player requests resolve to a [`PlayerAccess`] or a denial, checked in order:
//! license window, legacy shared secret, account lookup, account expiry.
//! Admin requests resolve to an [`AdminIdentity`] from a shared key or
//! Basic-Auth credentials.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{Account, License};
use crate::services::account_store::AccountStore;
use crate::services::metrics;

/// Outcome of a successful player authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerAccess {
    /// Legacy shared secret: sees every source
    Legacy { username: String, password: String },
    /// Regular account, scoped to its lists
    Account(Account),
}

impl PlayerAccess {
    /// Source selection for the playlist assembler (empty = all)
    pub fn lists(&self) -> &[String] {
        match self {
            PlayerAccess::Legacy { .. } => &[],
            PlayerAccess::Account(account) => &account.lists,
        }
    }

    pub fn username(&self) -> &str {
        match self {
            PlayerAccess::Legacy { username, .. } => username,
            PlayerAccess::Account(account) => &account.username,
        }
    }

    pub fn password(&self) -> &str {
        match self {
            PlayerAccess::Legacy { password, .. } => password,
            PlayerAccess::Account(account) => &account.password,
        }
    }
}

/// Authorize a player request
pub async fn authorize_player(
    config: &Config,
    license: &License,
    store: &AccountStore,
    username: &str,
    password: &str,
    now: DateTime<Utc>,
) -> AppResult<PlayerAccess> {
    let result = check_player(config, license, store, username, password, now).await;
    if let Err(ref e) = result {
        warn!("Player access denied for '{}': {}", username, e.code());
        metrics::AUTH_DENIALS.with_label_values(&[e.code()]).inc();
    }
    result
}

async fn check_player(
    config: &Config,
    license: &License,
    store: &AccountStore,
    username: &str,
    password: &str,
    now: DateTime<Utc>,
) -> AppResult<PlayerAccess> {
    if license.is_expired(now) {
        return Err(AppError::LicenseExpired);
    }

    if username == config.legacy_username && password == config.legacy_password {
        return Ok(PlayerAccess::Legacy {
            username: username.to_string(),
            password: password.to_string(),
        });
    }

    let account = store
        .find_account(username, password)
        .await
        .ok_or(AppError::InvalidCredentials)?;

    if account.is_expired(now) {
        return Err(AppError::AccountExpired);
    }

    Ok(PlayerAccess::Account(account))
}

/// Authenticated admin or reseller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub username: String,
    pub is_master: bool,
}

impl AdminIdentity {
    /// Masters manage every account, resellers only their own
    pub fn can_manage(&self, account: &Account) -> bool {
        self.is_master || account.created_by == self.username
    }

    pub fn require_master(&self) -> AppResult<()> {
        if self.is_master {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// Credentials presented to the admin API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCredentials {
    Key(String),
    Basic { username: String, password: String },
}

/// Decode an `Authorization: Basic ...` header value
pub fn parse_basic_auth(header: &str) -> Option<AdminCredentials> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some(AdminCredentials::Basic {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Resolve presented admin credentials to an identity.
///
/// Each credential is tried in order and the first valid one wins, so a stale
/// key does not shadow valid Basic-Auth credentials.
pub async fn authorize_admin(
    config: &Config,
    store: &AccountStore,
    credentials: &[AdminCredentials],
) -> AppResult<AdminIdentity> {
    for credential in credentials {
        if let Some(identity) = resolve_admin(config, store, credential).await {
            return Ok(identity);
        }
    }

    metrics::AUTH_DENIALS
        .with_label_values(&[AppError::Unauthorized.code()])
        .inc();
    Err(AppError::Unauthorized)
}

async fn resolve_admin(
    config: &Config,
    store: &AccountStore,
    credential: &AdminCredentials,
) -> Option<AdminIdentity> {
    match credential {
        AdminCredentials::Key(key) => (*key == config.admin_key).then(|| AdminIdentity {
            username: config.master_username.clone(),
            is_master: true,
        }),
        // The master login never falls through to the admins file
        AdminCredentials::Basic { username, password } if *username == config.master_username => {
            (*password == config.master_password).then(|| AdminIdentity {
                username: username.clone(),
                is_master: true,
            })
        }
        AdminCredentials::Basic { username, password } => store
            .find_admin(username, password)
            .await
            .map(|admin| AdminIdentity {
                username: admin.username,
                is_master: admin.is_master,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::account_store::NewAccount;
    use crate::services::storage::LocalStorage;
    use chrono::Duration;
    use std::sync::Arc;

    struct Fixture {
        _dir: tempfile::TempDir,
        config: Config,
        store: AccountStore,
        license: License,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::for_dirs(dir.path(), dir.path());
        let store = AccountStore::new(
            Arc::new(LocalStorage::new(dir.path())),
            &config.master_username,
        );
        let license = License::starting_at(Utc::now() - Duration::days(1), 30);
        Fixture {
            _dir: dir,
            config,
            store,
            license,
        }
    }

    fn master() -> AdminIdentity {
        AdminIdentity {
            username: "admin".to_string(),
            is_master: true,
        }
    }

    async fn add_account(f: &Fixture, username: &str, expires_at: Option<DateTime<Utc>>) {
        f.store
            .create_account(
                &master(),
                NewAccount {
                    username: username.to_string(),
                    password: "pw".to_string(),
                    expires_at,
                    lists: vec!["news".to_string()],
                    plan_label: None,
                },
                Utc::now(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_legacy_secret_sees_everything() {
        let f = fixture().await;
        let access = authorize_player(&f.config, &f.license, &f.store, "demo", "demo", Utc::now())
            .await
            .unwrap();

        assert!(matches!(access, PlayerAccess::Legacy { .. }));
        assert!(access.lists().is_empty());
    }

    #[tokio::test]
    async fn test_license_checked_first() {
        let f = fixture().await;
        let after = f.license.expires_at + Duration::seconds(1);

        let err = authorize_player(&f.config, &f.license, &f.store, "demo", "demo", after)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LicenseExpired));
    }

    #[tokio::test]
    async fn test_unknown_credentials() {
        let f = fixture().await;
        add_account(&f, "ana", None).await;

        let err = authorize_player(&f.config, &f.license, &f.store, "ana", "wrong", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_account_scoped_access() {
        let f = fixture().await;
        add_account(&f, "ana", None).await;

        let access = authorize_player(&f.config, &f.license, &f.store, "ana", "pw", Utc::now())
            .await
            .unwrap();
        assert_eq!(access.username(), "ana");
        assert_eq!(access.lists(), &["news".to_string()]);
    }

    #[tokio::test]
    async fn test_account_expiry_boundary() {
        let f = fixture().await;
        let expires_at = Utc::now() + Duration::hours(1);
        add_account(&f, "ana", Some(expires_at)).await;

        assert!(
            authorize_player(&f.config, &f.license, &f.store, "ana", "pw", expires_at)
                .await
                .is_ok()
        );
        let err = authorize_player(
            &f.config,
            &f.license,
            &f.store,
            "ana",
            "pw",
            expires_at + Duration::microseconds(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::AccountExpired));
    }

    #[test]
    fn test_parse_basic_auth() {
        let header = format!("Basic {}", STANDARD.encode("bob:p:w"));
        assert_eq!(
            parse_basic_auth(&header),
            Some(AdminCredentials::Basic {
                username: "bob".to_string(),
                password: "p:w".to_string(),
            })
        );
        assert_eq!(parse_basic_auth("Bearer abc"), None);
        assert_eq!(parse_basic_auth("Basic !!!"), None);
    }

    #[tokio::test]
    async fn test_admin_resolution() {
        let f = fixture().await;
        f.store
            .create_admin(&master(), "bob", "pw", 3, false, Utc::now())
            .await
            .unwrap();

        let by_key = authorize_admin(
            &f.config,
            &f.store,
            &[AdminCredentials::Key("admin123".into())],
        )
        .await
        .unwrap();
        assert!(by_key.is_master);

        let by_master = authorize_admin(
            &f.config,
            &f.store,
            &[AdminCredentials::Basic {
                username: "admin".into(),
                password: "admin".into(),
            }],
        )
        .await
        .unwrap();
        assert!(by_master.is_master);

        let reseller = authorize_admin(
            &f.config,
            &f.store,
            &[AdminCredentials::Basic {
                username: "bob".into(),
                password: "pw".into(),
            }],
        )
        .await
        .unwrap();
        assert_eq!(reseller.username, "bob");
        assert!(!reseller.is_master);

        for bad in [
            vec![],
            vec![AdminCredentials::Key("nope".into())],
            vec![AdminCredentials::Basic {
                username: "bob".into(),
                password: "bad".into(),
            }],
        ] {
            let err = authorize_admin(&f.config, &f.store, &bad).await.unwrap_err();
            assert!(matches!(err, AppError::Unauthorized));
        }
    }

    #[tokio::test]
    async fn test_wrong_key_falls_back_to_basic() {
        let f = fixture().await;
        let identity = authorize_admin(
            &f.config,
            &f.store,
            &[
                AdminCredentials::Key("stale".into()),
                AdminCredentials::Basic {
                    username: "admin".into(),
                    password: "admin".into(),
                },
            ],
        )
        .await
        .unwrap();

        assert!(identity.is_master);
    }

    #[tokio::test]
    async fn test_master_login_ignores_admins_file() {
        let f = fixture().await;
        f.store
            .save_admins(&[crate::models::Admin {
                username: "admin".into(),
                password: "evil".into(),
                is_master: false,
                credits: 0,
                created_at: None,
            }])
            .await
            .unwrap();

        let err = authorize_admin(
            &f.config,
            &f.store,
            &[AdminCredentials::Basic {
                username: "admin".into(),
                password: "evil".into(),
            }],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }
}
