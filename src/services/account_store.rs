//! Account, admin, settings and license persistence
//!
//! Every document is read-modify-written as a whole. Within the process each
//! document is serialized by its own mutex; operations touching several
//! documents lock them in the order accounts → admins → settings.

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{Account, Admin, License, Settings};
use crate::services::auth::AdminIdentity;
use crate::services::storage::{StorageBackend, StorageError};

pub const ACCOUNTS_FILE: &str = "accounts.json";
pub const ADMINS_FILE: &str = "admins.json";
pub const SETTINGS_FILE: &str = "settings.json";
pub const LICENSE_FILE: &str = "license.json";

/// Input for account creation
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub lists: Vec<String>,
    pub plan_label: Option<String>,
}

/// How an account's expiry changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryChange {
    /// Extend from the later of now and the current expiry
    ExtendDays(i64),
    ExtendHours(i64),
    SetAt(DateTime<Utc>),
}

impl ExpiryChange {
    /// New expiry; extensions past the representable range are rejected
    pub fn apply(
        self,
        current: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> AppResult<DateTime<Utc>> {
        let base = current.filter(|c| *c > now).unwrap_or(now);
        let (delta, field) = match self {
            ExpiryChange::ExtendDays(days) => (Duration::try_days(days), "days"),
            ExpiryChange::ExtendHours(hours) => (Duration::try_hours(hours), "hours"),
            ExpiryChange::SetAt(at) => return Ok(at),
        };

        delta
            .and_then(|delta| base.checked_add_signed(delta))
            .ok_or_else(|| AppError::Validation(format!("{} is out of range", field)))
    }
}

/// Partial settings update
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub global_account_limit: Option<u32>,
    pub allow_admin_signup: Option<bool>,
}

/// Flat-file store for accounts, admins, settings and the license
pub struct AccountStore {
    backend: Arc<dyn StorageBackend>,
    /// Configured master login; never available as a reseller name
    master_username: String,
    accounts_lock: Mutex<()>,
    admins_lock: Mutex<()>,
    settings_lock: Mutex<()>,
    license_lock: Mutex<()>,
}

impl AccountStore {
    pub fn new(backend: Arc<dyn StorageBackend>, master_username: impl Into<String>) -> Self {
        info!("Account store backend: {}", backend.describe());
        Self {
            backend,
            master_username: master_username.into(),
            accounts_lock: Mutex::new(()),
            admins_lock: Mutex::new(()),
            settings_lock: Mutex::new(()),
            license_lock: Mutex::new(()),
        }
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }

    // ========================================================================
    // Document I/O
    // ========================================================================

    /// Read a document; never fails.
    ///
    /// Missing or corrupt documents yield `T::default()` and are rewritten as
    /// such. Backend I/O failures also yield the default but leave the file alone.
    async fn read_document<T>(&self, name: &str) -> T
    where
        T: DeserializeOwned + Serialize + Default,
    {
        let contents = match self.backend.read(name).await {
            Ok(Some(contents)) => contents,
            Ok(None) => {
                self.reinitialize::<T>(name).await;
                return T::default();
            }
            Err(e) => {
                warn!("Failed to read {}: {}", name, e);
                return T::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(value) => value,
            Err(e) => {
                warn!("Corrupt {} ({}), reinitializing", name, e);
                self.reinitialize::<T>(name).await;
                T::default()
            }
        }
    }

    /// Read a document that is about to be rewritten.
    ///
    /// Missing or corrupt documents still start over from `T::default()`, but
    /// a backend failure is returned so the caller never overwrites data it
    /// could not read.
    async fn read_document_for_update<T>(&self, name: &str) -> Result<T, StorageError>
    where
        T: DeserializeOwned + Default,
    {
        let Some(contents) = self.backend.read(name).await? else {
            return Ok(T::default());
        };

        match serde_json::from_str(&contents) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("Corrupt {} ({}), starting from empty", name, e);
                Ok(T::default())
            }
        }
    }

    async fn reinitialize<T>(&self, name: &str)
    where
        T: Serialize + Default,
    {
        if let Err(e) = self.write_document(name, &T::default()).await {
            warn!("Failed to initialize {}: {}", name, e);
        }
    }

    async fn write_document<T: Serialize + ?Sized>(
        &self,
        name: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let contents = serde_json::to_string_pretty(value).map_err(|source| StorageError::Json {
            name: name.to_string(),
            source,
        })?;
        self.backend.write(name, &contents).await
    }

    // ========================================================================
    // Collections
    // ========================================================================

    pub async fn read_accounts(&self) -> Vec<Account> {
        let _guard = self.accounts_lock.lock().await;
        self.read_document(ACCOUNTS_FILE).await
    }

    pub async fn save_accounts(&self, accounts: &[Account]) -> Result<(), StorageError> {
        let _guard = self.accounts_lock.lock().await;
        self.write_document(ACCOUNTS_FILE, accounts).await
    }

    /// Exact match on both username and password
    pub async fn find_account(&self, username: &str, password: &str) -> Option<Account> {
        self.read_accounts()
            .await
            .into_iter()
            .find(|a| a.username == username && a.password == password)
    }

    pub async fn read_admins(&self) -> Vec<Admin> {
        let _guard = self.admins_lock.lock().await;
        self.read_document(ADMINS_FILE).await
    }

    pub async fn save_admins(&self, admins: &[Admin]) -> Result<(), StorageError> {
        let _guard = self.admins_lock.lock().await;
        self.write_document(ADMINS_FILE, admins).await
    }

    /// Exact match on both username and password
    pub async fn find_admin(&self, username: &str, password: &str) -> Option<Admin> {
        self.read_admins()
            .await
            .into_iter()
            .find(|a| a.username == username && a.password == password)
    }

    pub async fn read_settings(&self) -> Settings {
        let _guard = self.settings_lock.lock().await;
        self.read_document(SETTINGS_FILE).await
    }

    pub async fn save_settings(&self, settings: &Settings) -> Result<(), StorageError> {
        let _guard = self.settings_lock.lock().await;
        self.write_document(SETTINGS_FILE, settings).await
    }

    /// Load the license, creating it on first start.
    ///
    /// An unreadable or corrupt license is an error rather than a reset, so
    /// the window cannot be restarted by damaging the file.
    pub async fn load_or_create_license(
        &self,
        now: DateTime<Utc>,
        days: i64,
    ) -> Result<License, StorageError> {
        let _guard = self.license_lock.lock().await;

        if let Some(contents) = self.backend.read(LICENSE_FILE).await? {
            return serde_json::from_str(&contents).map_err(|source| StorageError::Json {
                name: LICENSE_FILE.to_string(),
                source,
            });
        }

        let license = License::starting_at(now, days);
        self.write_document(LICENSE_FILE, &license).await?;
        info!("License created, valid until {}", license.expires_at.to_rfc3339());
        Ok(license)
    }

    // ========================================================================
    // Account operations
    // ========================================================================

    /// Accounts visible to the caller: all for a master, own accounts otherwise
    pub async fn list_accounts(&self, actor: &AdminIdentity) -> Vec<Account> {
        self.read_accounts()
            .await
            .into_iter()
            .filter(|a| actor.is_master || a.created_by == actor.username)
            .collect()
    }

    /// Create an account, charging one credit to non-master resellers
    pub async fn create_account(
        &self,
        actor: &AdminIdentity,
        new: NewAccount,
        now: DateTime<Utc>,
    ) -> AppResult<Account> {
        let username = new.username.trim().to_string();
        if username.is_empty() || new.password.is_empty() {
            return Err(AppError::Validation(
                "username and password are required".to_string(),
            ));
        }

        let settings: Settings = {
            let _settings_guard = self.settings_lock.lock().await;
            self.read_document_for_update(SETTINGS_FILE).await?
        };

        let _accounts_guard = self.accounts_lock.lock().await;
        let mut accounts: Vec<Account> = self.read_document_for_update(ACCOUNTS_FILE).await?;

        if accounts.iter().any(|a| a.username == username) {
            return Err(AppError::AccountExists(username));
        }

        if settings.global_account_limit > 0
            && accounts.len() >= settings.global_account_limit as usize
        {
            return Err(AppError::GlobalLimitReached);
        }

        let _admins_guard = self.admins_lock.lock().await;
        let mut admins: Vec<Admin> = self.read_document_for_update(ADMINS_FILE).await?;

        let charged = if actor.is_master {
            None
        } else {
            let reseller = admins
                .iter_mut()
                .find(|a| a.username == actor.username)
                .ok_or_else(|| AppError::AdminNotFound(actor.username.clone()))?;
            if reseller.credits == 0 {
                return Err(AppError::InsufficientCredits);
            }
            reseller.credits -= 1;
            Some(reseller.credits)
        };

        let account = Account {
            username,
            password: new.password,
            created_at: now,
            expires_at: new.expires_at,
            lists: new.lists,
            created_by: actor.username.clone(),
            plan_label: new.plan_label,
        };

        accounts.push(account.clone());
        self.write_document(ACCOUNTS_FILE, &accounts).await?;

        if let Some(remaining) = charged {
            if let Err(e) = self.write_document(ADMINS_FILE, &admins).await {
                // Roll back so no account exists without its credit being charged
                accounts.pop();
                if let Err(rollback) = self.write_document(ACCOUNTS_FILE, &accounts).await {
                    warn!("Failed to roll back account {}: {}", account.username, rollback);
                }
                return Err(e.into());
            }
            info!(
                "Account {} created by {} ({} credits left)",
                account.username, actor.username, remaining
            );
        } else {
            info!("Account {} created by {}", account.username, actor.username);
        }

        Ok(account)
    }

    pub async fn delete_account(&self, actor: &AdminIdentity, username: &str) -> AppResult<()> {
        let _guard = self.accounts_lock.lock().await;
        let mut accounts: Vec<Account> = self.read_document_for_update(ACCOUNTS_FILE).await?;

        let position = accounts
            .iter()
            .position(|a| a.username == username && actor.can_manage(a))
            .ok_or_else(|| AppError::AccountNotFound(username.to_string()))?;

        accounts.remove(position);
        self.write_document(ACCOUNTS_FILE, &accounts).await?;

        info!("Account {} deleted by {}", username, actor.username);
        Ok(())
    }

    /// Change expiry and/or entitlements of an existing account
    pub async fn update_account(
        &self,
        actor: &AdminIdentity,
        username: &str,
        expiry: Option<ExpiryChange>,
        lists: Option<Vec<String>>,
        now: DateTime<Utc>,
    ) -> AppResult<Account> {
        if expiry.is_none() && lists.is_none() {
            return Err(AppError::Validation(
                "one of days, hours, expiresAt or lists is required".to_string(),
            ));
        }

        let _guard = self.accounts_lock.lock().await;
        let mut accounts: Vec<Account> = self.read_document_for_update(ACCOUNTS_FILE).await?;

        let account = accounts
            .iter_mut()
            .find(|a| a.username == username && actor.can_manage(a))
            .ok_or_else(|| AppError::AccountNotFound(username.to_string()))?;

        if let Some(change) = expiry {
            account.expires_at = Some(change.apply(account.expires_at, now)?);
        }
        if let Some(lists) = lists {
            account.lists = lists;
        }
        let updated = account.clone();

        self.write_document(ACCOUNTS_FILE, &accounts).await?;

        info!(
            "Account {} updated by {} (expires {:?})",
            username, actor.username, updated.expires_at
        );
        Ok(updated)
    }

    // ========================================================================
    // Admin operations
    // ========================================================================

    pub async fn create_admin(
        &self,
        actor: &AdminIdentity,
        username: &str,
        password: &str,
        credits: u32,
        is_master: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Admin> {
        actor.require_master()?;
        self.insert_admin(username, password, credits, is_master, now)
            .await
    }

    /// Self-service reseller registration, when enabled in settings
    pub async fn signup_admin(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Admin> {
        if !self.read_settings().await.allow_admin_signup {
            return Err(AppError::Forbidden);
        }
        self.insert_admin(username, password, 0, false, now).await
    }

    async fn insert_admin(
        &self,
        username: &str,
        password: &str,
        credits: u32,
        is_master: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Admin> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "username and password are required".to_string(),
            ));
        }

        if username == self.master_username {
            return Err(AppError::AdminExists(username.to_string()));
        }

        let _guard = self.admins_lock.lock().await;
        let mut admins: Vec<Admin> = self.read_document_for_update(ADMINS_FILE).await?;

        if admins.iter().any(|a| a.username == username) {
            return Err(AppError::AdminExists(username.to_string()));
        }

        let admin = Admin {
            username: username.to_string(),
            password: password.to_string(),
            is_master,
            credits,
            created_at: Some(now),
        };
        admins.push(admin.clone());
        self.write_document(ADMINS_FILE, &admins).await?;

        info!("Admin {} created (master: {}, credits: {})", username, is_master, credits);
        Ok(admin)
    }

    pub async fn set_admin_credits(
        &self,
        actor: &AdminIdentity,
        username: &str,
        credits: u32,
    ) -> AppResult<Admin> {
        actor.require_master()?;

        let _guard = self.admins_lock.lock().await;
        let mut admins: Vec<Admin> = self.read_document_for_update(ADMINS_FILE).await?;

        let admin = admins
            .iter_mut()
            .find(|a| a.username == username)
            .ok_or_else(|| AppError::AdminNotFound(username.to_string()))?;
        admin.credits = credits;
        let updated = admin.clone();

        self.write_document(ADMINS_FILE, &admins).await?;

        info!("Admin {} credits set to {} by {}", username, credits, actor.username);
        Ok(updated)
    }

    pub async fn update_settings(
        &self,
        actor: &AdminIdentity,
        patch: SettingsPatch,
    ) -> AppResult<Settings> {
        actor.require_master()?;

        let _guard = self.settings_lock.lock().await;
        let mut settings: Settings = self.read_document_for_update(SETTINGS_FILE).await?;

        if let Some(limit) = patch.global_account_limit {
            settings.global_account_limit = limit;
        }
        if let Some(allow) = patch.allow_admin_signup {
            settings.allow_admin_signup = allow;
        }

        self.write_document(SETTINGS_FILE, &settings).await?;

        info!("Settings updated by {}: {:?}", actor.username, settings);
        Ok(settings)
    }
}
