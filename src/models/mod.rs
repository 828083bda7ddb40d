pub mod account;
pub mod playlist;

pub use account::{Account, Admin, AdminSummary, License, Settings};
pub use playlist::{Category, ContentType, MediaRecord, SeriesInfo, DEFAULT_CATEGORY};
