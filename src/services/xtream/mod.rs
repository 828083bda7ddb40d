//! Xtream Codes compatibility
//!
//! Xtream Codes is the de facto IPTV panel API. Third-party players log in with
//!
//! ```text
//! http://server:port/player_api.php?username=X&password=Y
//! ```
//!
//! and download playlists from
//!
//! ```text
//! http://server:port/get.php?username=X&password=Y&type=m3u_plus
//! ```
//!
//! This module holds the response types and the listing logic that turns a
//! parsed playlist into Xtream categories and stream descriptors.

pub mod catalog;
pub mod types;

pub use catalog::{Listing, XtreamCatalog};
pub use types::{
    XtreamAuthFailure, XtreamAuthResponse, XtreamCategory, XtreamDeniedUserInfo,
    XtreamServerInfo, XtreamStream, XtreamUserInfo,
};
