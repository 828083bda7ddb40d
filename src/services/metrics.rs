//! Prometheus counters (default registry, exposed at `/metrics`)

use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

lazy_static! {
    pub static ref PLAYLIST_REQUESTS: IntCounter = register_int_counter!(
        "playlist_requests_total",
        "Playlists served through get.php"
    )
    .unwrap();

    pub static ref AUTH_DENIALS: IntCounterVec = register_int_counter_vec!(
        "auth_denials_total",
        "Denied player and admin requests by reason",
        &["reason"]
    )
    .unwrap();

    pub static ref ADMIN_OPERATIONS: IntCounterVec = register_int_counter_vec!(
        "admin_operations_total",
        "Successful admin mutations by operation",
        &["operation"]
    )
    .unwrap();
}
