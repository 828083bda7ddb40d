pub mod account_store;
pub mod auth;
pub mod classifier;
pub mod m3u_parser;
pub mod metrics;
pub mod playlist_assembler;
pub mod storage;
pub mod xtream;
