pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod proxy;
pub mod router;
pub mod session;
pub mod storage;
pub mod transport;
