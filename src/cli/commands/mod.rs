pub mod auth;
pub mod proxy;
pub mod route;
pub mod taxonomy;
