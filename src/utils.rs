pub mod config;
pub mod errors;
pub mod http_utils;
pub mod middleware;
