pub mod cache;
pub mod config;
pub mod healthcheck;
pub mod render;
pub mod serve;
pub mod supervise;
