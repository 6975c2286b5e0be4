pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod io;
pub mod news;
pub mod notify;
pub mod paths;
pub mod privileges;
pub mod probe;
pub mod render;
pub mod resources;
pub mod workspace;

pub use error::{OgError, Result};
