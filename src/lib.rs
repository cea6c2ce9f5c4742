pub mod args;
pub mod cache;
pub mod commands;
mod config;
pub mod context;
mod error;
pub mod model;
pub mod mutation;
pub mod session;
pub mod settings;
mod utils;
pub mod view;


pub use config::Config;
pub use context::AppContext;
pub use error::{Error, ErrorType, Result};
