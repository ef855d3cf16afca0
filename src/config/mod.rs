// ABOUTME: Settings document loading, validation, and generation for the watch daemon

pub mod generate;
pub mod settings;

pub use generate::{generate, DEFAULT_CONFIG};
pub use settings::{ConfigError, Settings, SUPPORTED_HOSTS, TOKEN_ENV};
