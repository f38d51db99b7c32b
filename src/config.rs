use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub forum: ForumConfig,
    pub sessions: SessionConfig,
    pub uploads: UploadConfig,
    pub cleanup: CleanupConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum request body size in bytes (default: 20MB)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    /// Allowed CORS origins (comma-separated, or "*" for any)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum idle connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Connection acquire timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

/// Length limits on user content, in characters
#[derive(Debug, Clone, Deserialize)]
pub struct ForumConfig {
    #[serde(default = "default_max_title_len")]
    pub max_title_len: usize,
    #[serde(default = "default_max_content_len")]
    pub max_content_len: usize,
    #[serde(default = "default_max_categories_len")]
    pub max_categories_len: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in minutes
    #[serde(default = "default_session_minutes")]
    pub lifetime_minutes: i64,
    /// Mark the session cookie `Secure`
    #[serde(default)]
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Directory holding uploaded images
    #[serde(default = "default_image_dir")]
    pub image_dir: String,
    /// Maximum size of a single image in bytes (default: 20MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
    /// Maximum image width or height in pixels
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CleanupConfig {
    /// Expired session sweep interval in seconds
    #[serde(default = "default_session_sweep")]
    pub session_interval_secs: u64,
    /// Unused category sweep interval in seconds
    #[serde(default = "default_category_sweep")]
    pub category_interval_secs: u64,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_max_body_size() -> usize { 20 * 1024 * 1024 } // 20MB
fn default_cors_origins() -> String { "*".to_string() }
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_title_len() -> usize { 200 }
fn default_max_content_len() -> usize { 3000 }
fn default_max_categories_len() -> usize { 200 }
fn default_session_minutes() -> i64 { 30 }
fn default_image_dir() -> String { "images".to_string() }
fn default_max_file_size() -> usize { 20 * 1024 * 1024 } // 20MB
fn default_max_dimension() -> u32 { 8192 }
fn default_session_sweep() -> u64 { 60 * 60 } // 1 hour
fn default_category_sweep() -> u64 { 6 * 60 * 60 } // 6 hours

/// Parse an environment variable, falling back to `default` when unset or invalid
fn env_or<T: std::str::FromStr>(key: &str, default: fn() -> T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(default)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            server: ServerConfig {
                host: std::env::var("HOST").unwrap_or_else(|_| default_host()),
                port: env_or("PORT", default_port),
                max_body_size: env_or("MAX_BODY_SIZE", default_max_body_size),
                cors_origins: std::env::var("CORS_ORIGINS")
                    .unwrap_or_else(|_| default_cors_origins()),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .context("DATABASE_URL must be set")?,
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", default_max_connections),
                min_connections: env_or("DATABASE_MIN_CONNECTIONS", default_min_connections),
                connect_timeout_secs: env_or("DATABASE_CONNECT_TIMEOUT", default_connect_timeout),
                idle_timeout_secs: env_or("DATABASE_IDLE_TIMEOUT", default_idle_timeout),
            },
            forum: ForumConfig {
                max_title_len: env_or("MAX_TITLE_LENGTH", default_max_title_len),
                max_content_len: env_or("MAX_CONTENT_LENGTH", default_max_content_len),
                max_categories_len: env_or("MAX_CATEGORIES_LENGTH", default_max_categories_len),
            },
            sessions: SessionConfig {
                lifetime_minutes: env_or("SESSION_MINUTES", default_session_minutes),
                secure_cookie: env_or("SECURE_COOKIES", || false),
            },
            uploads: UploadConfig {
                image_dir: std::env::var("IMAGE_DIR").unwrap_or_else(|_| default_image_dir()),
                max_file_size: env_or("MAX_FILE_SIZE", default_max_file_size),
                max_dimension: env_or("MAX_IMAGE_DIMENSION", default_max_dimension),
            },
            cleanup: CleanupConfig {
                session_interval_secs: env_or("SESSION_CLEANUP_SECS", default_session_sweep),
                category_interval_secs: env_or("CATEGORY_CLEANUP_SECS", default_category_sweep),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        std::env::set_var("FORUM_TEST_PORT", "not-a-port");
        assert_eq!(env_or("FORUM_TEST_PORT", default_port), 8080);
        std::env::set_var("FORUM_TEST_PORT", "9000");
        assert_eq!(env_or("FORUM_TEST_PORT", default_port), 9000);
        assert_eq!(env_or("FORUM_TEST_UNSET", default_session_minutes), 30);
    }
}
