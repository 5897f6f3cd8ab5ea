use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Root served as static files; uploads land in `<public_dir>/uploads`.
    pub public_dir: PathBuf,
    pub session_secret: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let raw_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://storefront.db".into());
        let port = parse_or("PORT", 3000)?;
        let public_dir = env::var("PUBLIC_DIR").unwrap_or_else(|_| "public".into());
        let session_secret = env::var("SESSION_SECRET").context("SESSION_SECRET must be set")?;
        let max_upload_bytes = parse_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;

        Ok(Config {
            database_url: normalize_sqlite_url(&raw_url),
            port,
            public_dir: PathBuf::from(public_dir),
            session_secret,
            max_upload_bytes,
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid {key} value: {raw}")),
        Err(_) => Ok(default),
    }
}

/// Accepts `sqlite:foo.db`, `sqlite://foo.db`, `file:foo.db` and bare paths.
pub fn normalize_sqlite_url(input: &str) -> String {
    if input.starts_with("sqlite://") || input.starts_with("sqlite::memory:") {
        return input.to_string();
    }
    if let Some(rest) = input.strip_prefix("sqlite:") {
        return format!("sqlite://{}", rest.trim_start_matches('/'));
    }
    if let Some(rest) = input.strip_prefix("file:") {
        return format!("sqlite://{rest}");
    }
    format!("sqlite://{input}")
}
