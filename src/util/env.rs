//! Environment helpers: centralized dotenv loading and ergonomic getters.
//! Call `init_env()` once early in each binary (or rely on lazy Once).
use std::sync::Once;

static INIT: Once = Once::new();

/// Load .env if present, exactly once. Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        let _ = dotenv::dotenv();
    });
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolve the database DSN: an explicit CLI value wins, then DATABASE_URL.
pub fn db_url(cli_override: Option<&str>) -> anyhow::Result<String> {
    if let Some(url) = cli_override {
        if !url.trim().is_empty() {
            return Ok(url.to_string());
        }
    }
    env_opt("DATABASE_URL").ok_or_else(|| {
        anyhow::anyhow!("database URL not configured; pass --db-url or set DATABASE_URL")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_override_wins() {
        let url = db_url(Some("postgres://cli/db")).unwrap();
        assert_eq!(url, "postgres://cli/db");
    }

    #[test]
    fn blank_override_falls_through() {
        if std::env::var("DATABASE_URL").is_err() {
            assert!(db_url(Some("  ")).is_err());
        }
    }
}
