use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use tracing::warn;

use radar_api::ApiConfig;

const DEV_JWT_SECRET: &str = "dev-secret-change-me";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Server settings, read from `RADAR_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub seed_demo: bool,
    pub api: ApiConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_owned());

        let host = get("RADAR_HOST", "0.0.0.0");
        let port: u16 = get("RADAR_PORT", "3000")
            .parse()
            .context("RADAR_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        let jwt_secret = get("RADAR_JWT_SECRET", DEV_JWT_SECRET);
        if jwt_secret.is_empty() {
            anyhow::bail!("RADAR_JWT_SECRET must not be empty");
        }
        if jwt_secret == DEV_JWT_SECRET {
            warn!("RADAR_JWT_SECRET is unset; using the development secret");
        }

        let token_ttl_days: i64 = get("RADAR_TOKEN_TTL_DAYS", "30")
            .parse()
            .context("RADAR_TOKEN_TTL_DAYS must be a whole number of days")?;
        let max_upload_bytes = match var("RADAR_MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .parse()
                .context("RADAR_MAX_UPLOAD_BYTES must be a byte count")?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        // An explicitly empty command turns scanning off.
        let scan_command = match var("RADAR_SCAN_COMMAND") {
            Some(cmd) if cmd.trim().is_empty() => None,
            Some(cmd) => Some(cmd.trim().to_owned()),
            None => Some("clamscan".to_owned()),
        };

        let seed_demo = matches!(
            get("RADAR_SEED_DEMO", "false").to_ascii_lowercase().as_str(),
            "1" | "true" | "yes"
        );

        Ok(Self {
            addr,
            db_path: get("RADAR_DB_PATH", "radar.db").into(),
            seed_demo,
            api: ApiConfig {
                jwt_secret,
                token_ttl_days,
                upload_dir: get("RADAR_UPLOAD_DIR", "./uploads").into(),
                max_upload_bytes,
                scan_command,
            },
        })
    }
}
