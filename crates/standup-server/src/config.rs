use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};

use standup_types::models::{AdmissionPolicy, StoreErrorPolicy};

/// Runtime configuration, read once at startup from the environment
/// (a `.env` file is honored when present).
#[derive(Debug, Clone)]
pub struct Config {
    /// Bare account address the service signs in as.
    pub jid: String,
    pub password: String,
    pub db_path: PathBuf,
    pub http_addr: SocketAddr,
    /// Public base URL advertised in help replies.
    pub base_url: String,
    pub admission: AdmissionPolicy,
    pub store_errors: StoreErrorPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let jid = env::var("STANDUP_JID").context("STANDUP_JID must be set")?;
        if !jid.contains('@') {
            bail!("STANDUP_JID must be a full address (user@domain), got '{}'", jid);
        }
        let password = env::var("STANDUP_PASSWORD").context("STANDUP_PASSWORD must be set")?;

        let db_path = env::var("STANDUP_DB_PATH")
            .unwrap_or_else(|_| "standup.db".to_string())
            .into();

        let http_addr: SocketAddr = env::var("STANDUP_HTTP_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .map_err(|e| anyhow!("invalid STANDUP_HTTP_ADDR: {}", e))?;

        let base_url = env::var("STANDUP_BASE_URL")
            .unwrap_or_else(|_| format!("http://{}", http_addr));

        let admission = match env::var("STANDUP_ADMISSION") {
            Ok(s) => s
                .parse::<AdmissionPolicy>()
                .map_err(|e| anyhow!("invalid STANDUP_ADMISSION: {}", e))?,
            Err(_) => AdmissionPolicy::Permissive,
        };

        let store_errors = match env::var("STANDUP_STORE_ERRORS") {
            Ok(s) => s
                .parse::<StoreErrorPolicy>()
                .map_err(|e| anyhow!("invalid STANDUP_STORE_ERRORS: {}", e))?,
            Err(_) => StoreErrorPolicy::Report,
        };

        Ok(Self {
            jid,
            password,
            db_path,
            http_addr,
            base_url,
            admission,
            store_errors,
        })
    }
}
