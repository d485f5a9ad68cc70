use std::net::IpAddr;

use anyhow::{Result, bail};

use super::stage::Stage;

pub const MIN_PRODUCTION_SECRET_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub stage: Stage,
    pub backend_server: BackendServer,
    pub database: Database,
    pub admin_area: AdminArea,
    pub session: Session,
    pub uploads: Uploads,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
    pub static_dir: String,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct AdminArea {
    pub url_prefix: String,
    /// Empty means every address may reach the admin area.
    pub allowed_ips: Vec<IpAddr>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct Uploads {
    pub dir: String,
}

#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl DotEnvyConfig {
    /// Startup checks that must pass before the listener binds.
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            bail!("DATABASE_URL must be set");
        }

        if self.stage.is_production() {
            if self.session.secret.is_empty() {
                bail!("SECRET_KEY must be set in production");
            }
            if self.session.secret.len() < MIN_PRODUCTION_SECRET_BYTES {
                bail!(
                    "SECRET_KEY must be at least {MIN_PRODUCTION_SECRET_BYTES} bytes in production"
                );
            }
        }

        let prefix = &self.admin_area.url_prefix;
        if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
            bail!("ADMIN_URL_PREFIX must look like `/segment` (got `{prefix}`)");
        }

        if self.session.ttl_minutes <= 0 {
            bail!("SESSION_TTL_MINUTES must be positive");
        }

        if self.backend_server.body_limit == 0 {
            bail!("SERVER_BODY_LIMIT must be positive");
        }

        Ok(())
    }
}
