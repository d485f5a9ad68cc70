use std::net::IpAddr;

use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose};
use rand::RngCore;
use tracing::warn;

use super::{
    config_model::{
        AdminArea, BackendServer, BootstrapAdmin, Database, DotEnvyConfig, Session, Uploads,
    },
    stage::Stage,
};

pub const DEFAULT_ADMIN_URL_PREFIX: &str = "/gestao-exclusiva-netfyber";

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    from_lookup(|key| std::env::var(key).ok())
}

/// Builds the configuration from any key lookup; `load` passes the process env.
pub fn from_lookup<F>(lookup: F) -> Result<DotEnvyConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let stage = match var("STAGE") {
        Some(raw) => Stage::try_from(raw.as_str()).context("STAGE is invalid")?,
        None => Stage::default(),
    };

    let backend_server = BackendServer {
        port: var("SERVER_PORT")
            .unwrap_or_else(|| "5000".to_string())
            .parse()
            .context("SERVER_PORT is invalid")?,
        body_limit: var("SERVER_BODY_LIMIT")
            .unwrap_or_else(|| "8".to_string())
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: var("SERVER_TIMEOUT")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
        static_dir: var("STATIC_DIR").unwrap_or_else(|| "static".to_string()),
    };

    let database = Database {
        url: var("DATABASE_URL").unwrap_or_default(),
    };

    let url_prefix = var("ADMIN_URL_PREFIX")
        .map(|prefix| prefix.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_ADMIN_URL_PREFIX.to_string());

    let admin_area = AdminArea {
        url_prefix,
        allowed_ips: parse_ip_list(&var("ADMIN_IPS").unwrap_or_default())?,
    };

    let secret = match var("SECRET_KEY") {
        Some(secret) => secret,
        None if stage.is_production() => String::new(),
        None => {
            warn!(%stage, "config: SECRET_KEY not set, generated an ephemeral session secret");
            generate_secret()
        }
    };

    let session = Session {
        secret,
        ttl_minutes: var("SESSION_TTL_MINUTES")
            .unwrap_or_else(|| "120".to_string())
            .parse()
            .context("SESSION_TTL_MINUTES is invalid")?,
    };

    let uploads = Uploads {
        dir: var("UPLOAD_DIR").unwrap_or_else(|| "static/uploads/blog".to_string()),
    };

    let bootstrap_admin = match (var("ADMIN_USERNAME"), var("ADMIN_PASSWORD")) {
        (Some(username), Some(password)) => Some(BootstrapAdmin {
            email: var("ADMIN_EMAIL").unwrap_or_else(|| format!("{username}@localhost")),
            username,
            password,
        }),
        _ => None,
    };

    Ok(DotEnvyConfig {
        stage,
        backend_server,
        database,
        admin_area,
        session,
        uploads,
        bootstrap_admin,
    })
}

fn parse_ip_list(raw: &str) -> Result<Vec<IpAddr>> {
    raw.split(',')
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(|ip| {
            ip.parse::<IpAddr>()
                .with_context(|| format!("ADMIN_IPS contains an invalid address: {ip}"))
        })
        .collect()
}

fn generate_secret() -> String {
    let mut bytes = [0u8; 48];
    rand::thread_rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn applies_defaults() {
        let config = from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/site")])).unwrap();

        assert_eq!(config.stage, Stage::Development);
        assert_eq!(config.backend_server.port, 5000);
        assert_eq!(config.backend_server.body_limit, 8);
        assert_eq!(config.backend_server.timeout, 30);
        assert_eq!(config.admin_area.url_prefix, DEFAULT_ADMIN_URL_PREFIX);
        assert!(config.admin_area.allowed_ips.is_empty());
        assert_eq!(config.session.ttl_minutes, 120);
        assert_eq!(config.uploads.dir, "static/uploads/blog");
        assert!(config.bootstrap_admin.is_none());
        assert!(config.session.secret.len() >= 32);
        config.validate().unwrap();
    }

    #[test]
    fn parses_admin_ips_and_prefix() {
        let config = from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/site"),
            ("ADMIN_IPS", "127.0.0.1, ::1 ,,10.0.0.7"),
            ("ADMIN_URL_PREFIX", "/painel/"),
        ]))
        .unwrap();

        assert_eq!(config.admin_area.url_prefix, "/painel");
        assert_eq!(config.admin_area.allowed_ips.len(), 3);
        config.validate().unwrap();
    }

    #[test]
    fn rejects_invalid_ip() {
        let err = from_lookup(lookup_from(&[("ADMIN_IPS", "127.0.0.1,not-an-ip")])).unwrap_err();
        assert!(err.to_string().contains("ADMIN_IPS"));
    }

    #[test]
    fn production_requires_long_secret() {
        let missing = from_lookup(lookup_from(&[
            ("STAGE", "production"),
            ("DATABASE_URL", "postgres://db/site"),
        ]))
        .unwrap();
        assert!(missing.validate().is_err());

        let short = from_lookup(lookup_from(&[
            ("STAGE", "production"),
            ("DATABASE_URL", "postgres://db/site"),
            ("SECRET_KEY", "too-short"),
        ]))
        .unwrap();
        assert!(short.validate().is_err());

        let ok = from_lookup(lookup_from(&[
            ("STAGE", "production"),
            ("DATABASE_URL", "postgres://db/site"),
            ("SECRET_KEY", "0123456789abcdef0123456789abcdef"),
        ]))
        .unwrap();
        ok.validate().unwrap();
    }

    #[test]
    fn database_url_is_required() {
        let config = from_lookup(lookup_from(&[])).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn bootstrap_admin_needs_username_and_password() {
        let config = from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/site"),
            ("ADMIN_USERNAME", "admin"),
            ("ADMIN_PASSWORD", "Admin@Netfyber2025!"),
        ]))
        .unwrap();
        let admin = config.bootstrap_admin.unwrap();
        assert_eq!(admin.username, "admin");
        assert_eq!(admin.email, "admin@localhost");

        let partial = from_lookup(lookup_from(&[("ADMIN_USERNAME", "admin")])).unwrap();
        assert!(partial.bootstrap_admin.is_none());
    }
}
