use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{
    entities::site_configs::SiteConfigEntity, value_objects::html_sanitizer::clean_text_field,
};

/// Form fields that are never persisted as configuration entries.
pub const RESERVED_FORM_KEYS: &[&str] = &["csrf_token"];

/// Entries seeded at startup when their key is missing.
pub const DEFAULT_SITE_CONFIGS: &[(&str, &str)] = &[
    ("contact_phone", "(63) 8494-1778"),
    ("contact_email", "contato@netfyber.com"),
    (
        "address",
        "AV. Tocantins – 934, Centro – Sítio Novo – TO<br>Axixá TO / Juverlândia / São Pedro / Folha Seca / Morada Nova / Santa Luzia / Boa Esperança",
    ),
    ("hours_weekdays", "08h às 18h"),
    ("hours_saturday", "08h às 13h"),
    ("whatsapp_number", "556384941778"),
    ("instagram_url", "https://www.instagram.com/netfybertelecom"),
    ("facebook_url", "#"),
    ("hero_image", "images/familia.png"),
    ("hero_title", "Internet de Alta Velocidade"),
    ("hero_subtitle", "Conecte sua família ao futuro com a NetFyber Telecom"),
];

/// Served instead of the table contents when the store cannot be read.
pub const FALLBACK_SITE_CONFIGS: &[(&str, &str)] = &[
    ("site_name", "NetFyber"),
    ("site_description", "Plataforma de Testes de Velocidade"),
];

pub type SiteConfigMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteConfigDto {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
}

impl From<SiteConfigEntity> for SiteConfigDto {
    fn from(value: SiteConfigEntity) -> Self {
        Self {
            key: value.config_key,
            value: clean_text_field(&value.config_value),
            description: value.description,
        }
    }
}

pub fn fallback_site_configs() -> SiteConfigMap {
    FALLBACK_SITE_CONFIGS
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

pub fn is_reserved_form_key(key: &str) -> bool {
    RESERVED_FORM_KEYS.contains(&key)
}
