use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const FLASH_COOKIE: &str = "netfyber_flash";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// One-shot notice shown on the next rendered page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub message: String,
}

impl FlashMessage {
    pub fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Error, message)
    }
}

/// Replaces the pending flash messages with `messages`.
pub fn store(jar: CookieJar, messages: Vec<FlashMessage>) -> CookieJar {
    if messages.is_empty() {
        return jar;
    }

    let encoded = match serde_json::to_vec(&messages) {
        Ok(json) => URL_SAFE_NO_PAD.encode(json),
        Err(err) => {
            debug!(error = %err, "flash: failed to encode messages");
            return jar;
        }
    };

    jar.add(
        Cookie::build((FLASH_COOKIE, encoded))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build(),
    )
}

/// Reads the pending messages. The returned jar expires the cookie when
/// there was anything to read.
pub fn take(jar: CookieJar) -> (CookieJar, Vec<FlashMessage>) {
    let Some(raw) = jar.get(FLASH_COOKIE).map(|c| c.value().to_string()) else {
        return (jar, Vec::new());
    };

    let messages = URL_SAFE_NO_PAD
        .decode(raw.as_bytes())
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Vec<FlashMessage>>(&bytes).ok())
        .unwrap_or_else(|| {
            debug!("flash: discarding unreadable flash cookie");
            Vec::new()
        });

    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
    (jar, messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, header::COOKIE};

    fn jar_with_cookie(value: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{FLASH_COOKIE}={value}")).unwrap(),
        );
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn stored_messages_can_be_taken_once() {
        let jar = store(
            CookieJar::new(),
            vec![
                FlashMessage::warning("Invalid date. Using today's date."),
                FlashMessage::success("Post \"Fibra\" added."),
            ],
        );
        let value = jar.get(FLASH_COOKIE).unwrap().value().to_string();

        let (jar, messages) = take(jar_with_cookie(&value));

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].level, FlashLevel::Warning);
        assert_eq!(messages[1].message, "Post \"Fibra\" added.");
        assert!(jar.get(FLASH_COOKIE).map_or(true, |c| c.value().is_empty()));
    }

    #[test]
    fn tampered_cookie_yields_nothing() {
        let (_, messages) = take(jar_with_cookie("not-base64-json"));
        assert!(messages.is_empty());
    }

    #[test]
    fn storing_nothing_leaves_jar_untouched() {
        let jar = store(CookieJar::new(), Vec::new());
        assert!(jar.get(FLASH_COOKIE).is_none());
    }
}
