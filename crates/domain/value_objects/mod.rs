pub mod admin_auth;
pub mod html_sanitizer;
pub mod markdown;
pub mod plans;
pub mod post_summary;
pub mod posts;
pub mod site_configs;
pub mod uploads;
