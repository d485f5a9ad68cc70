pub mod admin_auth;
pub mod admin_plans;
pub mod admin_posts;
pub mod admin_site_configs;
pub mod api;
pub mod public_pages;
