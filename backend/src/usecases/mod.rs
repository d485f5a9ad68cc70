pub mod admin_auth;
pub mod plans;
pub mod posts;
pub mod site_configs;
