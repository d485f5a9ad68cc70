pub mod admin_users;
pub mod image_storage;
pub mod plans;
pub mod posts;
pub mod site_configs;
