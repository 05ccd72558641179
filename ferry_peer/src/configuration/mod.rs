pub mod application_config;
pub use application_config::ApplicationConfig;
