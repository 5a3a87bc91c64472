use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use tracing::debug;

pub mod models;
pub use models::*;

static DOTENV_LOADED: OnceCell<()> = OnceCell::new();

/// Loads `.env` exactly once per process. Safe to call from every crate
/// that needs configuration; repeated calls are no-ops.
pub fn ensure_dotenv_loaded() {
    DOTENV_LOADED.get_or_init(|| {
        let _ = dotenv::dotenv();
    });
}

/// Loads the unified application configuration.
///
/// Layering, later sources winning: `config/default.*`, then
/// `config/{RUN_ENV}.*`, then `APP_`-prefixed environment variables with
/// `__` as the section separator (e.g. `APP_GCAL__CLIENT_SECRET`).
/// Dependent crates call this so they do not need to know where a value
/// came from.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();
    let run_env = std::env::var("RUN_ENV").unwrap_or_else(|_| "default".to_string());
    debug!("Loading configuration for RUN_ENV={}", run_env);

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{}", run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?
        .try_deserialize()
}
