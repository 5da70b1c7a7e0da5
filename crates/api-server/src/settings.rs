use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    /// Where the store lives, e.g. `sqlite://tracker.db3` or `sqlite::memory:`
    pub database_url: String,
    pub port: u16,
    /// Directory served for paths no route matches
    pub static_dir: PathBuf,
    /// Directory holding the landing page
    pub views_dir: PathBuf,
    pub log_level: String,
}

impl Settings {
    /// Defaults, overridden by an optional `tracker.toml`, overridden by
    /// `TRACKER_*` environment variables.
    pub fn new() -> Result<Self, ConfigError> {
        Self::build(Environment::with_prefix("TRACKER"))
    }

    fn build(environment: Environment) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("database_url", "sqlite://tracker.db3")?
            .set_default("port", 3000_i64)?
            .set_default("static_dir", "public")?
            .set_default("views_dir", "views")?
            .set_default("log_level", "info")?
            .add_source(File::with_name("tracker").required(false))
            .add_source(environment.try_parsing(true))
            .build()?;

        s.try_deserialize()
    }

    pub fn landing_page(&self) -> PathBuf {
        self.views_dir.join("index.html")
    }
}
