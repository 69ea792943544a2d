//! Merge rules: defaults and the environment layer.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Prefix of environment overrides, e.g. `LAKELOG__LAKE__PATH`.
pub const ENV_PREFIX: &str = "LAKELOG";

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("head.file", crate::head::HEAD_FILE_NAME)?
        .set_default("logging.level", "off")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stderr")?
        .set_default("auth.enabled", false)
}

/// Environment variables override every file source.
pub fn add_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
