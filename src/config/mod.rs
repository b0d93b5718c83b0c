//! The `config` module loads the settings of the master and of the nodes.
//!
//! Sources, later ones winning: built-in defaults, the `config/default` file
//! (any format the `config` crate understands) or an explicit file, and
//! `ROSMASTER__SECTION__KEY` environment variables.

mod settings;

use std::path::Path;

use config::{Config, ConfigError, Environment, File};

use settings::PartialSettings;

pub use settings::{
    DisconnectPolicy, LoggingSettings, MasterSettings, NodeSettings, Settings,
};

/// Loads the configuration from the default file and environment variables
/// and merges it with default values.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from(None)
}

/// Like [`load_config`], reading `file` instead of `config/default`. An
/// explicit file must exist.
pub fn load_config_from(file: Option<&Path>) -> Result<Settings, ConfigError> {
    let file_source = match file {
        Some(path) => File::from(path).required(true),
        None => File::with_name("config/default").required(false),
    };

    let builder = Config::builder().add_source(file_source).add_source(
        Environment::with_prefix("ROSMASTER")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("node.protocols")
            .try_parsing(true),
    );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(Settings::merge(partial))
}

#[cfg(test)]
mod tests;
