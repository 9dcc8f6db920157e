//! User configuration stored in `~/.libermap/config.ini`.
//!
//! Settings structs live in [`settings`], constants in [`defaults`],
//! INI parsing in `parser` and serialization in `writer`. [`ConfigKey`]
//! gives validated get/set access by `section.key` name for the CLI.
//!
//! # Example
//!
//! ```
//! use libermap::config::{ConfigFile, ConfigKey};
//!
//! let mut config = ConfigFile::default();
//! ConfigKey::MapBasemap.set(&mut config, "imagery").unwrap();
//! assert_eq!(ConfigKey::MapBasemap.get(&config), "imagery");
//! ```

mod defaults;
mod file;
mod keys;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use keys::{ConfigKey, ConfigKeyError};
pub use settings::{
    ConfigFile, ContentSettings, DownloadSettings, LayerSettings, LoggingSettings, MapSettings,
    PrintSettings, SearchSettings,
};
