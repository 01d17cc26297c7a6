//! Where tariff, zone and options documents come from.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::catalog::TariffId;
use crate::options::OptionsConfig;
use crate::tariff::TariffTable;
use crate::zones::ZoneMap;

/// Errors that can occur while loading a table document
#[derive(Debug, Error)]
pub enum TableLoadError {
    #[error("Failed to read table '{name}' from {}: {source}", .path.display())]
    Io {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse table '{name}': {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown table '{0}'")]
    UnknownTable(String),
}

pub const ZONES_TABLE: &str = "zones";
pub const OPTIONS_TABLE: &str = "options";

/// Source of the read-only configuration documents.
///
/// Implementations are called at most once per successful load; the quote
/// service caches what they return.
#[cfg_attr(test, mockall::automock)]
pub trait RateTableSource: Send + Sync {
    /// Load the tariff table `id`
    fn load_tariff(&self, id: TariffId) -> Result<TariffTable, TableLoadError>;

    /// Load the country to zone map
    fn load_zone_map(&self) -> Result<ZoneMap, TableLoadError>;

    /// Load the options document
    fn load_options(&self) -> Result<OptionsConfig, TableLoadError>;

    /// Human-readable origin, for logs
    fn describe(&self) -> String;
}

impl<S: RateTableSource + ?Sized> RateTableSource for Box<S> {
    fn load_tariff(&self, id: TariffId) -> Result<TariffTable, TableLoadError> {
        (**self).load_tariff(id)
    }

    fn load_zone_map(&self) -> Result<ZoneMap, TableLoadError> {
        (**self).load_zone_map()
    }

    fn load_options(&self) -> Result<OptionsConfig, TableLoadError> {
        (**self).load_options()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

fn parse<T: DeserializeOwned>(name: &str, document: &str) -> Result<T, TableLoadError> {
    serde_json::from_str(document).map_err(|source| TableLoadError::Parse {
        name: name.to_string(),
        source,
    })
}

/// Documents compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTables;

impl EmbeddedTables {
    fn document(name: &str) -> Option<&'static str> {
        let document = match name {
            "posta1" => include_str!("../data/posta1.json"),
            "posta4" => include_str!("../data/posta4.json"),
            "raccomandata" => include_str!("../data/raccomandata.json"),
            "raccomandata1" => include_str!("../data/raccomandata1.json"),
            "posta_internazionale" => include_str!("../data/posta_internazionale.json"),
            "raccomandata_internazionale" => {
                include_str!("../data/raccomandata_internazionale.json")
            }
            ZONES_TABLE => include_str!("../data/zones.json"),
            OPTIONS_TABLE => include_str!("../data/options.json"),
            _ => return None,
        };
        Some(document)
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T, TableLoadError> {
        let document =
            Self::document(name).ok_or_else(|| TableLoadError::UnknownTable(name.to_string()))?;
        parse(name, document)
    }
}

impl RateTableSource for EmbeddedTables {
    fn load_tariff(&self, id: TariffId) -> Result<TariffTable, TableLoadError> {
        self.load(id.as_str())
    }

    fn load_zone_map(&self) -> Result<ZoneMap, TableLoadError> {
        self.load(ZONES_TABLE)
    }

    fn load_options(&self) -> Result<OptionsConfig, TableLoadError> {
        self.load(OPTIONS_TABLE)
    }

    fn describe(&self) -> String {
        "embedded tables".to_string()
    }
}

/// Documents read from `<root>/<name>.json`
#[derive(Debug, Clone)]
pub struct DirectoryTables {
    root: PathBuf,
}

impl DirectoryTables {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T, TableLoadError> {
        let path = self.root.join(format!("{name}.json"));
        let document = std::fs::read_to_string(&path).map_err(|source| TableLoadError::Io {
            name: name.to_string(),
            path: path.clone(),
            source,
        })?;
        parse(name, &document)
    }
}

impl RateTableSource for DirectoryTables {
    fn load_tariff(&self, id: TariffId) -> Result<TariffTable, TableLoadError> {
        self.load(id.as_str())
    }

    fn load_zone_map(&self) -> Result<ZoneMap, TableLoadError> {
        self.load(ZONES_TABLE)
    }

    fn load_options(&self) -> Result<OptionsConfig, TableLoadError> {
        self.load(OPTIONS_TABLE)
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}

/// Directory tables when `dir` is set, embedded tables otherwise
pub fn table_source(dir: Option<&Path>) -> Box<dyn RateTableSource> {
    match dir {
        Some(dir) => Box::new(DirectoryTables::new(dir)),
        None => Box::new(EmbeddedTables),
    }
}
