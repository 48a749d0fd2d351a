//! Configuration management and validation.
//!
//! Provides the pipeline configuration (separator, free-text column, required
//! columns, primary key and date fields, boundary detection) with layered
//! loading: built-in defaults, then a TOML file, then CLI overrides.

use crate::constants::{
    APP_CONFIG_DIR, CONFIG_FILE_NAME, DEFAULT_PRIMARY_KEY_FIELD, DEFAULT_SEPARATOR,
    LINE_BREAK_CHARS,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How record boundaries are recognized in an export
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BoundaryConfig {
    /// A line starting with the separator begins a new record
    #[default]
    LeadingSeparator,
    /// A line matching the regular expression begins a new record
    Pattern { pattern: String },
}

/// Configuration for one repair and mapping run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Field separator (TAB for the vendor export)
    pub separator: char,

    /// Header name of the column allowed to contain embedded line breaks
    ///
    /// When unset, continuation text is merged into the last buffered cell
    /// and the last column is sanitized.
    pub free_text_column: Option<String>,

    /// Columns that must be present in the header
    pub required_headers: BTreeSet<String>,

    /// Column whose trimmed value identifies a record downstream
    pub primary_key_field: String,

    /// Columns that must hold a recognizable date
    pub date_fields: Vec<String>,

    /// Date field used to derive the persistence partition key
    pub partition_date_field: Option<String>,

    /// Record boundary detection strategy
    pub boundary: BoundaryConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            free_text_column: None,
            required_headers: BTreeSet::new(),
            primary_key_field: DEFAULT_PRIMARY_KEY_FIELD.to_string(),
            date_fields: Vec::new(),
            partition_date_field: None,
            boundary: BoundaryConfig::LeadingSeparator,
        }
    }
}

impl PipelineConfig {
    /// Default config file location (`<config dir>/pms-export-repair/config.toml`)
    pub fn default_config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_CONFIG_DIR).join(CONFIG_FILE_NAME))
            .ok_or_else(|| Error::configuration("Could not determine config directory"))
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::io(format!("Failed to read config file {}", path.display()), e)
        })?;

        toml::from_str(&content).map_err(|source| Error::ConfigFormat {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load defaults overlaid with an explicit or default-location file
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Ok(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        debug!("Loaded pipeline configuration: {:?}", config);
        Ok(config)
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_free_text_column(mut self, column: impl Into<String>) -> Self {
        self.free_text_column = Some(column.into());
        self
    }

    pub fn with_required_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_primary_key_field(mut self, field: impl Into<String>) -> Self {
        self.primary_key_field = field.into();
        self
    }

    pub fn with_date_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_partition_date_field(mut self, field: impl Into<String>) -> Self {
        self.partition_date_field = Some(field.into());
        self
    }

    pub fn with_boundary(mut self, boundary: BoundaryConfig) -> Self {
        self.boundary = boundary;
        self
    }

    /// Every column the header must contain, without duplicates
    ///
    /// Covers the required headers, the primary key, each date field and the
    /// free-text column.
    pub fn required_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        let candidates = self
            .required_headers
            .iter()
            .chain(std::iter::once(&self.primary_key_field))
            .chain(self.date_fields.iter())
            .chain(self.free_text_column.iter());

        for column in candidates {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
        columns
    }

    /// Validate configuration consistency
    pub fn validate(&self) -> Result<()> {
        if LINE_BREAK_CHARS.contains(&self.separator) {
            return Err(Error::configuration(
                "Separator cannot be a line break character",
            ));
        }

        if self.primary_key_field.trim().is_empty() {
            return Err(Error::configuration("Primary key field cannot be empty"));
        }

        if let Some(partition) = &self.partition_date_field {
            if !self.date_fields.contains(partition) {
                return Err(Error::configuration(format!(
                    "Partition date field '{}' must also be listed in date_fields",
                    partition
                )));
            }
        }

        if let BoundaryConfig::Pattern { pattern } = &self.boundary {
            if pattern.is_empty() {
                return Err(Error::configuration("Boundary pattern cannot be empty"));
            }
        }

        Ok(())
    }
}
