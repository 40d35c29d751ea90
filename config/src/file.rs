//! File-backed configuration sources (TOML, YAML, JSON).
//!
//! A [`FileConfig`] locates its file (optionally searching parent
//! directories), parses it once into a JSON-shaped table, and memoizes the
//! result. The memo is guarded by a mutex held across the load, so
//! concurrent first callers wait for a single load instead of racing.
//! Failed loads are not memoized.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use argbind_core::{CommandSignature, SoftDefaults, resolve_slot};
use serde_json::{Map, Value as Json};
use tracing::{debug, trace};

use crate::overlay::{SlotValues, walk_leaves};
use crate::{ConfigError, Overlay, Result};

/// Parsed configuration document.
pub type ConfigMap = Map<String, Json>;

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Yaml,
    Json,
}

impl Format {
    /// Infers the format from a file extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use argbind_config::Format;
    /// use std::path::Path;
    ///
    /// assert_eq!(Format::from_path(Path::new("pyproject.toml")), Some(Format::Toml));
    /// assert_eq!(Format::from_path(Path::new("app.yml")), Some(Format::Yaml));
    /// assert_eq!(Format::from_path(Path::new("settings.ini")), None);
    /// ```
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "toml" => Some(Format::Toml),
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            _ => None,
        }
    }

    /// Parses `text` into a table.
    pub fn parse(self, text: &str, path: &Path) -> Result<ConfigMap> {
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        let document = match self {
            Format::Toml => toml_to_json(toml::Value::Table(text.parse::<toml::Table>()?)),
            Format::Yaml => serde_yaml::from_str::<Json>(text)?,
            Format::Json => serde_json::from_str::<Json>(text)?,
        };
        match document {
            Json::Object(map) => Ok(map),
            Json::Null => Ok(Map::new()),
            _ => Err(ConfigError::InvalidRoot(path.to_path_buf())),
        }
    }
}

fn toml_to_json(value: toml::Value) -> Json {
    match value {
        toml::Value::String(s) => Json::String(s),
        toml::Value::Integer(i) => Json::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f).map_or(Json::Null, Json::Number),
        toml::Value::Boolean(b) => Json::Bool(b),
        toml::Value::Datetime(dt) => Json::String(dt.to_string()),
        toml::Value::Array(items) => Json::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Json::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// A configuration file used as an overlay.
///
/// # Examples
///
/// ```
/// use argbind_config::{FileConfig, Format};
///
/// let config = FileConfig::new("pyproject.toml", Format::Toml)
///     .with_root_keys(["tool", "myapp"])
///     .search_parents(true);
/// assert_eq!(config.root_keys(), ["tool", "myapp"]);
/// ```
#[derive(Debug)]
pub struct FileConfig {
    path: PathBuf,
    format: Format,
    root_keys: Vec<String>,
    must_exist: bool,
    search_parents: bool,
    allow_unknown: bool,
    cache: Mutex<Option<Arc<ConfigMap>>>,
}

impl FileConfig {
    pub fn new(path: impl Into<PathBuf>, format: Format) -> Self {
        Self {
            path: path.into(),
            format,
            root_keys: Vec::new(),
            must_exist: false,
            search_parents: false,
            allow_unknown: false,
            cache: Mutex::new(None),
        }
    }

    pub fn toml(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Format::Toml)
    }

    pub fn yaml(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Format::Yaml)
    }

    pub fn json(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Format::Json)
    }

    /// Creates a source whose format is inferred from the extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        match Format::from_path(&path) {
            Some(format) => Ok(Self::new(path, format)),
            None => Err(ConfigError::UnsupportedFormat(path)),
        }
    }

    /// Keys descended before command-path keys (e.g. `["tool", "myapp"]`).
    pub fn with_root_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.root_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Fail with [`ConfigError::NotFound`] when no file is found.
    pub fn must_exist(mut self, must_exist: bool) -> Self {
        self.must_exist = must_exist;
        self
    }

    /// Search for the file name in every ancestor directory.
    pub fn search_parents(mut self, search_parents: bool) -> Self {
        self.search_parents = search_parents;
        self
    }

    /// Skip keys matching no parameter instead of failing.
    pub fn allow_unknown(mut self, allow_unknown: bool) -> Self {
        self.allow_unknown = allow_unknown;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn root_keys(&self) -> &[String] {
        &self.root_keys
    }

    /// Returns the parsed document, loading it on first use.
    ///
    /// A missing file yields an empty table unless `must_exist` is set.
    pub fn config(&self) -> Result<Arc<ConfigMap>> {
        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(config) = cache.as_ref() {
            trace!(path = %self.path.display(), "Config cache hit");
            return Ok(Arc::clone(config));
        }

        let config = match self.locate()? {
            Some(found) => {
                debug!(path = %found.display(), format = ?self.format, "Loading config file");
                let text = fs::read_to_string(&found).map_err(|source| ConfigError::Io {
                    path: found.clone(),
                    source,
                })?;
                self.format.parse(&text, &found)?
            }
            None => {
                debug!(path = %self.path.display(), "Config file not found, contributing nothing");
                Map::new()
            }
        };

        let config = Arc::new(config);
        *cache = Some(Arc::clone(&config));
        Ok(config)
    }

    /// Finds the file to load, or `None` when it is absent and optional.
    fn locate(&self) -> Result<Option<PathBuf>> {
        if !self.search_parents {
            if self.path.is_file() {
                return Ok(Some(self.path.clone()));
            }
            return self.not_found();
        }

        let absolute = std::path::absolute(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        let (Some(name), Some(start)) = (absolute.file_name(), absolute.parent()) else {
            return self.not_found();
        };
        for dir in start.ancestors() {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }
        self.not_found()
    }

    fn not_found(&self) -> Result<Option<PathBuf>> {
        if self.must_exist {
            Err(ConfigError::NotFound(self.path.clone()))
        } else {
            Ok(None)
        }
    }
}

impl Overlay for FileConfig {
    fn source_name(&self) -> String {
        self.path.display().to_string()
    }

    fn apply(
        &self,
        signature: &CommandSignature,
        command_path: &[String],
        defaults: &mut SoftDefaults,
    ) -> Result<()> {
        let config = self.config()?;
        let source = self.source_name();

        let mut scope: &ConfigMap = &config;
        for key in self.root_keys.iter().chain(command_path) {
            match scope.get(key) {
                Some(Json::Object(next)) => scope = next,
                _ => {
                    trace!(source = %source, key = %key, "Scope key absent, nothing to apply");
                    return Ok(());
                }
            }
        }

        let mut values = SlotValues::default();
        for (key, value) in scope {
            if signature.is_subcommand(key) {
                trace!(source = %source, key = %key, "Skipping subcommand table");
                continue;
            }
            for (subkeys, leaf) in walk_leaves(value) {
                let segments: Vec<String> = std::iter::once(key.clone()).chain(subkeys).collect();
                match resolve_slot(&signature.parameters, &segments) {
                    Some(found) => values.insert(found.slot, &found.rest, leaf),
                    None if self.allow_unknown => {
                        trace!(source = %source, key = %segments.join("."), "Ignoring unknown key");
                    }
                    None => {
                        let key = self
                            .root_keys
                            .iter()
                            .chain(command_path)
                            .chain(&segments)
                            .map(|k| format!("[{k}]"))
                            .collect();
                        return Err(ConfigError::UnknownKey {
                            key,
                            origin: source,
                        });
                    }
                }
            }
        }

        values.commit(defaults, &source);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_toml_datetime_becomes_string() {
        let map = Format::Toml
            .parse("when = 1979-05-27T07:32:00Z\nn = 1.5\n", Path::new("x.toml"))
            .unwrap();
        assert_eq!(map.get("when"), Some(&json!("1979-05-27T07:32:00Z")));
        assert_eq!(map.get("n"), Some(&json!(1.5)));
    }

    #[test]
    fn test_non_table_root_is_rejected() {
        let err = Format::Json.parse("[1, 2]", Path::new("x.json")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRoot(_)));
    }

    #[test]
    fn test_empty_yaml_is_empty_table() {
        let map = Format::Yaml.parse("", Path::new("x.yaml")).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_from_path_rejects_unknown_extension() {
        assert!(matches!(
            FileConfig::from_path("settings.ini"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
