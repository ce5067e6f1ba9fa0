//! Layered key/value sources for credentials and settings.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::{Error, Result, TRACING_TARGET_CONFIG};

/// A single layer of configuration values.
pub trait SecretSource: Send + Sync {
    /// Short name used in logs, e.g. `secrets.toml` or `env`.
    fn name(&self) -> &str;

    /// Returns the raw value for `key`, if this layer defines it.
    fn get(&self, key: &str) -> Option<String>;
}

/// Flat TOML secrets file (`KEY = "value"`).
///
/// Integers, floats and booleans are stringified; nested tables and arrays
/// are ignored.
#[derive(Clone, Default)]
pub struct SecretsFile {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl SecretsFile {
    /// Loads the secrets file at `path`.
    ///
    /// A missing file yields an empty layer. An unreadable or malformed file
    /// is a configuration error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    target: TRACING_TARGET_CONFIG,
                    path = %path.display(),
                    "Secrets file not found, skipping layer"
                );
                return Ok(Self {
                    path: path.to_path_buf(),
                    values: HashMap::new(),
                });
            }
            Err(err) => {
                return Err(Error::config(format!(
                    "failed to read secrets file {}",
                    path.display()
                ))
                .with_source(err));
            }
        };

        let secrets = Self::parse(&contents).map_err(|err| {
            err.with_context(format!("secrets file {}", path.display()))
        })?;

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            path = %path.display(),
            keys = secrets.values.len(),
            "Loaded secrets file"
        );

        Ok(Self {
            path: path.to_path_buf(),
            ..secrets
        })
    }

    /// Parses secrets from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(contents)
            .map_err(|err| Error::config("malformed secrets file").with_source(err))?;

        let values = table
            .into_iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    toml::Value::String(s) => s,
                    toml::Value::Integer(i) => i.to_string(),
                    toml::Value::Float(f) => f.to_string(),
                    toml::Value::Boolean(b) => b.to_string(),
                    _ => return None,
                };
                Some((key, value))
            })
            .collect();

        Ok(Self {
            path: PathBuf::new(),
            values,
        })
    }

    /// Returns the path this layer was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SecretSource for SecretsFile {
    fn name(&self) -> &str {
        "secrets"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

impl fmt::Debug for SecretsFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretsFile")
            .field("path", &self.path)
            .field("keys", &self.values.len())
            .finish()
    }
}

/// Process environment layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl SecretSource for EnvSource {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// In-memory layer.
#[derive(Clone, Default)]
pub struct MapSource(HashMap<String, String>);

impl MapSource {
    /// Creates an empty layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for MapSource
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl SecretSource for MapSource {
    fn name(&self) -> &str {
        "map"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

impl fmt::Debug for MapSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapSource")
            .field("keys", &self.0.len())
            .finish()
    }
}

/// Ordered stack of layers. The first layer defining a key wins.
///
/// Blank values count as absent, so an empty `OPENAI_API_KEY=` in the
/// environment does not shadow a default or a later layer.
#[derive(Default)]
pub struct Resolver {
    layers: Vec<Box<dyn SecretSource>>,
}

impl Resolver {
    /// Creates a resolver without layers; every lookup falls back to defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the standard stack: secrets file, then process environment.
    pub fn standard(secrets_path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new()
            .with_layer(SecretsFile::load(secrets_path)?)
            .with_layer(EnvSource))
    }

    /// Appends a lower-priority layer.
    pub fn with_layer(mut self, layer: impl SecretSource + 'static) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    /// Returns the value for `key` from the highest-priority layer.
    pub fn get(&self, key: &str) -> Option<String> {
        self.lookup(key).map(|(_, value)| value)
    }

    /// Returns the name of the layer that defines `key`.
    pub fn source_of(&self, key: &str) -> Option<&str> {
        self.lookup(key).map(|(layer, _)| layer)
    }

    /// Returns the value for `key` or `default`.
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_owned())
    }

    /// Parses the value for `key`, falling back to `default` when undefined.
    pub fn parse<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw.trim().parse().map_err(|err: T::Err| {
                Error::config(format!("invalid value for {key}: {err}"))
            }),
            None => Ok(default),
        }
    }

    fn lookup(&self, key: &str) -> Option<(&str, String)> {
        self.layers.iter().find_map(|layer| {
            layer
                .get(key)
                .filter(|value| !value.trim().is_empty())
                .map(|value| (layer.name(), value))
        })
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layers: Vec<&str> = self.layers.iter().map(|l| l.name()).collect();
        f.debug_struct("Resolver").field("layers", &layers).finish()
    }
}
