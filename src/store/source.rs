//! Property sources: `.properties` files, TOML files and in-memory stores.

use std::path::{Path, PathBuf};

use toml::{Table, Value};
use tracing::debug;

use super::{format, LoadError, Properties};

/// Text format of a property file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Properties,
    Toml,
}

impl Format {
    /// Picks the format from the file extension; anything but `.toml` is
    /// read as `.properties` text.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Format::Toml,
            _ => Format::Properties,
        }
    }
}

/// Something that yields a property store.
///
/// `Ok(None)` means the source is absent and may be skipped.
pub trait PropertySource: std::fmt::Debug {
    fn load(&self) -> Result<Option<Properties>, LoadError>;
}

impl PropertySource for Properties {
    fn load(&self) -> Result<Option<Properties>, LoadError> {
        Ok(Some(self.clone()))
    }
}

/// A property file on disk.
///
/// Required files that don't exist cause an error; optional files that don't
/// exist are skipped.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: Format,
    required: bool,
}

impl FileSource {
    /// Creates a file source whose format follows the file extension.
    pub fn new(path: impl AsRef<Path>, required: bool) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            format: Format::from_path(&path),
            path,
            required,
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PropertySource for FileSource {
    fn load(&self) -> Result<Option<Properties>, LoadError> {
        let loaded = match self.format {
            Format::Properties => load_properties_file(&self.path),
            Format::Toml => load_toml_file(&self.path),
        };

        match loaded {
            Ok(props) => Ok(Some(props)),
            Err(LoadError::NotFound(path)) if !self.required => {
                debug!(path = %path.display(), "skipping missing optional property file");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

/// Loads a `.properties` file. A leading `~` stands for the home directory.
pub fn load_properties_file(path: impl AsRef<Path>) -> Result<Properties, LoadError> {
    let (path, contents) = read_file(path.as_ref())?;
    format::parse(&contents).map_err(|source| LoadError::Parse { path, source })
}

/// Loads a TOML file and flattens it to dotted keys.
pub fn load_toml_file(path: impl AsRef<Path>) -> Result<Properties, LoadError> {
    let (path, contents) = read_file(path.as_ref())?;
    let table: Table = toml::from_str(&contents).map_err(|source| LoadError::Toml {
        path: path.clone(),
        source,
    })?;
    flatten_toml(&table).map_err(|key| LoadError::UnsupportedValue { path, key })
}

/// Flattens nested tables to dotted keys.
///
/// Scalars become their text form and arrays of scalars are joined with `,`.
/// Returns the key of the first value that has no flat form (an array
/// holding tables or arrays).
pub fn flatten_toml(table: &Table) -> Result<Properties, String> {
    let mut props = Properties::new();
    flatten_into(&mut props, "", table)?;
    Ok(props)
}

fn flatten_into(props: &mut Properties, prefix: &str, table: &Table) -> Result<(), String> {
    for (key, value) in table {
        let key = format!("{prefix}{key}");
        match value {
            Value::Table(nested) => flatten_into(props, &format!("{key}."), nested)?,
            Value::Array(items) => {
                let parts = items
                    .iter()
                    .map(scalar_to_string)
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| key.clone())?;
                props.insert(key, parts.join(","));
            }
            scalar => {
                let text = scalar_to_string(scalar).ok_or_else(|| key.clone())?;
                props.insert(key, text);
            }
        }
    }
    Ok(())
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Datetime(dt) => Some(dt.to_string()),
        Value::Array(_) | Value::Table(_) => None,
    }
}

/// Reads a whole file, returning the path it was read from.
fn read_file(path: &Path) -> Result<(PathBuf, String), LoadError> {
    let path = expand_home(path);

    if path.is_dir() {
        return Err(LoadError::IsDirectory(path));
    }
    if let Ok(canonical) = path.canonicalize() {
        debug!(path = %canonical.display(), "loading property file");
    }

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok((path, contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(LoadError::NotFound(path)),
        Err(e) => Err(LoadError::Read { path, source: e }),
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
