use std::path::Path;

use tracing::debug;

use super::{FileSource, LoadError, Properties, PropertySource};

/// Builder for loading properties from several sources.
///
/// Sources are merged in registration order, with later sources overriding
/// earlier ones key by key.
///
/// ## Example
///
/// ```no_run
/// use dragon_props::Properties;
///
/// let props = Properties::builder()
///     .with_file("config/default.properties", true)
///     .with_file("config/local.toml", false)
///     .build()?;
/// # Ok::<(), dragon_props::LoadError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct PropertiesBuilder {
    sources: Vec<Box<dyn PropertySource>>,
}

impl PropertiesBuilder {
    /// Adds a property file; `.toml` files are flattened, others are read as
    /// `.properties` text.
    ///
    /// If `required` is `true`, the build fails if the file doesn't exist.
    pub fn with_file(self, path: impl AsRef<Path>, required: bool) -> Self {
        self.with_source(FileSource::new(path, required))
    }

    pub fn with_source(mut self, source: impl PropertySource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Adds fixed entries, e.g. defaults or overrides.
    pub fn with_properties(self, props: Properties) -> Self {
        self.with_source(props)
    }

    /// Loads every source and merges them.
    pub fn build(self) -> Result<Properties, LoadError> {
        let mut merged = Properties::new();

        for source in &self.sources {
            if let Some(props) = source.load()? {
                debug!(?source, entries = props.len(), "merging property source");
                merged.merge(props);
            }
        }

        Ok(merged)
    }
}
