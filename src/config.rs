//! Application configuration.
//!
//! [`Config`] is built either with its by-value builder methods or
//! deserialized with serde; missing fields take their default values.
//!
//! ```rust
//! use bolt::Config;
//!
//! let config = Config::default()
//!     .api_info("Pets", "A pet store", "2.0.0")
//!     .max_body_size(1 << 20);
//!
//! assert_eq!(config.docs.title, "Pets");
//! assert_eq!(config.docs.spec_path, "/openapi.json");
//! ```

use serde::Deserialize;

use crate::encoder::TimestampFormat;
use crate::params::MAX_RETAINED_PARAMS;
use crate::router::DEFAULT_POOL_SIZE;

/// Configuration for an [`App`](crate::App).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reuse parameter stores and body buffers between requests.
    pub enable_pooling: bool,
    /// The maximum number of idle objects each pool keeps.
    pub max_pool_size: usize,
    /// Parameter stores holding more entries than this are not pooled.
    pub max_retained_params: usize,
    /// Body buffers with a larger capacity than this are not pooled.
    pub max_retained_buffer: usize,
    /// The largest request body [`Context::bind_json`](crate::Context::bind_json) reads.
    pub max_body_size: usize,
    /// Capacity reserved for route records at startup.
    pub preallocate_routes: usize,
    /// Answer `405 Method Not Allowed` with an `Allow` header when the path
    /// is registered for other methods, instead of `404`.
    pub handle_method_not_allowed: bool,
    /// Log server lifecycle events.
    pub dev_mode: bool,
    /// How timestamp fields are rendered by [`Context::fields`](crate::Context::fields).
    pub timestamp_format: TimestampFormat,
    pub docs: DocsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_pooling: true,
            max_pool_size: DEFAULT_POOL_SIZE,
            max_retained_params: MAX_RETAINED_PARAMS,
            max_retained_buffer: 8 * 1024,
            max_body_size: 10 * 1024 * 1024,
            preallocate_routes: 100,
            handle_method_not_allowed: false,
            dev_mode: false,
            timestamp_format: TimestampFormat::default(),
            docs: DocsConfig::default(),
        }
    }
}

impl Config {
    /// Enables or disables the OpenAPI document route.
    pub fn docs(mut self, enabled: bool) -> Self {
        self.docs.enabled = enabled;
        self
    }

    /// Sets the path the OpenAPI document is served at.
    pub fn docs_path(mut self, spec_path: impl Into<String>) -> Self {
        self.docs.spec_path = spec_path.into();
        self
    }

    /// Sets the API metadata in the OpenAPI document.
    pub fn api_info(
        mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        self.docs.title = title.into();
        self.docs.description = description.into();
        self.docs.version = version.into();
        self
    }

    pub fn dev_mode(mut self, enabled: bool) -> Self {
        self.dev_mode = enabled;
        self
    }

    pub fn pooling(mut self, enabled: bool) -> Self {
        self.enable_pooling = enabled;
        self
    }

    pub fn max_pool_size(mut self, size: usize) -> Self {
        self.max_pool_size = size;
        self
    }

    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    pub fn handle_method_not_allowed(mut self, enabled: bool) -> Self {
        self.handle_method_not_allowed = enabled;
        self
    }

    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }
}

/// Configuration of the generated OpenAPI document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    pub enabled: bool,
    pub spec_path: String,
    pub title: String,
    pub description: String,
    pub version: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            spec_path: "/openapi.json".to_owned(),
            title: "API Documentation".to_owned(),
            description: "Automatically generated API documentation".to_owned(),
            version: "1.0.0".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.enable_pooling);
        assert_eq!(config.max_pool_size, 1000);
        assert_eq!(config.max_retained_params, 8);
        assert_eq!(config.max_body_size, 10 << 20);
        assert!(!config.handle_method_not_allowed);
        assert!(config.docs.enabled);
        assert_eq!(config.docs.version, "1.0.0");
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: Config = serde_json::from_str(
            r#"{
                "dev_mode": true,
                "timestamp_format": "rfc3339_millis",
                "docs": { "title": "Pets" }
            }"#,
        )
        .unwrap();

        assert!(config.dev_mode);
        assert_eq!(config.timestamp_format, TimestampFormat::Rfc3339Millis);
        assert_eq!(config.docs.title, "Pets");
        assert_eq!(config.docs.spec_path, "/openapi.json");
        assert_eq!(config.max_pool_size, 1000);
    }

    #[test]
    fn builders() {
        let config = Config::default()
            .docs(false)
            .docs_path("/spec.json")
            .pooling(false)
            .max_pool_size(10)
            .handle_method_not_allowed(true);

        assert!(!config.docs.enabled);
        assert_eq!(config.docs.spec_path, "/spec.json");
        assert!(!config.enable_pooling);
        assert_eq!(config.max_pool_size, 10);
        assert!(config.handle_method_not_allowed);
    }
}
