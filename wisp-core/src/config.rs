//! Render configuration.
//!
//! The directive dispatcher recognises attribute keys by naming convention.
//! Those conventions live here so an application (or generated code) can
//! change them in one place:
//!
//! ```json
//! { "event_prefix": "on", "property_prefix": "$", "ref_key": "ref" }
//! ```
//!
//! The configuration is installed per thread; rendering reads whatever is
//! installed when an element is constructed.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Naming conventions for attribute directives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Keys starting with this prefix bind event listeners (`onClick`).
    pub event_prefix: String,

    /// Keys starting with this prefix bind host properties (`$checked`).
    pub property_prefix: String,

    /// The key whose callback receives the created node.
    pub ref_key: String,

    /// Lowercase the event name derived from the key (`onClick` -> `click`).
    pub lowercase_event_names: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            event_prefix: "on".to_owned(),
            property_prefix: "$".to_owned(),
            ref_key: "ref".to_owned(),
            lowercase_event_names: true,
        }
    }
}

thread_local! {
    static ACTIVE: RefCell<Rc<RenderConfig>> = RefCell::new(Rc::new(RenderConfig::default()));
}

impl RenderConfig {
    /// Parse and validate a configuration from JSON. Missing fields take
    /// their default values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RenderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the conventions can be told apart.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.event_prefix.is_empty() {
            return Err(ConfigError::Invalid("event_prefix must not be empty".into()));
        }
        if self.property_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "property_prefix must not be empty".into(),
            ));
        }
        if self.ref_key.is_empty() {
            return Err(ConfigError::Invalid("ref_key must not be empty".into()));
        }
        if self.event_prefix.starts_with(&self.property_prefix)
            || self.property_prefix.starts_with(&self.event_prefix)
        {
            return Err(ConfigError::Invalid(format!(
                "event_prefix {:?} and property_prefix {:?} overlap",
                self.event_prefix, self.property_prefix
            )));
        }
        Ok(())
    }

    /// Make this configuration current for the calling thread, returning the
    /// one it replaces.
    pub fn install(self) -> Result<Rc<RenderConfig>, ConfigError> {
        self.validate()?;
        tracing::debug!(config = ?self, "installing render config");
        Ok(ACTIVE.with(|active| active.replace(Rc::new(self))))
    }

    /// The configuration current for the calling thread.
    pub fn current() -> Rc<RenderConfig> {
        ACTIVE.with(|active| active.borrow().clone())
    }

    /// Derive the event name from an event directive key.
    pub fn event_name(&self, key: &str) -> Option<String> {
        let name = key.strip_prefix(&self.event_prefix)?;
        Some(if self.lowercase_event_names {
            name.to_lowercase()
        } else {
            name.to_owned()
        })
    }

    /// Derive the property name from a property directive key.
    pub fn property_name<'k>(&self, key: &'k str) -> Option<&'k str> {
        key.strip_prefix(&self.property_prefix)
    }
}
