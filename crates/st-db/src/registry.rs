//! Scheme to driver factory mapping.

use crate::duckdb::{DuckDbDriver, DUCKDB_SCHEME};
use crate::error::{DbError, DbResult};
use crate::traits::Driver;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Produces a fresh, uninitialized driver.
pub type DriverFactory = Arc<dyn Fn() -> Box<dyn Driver> + Send + Sync>;

/// Maps URL schemes to driver factories.
#[derive(Clone, Default)]
pub struct DriverRegistry {
    factories: BTreeMap<String, DriverFactory>,
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("drivers", &self.drivers())
            .finish()
    }
}

impl DriverRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in driver registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.factories.insert(
            DUCKDB_SCHEME.to_string(),
            Arc::new(|| Box::new(DuckDbDriver::new()) as Box<dyn Driver>),
        );
        registry
    }

    /// Register `factory` under `scheme`.
    pub fn register<F>(&mut self, scheme: &str, factory: F) -> DbResult<()>
    where
        F: Fn() -> Box<dyn Driver> + Send + Sync + 'static,
    {
        let scheme = scheme.to_ascii_lowercase();
        if self.factories.contains_key(&scheme) {
            return Err(DbError::DuplicateDriver(scheme));
        }
        self.factories.insert(scheme, Arc::new(factory));
        Ok(())
    }

    /// Registered schemes, sorted.
    pub fn drivers(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Create a blank driver for the scheme of `url` without connecting.
    pub fn instantiate(&self, url: &str) -> DbResult<Box<dyn Driver>> {
        let scheme = scheme_of(url)?;
        let factory = self
            .factories
            .get(&scheme)
            .ok_or_else(|| DbError::UnknownDriver {
                scheme: scheme.clone(),
                available: self.drivers().join(", "),
            })?;
        let driver = factory();
        verify_filename_extension(&scheme, driver.as_ref())?;
        Ok(driver)
    }

    /// Instantiate the driver for `url` and initialize it.
    pub async fn open(&self, url: &str) -> DbResult<Arc<dyn Driver>> {
        let driver: Arc<dyn Driver> = Arc::from(self.instantiate(url)?);
        driver.initialize(url).await?;
        log::info!("Opened {} driver", driver.driver_name());
        Ok(driver)
    }
}

/// Lowercased scheme of a connection URL.
pub fn scheme_of(url: &str) -> DbResult<String> {
    let parsed = Url::parse(url).map_err(|e| DbError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    Ok(parsed.scheme().to_string())
}

fn verify_filename_extension(scheme: &str, driver: &dyn Driver) -> DbResult<()> {
    let extension = driver.filename_extension();
    if extension.is_empty() || extension.starts_with('.') {
        return Err(DbError::InvalidExtension {
            scheme: scheme.to_string(),
            extension: extension.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
