//! Built-in component factories

use crate::capability::ComponentFactory;
use crate::definition::ComponentInstance;
use crate::error::{ContainerError, Result};
use crate::literal;

/// Factory producing a `Vec<String>` by splitting a configured literal on
/// commas, trimming each element. The product, not the factory, is what
/// name and type lookups hand out.
#[derive(Debug, Default)]
pub struct StringListFactory {
    values: Option<String>,
}

impl StringListFactory {
    /// Factory with no configured values; producing from it fails
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the comma-separated values
    pub fn with_values(values: impl Into<String>) -> Self {
        Self {
            values: Some(values.into()),
        }
    }

    /// Set the comma-separated values
    pub fn set_values(&mut self, values: impl Into<String>) {
        self.values = Some(values.into());
    }
}

impl ComponentFactory for StringListFactory {
    fn create_object(&self) -> Result<ComponentInstance> {
        let values = self.values.as_deref().ok_or_else(|| {
            ContainerError::processing("string list factory has no values configured.")
        })?;
        Ok(crate::definition::instance(literal::split_list(values)))
    }
}
