//! Device — a physical frame known to the hub, exposing one or more entities.

use serde::{Deserialize, Serialize};

use crate::error::{HubError, ValidationError};
use crate::id::DeviceId;

/// A physical device registered by an integration.
///
/// Devices are matched across restarts by the `(integration, unique_id)`
/// pair, so `unique_id` should be a vendor serial (for Meural frames, the
/// `productKey`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub integration: String,
    pub unique_id: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub sw_version: Option<String>,
    /// URL of the device's own configuration page, when it serves one.
    pub configuration_url: Option<String>,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), HubError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    integration: Option<String>,
    unique_id: Option<String>,
    manufacturer: Option<String>,
    model: Option<String>,
    sw_version: Option<String>,
    configuration_url: Option<String>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: DeviceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn integration(mut self, integration: impl Into<String>) -> Self {
        self.integration = Some(integration.into());
        self
    }

    #[must_use]
    pub fn unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }

    #[must_use]
    pub fn manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn sw_version(mut self, sw_version: impl Into<String>) -> Self {
        self.sw_version = Some(sw_version.into());
        self
    }

    #[must_use]
    pub fn configuration_url(mut self, url: impl Into<String>) -> Self {
        self.configuration_url = Some(url.into());
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<Device, HubError> {
        let device = Device {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            integration: self.integration.unwrap_or_default(),
            unique_id: self.unique_id.unwrap_or_default(),
            manufacturer: self.manufacturer,
            model: self.model,
            sw_version: self.sw_version,
            configuration_url: self.configuration_url,
        };
        device.validate()?;
        Ok(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_device_with_metadata() {
        let device = Device::builder()
            .name("Living Room Canvas")
            .integration("meural")
            .unique_id("MC2-0001")
            .manufacturer("NETGEAR")
            .model("Canvas II")
            .sw_version("2.3.1")
            .configuration_url("http://192.168.1.20/remote/")
            .build()
            .unwrap();

        assert_eq!(device.name, "Living Room Canvas");
        assert_eq!(device.integration, "meural");
        assert_eq!(device.unique_id, "MC2-0001");
        assert_eq!(device.manufacturer.as_deref(), Some("NETGEAR"));
        assert_eq!(device.model.as_deref(), Some("Canvas II"));
        assert_eq!(device.sw_version.as_deref(), Some("2.3.1"));
        assert_eq!(
            device.configuration_url.as_deref(),
            Some("http://192.168.1.20/remote/")
        );
    }

    #[test]
    fn should_return_validation_error_when_name_is_blank() {
        let result = Device::builder().name("   ").build();
        assert!(matches!(
            result,
            Err(HubError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_keep_explicit_id() {
        let id = DeviceId::stable("meural", "MC2-0001");
        let device = Device::builder().id(id).name("Canvas").build().unwrap();
        assert_eq!(device.id, id);
    }
}
