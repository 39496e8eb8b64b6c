//! Entity — the central state-holding concept of the hub.
//!
//! Each Meural frame is exposed as one `media_player.*` entity whose state is
//! `playing`, `paused`, `off`, or `unavailable`, with the currently displayed
//! artwork described through attributes.

mod attribute_value;
mod state;

pub use attribute_value::AttributeValue;
pub use state::EntityState;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{HubError, ValidationError};
use crate::id::{DeviceId, EntityId};

/// UTC timestamp used for `last_changed` and `last_updated`.
pub type Timestamp = DateTime<Utc>;

/// A single observable/controllable aspect of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub device_id: Option<DeviceId>,
    /// Human-facing identifier such as `media_player.living_room`.
    pub entity_id: String,
    pub friendly_name: String,
    pub state: EntityState,
    pub attributes: HashMap<String, AttributeValue>,
    pub last_changed: Timestamp,
    pub last_updated: Timestamp,
}

impl Entity {
    /// Create a builder for constructing an [`Entity`].
    #[must_use]
    pub fn builder() -> EntityBuilder {
        EntityBuilder::default()
    }

    /// Look up an attribute by key.
    #[must_use]
    pub fn get_attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Record a new state observed at `at`.
    ///
    /// `last_changed` only moves when the state actually differs;
    /// `last_updated` always moves.
    pub fn update_state(&mut self, state: EntityState, at: Timestamp) {
        if self.state != state {
            self.state = state;
            self.last_changed = at;
        }
        self.last_updated = at;
    }

    /// The part of `entity_id` before the dot (e.g. `media_player`).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.entity_id
            .split_once('.')
            .map_or(self.entity_id.as_str(), |(domain, _)| domain)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] when `entity_id` is empty or not of
    /// the form `<domain>.<object_id>`, or when `friendly_name` is empty.
    pub fn validate(&self) -> Result<(), HubError> {
        if self.entity_id.is_empty() {
            return Err(ValidationError::EmptyEntityId.into());
        }
        match self.entity_id.split_once('.') {
            Some((domain, object)) if !domain.is_empty() && !object.is_empty() => {}
            _ => return Err(ValidationError::MalformedEntityId(self.entity_id.clone()).into()),
        }
        if self.friendly_name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Entity`].
#[derive(Debug, Default)]
pub struct EntityBuilder {
    id: Option<EntityId>,
    device_id: Option<DeviceId>,
    entity_id: Option<String>,
    friendly_name: Option<String>,
    state: EntityState,
    attributes: HashMap<String, AttributeValue>,
}

impl EntityBuilder {
    #[must_use]
    pub fn id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn device_id(mut self, device_id: DeviceId) -> Self {
        self.device_id = Some(device_id);
        self
    }

    #[must_use]
    pub fn entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    #[must_use]
    pub fn friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn state(mut self, state: EntityState) -> Self {
        self.state = state;
        self
    }

    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Set an attribute only when `value` is `Some`.
    #[must_use]
    pub fn maybe_attribute(self, key: impl Into<String>, value: Option<AttributeValue>) -> Self {
        match value {
            Some(value) => self.attribute(key, value),
            None => self,
        }
    }

    /// Consume the builder, validate, and return an [`Entity`].
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if any invariant of
    /// [`Entity::validate`] fails.
    pub fn build(self) -> Result<Entity, HubError> {
        let ts = Utc::now();
        let entity = Entity {
            id: self.id.unwrap_or_default(),
            device_id: self.device_id,
            entity_id: self.entity_id.unwrap_or_default(),
            friendly_name: self.friendly_name.unwrap_or_default(),
            state: self.state,
            attributes: self.attributes,
            last_changed: ts,
            last_updated: ts,
        };
        entity.validate()?;
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Entity {
        Entity::builder()
            .entity_id("media_player.living_room")
            .friendly_name("Living Room")
            .state(EntityState::Playing)
            .attribute("source", AttributeValue::String("Favourites".to_string()))
            .build()
            .unwrap()
    }

    #[test]
    fn should_build_entity_with_attributes() {
        let entity = canvas();
        assert_eq!(entity.state, EntityState::Playing);
        assert_eq!(
            entity.get_attribute("source"),
            Some(&AttributeValue::String("Favourites".to_string()))
        );
        assert_eq!(entity.domain(), "media_player");
    }

    #[test]
    fn should_reject_entity_id_without_domain() {
        let result = Entity::builder()
            .entity_id("living_room")
            .friendly_name("Living Room")
            .build();
        assert!(matches!(
            result,
            Err(HubError::Validation(ValidationError::MalformedEntityId(_)))
        ));
    }

    #[test]
    fn should_reject_empty_entity_id() {
        let result = Entity::builder().friendly_name("Living Room").build();
        assert!(matches!(
            result,
            Err(HubError::Validation(ValidationError::EmptyEntityId))
        ));
    }

    #[test]
    fn should_skip_missing_optional_attribute() {
        let entity = Entity::builder()
            .entity_id("media_player.hall")
            .friendly_name("Hall")
            .maybe_attribute("media_title", None)
            .maybe_attribute("shuffle", Some(AttributeValue::Bool(true)))
            .build()
            .unwrap();
        assert!(entity.get_attribute("media_title").is_none());
        assert_eq!(
            entity.get_attribute("shuffle"),
            Some(&AttributeValue::Bool(true))
        );
    }

    #[test]
    fn should_move_last_changed_only_when_state_differs() {
        let mut entity = canvas();
        let first = entity.last_changed;

        let later = first + chrono::Duration::seconds(5);
        entity.update_state(EntityState::Playing, later);
        assert_eq!(entity.last_changed, first);
        assert_eq!(entity.last_updated, later);

        let even_later = later + chrono::Duration::seconds(5);
        entity.update_state(EntityState::Paused, even_later);
        assert_eq!(entity.last_changed, even_later);
        assert_eq!(entity.state, EntityState::Paused);
    }
}
