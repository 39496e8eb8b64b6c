//! In-memory registry of devices and entities.
//!
//! The registry is the daemon's view of the world: integrations push device
//! descriptors and entity snapshots into it through [`IntegrationContext`],
//! and it keeps one record per `(integration, unique_id)` device and per
//! `entity_id` string.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use meural_domain::device::Device;
use meural_domain::entity::Entity;
use meural_domain::error::{HubError, NotFoundError};
use meural_domain::id::{DeviceId, EntityId};

use crate::ports::IntegrationContext;

#[derive(Debug, Default)]
struct RegistryState {
    devices: HashMap<DeviceId, Device>,
    entities: HashMap<EntityId, Entity>,
}

/// Shared, cheaply cloneable registry backed by a tokio [`RwLock`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    inner: Arc<RwLock<RegistryState>>,
}

impl InMemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or update a device by its `(integration, unique_id)` pair.
    ///
    /// An existing record keeps its id; every other field is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if the device is invalid.
    #[tracing::instrument(skip(self, device), fields(device_name = %device.name))]
    pub async fn upsert_device(&self, mut device: Device) -> Result<Device, HubError> {
        device.validate()?;
        let mut state = self.inner.write().await;
        if let Some(existing) = state
            .devices
            .values()
            .find(|d| d.integration == device.integration && d.unique_id == device.unique_id)
        {
            device.id = existing.id;
        } else {
            tracing::info!(integration = %device.integration, unique_id = %device.unique_id, "device registered");
        }
        state.devices.insert(device.id, device.clone());
        Ok(device)
    }

    /// Create or update an entity by its `entity_id` string.
    ///
    /// An existing record keeps its id, and keeps its `last_changed` when the
    /// state did not change.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if the entity is invalid.
    #[tracing::instrument(skip(self, entity), fields(entity_id = %entity.entity_id))]
    pub async fn upsert_entity(&self, mut entity: Entity) -> Result<Entity, HubError> {
        entity.validate()?;
        let mut state = self.inner.write().await;
        let existing = state
            .entities
            .values()
            .find(|e| e.entity_id == entity.entity_id)
            .map(|e| (e.id, e.state, e.last_changed));
        match existing {
            Some((id, previous, last_changed)) => {
                entity.id = id;
                if previous == entity.state {
                    entity.last_changed = last_changed;
                } else {
                    tracing::info!(from = %previous, to = %entity.state, "state changed");
                }
            }
            None => tracing::info!(state = %entity.state, "entity registered"),
        }
        state.entities.insert(entity.id, entity.clone());
        Ok(entity)
    }

    /// Look up an entity by id.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] when no entity with `id` exists.
    pub async fn get_entity(&self, id: EntityId) -> Result<Entity, HubError> {
        self.inner
            .read()
            .await
            .entities
            .get(&id)
            .cloned()
            .ok_or_else(|| {
                NotFoundError {
                    entity: "Entity",
                    id: id.to_string(),
                }
                .into()
            })
    }

    /// Look up an entity by its `entity_id` string.
    pub async fn find_entity(&self, entity_id: &str) -> Option<Entity> {
        self.inner
            .read()
            .await
            .entities
            .values()
            .find(|e| e.entity_id == entity_id)
            .cloned()
    }

    /// All entities, sorted by `entity_id`.
    pub async fn list_entities(&self) -> Vec<Entity> {
        let mut entities: Vec<_> = self.inner.read().await.entities.values().cloned().collect();
        entities.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        entities
    }

    /// All devices, sorted by name.
    pub async fn list_devices(&self) -> Vec<Device> {
        let mut devices: Vec<_> = self.inner.read().await.devices.values().cloned().collect();
        devices.sort_by(|a, b| a.name.cmp(&b.name));
        devices
    }
}

impl IntegrationContext for InMemoryRegistry {
    async fn upsert_device(&self, device: Device) -> Result<Device, HubError> {
        InMemoryRegistry::upsert_device(self, device).await
    }

    async fn upsert_entity(&self, entity: Entity) -> Result<Entity, HubError> {
        InMemoryRegistry::upsert_entity(self, entity).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::DiscoveredDevice;
    use meural_domain::entity::EntityState;

    fn frame(unique_id: &str, name: &str) -> Device {
        Device::builder()
            .name(name)
            .integration("meural")
            .unique_id(unique_id)
            .build()
            .unwrap()
    }

    fn player(state: EntityState) -> Entity {
        Entity::builder()
            .entity_id("media_player.hall")
            .friendly_name("Hall")
            .state(state)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_keep_device_id_when_upserting_same_unique_id() {
        let registry = InMemoryRegistry::new();

        let first = registry.upsert_device(frame("MC-1", "Hall")).await.unwrap();
        let second = registry
            .upsert_device(frame("MC-1", "Hallway"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let devices = registry.list_devices().await;
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "Hallway");
    }

    #[tokio::test]
    async fn should_keep_last_changed_when_state_is_unchanged() {
        let registry = InMemoryRegistry::new();

        let first = registry
            .upsert_entity(player(EntityState::Playing))
            .await
            .unwrap();
        let second = registry
            .upsert_entity(player(EntityState::Playing))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.last_changed, first.last_changed);
    }

    #[tokio::test]
    async fn should_record_state_change() {
        let registry = InMemoryRegistry::new();
        let first = registry
            .upsert_entity(player(EntityState::Playing))
            .await
            .unwrap();

        registry
            .upsert_entity(player(EntityState::Paused))
            .await
            .unwrap();

        let stored = registry.get_entity(first.id).await.unwrap();
        assert_eq!(stored.state, EntityState::Paused);
        assert_eq!(
            registry.find_entity("media_player.hall").await.unwrap().id,
            first.id
        );
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_entity() {
        let registry = InMemoryRegistry::new();
        let result = registry.get_entity(EntityId::new()).await;
        assert!(matches!(result, Err(HubError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_persist_discovered_device_with_entities() {
        let registry = InMemoryRegistry::new();
        let discovered = DiscoveredDevice {
            device: frame("MC-2", "Study"),
            entities: vec![player(EntityState::Off)],
        };

        registry.persist_discovered(discovered).await.unwrap();

        assert_eq!(registry.list_devices().await.len(), 1);
        assert_eq!(registry.list_entities().await.len(), 1);
    }
}
