//! Integration port — lifecycle and service-call handling for device integrations.
//!
//! An integration bridges an external system (the Meural cloud and the frames
//! on the LAN) into the hub. It discovers devices and entities on startup,
//! keeps their state fresh in the background, and handles service calls
//! directed at entities it owns.

use std::future::Future;

use meural_domain::device::Device;
use meural_domain::entity::Entity;
use meural_domain::error::HubError;
use meural_domain::id::EntityId;

/// Context provided to integrations for persisting discoveries.
///
/// This is a **port** — adapters call it to publish devices and entity
/// snapshots. The binary crate provides the concrete implementation.
pub trait IntegrationContext: Send + Sync {
    /// Persist a discovered device (create or update by `integration`+`unique_id`).
    fn upsert_device(&self, device: Device)
    -> impl Future<Output = Result<Device, HubError>> + Send;

    /// Persist an entity snapshot (create or update by `entity_id` string).
    fn upsert_entity(&self, entity: Entity)
    -> impl Future<Output = Result<Entity, HubError>> + Send;

    /// Convenience: persist a full [`DiscoveredDevice`] (device + all entities).
    fn persist_discovered(
        &self,
        dd: DiscoveredDevice,
    ) -> impl Future<Output = Result<(), HubError>> + Send {
        async move {
            self.upsert_device(dd.device).await?;
            for entity in dd.entities {
                self.upsert_entity(entity).await?;
            }
            Ok(())
        }
    }
}

/// A pluggable device integration.
///
/// The binary crate calls the lifecycle methods in order:
///
/// 1. [`setup`](Self::setup) — discover devices and persist initial snapshots
/// 2. [`start_background`](Self::start_background) — spawn the polling task
/// 3. (the daemon runs, forwarding service calls via [`handle_service_call`](Self::handle_service_call))
/// 4. [`teardown`](Self::teardown) — stop background tasks
pub trait Integration {
    /// Unique name identifying this integration (e.g. `"meural"`).
    fn name(&self) -> &'static str;

    /// Discover devices and persist them via `ctx`.
    ///
    /// A device that fails to initialise must not abort the whole setup;
    /// only failures that leave the integration unusable are returned.
    fn setup(
        &mut self,
        ctx: &impl IntegrationContext,
    ) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Start long-running background work.
    ///
    /// Spawns internal tasks that publish snapshots via `ctx` and returns
    /// immediately. The default implementation is a no-op.
    fn start_background(
        &mut self,
        _ctx: impl IntegrationContext + Clone + 'static,
    ) -> impl Future<Output = Result<(), HubError>> + Send {
        async { Ok(()) }
    }

    /// Handle a service call (e.g. `media_pause`, `select_source`) for an
    /// entity owned by this integration.
    ///
    /// Returns the new [`Entity`] state after handling the call.
    fn handle_service_call(
        &self,
        entity_id: EntityId,
        service: &str,
        data: serde_json::Value,
    ) -> impl Future<Output = Result<Entity, HubError>> + Send;

    /// Called on graceful shutdown. Clean up any background tasks.
    fn teardown(&mut self) -> impl Future<Output = Result<(), HubError>> + Send;
}

/// A device and its associated entities discovered during integration setup.
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    pub device: Device,
    pub entities: Vec<Entity>,
}
