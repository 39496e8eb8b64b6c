//! # meurald — Meural frame daemon
//!
//! Composition root that wires the clients, the media-player adapter and the
//! in-memory registry together.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Reuse the stored session token, or authenticate once at startup
//! - Set up every frame of the account and start the poll loop
//! - Tear down on Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;
mod token;

use std::sync::Arc;

use meural_adapter_media_player::MeuralIntegration;
use meural_app::ports::Integration;
use meural_app::services::registry::InMemoryRegistry;
use meural_client::{CloudClient, MeuralError, authenticate};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::token::TokenFile;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    let credentials = config.credentials();
    let token_file = TokenFile::new(&config.meural.token_file);
    let http = reqwest::Client::new();

    let token = match token_file.load()? {
        Some(token) => token,
        None => match authenticate(&http, &config.client, &credentials).await {
            Ok(token) => {
                token_file.save(&token)?;
                token
            }
            Err(err @ (MeuralError::InvalidAuth | MeuralError::CannotConnect(_))) => {
                tracing::error!(%err, "unable to sign in to the Meural cloud");
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        },
    };

    let refresh_file = token_file.clone();
    let cloud = CloudClient::new(config.client.clone(), credentials)
        .with_http_client(http)
        .with_token(token)
        .on_token_refresh(move |token| {
            if let Err(err) = refresh_file.save(token) {
                tracing::warn!(%err, "failed to store refreshed session token");
            }
        });

    let registry = InMemoryRegistry::new();
    let mut integration = MeuralIntegration::new(Arc::new(cloud), config.media_player);

    integration.setup(&registry).await?;
    for entity in registry.list_entities().await {
        tracing::info!(
            entity_id = %entity.entity_id,
            name = %entity.friendly_name,
            state = %entity.state,
            "frame ready"
        );
    }
    integration.start_background(registry.clone()).await?;

    tracing::info!("meurald running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    integration.teardown().await?;
    Ok(())
}
