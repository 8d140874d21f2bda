//! HTTP collaborators behind the tools.
//!
//! Every collaborator shares one [`UpstreamClient`], built with the
//! configured per-call timeout, and receives its own slice of configuration
//! once at startup.

mod cards;
mod client;
pub mod mutation;
mod properties;

pub use cards::TrelloCards;
pub use client::UpstreamClient;
pub use mutation::{CreateProperty, PropertyMutationService, UpdateRent};
pub use properties::{ChartBuilder, PropertyRecords};

use std::sync::Arc;

use anyhow::Result;

use crate::config::AgentConfig;
use crate::tools::ToolExecutor;

/// One executor per tool, ready to be bound into the registry.
#[derive(Clone)]
pub struct Collaborators {
    pub properties: Arc<dyn ToolExecutor>,
    pub chart: Arc<dyn ToolExecutor>,
    pub cards: Arc<dyn ToolExecutor>,
    pub update_price: Arc<dyn ToolExecutor>,
    pub create_property: Arc<dyn ToolExecutor>,
}

impl Collaborators {
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let client = Arc::new(UpstreamClient::new(config.timeout())?);
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Arc<UpstreamClient>, config: &AgentConfig) -> Self {
        let mutation = Arc::new(PropertyMutationService::new(
            client.clone(),
            &config.update_property_api_base,
            &config.create_property_api_base,
        ));
        Self {
            properties: Arc::new(PropertyRecords::new(client.clone(), config.property_url.as_str())),
            chart: Arc::new(ChartBuilder::new(client.clone(), config.chart_url.as_str())),
            cards: Arc::new(TrelloCards::new(client, config.trello.clone())),
            update_price: Arc::new(UpdateRent(mutation.clone())),
            create_property: Arc::new(CreateProperty(mutation)),
        }
    }
}
