//! Composition root: builds every adapter and service from configuration.

use std::sync::Arc;

use super::{AccountService, ClassifierAdapter, KnowledgeBase, RecommendationService};
use crate::adapters::model::{ExemplarModel, LinearModel, LoadedModel, SignaturePolicy};
use crate::adapters::sqlite::SqliteStorage;
use crate::config::AppConfig;
use crate::{ConfigError, Result};

/// The wired application.
pub struct Services {
    pub recommendations: RecommendationService<LoadedModel, SqliteStorage>,
    pub accounts: AccountService<SqliteStorage>,
    pub history_limit: usize,
}

impl Services {
    /// Load reference data, the model and storage, and wire the services.
    ///
    /// # Errors
    /// Any configuration or storage error aborts startup.
    pub fn start(config: &AppConfig) -> Result<Self> {
        tracing::info!("Starting services (data_dir={:?})", config.data_dir);

        let knowledge = Arc::new(KnowledgeBase::load(&config.data_dir)?);
        let model = load_model(config, &knowledge)?;
        let classifier = ClassifierAdapter::new(model, knowledge.vocabulary(), knowledge.labels())?;

        let storage = Arc::new(if config.db_path == ":memory:" {
            SqliteStorage::in_memory()?
        } else {
            SqliteStorage::new(&config.db_path)?
        });

        Ok(Self {
            recommendations: RecommendationService::new(knowledge, classifier, storage.clone()),
            accounts: AccountService::new(storage),
            history_limit: config.history_limit,
        })
    }
}

fn load_model(config: &AppConfig, knowledge: &KnowledgeBase) -> Result<LoadedModel> {
    match &config.model_dir {
        Some(dir) => {
            let policy =
                SignaturePolicy::new(config.require_signed_models, config.pubkey_file.as_deref())?;
            Ok(LoadedModel::Linear(LinearModel::load(dir, &policy)?))
        }
        None if config.require_signed_models => Err(ConfigError::Signature(
            "signed models are required but no model directory is configured".into(),
        )
        .into()),
        None => {
            tracing::warn!("No model directory configured; using the exemplar model");
            Ok(LoadedModel::Exemplar(ExemplarModel::from_training(
                knowledge.training(),
                knowledge.labels(),
            )))
        }
    }
}
