use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::aggregate::check_max_points;
use super::batch::{BatchCalculator, CancellationFlag};
use super::config::{
    validate, ConfigId, ConfigSnapshot, ConfigWarning, FieldViolation, FinalRatingConfig,
    InvalidConfig, RatingRules, RatingRulesDraft,
};
use super::engine::{FinalRatingResult, RatingEngine};
use super::error::RatingError;
use super::period::RatingPeriod;
use super::signals::{SignalSource, UserId};
use super::store::{ConfigStore, NewConfig, StoreError};

pub const DEFAULT_BATCH_CONCURRENCY: usize = 4;

/// Calculation request as accepted over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub max_points: f64,
    /// Omitted means the active configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_id: Option<ConfigId>,
    /// Pins the stored version the caller expects to be rated against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_version: Option<u32>,
    /// Omitted means every user with activity in the period.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<Vec<UserId>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalculationResponse {
    pub period: RatingPeriod,
    pub config: ConfigSnapshot,
    pub max_points_for_100_percent: f64,
    pub calculated_at: DateTime<Utc>,
    pub users: Vec<FinalRatingResult>,
}

/// Admin payload for creating or replacing a configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConfigDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rules: RatingRulesDraft,
}

/// A stored configuration plus any warnings raised while validating it.
#[derive(Debug, Clone, Serialize)]
pub struct SavedConfig {
    pub config: FinalRatingConfig,
    pub warnings: Vec<ConfigWarning>,
}

/// Facade tying the config store, the signal source and the batch engine.
pub struct RatingService<S, D> {
    store: Arc<S>,
    signals: Arc<D>,
    concurrency: usize,
}

impl<S, D> RatingService<S, D>
where
    S: ConfigStore + 'static,
    D: SignalSource + 'static,
{
    pub fn new(store: Arc<S>, signals: Arc<D>) -> Self {
        Self {
            store,
            signals,
            concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Rate every candidate user for the requested period.
    ///
    /// Request validation happens before the store or the signal source is
    /// touched. Signals are fetched once for the whole batch.
    pub fn calculate(
        &self,
        request: CalculationRequest,
        cancellation: &CancellationFlag,
    ) -> Result<CalculationResponse, RatingServiceError> {
        let period = RatingPeriod::new(request.period_start, request.period_end)?;
        check_max_points(request.max_points)?;
        if matches!(&request.user_ids, Some(ids) if ids.is_empty()) {
            return Err(RatingError::InvalidRequest("user_ids must not be empty".to_string()).into());
        }

        let snapshot = self.snapshot(request.config_id, request.config_version)?;

        let users: Vec<UserId> = match request.user_ids {
            Some(ids) => ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect(),
            None => self
                .signals
                .active_users(&period)
                .map_err(RatingError::from)?,
        };
        if users.is_empty() {
            return Err(RatingError::InvalidRequest(format!(
                "no users with activity between {} and {}",
                period.start(),
                period.end()
            ))
            .into());
        }

        let signals = self
            .signals
            .fetch(&period, &users)
            .map_err(RatingError::from)?;
        let engine = RatingEngine::new(snapshot.rules.clone(), request.max_points)?;
        let results = BatchCalculator::new(self.concurrency)
            .with_cancellation(cancellation.clone())
            .with_observer(Arc::new(|result: &FinalRatingResult| {
                debug!(
                    user_id = %result.user_id,
                    final_percentage = result.final_percentage,
                    "user rated"
                );
            }))
            .run(&engine, &users, &signals)?;

        info!(
            config_id = %snapshot.id,
            config_version = snapshot.version,
            users = results.len(),
            start = %period.start(),
            end = %period.end(),
            "final ratings calculated"
        );

        Ok(CalculationResponse {
            period,
            config: snapshot,
            max_points_for_100_percent: request.max_points,
            calculated_at: Utc::now(),
            users: results,
        })
    }

    /// Copy the referenced configuration. Never falls back to the active one
    /// when an explicit id is given.
    pub fn snapshot(
        &self,
        config_id: Option<ConfigId>,
        expected_version: Option<u32>,
    ) -> Result<ConfigSnapshot, RatingServiceError> {
        let config = match config_id {
            Some(id) => self
                .store
                .get(id)?
                .ok_or_else(|| RatingError::ConfigNotFound(format!("config {id} does not exist")))?,
            None => self.store.active()?.ok_or_else(|| {
                RatingError::ConfigNotFound("no configuration is active".to_string())
            })?,
        };

        if let Some(version) = expected_version {
            if version != config.version {
                return Err(RatingError::ConfigNotFound(format!(
                    "config {} version {version} is not current (stored version {})",
                    config.id, config.version
                ))
                .into());
            }
        }

        Ok(ConfigSnapshot::from(&config))
    }

    pub fn list_configs(&self) -> Result<Vec<FinalRatingConfig>, RatingServiceError> {
        Ok(self.store.list()?)
    }

    pub fn get_config(&self, id: ConfigId) -> Result<FinalRatingConfig, RatingServiceError> {
        Ok(self.store.get(id)?.ok_or(StoreError::NotFound(id))?)
    }

    pub fn active_config(&self) -> Result<FinalRatingConfig, RatingServiceError> {
        let active = self.store.active()?.ok_or_else(|| {
            RatingError::ConfigNotFound("no configuration is active".to_string())
        })?;
        Ok(active)
    }

    pub fn create_config(&self, draft: ConfigDraft) -> Result<SavedConfig, RatingServiceError> {
        let (config, warnings) = checked(draft)?;
        let config = self.store.create(config)?;
        info!(config_id = %config.id, name = %config.name, "final rating config created");
        Ok(SavedConfig { config, warnings })
    }

    pub fn update_config(
        &self,
        id: ConfigId,
        draft: ConfigDraft,
    ) -> Result<SavedConfig, RatingServiceError> {
        let (config, warnings) = checked(draft)?;
        let config = self.store.update(id, config)?;
        info!(config_id = %config.id, version = config.version, "final rating config updated");
        Ok(SavedConfig { config, warnings })
    }

    pub fn delete_config(&self, id: ConfigId) -> Result<(), RatingServiceError> {
        self.store.delete(id)?;
        info!(config_id = %id, "final rating config deleted");
        Ok(())
    }

    pub fn activate_config(&self, id: ConfigId) -> Result<FinalRatingConfig, RatingServiceError> {
        let config = self.store.activate(id)?;
        info!(config_id = %id, version = config.version, "final rating config activated");
        Ok(config)
    }

    /// Template for a new configuration; not stored.
    pub fn default_structure(&self) -> NewConfig {
        default_template()
    }
}

pub fn default_template() -> NewConfig {
    NewConfig {
        name: "Default final rating".to_string(),
        description: Some("All five components enabled with standard weights".to_string()),
        rules: RatingRules::default_structure(),
    }
}

fn checked(draft: ConfigDraft) -> Result<(NewConfig, Vec<ConfigWarning>), InvalidConfig> {
    let name = draft.name.trim().to_string();
    let name_violation = name.is_empty().then(|| FieldViolation {
        field: "name".to_string(),
        message: "must not be empty".to_string(),
    });

    let validated = match (validate(&draft.rules), name_violation) {
        (Ok(validated), None) => validated,
        (Ok(_), Some(violation)) => {
            return Err(InvalidConfig {
                violations: vec![violation],
            })
        }
        (Err(mut invalid), violation) => {
            if let Some(violation) = violation {
                invalid.violations.insert(0, violation);
            }
            return Err(invalid);
        }
    };

    for warning in &validated.warnings {
        warn!(field = %warning.field, message = %warning.message, "config accepted with warning");
    }

    Ok((
        NewConfig {
            name,
            description: draft.description,
            rules: validated.rules,
        },
        validated.warnings,
    ))
}

#[derive(Debug, thiserror::Error)]
pub enum RatingServiceError {
    #[error(transparent)]
    Rating(#[from] RatingError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<InvalidConfig> for RatingServiceError {
    fn from(value: InvalidConfig) -> Self {
        Self::Rating(RatingError::InvalidConfig(value))
    }
}
