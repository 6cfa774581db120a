use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::rating::config::{
    AggregationMode, ConfigId, FinalRatingConfig, PenaltyCategory, RatingRules,
};
use crate::rating::period::RatingPeriod;
use crate::rating::service::{CalculationRequest, RatingService};
use crate::rating::signals::{
    RequesterCategoryCount, SignalError, SignalEvent, SignalLedger, SignalSource,
    StakeholderRatingRecord, TaskRatingRecord, UserId, UserSignals,
};
use crate::rating::store::{ConfigStore, InMemoryConfigStore, NewConfig, StoreError};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn january() -> RatingPeriod {
    RatingPeriod::new(date(2025, 1, 1), date(2025, 1, 31)).expect("valid period")
}

pub(super) fn disabled_rules() -> RatingRules {
    let mut rules = RatingRules::default_structure();
    rules.task_ratings.enabled = false;
    rules.stakeholder_ratings.enabled = false;
    rules.help_requests_helper.enabled = false;
    rules.help_requests_requester.enabled = false;
    rules.tickets_resolved.enabled = false;
    rules
}

pub(super) fn task(
    task_id: u64,
    rating: f64,
    weight: Option<f64>,
    user_percentage: Option<f64>,
) -> TaskRatingRecord {
    TaskRatingRecord {
        task_id,
        task_name: format!("Task {task_id}"),
        rating,
        task_weight: weight,
        user_percentage,
    }
}

pub(super) fn stakeholder(project_id: u64, rating: f64, percentage: Option<f64>) -> StakeholderRatingRecord {
    StakeholderRatingRecord {
        project_id,
        project_name: format!("Project {project_id}"),
        rating,
        task_weight: None,
        user_project_percentage: percentage,
    }
}

pub(super) fn requests(category: &str, count: u32) -> RequesterCategoryCount {
    RequesterCategoryCount {
        category: PenaltyCategory::new(category),
        count,
    }
}

/// A user active in every component.
pub(super) fn busy_user() -> UserSignals {
    UserSignals {
        task_ratings: vec![
            task(1, 85.0, Some(90.0), Some(50.0)),
            task(2, 70.0, Some(33.0), None),
            task(3, 100.0, None, Some(12.5)),
        ],
        stakeholder_ratings: vec![stakeholder(10, 90.0, Some(40.0)), stakeholder(11, 75.0, None)],
        help_given: 7,
        help_requested: vec![requests("clarification", 2), requests("other", 1)],
        tickets_resolved: 13,
    }
}

/// January activity for users 1 and 2; user 3 only appears in February.
pub(super) fn january_ledger() -> SignalLedger {
    let mut ledger = SignalLedger::default();
    ledger.record(
        UserId(1),
        date(2025, 1, 6),
        SignalEvent::TaskRated(task(101, 80.0, Some(50.0), None)),
    );
    ledger.record(
        UserId(1),
        date(2025, 1, 9),
        SignalEvent::TaskRated(task(102, 100.0, Some(100.0), None)),
    );
    for day in [10, 11] {
        ledger.record(UserId(1), date(2025, 1, day), SignalEvent::HelpGiven);
    }
    for day in [12, 13, 14] {
        ledger.record(UserId(1), date(2025, 1, day), SignalEvent::TicketResolved);
    }

    ledger.record(
        UserId(2),
        date(2025, 1, 15),
        SignalEvent::TaskRated(task(103, 90.0, None, None)),
    );
    for day in [16, 17] {
        ledger.record(
            UserId(2),
            date(2025, 1, day),
            SignalEvent::HelpRequested(PenaltyCategory::new("clarification")),
        );
    }
    ledger.record(UserId(2), date(2025, 1, 18), SignalEvent::TicketResolved);

    ledger.record(UserId(3), date(2025, 2, 3), SignalEvent::TicketResolved);
    ledger
}

pub(super) fn january_request(max_points: f64) -> CalculationRequest {
    CalculationRequest {
        period_start: date(2025, 1, 1),
        period_end: date(2025, 1, 31),
        max_points,
        config_id: None,
        config_version: None,
        user_ids: None,
    }
}

pub(super) fn default_config(name: &str) -> NewConfig {
    NewConfig {
        name: name.to_string(),
        description: None,
        rules: RatingRules::default_structure(),
    }
}

/// Service over the January ledger with the default structure stored and
/// active.
pub(super) fn build_service() -> (
    RatingService<InMemoryConfigStore, SignalLedger>,
    FinalRatingConfig,
) {
    let store = Arc::new(InMemoryConfigStore::new());
    let created = store
        .create(default_config("Quarterly review"))
        .expect("config stored");
    let active = store.activate(created.id).expect("config activated");
    let service = RatingService::new(store, Arc::new(january_ledger())).with_concurrency(2);
    (service, active)
}

/// Signal source that counts how often it is queried.
#[derive(Default)]
pub(super) struct CountingSignals {
    pub(super) users: BTreeMap<UserId, UserSignals>,
    pub(super) fetches: AtomicUsize,
}

impl CountingSignals {
    pub(super) fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl SignalSource for CountingSignals {
    fn active_users(&self, _period: &RatingPeriod) -> Result<Vec<UserId>, SignalError> {
        Ok(self.users.keys().copied().collect())
    }

    fn fetch(
        &self,
        _period: &RatingPeriod,
        users: &[UserId],
    ) -> Result<BTreeMap<UserId, UserSignals>, SignalError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(users
            .iter()
            .filter_map(|id| self.users.get(id).map(|signals| (*id, signals.clone())))
            .collect())
    }
}

pub(super) struct UnavailableSignals;

impl SignalSource for UnavailableSignals {
    fn active_users(&self, _period: &RatingPeriod) -> Result<Vec<UserId>, SignalError> {
        Err(SignalError::Unavailable("warehouse offline".to_string()))
    }

    fn fetch(
        &self,
        _period: &RatingPeriod,
        _users: &[UserId],
    ) -> Result<BTreeMap<UserId, UserSignals>, SignalError> {
        Err(SignalError::Unavailable("warehouse offline".to_string()))
    }
}

pub(super) struct UnavailableStore;

impl ConfigStore for UnavailableStore {
    fn list(&self) -> Result<Vec<FinalRatingConfig>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn get(&self, _id: ConfigId) -> Result<Option<FinalRatingConfig>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn active(&self) -> Result<Option<FinalRatingConfig>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn create(&self, _config: NewConfig) -> Result<FinalRatingConfig, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _id: ConfigId, _config: NewConfig) -> Result<FinalRatingConfig, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: ConfigId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn activate(&self, _id: ConfigId) -> Result<FinalRatingConfig, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn average_tasks_rules() -> RatingRules {
    let mut rules = disabled_rules();
    rules.task_ratings.enabled = true;
    rules.task_ratings.include_task_weight = true;
    rules.task_ratings.include_user_percentage = false;
    rules.task_ratings.aggregation = AggregationMode::Average;
    rules
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
