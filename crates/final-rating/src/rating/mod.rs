//! Final rating engine: configuration model, component calculators,
//! aggregation, trace rendering, batch orchestration and the service and
//! HTTP surfaces built on them.

pub mod aggregate;
pub mod audit;
pub mod batch;
pub mod breakdown;
pub(crate) mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod period;
pub mod router;
pub mod service;
pub mod signals;
pub mod store;

#[cfg(test)]
mod tests;

pub use aggregate::{aggregate, check_max_points, Aggregate};
pub use audit::{replay, verify, Replay, TraceError};
pub use batch::{sort_results, BatchCalculator, CancellationFlag, ResultObserver};
pub use breakdown::{
    CappedBreakdown, DetailLine, HelpRequestsBreakdown, RatedBreakdown, RatingBreakdown,
    RequesterBreakdown, TraceFactor,
};
pub use config::{
    validate, AggregationMode, ConfigId, ConfigSnapshot, ConfigWarning, FieldViolation,
    FinalRatingConfig, HelperConfig, InvalidConfig, PenaltyCategory, RatingRules,
    RatingRulesDraft, RequesterConfig, StakeholderRatingsConfig, TaskRatingsConfig,
    TicketsConfig, ValidatedRules,
};
pub use engine::{FinalRatingResult, RatingEngine};
pub use error::RatingError;
pub use period::RatingPeriod;
pub use router::rating_router;
pub use service::{
    default_template, CalculationRequest, CalculationResponse, ConfigDraft, RatingService,
    RatingServiceError, SavedConfig, DEFAULT_BATCH_CONCURRENCY,
};
pub use signals::{
    RequesterCategoryCount, SignalEntry, SignalError, SignalEvent, SignalLedger, SignalSource,
    StakeholderRatingRecord, TaskRatingRecord, UserId, UserSignals,
};
pub use store::{ConfigStore, InMemoryConfigStore, NewConfig, StoreError};
