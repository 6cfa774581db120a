use chrono::NaiveDate;
use final_rating::rating::{
    default_template, ConfigStore, FinalRatingConfig, InMemoryConfigStore, StoreError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Store holding the default template as its active configuration.
pub(crate) fn seeded_store() -> Result<(InMemoryConfigStore, FinalRatingConfig), StoreError> {
    let store = InMemoryConfigStore::new();
    let created = store.create(default_template())?;
    let active = store.activate(created.id)?;
    Ok((store, active))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
