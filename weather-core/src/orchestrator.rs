//! Drives a location query through current conditions and then forecast.
//!
//! Each query takes a new generation number. Results are applied only while
//! their generation is still the latest one. Teardown closes the session.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    location::LocationSource,
    model::{
        CurrentObservation, FORECAST_SLICE_LIMIT, LocationQuery, QueryState, UnitSystem,
        WeatherReport,
    },
    provider::WeatherProvider,
    store::{HistoryStore, KeyValueStore, SearchHistory, UnitStore},
};

#[derive(Debug)]
struct Session {
    generation: u64,
    closed: bool,
    state: QueryState,
    unit: UnitSystem,
    history: SearchHistory,
}

/// Captured at sequence start and carried to every resumption point.
#[derive(Debug, Clone, Copy)]
struct Ticket {
    generation: u64,
    unit: UnitSystem,
}

#[derive(Debug)]
pub struct QueryOrchestrator {
    provider: Box<dyn WeatherProvider>,
    unit_store: UnitStore,
    history_store: HistoryStore,
    session: Mutex<Session>,
}

impl QueryOrchestrator {
    /// Create an idle session, loading unit preference and history.
    pub fn new(
        provider: Box<dyn WeatherProvider>,
        unit_store: UnitStore,
        history_store: HistoryStore,
    ) -> Self {
        let session = Session {
            generation: 0,
            closed: false,
            state: QueryState::Idle,
            unit: unit_store.load(),
            history: history_store.load(),
        };
        Self { provider, unit_store, history_store, session: Mutex::new(session) }
    }

    /// Both stores over the same key-value backing.
    pub fn with_store(provider: Box<dyn WeatherProvider>, kv: Arc<dyn KeyValueStore>) -> Self {
        Self::new(provider, UnitStore::new(kv.clone()), HistoryStore::new(kv))
    }

    pub async fn query_by_name(&self, text: &str) {
        match LocationQuery::by_name(text) {
            Ok(query) => self.query(query).await,
            Err(err) => {
                if let Some(ticket) = self.begin() {
                    self.settle(ticket, QueryState::Failed(err));
                }
            }
        }
    }

    pub async fn query_by_coordinates(&self, lat: f64, lon: f64) {
        self.query(LocationQuery::by_coordinates(lat, lon)).await;
    }

    /// Ask `source` for a position, then query it. A refusal ends in `Failed`.
    pub async fn query_my_location(&self, source: &dyn LocationSource) {
        let Some(ticket) = self.begin() else { return };

        match source.current_position().await {
            Ok(coords) => self.run_sequence(ticket, LocationQuery::ByCoordinates(coords)).await,
            Err(err) => self.settle(ticket, QueryState::Failed(err)),
        }
    }

    /// Re-query the most recent history entry. Returns false if history is empty.
    pub async fn requery_last(&self) -> bool {
        let last = self.session.lock().history.most_recent().map(str::to_string);
        match last {
            Some(label) => {
                self.query_by_name(&label).await;
                true
            }
            None => false,
        }
    }

    pub async fn query(&self, query: LocationQuery) {
        if let Some(ticket) = self.begin() {
            self.run_sequence(ticket, query).await;
        }
    }

    pub fn current_state(&self) -> QueryState {
        self.session.lock().state.clone()
    }

    pub fn unit_system(&self) -> UnitSystem {
        self.session.lock().unit
    }

    /// Persist a new unit preference. Sequences already running keep theirs.
    pub fn set_unit_system(&self, unit: UnitSystem) {
        let mut session = self.session.lock();
        session.unit = unit;
        self.unit_store.save(unit);
    }

    pub fn history(&self) -> Vec<String> {
        self.session.lock().history.entries().to_vec()
    }

    pub fn clear_history(&self) {
        let mut session = self.session.lock();
        session.history.clear();
        self.history_store.clear();
    }

    /// Suppress the effects of anything still in flight, now and later.
    pub fn teardown(&self) {
        let mut session = self.session.lock();
        session.closed = true;
        session.generation += 1;
    }

    fn begin(&self) -> Option<Ticket> {
        let mut session = self.session.lock();
        if session.closed {
            debug!("session torn down, ignoring query");
            return None;
        }
        session.generation += 1;
        session.state = QueryState::Loading;
        Some(Ticket { generation: session.generation, unit: session.unit })
    }

    async fn run_sequence(&self, ticket: Ticket, query: LocationQuery) {
        let current = match self.provider.fetch_current(&query, ticket.unit).await {
            Ok(current) => current,
            Err(err) => {
                self.settle(ticket, QueryState::Failed(err));
                return;
            }
        };

        if !self.record_history(ticket, &current) {
            return;
        }

        // Canonical coordinates from the provider, not the caller's input.
        let state = match self.provider.fetch_forecast(current.coordinates, ticket.unit).await {
            Ok(mut forecast) => {
                forecast.truncate(FORECAST_SLICE_LIMIT);
                QueryState::Ready(WeatherReport { current, forecast, unit: ticket.unit })
            }
            Err(err) => QueryState::Failed(err),
        };
        self.settle(ticket, state);
    }

    fn record_history(&self, ticket: Ticket, current: &CurrentObservation) -> bool {
        let mut session = self.session.lock();
        if session.generation != ticket.generation {
            debug!(generation = ticket.generation, "discarding stale current conditions");
            return false;
        }
        if session.history.record(&current.label()) {
            self.history_store.save(&session.history);
        }
        true
    }

    fn settle(&self, ticket: Ticket, state: QueryState) {
        let mut session = self.session.lock();
        if session.generation != ticket.generation {
            debug!(generation = ticket.generation, "discarding stale result");
            return;
        }
        match &state {
            QueryState::Ready(report) => {
                info!(location = %report.current.label(), slices = report.forecast.len(), "weather ready")
            }
            QueryState::Failed(err) => info!(error = %err, "query failed"),
            _ => {}
        }
        session.state = state;
    }
}
