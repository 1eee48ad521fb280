use chrono::{DateTime, Utc};
use tracing::warn;

use crate::config::EngineConfig;
use crate::errors::{LoanError, Result};
use crate::events::{Event, EventStore};
use crate::payments::ScheduleGenerator;
use crate::store::Store;
use crate::workflows::Deadline;

/// loan engine: owns the store, configuration and the committed-event buffer.
///
/// the workflows live in `workflows::{origination, repayment, delinquency}`
/// as further `impl` blocks on this type.
pub struct LoanEngine<S: Store> {
    pub(crate) store: S,
    pub(crate) config: EngineConfig,
    pub(crate) schedule: ScheduleGenerator,
    pub(crate) events: EventStore,
}

impl<S: Store> LoanEngine<S> {
    /// engine with the standard configuration
    pub fn new(store: S) -> Self {
        let config = EngineConfig::standard();
        Self {
            schedule: ScheduleGenerator::new(config.weeks_per_year),
            store,
            config,
            events: EventStore::new(),
        }
    }

    pub fn with_config(store: S, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            schedule: ScheduleGenerator::new(config.weeks_per_year),
            store,
            config,
            events: EventStore::new(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    /// get events
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    pub(crate) fn deadline(&self) -> Deadline {
        Deadline::start(self.config.workflow_timeout())
    }

    pub(crate) fn record_rollback(&mut self, workflow: &'static str, error: &LoanError, at: DateTime<Utc>) {
        warn!(workflow, error = %error, "unit of work rolled back");
        self.events.emit(Event::UnitRolledBack {
            workflow: workflow.to_string(),
            reason: error.to_string(),
            timestamp: at,
        });
    }
}
