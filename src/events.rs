use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{BorrowerId, InstallmentId, LoanId, PaymentId};

/// all events that can be emitted by the engine; only committed work is reported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // borrower events
    BorrowerRegistered {
        borrower_id: BorrowerId,
        email: String,
        timestamp: DateTime<Utc>,
    },

    // lifecycle events
    LoanOriginated {
        loan_id: LoanId,
        borrower_id: BorrowerId,
        principal: Money,
        annual_interest_rate: Rate,
        term_weeks: u32,
        outstanding_amount: Money,
        timestamp: DateTime<Utc>,
    },
    LoanSettled {
        loan_id: LoanId,
        final_payment: Money,
        timestamp: DateTime<Utc>,
    },

    // payment events
    PaymentApplied {
        loan_id: LoanId,
        payment_id: PaymentId,
        amount: Money,
        installment_ids: Vec<InstallmentId>,
        remaining_outstanding: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentRejected {
        loan_id: LoanId,
        expected: Money,
        provided: Money,
        timestamp: DateTime<Utc>,
    },

    // unit of work events
    UnitRolledBack {
        workflow: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_take_events_drains() {
        let mut store = EventStore::new();
        store.emit(Event::LoanSettled {
            loan_id: Uuid::new_v4(),
            final_payment: Money::from_minor(50096),
            timestamp: Utc::now(),
        });

        assert_eq!(store.events().len(), 1);
        assert_eq!(store.take_events().len(), 1);
        assert!(store.events().is_empty());
    }

    #[test]
    fn test_event_serializes_with_variant_tag() {
        let event = Event::PaymentRejected {
            loan_id: Uuid::nil(),
            expected: Money::from_minor(50096),
            provided: Money::from_major(500),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["PaymentRejected"]["expected"], "500.96");
    }
}
