use chrono::{DateTime, Utc};
use hourglass_rs::{SafeTimeProvider, TimeSource};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::LoanEngine;
use crate::errors::Result;
use crate::store::Store;
use crate::types::BorrowerId;

/// overdue position of a borrower across all of their loans
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelinquencyReport {
    pub borrower_id: BorrowerId,
    pub as_of: DateTime<Utc>,
    pub loan_count: usize,
    pub overdue_installments: usize,
    pub threshold: u32,
    pub delinquent: bool,
}

impl<S: Store> LoanEngine<S> {
    /// check delinquency with system time
    pub fn is_delinquent_now(&self, borrower_id: BorrowerId) -> Result<bool> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.is_delinquent(borrower_id, &time)
    }

    /// true when the borrower has at least `delinquency_threshold` unpaid
    /// installments due strictly before now, counted across every loan
    pub fn is_delinquent(&self, borrower_id: BorrowerId, time: &SafeTimeProvider) -> Result<bool> {
        Ok(self.delinquency_report(borrower_id, time)?.delinquent)
    }

    /// the counts behind `is_delinquent`
    pub fn delinquency_report(
        &self,
        borrower_id: BorrowerId,
        time: &SafeTimeProvider,
    ) -> Result<DelinquencyReport> {
        let deadline = self.deadline();
        self.store.find_borrower_by_id(borrower_id)?;
        let loans = self.store.find_loans_by_borrower_id(borrower_id)?;
        deadline.check("delinquency")?;

        let now = time.now();
        let overdue: usize = loans.iter().map(|ledger| ledger.overdue_count(now)).sum();
        let threshold = self.config.delinquency_threshold;
        let delinquent = overdue >= threshold as usize;

        debug!(
            borrower_id = %borrower_id,
            loans = loans.len(),
            overdue,
            delinquent,
            "delinquency evaluated"
        );

        Ok(DelinquencyReport {
            borrower_id,
            as_of: now,
            loan_count: loans.len(),
            overdue_installments: overdue,
            threshold,
            delinquent,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::decimal::Money;
    use crate::errors::{Entity, LoanError};
    use crate::workflows::testing::{clock, engine, engine_with, reference_request, register};
    use chrono::Duration;
    use uuid::Uuid;

    #[test]
    fn test_two_overdue_on_one_loan() {
        let mut engine = engine();
        let time = clock(2023, 1, 1);
        let borrower = register(&mut engine, &time);
        engine.create_loan(reference_request(borrower.id), &time).unwrap();

        // on the second due date only the first is strictly overdue
        assert!(!engine.is_delinquent(borrower.id, &clock(2023, 1, 15)).unwrap());
        assert!(engine.is_delinquent(borrower.id, &clock(2023, 1, 16)).unwrap());
    }

    #[test]
    fn test_one_overdue_one_paid() {
        let mut engine = engine();
        let time = clock(2023, 1, 1);
        let borrower = register(&mut engine, &time);
        let created = engine.create_loan(reference_request(borrower.id), &time).unwrap();

        let first_due = clock(2023, 1, 8);
        engine
            .apply_payment(created.loan.id, &created.installment_ids()[..1], Money::from_minor(50096), &first_due)
            .unwrap();

        let report = engine.delinquency_report(borrower.id, &clock(2023, 1, 16)).unwrap();
        assert_eq!(report.overdue_installments, 1);
        assert!(!report.delinquent);
    }

    #[test]
    fn test_overdue_counted_across_loans() {
        let mut engine = engine();
        let time = clock(2023, 1, 1);
        let borrower = register(&mut engine, &time);

        let mut first = reference_request(borrower.id);
        first.term_weeks = 1;
        engine.create_loan(first, &time).unwrap();

        let mut second = reference_request(borrower.id);
        second.term_weeks = 1;
        second.start_date = second.start_date + Duration::days(1);
        engine.create_loan(second, &time).unwrap();

        let report = engine.delinquency_report(borrower.id, &clock(2023, 1, 10)).unwrap();
        assert_eq!(report.loan_count, 2);
        assert_eq!(report.overdue_installments, 2);
        assert!(report.delinquent);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let mut config = EngineConfig::standard();
        config.delinquency_threshold = 3;
        let mut engine = engine_with(config);
        let time = clock(2023, 1, 1);
        let borrower = register(&mut engine, &time);
        engine.create_loan(reference_request(borrower.id), &time).unwrap();

        assert!(!engine.is_delinquent(borrower.id, &clock(2023, 3, 1)).unwrap());
    }

    #[test]
    fn test_not_found_cases() {
        let mut engine = engine();
        let time = clock(2023, 1, 1);

        assert!(matches!(
            engine.is_delinquent(Uuid::new_v4(), &time),
            Err(LoanError::NotFound { entity: Entity::Borrower, .. })
        ));

        // a borrower without loans is not found rather than in good standing
        let borrower = register(&mut engine, &time);
        assert!(matches!(
            engine.is_delinquent(borrower.id, &time),
            Err(LoanError::NotFound { entity: Entity::BorrowerLoans, id }) if id == borrower.id
        ));
    }

    #[test]
    fn test_evaluation_does_not_mutate() {
        let mut engine = engine();
        let time = clock(2023, 1, 1);
        let borrower = register(&mut engine, &time);
        engine.create_loan(reference_request(borrower.id), &time).unwrap();
        let stats = engine.store().stats();

        engine.is_delinquent(borrower.id, &clock(2023, 2, 1)).unwrap();

        assert_eq!(engine.store().stats(), stats);
        assert_eq!(engine.store().payment_count(), 0);
    }
}
