pub mod schedule;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::types::{Installment, InstallmentId, LoanId};

pub use schedule::{schedule_total, ScheduleGenerator, ScheduledInstallment};

/// what a loan owes right now: unpaid installments due on or before `as_of`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DueQuote {
    pub loan_id: LoanId,
    pub as_of: DateTime<Utc>,
    pub total_due: Money,
    pub installments: Vec<Installment>,
}

impl DueQuote {
    pub fn new(loan_id: LoanId, as_of: DateTime<Utc>, mut installments: Vec<Installment>) -> Self {
        installments.sort_by_key(|i| i.due_date);
        let total_due = installments.iter().map(|i| i.due_amount).sum();
        Self {
            loan_id,
            as_of,
            total_due,
            installments,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.installments.is_empty()
    }

    pub fn installment_ids(&self) -> Vec<InstallmentId> {
        self.installments.iter().map(|i| i.id).collect()
    }

    /// a payment must equal the total due exactly
    pub fn validate_payment(&self, amount: Money) -> Result<()> {
        if amount != self.total_due {
            return Err(LoanError::AmountMismatch {
                expected: self.total_due,
                provided: amount,
            });
        }
        Ok(())
    }

    /// the caller's ids name exactly this quote's installments
    pub fn matches_ids(&self, ids: &[InstallmentId]) -> bool {
        let quoted: HashSet<InstallmentId> = self.installments.iter().map(|i| i.id).collect();
        let provided: HashSet<InstallmentId> = ids.iter().copied().collect();
        quoted == provided
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn installment(loan_id: LoanId, week: i64) -> Installment {
        Installment {
            id: Uuid::new_v4(),
            loan_id,
            due_amount: Money::from_minor(50096),
            due_date: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap() + Duration::days(7 * week),
            paid: false,
        }
    }

    #[test]
    fn test_quote_totals_and_orders() {
        let loan_id = Uuid::new_v4();
        let later = installment(loan_id, 2);
        let earlier = installment(loan_id, 1);
        let quote = DueQuote::new(loan_id, later.due_date, vec![later.clone(), earlier.clone()]);

        assert_eq!(quote.total_due, Money::from_minor(100192));
        assert_eq!(quote.installments[0].id, earlier.id);
        assert_eq!(quote.installment_ids(), vec![earlier.id, later.id]);
    }

    #[test]
    fn test_validate_payment_is_exact() {
        let loan_id = Uuid::new_v4();
        let quote = DueQuote::new(loan_id, Utc::now(), vec![installment(loan_id, 1)]);

        assert!(quote.validate_payment(Money::from_minor(50096)).is_ok());
        assert!(matches!(
            quote.validate_payment(Money::from_minor(50095)),
            Err(LoanError::AmountMismatch { .. })
        ));
        assert!(quote.validate_payment(Money::from_minor(50097)).is_err());
    }

    #[test]
    fn test_empty_quote_accepts_only_zero() {
        let quote = DueQuote::new(Uuid::new_v4(), Utc::now(), Vec::new());

        assert!(quote.is_empty());
        assert!(quote.total_due.is_zero());
        assert!(quote.validate_payment(Money::ZERO).is_ok());
        assert!(quote.validate_payment(Money::CENT).is_err());
    }

    #[test]
    fn test_matches_ids_ignores_order() {
        let loan_id = Uuid::new_v4();
        let first = installment(loan_id, 1);
        let second = installment(loan_id, 2);
        let quote = DueQuote::new(loan_id, second.due_date, vec![first.clone(), second.clone()]);

        assert!(quote.matches_ids(&[second.id, first.id]));
        assert!(!quote.matches_ids(&[first.id]));
        assert!(!quote.matches_ids(&[first.id, second.id, Uuid::new_v4()]));
    }
}
