use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::payments::schedule::{schedule_total, ScheduledInstallment};
use crate::types::{Installment, Loan};

/// a loan together with its schedule, ordered by due date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanLedger {
    pub loan: Loan,
    pub installments: Vec<Installment>,
}

impl LoanLedger {
    pub fn new(loan: Loan, mut installments: Vec<Installment>) -> Self {
        installments.sort_by_key(|i| i.due_date);
        Self { loan, installments }
    }

    /// stamp a generated schedule with the loan id and set the loan's
    /// outstanding amount to the schedule total
    pub fn attach_schedule(loan: &mut Loan, schedule: Vec<ScheduledInstallment>) -> Vec<Installment> {
        loan.outstanding_amount = schedule_total(&schedule);
        schedule
            .into_iter()
            .map(|entry| entry.into_installment(loan.id))
            .collect()
    }

    /// the loan after `amount` has been paid against it
    pub fn decrement_outstanding(loan: &Loan, amount: Money) -> Result<Loan> {
        let remaining = loan.outstanding_amount - amount;
        if remaining.is_negative() {
            return Err(LoanError::validation(format!(
                "payment of {} exceeds outstanding amount {}",
                amount, loan.outstanding_amount
            )));
        }

        let mut updated = loan.clone();
        updated.outstanding_amount = remaining;
        Ok(updated)
    }

    /// total of every scheduled installment
    pub fn scheduled_total(&self) -> Money {
        self.installments.iter().map(|i| i.due_amount).sum()
    }

    /// total of installments not yet paid
    pub fn unpaid_total(&self) -> Money {
        self.installments
            .iter()
            .filter(|i| !i.paid)
            .map(|i| i.due_amount)
            .sum()
    }

    /// unpaid installments due on or before `as_of`
    pub fn due_as_of(&self, as_of: DateTime<Utc>) -> impl Iterator<Item = &Installment> {
        self.installments.iter().filter(move |i| i.is_due(as_of))
    }

    /// unpaid installments whose due date is strictly before `as_of`
    pub fn overdue_count(&self, as_of: DateTime<Utc>) -> usize {
        self.installments.iter().filter(|i| i.is_overdue(as_of)).count()
    }

    /// first unpaid installment, if any
    pub fn next_unpaid(&self) -> Option<&Installment> {
        self.installments.iter().find(|i| !i.paid)
    }

    pub fn is_settled(&self) -> bool {
        self.loan.outstanding_amount.is_zero()
    }

    /// outstanding amount equals what is left unpaid on the schedule
    pub fn is_balanced(&self) -> bool {
        self.loan.outstanding_amount == self.unpaid_total()
    }

    /// structural invariants every persisted ledger must satisfy
    pub fn check_invariants(&self) -> Result<()> {
        if self.loan.outstanding_amount.is_negative() {
            return Err(LoanError::validation(format!(
                "loan {} has negative outstanding amount {}",
                self.loan.id, self.loan.outstanding_amount
            )));
        }
        if self.installments.len() != self.loan.term_weeks as usize {
            return Err(LoanError::validation(format!(
                "loan {} has {} installments for a {} week term",
                self.loan.id,
                self.installments.len(),
                self.loan.term_weeks
            )));
        }
        if let Some(stray) = self.installments.iter().find(|i| i.loan_id != self.loan.id) {
            return Err(LoanError::validation(format!(
                "installment {} belongs to loan {}, not {}",
                stray.id, stray.loan_id, self.loan.id
            )));
        }
        if self.loan.outstanding_amount > self.scheduled_total() {
            return Err(LoanError::validation(format!(
                "loan {} outstanding amount {} exceeds scheduled total {}",
                self.loan.id,
                self.loan.outstanding_amount,
                self.scheduled_total()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::payments::schedule::ScheduleGenerator;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
    }

    fn ledger(term_weeks: u32) -> LoanLedger {
        let mut loan = Loan {
            id: Uuid::new_v4(),
            borrower_id: Uuid::new_v4(),
            principal: Money::from_major(1_000),
            annual_interest_rate: Rate::from_percent(dec!(5)),
            term_weeks,
            start_date: start(),
            outstanding_amount: Money::ZERO,
            version: 1,
            created_at: start(),
        };
        let schedule = ScheduleGenerator::default().generate(
            loan.principal,
            loan.annual_interest_rate,
            term_weeks,
            start(),
        );
        let mut installments = LoanLedger::attach_schedule(&mut loan, schedule);
        for installment in &mut installments {
            installment.id = Uuid::new_v4();
        }
        LoanLedger::new(loan, installments)
    }

    #[test]
    fn test_attach_schedule_sets_outstanding() {
        let ledger = ledger(2);

        assert_eq!(ledger.loan.outstanding_amount, Money::from_minor(100192));
        assert_eq!(ledger.scheduled_total(), ledger.loan.outstanding_amount);
        assert!(ledger.installments.iter().all(|i| i.loan_id == ledger.loan.id && !i.paid));
        assert!(ledger.is_balanced());
        assert!(ledger.check_invariants().is_ok());
    }

    #[test]
    fn test_due_and_overdue_windows() {
        let mut ledger = ledger(4);
        let second_due = start() + Duration::days(14);

        // on the second due date both first installments are due, only one overdue
        assert_eq!(ledger.due_as_of(second_due).count(), 2);
        assert_eq!(ledger.overdue_count(second_due), 1);

        ledger.installments[0].paid = true;
        assert_eq!(ledger.due_as_of(second_due).count(), 1);
        assert_eq!(ledger.overdue_count(second_due), 0);
        assert_eq!(ledger.next_unpaid().map(|i| i.due_date), Some(second_due));
    }

    #[test]
    fn test_decrement_outstanding() {
        let ledger = ledger(2);

        let updated = LoanLedger::decrement_outstanding(&ledger.loan, Money::from_minor(50096)).unwrap();
        assert_eq!(updated.outstanding_amount, Money::from_minor(50096));
        assert_eq!(updated.version, ledger.loan.version);

        let settled = LoanLedger::decrement_outstanding(&updated, Money::from_minor(50096)).unwrap();
        assert!(settled.outstanding_amount.is_zero());

        assert!(matches!(
            LoanLedger::decrement_outstanding(&settled, Money::CENT),
            Err(LoanError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_invariant_violations() {
        let mut short = ledger(3);
        short.installments.pop();
        assert!(short.check_invariants().is_err());

        let mut inflated = ledger(3);
        inflated.loan.outstanding_amount += Money::from_major(1);
        assert!(inflated.check_invariants().is_err());
        assert!(!inflated.is_balanced());
    }
}
