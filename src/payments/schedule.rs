use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{Installment, LoanId};

/// one generated (amount, due date) pair, before it is stamped with ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledInstallment {
    pub week: u32,
    pub due_amount: Money,
    pub due_date: DateTime<Utc>,
}

impl ScheduledInstallment {
    /// stamp with the owning loan; the store assigns the id on insert
    pub fn into_installment(self, loan_id: LoanId) -> Installment {
        Installment {
            id: uuid::Uuid::nil(),
            loan_id,
            due_amount: self.due_amount,
            due_date: self.due_date,
            paid: false,
        }
    }
}

/// weekly schedule generator: flat interest on the original principal,
/// each week rounded to cents on its own
#[derive(Debug, Clone, Copy)]
pub struct ScheduleGenerator {
    weeks_per_year: u32,
}

impl Default for ScheduleGenerator {
    fn default() -> Self {
        Self::new(52)
    }
}

impl ScheduleGenerator {
    pub fn new(weeks_per_year: u32) -> Self {
        Self { weeks_per_year }
    }

    /// generate `term_weeks` installments starting one week after `start_date`.
    ///
    /// callers must pass a positive principal and term; rounding differences are
    /// left where they fall, so the sum of the result is the loan's obligation.
    pub fn generate(
        &self,
        principal: Money,
        annual_rate: Rate,
        term_weeks: u32,
        start_date: DateTime<Utc>,
    ) -> Vec<ScheduledInstallment> {
        let weekly_rate = annual_rate.weekly_rate(self.weeks_per_year).as_decimal();
        let weekly_interest = principal.as_decimal() * weekly_rate;
        let principal_portion = principal.as_decimal() / Decimal::from(term_weeks);
        let due_amount = Money::from_decimal_currency(principal_portion + weekly_interest);

        (1..=term_weeks)
            .map(|week| ScheduledInstallment {
                week,
                due_amount,
                due_date: due_date(start_date, week),
            })
            .collect()
    }
}

/// sum of a generated schedule
pub fn schedule_total(schedule: &[ScheduledInstallment]) -> Money {
    schedule.iter().map(|s| s.due_amount).sum()
}

fn due_date(start_date: DateTime<Utc>, week: u32) -> DateTime<Utc> {
    start_date + Duration::days(7 * week as i64)
}
