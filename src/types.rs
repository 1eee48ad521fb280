use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};

/// unique identifier for a borrower
pub type BorrowerId = Uuid;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a schedule installment
pub type InstallmentId = Uuid;

/// unique identifier for a payment record
pub type PaymentId = Uuid;

/// borrower identity and contact details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borrower {
    pub id: BorrowerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// borrower registration input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBorrower {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl NewBorrower {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(LoanError::validation("borrower names must not be blank"));
        }
        if !self.email.contains('@') {
            return Err(LoanError::validation(format!(
                "invalid borrower email: {}",
                self.email
            )));
        }
        Ok(())
    }
}

/// loan row; `outstanding_amount` is the running total of unpaid obligation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub borrower_id: BorrowerId,
    pub principal: Money,
    pub annual_interest_rate: Rate,
    pub term_weeks: u32,
    pub start_date: DateTime<Utc>,
    pub outstanding_amount: Money,
    /// optimistic concurrency counter, bumped by the store on every update
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

/// one weekly entry of a loan's payment schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub id: InstallmentId,
    pub loan_id: LoanId,
    pub due_amount: Money,
    pub due_date: DateTime<Utc>,
    pub paid: bool,
}

impl Installment {
    /// unpaid and due on or before `as_of`
    pub fn is_due(&self, as_of: DateTime<Utc>) -> bool {
        !self.paid && self.due_date <= as_of
    }

    /// unpaid and due strictly before `as_of`
    pub fn is_overdue(&self, as_of: DateTime<Utc>) -> bool {
        !self.paid && self.due_date < as_of
    }
}

/// append-only record of a satisfied due amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub loan_id: LoanId,
    pub amount: Money,
    pub paid_at: DateTime<Utc>,
}

/// largest principal a loan request may ask for
pub const MAX_PRINCIPAL: i64 = 1_000_000_000_000;

/// largest annual rate a loan request may ask for, as a percentage
pub const MAX_ANNUAL_RATE_PERCENT: u32 = 1_000;

/// loan origination input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRequest {
    pub borrower_id: BorrowerId,
    pub principal: Money,
    pub annual_interest_rate: Rate,
    pub term_weeks: u32,
    pub start_date: DateTime<Utc>,
}

impl LoanRequest {
    /// parse a `YYYY-MM-DD` start date as midnight utc
    pub fn parse_start_date(value: &str) -> Result<DateTime<Utc>> {
        let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
            LoanError::validation(format!("invalid start date {value:?}: {e}"))
        })?;
        Ok(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    /// reject requests the schedule generator must never see
    pub fn validate(&self, max_term_weeks: u32) -> Result<()> {
        if !self.principal.is_positive() {
            return Err(LoanError::validation(format!(
                "principal must be positive, got {}",
                self.principal
            )));
        }
        if self.principal > Money::from_major(MAX_PRINCIPAL) {
            return Err(LoanError::validation(format!(
                "principal {} exceeds the maximum of {}",
                self.principal, MAX_PRINCIPAL
            )));
        }
        if self.annual_interest_rate.is_negative() {
            return Err(LoanError::validation(format!(
                "interest rate must not be negative, got {}",
                self.annual_interest_rate
            )));
        }
        if self.annual_interest_rate > Rate::from_percentage(MAX_ANNUAL_RATE_PERCENT) {
            return Err(LoanError::validation(format!(
                "interest rate {} exceeds the maximum of {}%",
                self.annual_interest_rate, MAX_ANNUAL_RATE_PERCENT
            )));
        }
        if self.term_weeks == 0 {
            return Err(LoanError::validation("term must be at least one week"));
        }
        if self.term_weeks > max_term_weeks {
            return Err(LoanError::validation(format!(
                "term of {} weeks exceeds the maximum of {}",
                self.term_weeks, max_term_weeks
            )));
        }
        Ok(())
    }
}
