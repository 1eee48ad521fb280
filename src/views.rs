//! serializable response shapes
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::ledger::LoanLedger;
use crate::payments::DueQuote;
use crate::types::{Borrower, BorrowerId, Installment, InstallmentId, LoanId, Payment};

/// persisted loan fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanView {
    pub id: LoanId,
    pub borrower_id: BorrowerId,
    pub principal: Money,
    pub annual_interest_rate: Rate,
    pub term_weeks: u32,
    pub start_date: DateTime<Utc>,
    pub outstanding_amount: Money,
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentView {
    pub id: InstallmentId,
    pub due_amount: Money,
    pub due_date: DateTime<Utc>,
    pub paid: bool,
}

impl From<&Installment> for InstallmentView {
    fn from(installment: &Installment) -> Self {
        InstallmentView {
            id: installment.id,
            due_amount: installment.due_amount,
            due_date: installment.due_date,
            paid: installment.paid,
        }
    }
}

/// result of a successful loan creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedLoan {
    pub loan: LoanView,
    pub installments: Vec<InstallmentView>,
}

impl CreatedLoan {
    pub fn from_ledger(ledger: &LoanLedger) -> Self {
        CreatedLoan {
            loan: LoanView::from_ledger(ledger),
            installments: ledger.installments.iter().map(InstallmentView::from).collect(),
        }
    }

    pub fn installment_ids(&self) -> Vec<InstallmentId> {
        self.installments.iter().map(|i| i.id).collect()
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl LoanView {
    pub fn from_ledger(ledger: &LoanLedger) -> Self {
        let loan = &ledger.loan;
        LoanView {
            id: loan.id,
            borrower_id: loan.borrower_id,
            principal: loan.principal,
            annual_interest_rate: loan.annual_interest_rate,
            term_weeks: loan.term_weeks,
            start_date: loan.start_date,
            outstanding_amount: loan.outstanding_amount,
            version: loan.version,
            created_at: loan.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowerView {
    pub id: BorrowerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Borrower> for BorrowerView {
    fn from(borrower: &Borrower) -> Self {
        BorrowerView {
            id: borrower.id,
            first_name: borrower.first_name.clone(),
            last_name: borrower.last_name.clone(),
            email: borrower.email.clone(),
            created_at: borrower.created_at,
        }
    }
}

impl BorrowerView {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// schedule roll-up shown with loan details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub scheduled_total: Money,
    pub unpaid_total: Money,
    pub paid_count: u32,
    pub unpaid_count: u32,
    pub next_due_date: Option<DateTime<Utc>>,
    pub next_due_amount: Option<Money>,
}

/// a loan with its borrower, full schedule and payment history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanDetails {
    pub loan: LoanView,
    pub borrower: BorrowerView,
    pub summary: ScheduleSummary,
    pub installments: Vec<InstallmentView>,
    pub payments: Vec<Payment>,
}

impl LoanDetails {
    pub fn new(ledger: &LoanLedger, borrower: &Borrower, payments: Vec<Payment>) -> Self {
        let paid_count = ledger.installments.iter().filter(|i| i.paid).count() as u32;
        let next = ledger.next_unpaid();
        LoanDetails {
            loan: LoanView::from_ledger(ledger),
            borrower: BorrowerView::from(borrower),
            summary: ScheduleSummary {
                scheduled_total: ledger.scheduled_total(),
                unpaid_total: ledger.unpaid_total(),
                paid_count,
                unpaid_count: ledger.installments.len() as u32 - paid_count,
                next_due_date: next.map(|i| i.due_date),
                next_due_amount: next.map(|i| i.due_amount),
            },
            installments: ledger.installments.iter().map(InstallmentView::from).collect(),
            payments,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl DueQuote {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Loan;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn ledger() -> LoanLedger {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let loan_id = Uuid::new_v4();
        let installments = (1..=2)
            .map(|week| Installment {
                id: Uuid::new_v4(),
                loan_id,
                due_amount: Money::from_minor(50096),
                due_date: start + Duration::days(7 * week),
                paid: week == 1,
            })
            .collect();
        LoanLedger::new(
            Loan {
                id: loan_id,
                borrower_id: Uuid::new_v4(),
                principal: Money::from_major(1_000),
                annual_interest_rate: Rate::from_percent(dec!(5)),
                term_weeks: 2,
                start_date: start,
                outstanding_amount: Money::from_minor(50096),
                version: 3,
                created_at: start,
            },
            installments,
        )
    }

    #[test]
    fn test_created_loan_json() {
        let created = CreatedLoan::from_ledger(&ledger());
        let json = created.to_json_pretty().unwrap();

        assert!(json.contains("\"outstanding_amount\": \"500.96\""));
        assert!(json.contains("\"term_weeks\": 2"));
        assert_eq!(created.installment_ids().len(), 2);
    }

    #[test]
    fn test_loan_details_summary() {
        let ledger = ledger();
        let borrower = Borrower {
            id: ledger.loan.borrower_id,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            created_at: ledger.loan.created_at,
        };
        let details = LoanDetails::new(&ledger, &borrower, Vec::new());

        assert_eq!(details.summary.scheduled_total, Money::from_minor(100192));
        assert_eq!(details.summary.unpaid_total, Money::from_minor(50096));
        assert_eq!(details.summary.paid_count, 1);
        assert_eq!(details.summary.unpaid_count, 1);
        assert_eq!(details.summary.next_due_date, Some(ledger.installments[1].due_date));
        assert_eq!(details.borrower.email, "ada@example.com");
    }
}
