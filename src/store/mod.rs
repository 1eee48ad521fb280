pub mod memory;
pub mod unit_of_work;

use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::ledger::LoanLedger;
use crate::types::{
    Borrower, BorrowerId, Installment, InstallmentId, Loan, LoanId, Payment,
};

pub use memory::{FailMode, FailPoint, InMemoryStore, MemoryTx};
pub use unit_of_work::UnitOfWork;

/// begins and settles transactions; every repository write runs inside one
pub trait TransactionManager {
    type Tx;

    fn begin(&self) -> Result<Self::Tx>;
    fn commit(&self, tx: Self::Tx) -> Result<()>;
    fn rollback(&self, tx: Self::Tx) -> Result<()>;
}

pub trait BorrowerRepository: TransactionManager {
    /// persist a borrower, assigning its id
    fn create_borrower(&self, tx: &mut Self::Tx, borrower: &mut Borrower) -> Result<()>;
    fn find_borrower_by_id(&self, id: BorrowerId) -> Result<Borrower>;
}

pub trait LoanRepository: TransactionManager {
    /// persist a loan, assigning its id and initial version
    fn create_loan(&self, tx: &mut Self::Tx, loan: &mut Loan) -> Result<()>;

    /// overwrite a loan row; `loan.version` is the version the caller read and
    /// a different stored version fails the transaction with `VersionConflict`
    fn update_loan(&self, tx: &mut Self::Tx, loan: &Loan) -> Result<()>;

    fn find_loan_by_id(&self, id: LoanId) -> Result<LoanLedger>;

    /// every loan of a borrower; `NotFound` when there are none
    fn find_loans_by_borrower_id(&self, borrower_id: BorrowerId) -> Result<Vec<LoanLedger>>;
}

pub trait InstallmentRepository: TransactionManager {
    /// persist a loan's schedule, assigning installment ids in place
    fn bulk_create_installments(&self, tx: &mut Self::Tx, installments: &mut [Installment]) -> Result<()>;

    /// unpaid installments of a loan due on or before `as_of`, by due date
    fn find_unpaid_due_on_or_before(&self, loan_id: LoanId, as_of: DateTime<Utc>) -> Result<Vec<Installment>>;

    /// mark installments paid, returning how many unpaid rows matched
    fn mark_paid(&self, tx: &mut Self::Tx, ids: &[InstallmentId]) -> Result<usize>;
}

pub trait PaymentRepository: TransactionManager {
    /// append a payment record, assigning its id
    fn create_payment(&self, tx: &mut Self::Tx, payment: &mut Payment) -> Result<()>;

    /// payment history of a loan in `paid_at` order
    fn find_payments_by_loan_id(&self, loan_id: LoanId) -> Result<Vec<Payment>>;
}

/// everything the workflows need from persistence
pub trait Store: BorrowerRepository + LoanRepository + InstallmentRepository + PaymentRepository {}

impl<T> Store for T where T: BorrowerRepository + LoanRepository + InstallmentRepository + PaymentRepository {}
