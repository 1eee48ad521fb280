pub mod config;
pub mod decimal;
pub mod engine;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod payments;
pub mod store;
pub mod types;
pub mod views;
pub mod workflows;

// re-export key types
pub use config::EngineConfig;
pub use decimal::{Money, Rate};
pub use engine::LoanEngine;
pub use errors::{Entity, LoanError, Result};
pub use events::{Event, EventStore};
pub use ledger::LoanLedger;
pub use payments::{DueQuote, ScheduleGenerator, ScheduledInstallment};
pub use store::{
    BorrowerRepository, FailMode, FailPoint, InMemoryStore, InstallmentRepository,
    LoanRepository, PaymentRepository, Store, TransactionManager, UnitOfWork,
};
pub use types::{
    Borrower, BorrowerId, Installment, InstallmentId, Loan, LoanId, LoanRequest, NewBorrower,
    Payment, PaymentId,
};
pub use views::{BorrowerView, CreatedLoan, InstallmentView, LoanDetails, LoanView, ScheduleSummary};
pub use workflows::delinquency::DelinquencyReport;

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
