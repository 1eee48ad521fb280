use hourglass_rs::{SafeTimeProvider, TimeSource};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::Result;
use crate::events::Event;
use crate::engine::LoanEngine;
use crate::ledger::LoanLedger;
use crate::store::{Store, UnitOfWork};
use crate::types::{Borrower, BorrowerId, Loan, LoanId, LoanRequest, NewBorrower};
use crate::views::{CreatedLoan, LoanDetails};
use crate::workflows::Deadline;

impl<S: Store> LoanEngine<S> {
    /// register a borrower with system time
    pub fn create_borrower_now(&mut self, new: NewBorrower) -> Result<Borrower> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.create_borrower(new, &time)
    }

    /// register a borrower
    pub fn create_borrower(&mut self, new: NewBorrower, time: &SafeTimeProvider) -> Result<Borrower> {
        let deadline = self.deadline();
        if let Err(e) = new.validate() {
            warn!(error = %e, "borrower rejected");
            return Err(e);
        }

        let now = time.now();
        let mut borrower = Borrower {
            id: Uuid::nil(),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            created_at: now,
        };

        if let Err(e) = self.persist_borrower(&mut borrower, &deadline) {
            self.record_rollback("create_borrower", &e, now);
            return Err(e);
        }

        info!(borrower_id = %borrower.id, "borrower registered");
        self.events.emit(Event::BorrowerRegistered {
            borrower_id: borrower.id,
            email: borrower.email.clone(),
            timestamp: now,
        });
        Ok(borrower)
    }

    pub fn find_borrower(&self, id: BorrowerId) -> Result<Borrower> {
        self.store.find_borrower_by_id(id)
    }

    /// originate a loan with system time
    pub fn create_loan_now(&mut self, request: LoanRequest) -> Result<CreatedLoan> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.create_loan(request, &time)
    }

    /// originate a loan: the loan row and its whole schedule are persisted
    /// together or not at all
    pub fn create_loan(&mut self, request: LoanRequest, time: &SafeTimeProvider) -> Result<CreatedLoan> {
        let deadline = self.deadline();
        if let Err(e) = request.validate(self.config.max_term_weeks) {
            warn!(borrower_id = %request.borrower_id, error = %e, "loan request rejected");
            return Err(e);
        }

        // read-only, outside the unit
        let borrower = match self.store.find_borrower_by_id(request.borrower_id) {
            Ok(borrower) => borrower,
            Err(e) => {
                warn!(borrower_id = %request.borrower_id, error = %e, "loan request rejected");
                return Err(e);
            }
        };

        let now = time.now();
        let mut loan = Loan {
            id: Uuid::nil(),
            borrower_id: borrower.id,
            principal: request.principal,
            annual_interest_rate: request.annual_interest_rate,
            term_weeks: request.term_weeks,
            start_date: request.start_date,
            outstanding_amount: Money::ZERO,
            version: 0,
            created_at: now,
        };

        if let Err(e) = self.originate(&mut loan, &deadline) {
            self.record_rollback("create_loan", &e, now);
            return Err(e);
        }

        let ledger = self.store.find_loan_by_id(loan.id)?;
        info!(
            loan_id = %ledger.loan.id,
            borrower_id = %borrower.id,
            principal = %ledger.loan.principal,
            rate = %ledger.loan.annual_interest_rate,
            term_weeks = ledger.loan.term_weeks,
            outstanding = %ledger.loan.outstanding_amount,
            "loan originated"
        );
        self.events.emit(Event::LoanOriginated {
            loan_id: ledger.loan.id,
            borrower_id: borrower.id,
            principal: ledger.loan.principal,
            annual_interest_rate: ledger.loan.annual_interest_rate,
            term_weeks: ledger.loan.term_weeks,
            outstanding_amount: ledger.loan.outstanding_amount,
            timestamp: now,
        });

        Ok(CreatedLoan::from_ledger(&ledger))
    }

    /// a loan with its borrower, schedule and payments
    pub fn loan_details(&self, loan_id: LoanId) -> Result<LoanDetails> {
        let ledger = self.store.find_loan_by_id(loan_id)?;
        let borrower = self.store.find_borrower_by_id(ledger.loan.borrower_id)?;
        let payments = self.store.find_payments_by_loan_id(loan_id)?;
        Ok(LoanDetails::new(&ledger, &borrower, payments))
    }

    pub fn outstanding_amount(&self, loan_id: LoanId) -> Result<Money> {
        Ok(self.store.find_loan_by_id(loan_id)?.loan.outstanding_amount)
    }

    fn persist_borrower(&self, borrower: &mut Borrower, deadline: &Deadline) -> Result<()> {
        deadline.check("begin")?;
        let mut unit = UnitOfWork::begin(&self.store, "create_borrower")?;
        self.store.create_borrower(unit.tx()?, borrower)?;
        deadline.check("commit")?;
        unit.commit()
    }

    fn originate(&self, loan: &mut Loan, deadline: &Deadline) -> Result<()> {
        deadline.check("begin")?;
        let mut unit = UnitOfWork::begin(&self.store, "create_loan")?;

        self.store.create_loan(unit.tx()?, loan)?;
        debug!(loan_id = %loan.id, "loan staged");

        let schedule = self.schedule.generate(
            loan.principal,
            loan.annual_interest_rate,
            loan.term_weeks,
            loan.start_date,
        );
        let mut installments = LoanLedger::attach_schedule(loan, schedule);

        deadline.check("update_loan")?;
        self.store.update_loan(unit.tx()?, loan)?;

        deadline.check("bulk_create_installments")?;
        self.store.bulk_create_installments(unit.tx()?, &mut installments)?;
        debug!(loan_id = %loan.id, count = installments.len(), "schedule staged");

        LoanLedger::new(loan.clone(), installments).check_invariants()?;

        deadline.check("commit")?;
        unit.commit()
    }
}
