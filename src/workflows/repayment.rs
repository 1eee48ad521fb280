use chrono::{DateTime, Utc};
use hourglass_rs::{SafeTimeProvider, TimeSource};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::decimal::Money;
use crate::engine::LoanEngine;
use crate::errors::{LoanError, Result};
use crate::events::Event;
use crate::ledger::LoanLedger;
use crate::payments::DueQuote;
use crate::store::{Store, UnitOfWork};
use crate::types::{InstallmentId, Loan, LoanId, Payment};
use crate::workflows::Deadline;

impl<S: Store> LoanEngine<S> {
    /// quote what is due with system time
    pub fn quote_due_now(&self, loan_id: LoanId) -> Result<DueQuote> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.quote_due(loan_id, &time)
    }

    /// unpaid installments due on or before now, and their total
    pub fn quote_due(&self, loan_id: LoanId, time: &SafeTimeProvider) -> Result<DueQuote> {
        let deadline = self.deadline();
        self.store.find_loan_by_id(loan_id)?;
        let quote = self.due_quote(loan_id, time.now())?;
        deadline.check("quote_due")?;
        debug!(loan_id = %loan_id, total_due = %quote.total_due, count = quote.installments.len(), "due quoted");
        Ok(quote)
    }

    /// apply a payment with system time
    pub fn apply_payment_now(
        &mut self,
        loan_id: LoanId,
        installment_ids: &[InstallmentId],
        amount: Money,
    ) -> Result<Payment> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.apply_payment(loan_id, installment_ids, amount, &time)
    }

    /// apply a payment that exactly covers the current due set.
    ///
    /// the payment record, the paid flags and the outstanding decrement are
    /// committed together; the loan update is checked against the version read
    /// here, so a concurrent payment on the same loan fails with `VersionConflict`.
    pub fn apply_payment(
        &mut self,
        loan_id: LoanId,
        installment_ids: &[InstallmentId],
        amount: Money,
        time: &SafeTimeProvider,
    ) -> Result<Payment> {
        let deadline = self.deadline();
        let now = time.now();

        let ledger = self.store.find_loan_by_id(loan_id)?;
        let quote = self.due_quote(loan_id, now)?;

        if let Err(e) = quote.validate_payment(amount) {
            warn!(loan_id = %loan_id, expected = %quote.total_due, provided = %amount, "payment rejected");
            self.events.emit(Event::PaymentRejected {
                loan_id,
                expected: quote.total_due,
                provided: amount,
                timestamp: now,
            });
            return Err(e);
        }

        if quote.is_empty() {
            warn!(loan_id = %loan_id, "payment rejected, nothing is due");
            return Err(LoanError::validation(format!("nothing is due on loan {loan_id}")));
        }

        if self.config.strict_installment_match && !quote.matches_ids(installment_ids) {
            warn!(loan_id = %loan_id, "payment installments do not match the due set");
            return Err(LoanError::validation(format!(
                "installment ids do not match the {} installments due on loan {}",
                quote.installments.len(),
                loan_id
            )));
        }

        let mut payment = Payment {
            id: Uuid::nil(),
            loan_id,
            amount,
            paid_at: now,
        };

        let updated = match self.repay(&ledger.loan, &mut payment, installment_ids, &deadline) {
            Ok(updated) => updated,
            Err(e) => {
                self.record_rollback("apply_payment", &e, now);
                return Err(e);
            }
        };

        info!(
            loan_id = %loan_id,
            payment_id = %payment.id,
            amount = %amount,
            remaining = %updated.outstanding_amount,
            "payment applied"
        );
        self.events.emit(Event::PaymentApplied {
            loan_id,
            payment_id: payment.id,
            amount,
            installment_ids: installment_ids.to_vec(),
            remaining_outstanding: updated.outstanding_amount,
            timestamp: now,
        });
        if updated.outstanding_amount.is_zero() {
            info!(loan_id = %loan_id, "loan settled");
            self.events.emit(Event::LoanSettled {
                loan_id,
                final_payment: amount,
                timestamp: now,
            });
        }

        Ok(payment)
    }

    /// payment history in `paid_at` order
    pub fn payments_for_loan(&self, loan_id: LoanId) -> Result<Vec<Payment>> {
        self.store.find_loan_by_id(loan_id)?;
        self.store.find_payments_by_loan_id(loan_id)
    }

    fn due_quote(&self, loan_id: LoanId, as_of: DateTime<Utc>) -> Result<DueQuote> {
        let due = self.store.find_unpaid_due_on_or_before(loan_id, as_of)?;
        Ok(DueQuote::new(loan_id, as_of, due))
    }

    fn repay(
        &self,
        loan: &Loan,
        payment: &mut Payment,
        installment_ids: &[InstallmentId],
        deadline: &Deadline,
    ) -> Result<Loan> {
        deadline.check("begin")?;
        let mut unit = UnitOfWork::begin(&self.store, "apply_payment")?;

        self.store.create_payment(unit.tx()?, payment)?;

        deadline.check("mark_paid")?;
        let rows = self.store.mark_paid(unit.tx()?, installment_ids)?;
        if rows == 0 {
            return Err(LoanError::NoRowsAffected {
                operation: "mark_paid",
            });
        }
        debug!(loan_id = %loan.id, rows, "installments marked paid");

        let updated = LoanLedger::decrement_outstanding(loan, payment.amount)?;
        deadline.check("update_loan")?;
        self.store.update_loan(unit.tx()?, &updated)?;

        deadline.check("commit")?;
        unit.commit()?;
        Ok(updated)
    }
}
