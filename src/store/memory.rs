use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::errors::{Entity, LoanError, Result};
use crate::ledger::LoanLedger;
use crate::store::{
    BorrowerRepository, InstallmentRepository, LoanRepository, PaymentRepository,
    TransactionManager,
};
use crate::types::{
    Borrower, BorrowerId, Installment, InstallmentId, Loan, LoanId, Payment,
};

/// store operations at which a failure can be injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Begin,
    Commit,
    Rollback,
    CreateBorrower,
    CreateLoan,
    UpdateLoan,
    BulkCreateInstallments,
    MarkPaid,
    CreatePayment,
}

impl FailPoint {
    fn is_transactional(self) -> bool {
        matches!(self, FailPoint::Begin | FailPoint::Commit | FailPoint::Rollback)
    }
}

impl fmt::Display for FailPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// how an armed fail point behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailMode {
    /// return a storage (or transaction) error
    Error,
    /// panic inside the store call
    Panic,
}

/// transaction counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub begun: u64,
    pub committed: u64,
    pub rolled_back: u64,
}

/// one staged write, applied in order at commit
#[derive(Debug, Clone)]
enum WriteOp {
    InsertBorrower(Borrower),
    InsertLoan(Loan),
    UpdateLoan(Loan),
    InsertInstallments(Vec<Installment>),
    MarkPaid(Vec<InstallmentId>),
    InsertPayment(Payment),
}

/// an open in-memory transaction: nothing is visible to readers until commit
#[derive(Debug)]
pub struct MemoryTx {
    id: u64,
    ops: Vec<WriteOp>,
}

impl MemoryTx {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn staged_writes(&self) -> usize {
        self.ops.len()
    }

    fn staged_installments(&self) -> impl Iterator<Item = &Installment> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                WriteOp::InsertInstallments(rows) => Some(rows.iter()),
                _ => None,
            })
            .flatten()
    }

    fn staged_paid(&self) -> HashSet<InstallmentId> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                WriteOp::MarkPaid(ids) => Some(ids.iter().copied()),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    borrowers: HashMap<BorrowerId, Borrower>,
    loans: HashMap<LoanId, Loan>,
    installments: HashMap<InstallmentId, Installment>,
    payments: Vec<Payment>,
}

impl Tables {
    fn apply(&mut self, op: WriteOp) -> Result<()> {
        match op {
            WriteOp::InsertBorrower(borrower) => {
                self.borrowers.insert(borrower.id, borrower);
            }
            WriteOp::InsertLoan(loan) => {
                if !self.borrowers.contains_key(&loan.borrower_id) {
                    return Err(LoanError::StorageError {
                        message: format!(
                            "loan {} references missing borrower {}",
                            loan.id, loan.borrower_id
                        ),
                    });
                }
                self.loans.insert(loan.id, loan);
            }
            WriteOp::UpdateLoan(mut loan) => {
                let current = self
                    .loans
                    .get(&loan.id)
                    .ok_or_else(|| LoanError::not_found(Entity::Loan, loan.id))?;
                if current.version != loan.version {
                    return Err(LoanError::VersionConflict {
                        entity: Entity::Loan,
                        id: loan.id,
                        expected: loan.version,
                        found: current.version,
                    });
                }
                loan.version += 1;
                self.loans.insert(loan.id, loan);
            }
            WriteOp::InsertInstallments(rows) => {
                for row in rows {
                    if !self.loans.contains_key(&row.loan_id) {
                        return Err(LoanError::StorageError {
                            message: format!(
                                "installment {} references missing loan {}",
                                row.id, row.loan_id
                            ),
                        });
                    }
                    self.installments.insert(row.id, row);
                }
            }
            WriteOp::MarkPaid(ids) => {
                for id in ids {
                    if let Some(row) = self.installments.get_mut(&id) {
                        row.paid = true;
                    }
                }
            }
            WriteOp::InsertPayment(payment) => {
                if !self.loans.contains_key(&payment.loan_id) {
                    return Err(LoanError::StorageError {
                        message: format!(
                            "payment {} references missing loan {}",
                            payment.id, payment.loan_id
                        ),
                    });
                }
                self.payments.push(payment);
            }
        }
        Ok(())
    }

    fn ledger(&self, loan: &Loan) -> LoanLedger {
        let installments = self
            .installments
            .values()
            .filter(|i| i.loan_id == loan.id)
            .cloned()
            .collect();
        LoanLedger::new(loan.clone(), installments)
    }
}

/// thread-safe in-memory store with staged, all-or-nothing transactions
///
/// writes are buffered in the `MemoryTx` and applied to a copy of the tables
/// under the write lock at commit; the copy replaces the tables only if every
/// write applied, so readers see a whole unit or none of it.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    fail_points: Arc<Mutex<HashMap<FailPoint, FailMode>>>,
    next_tx: Arc<AtomicU64>,
    stats: Arc<Mutex<StoreStats>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// arm a fail point; it stays armed until cleared
    pub fn fail_at(&self, point: FailPoint, mode: FailMode) {
        self.fail_points.lock().insert(point, mode);
    }

    pub fn clear_fail_point(&self, point: FailPoint) {
        self.fail_points.lock().remove(&point);
    }

    pub fn clear_fail_points(&self) {
        self.fail_points.lock().clear();
    }

    pub fn stats(&self) -> StoreStats {
        *self.stats.lock()
    }

    pub fn borrower_count(&self) -> usize {
        self.tables.read().borrowers.len()
    }

    pub fn loan_count(&self) -> usize {
        self.tables.read().loans.len()
    }

    pub fn installment_count(&self) -> usize {
        self.tables.read().installments.len()
    }

    pub fn payment_count(&self) -> usize {
        self.tables.read().payments.len()
    }

    fn trip(&self, point: FailPoint) -> Result<()> {
        let armed = self.fail_points.lock().get(&point).copied();
        match armed {
            None => Ok(()),
            Some(FailMode::Error) if point.is_transactional() => Err(LoanError::TransactionError {
                message: format!("injected failure at {point}"),
            }),
            Some(FailMode::Error) => Err(LoanError::StorageError {
                message: format!("injected failure at {point}"),
            }),
            Some(FailMode::Panic) => panic!("injected panic at {point}"),
        }
    }
}

impl TransactionManager for InMemoryStore {
    type Tx = MemoryTx;

    fn begin(&self) -> Result<MemoryTx> {
        self.trip(FailPoint::Begin)?;
        let id = self.next_tx.fetch_add(1, Ordering::Relaxed) + 1;
        self.stats.lock().begun += 1;
        trace!(tx = id, "begin");
        Ok(MemoryTx {
            id,
            ops: Vec::new(),
        })
    }

    fn commit(&self, tx: MemoryTx) -> Result<()> {
        self.trip(FailPoint::Commit)?;

        let mut tables = self.tables.write();
        let mut next = tables.clone();
        let writes = tx.ops.len();
        for op in tx.ops {
            next.apply(op)?;
        }
        *tables = next;
        drop(tables);

        self.stats.lock().committed += 1;
        debug!(tx = tx.id, writes, "commit applied");
        Ok(())
    }

    fn rollback(&self, tx: MemoryTx) -> Result<()> {
        self.trip(FailPoint::Rollback)?;
        self.stats.lock().rolled_back += 1;
        debug!(tx = tx.id, discarded = tx.ops.len(), "rollback");
        Ok(())
    }
}

impl BorrowerRepository for InMemoryStore {
    fn create_borrower(&self, tx: &mut MemoryTx, borrower: &mut Borrower) -> Result<()> {
        self.trip(FailPoint::CreateBorrower)?;
        borrower.id = Uuid::new_v4();
        tx.ops.push(WriteOp::InsertBorrower(borrower.clone()));
        Ok(())
    }

    fn find_borrower_by_id(&self, id: BorrowerId) -> Result<Borrower> {
        self.tables
            .read()
            .borrowers
            .get(&id)
            .cloned()
            .ok_or_else(|| LoanError::not_found(Entity::Borrower, id))
    }
}

impl LoanRepository for InMemoryStore {
    fn create_loan(&self, tx: &mut MemoryTx, loan: &mut Loan) -> Result<()> {
        self.trip(FailPoint::CreateLoan)?;
        loan.id = Uuid::new_v4();
        loan.version = 1;
        tx.ops.push(WriteOp::InsertLoan(loan.clone()));
        Ok(())
    }

    fn update_loan(&self, tx: &mut MemoryTx, loan: &Loan) -> Result<()> {
        self.trip(FailPoint::UpdateLoan)?;
        tx.ops.push(WriteOp::UpdateLoan(loan.clone()));
        Ok(())
    }

    fn find_loan_by_id(&self, id: LoanId) -> Result<LoanLedger> {
        let tables = self.tables.read();
        let loan = tables
            .loans
            .get(&id)
            .ok_or_else(|| LoanError::not_found(Entity::Loan, id))?;
        Ok(tables.ledger(loan))
    }

    fn find_loans_by_borrower_id(&self, borrower_id: BorrowerId) -> Result<Vec<LoanLedger>> {
        let tables = self.tables.read();
        let mut loans: Vec<&Loan> = tables
            .loans
            .values()
            .filter(|l| l.borrower_id == borrower_id)
            .collect();
        if loans.is_empty() {
            return Err(LoanError::not_found(Entity::BorrowerLoans, borrower_id));
        }
        loans.sort_by_key(|l| l.created_at);
        Ok(loans.into_iter().map(|l| tables.ledger(l)).collect())
    }
}

impl InstallmentRepository for InMemoryStore {
    fn bulk_create_installments(&self, tx: &mut MemoryTx, installments: &mut [Installment]) -> Result<()> {
        self.trip(FailPoint::BulkCreateInstallments)?;
        for installment in installments.iter_mut() {
            installment.id = Uuid::new_v4();
        }
        tx.ops.push(WriteOp::InsertInstallments(installments.to_vec()));
        Ok(())
    }

    fn find_unpaid_due_on_or_before(&self, loan_id: LoanId, as_of: DateTime<Utc>) -> Result<Vec<Installment>> {
        let mut due: Vec<Installment> = self
            .tables
            .read()
            .installments
            .values()
            .filter(|i| i.loan_id == loan_id && i.is_due(as_of))
            .cloned()
            .collect();
        due.sort_by_key(|i| i.due_date);
        Ok(due)
    }

    fn mark_paid(&self, tx: &mut MemoryTx, ids: &[InstallmentId]) -> Result<usize> {
        self.trip(FailPoint::MarkPaid)?;

        let wanted: HashSet<InstallmentId> = ids.iter().copied().collect();
        let already_staged = tx.staged_paid();
        let committed = self
            .tables
            .read()
            .installments
            .values()
            .filter(|i| wanted.contains(&i.id) && !i.paid && !already_staged.contains(&i.id))
            .count();
        let staged = tx
            .staged_installments()
            .filter(|i| wanted.contains(&i.id) && !already_staged.contains(&i.id))
            .count();

        tx.ops.push(WriteOp::MarkPaid(wanted.into_iter().collect()));
        Ok(committed + staged)
    }
}

impl PaymentRepository for InMemoryStore {
    fn create_payment(&self, tx: &mut MemoryTx, payment: &mut Payment) -> Result<()> {
        self.trip(FailPoint::CreatePayment)?;
        payment.id = Uuid::new_v4();
        tx.ops.push(WriteOp::InsertPayment(payment.clone()));
        Ok(())
    }

    fn find_payments_by_loan_id(&self, loan_id: LoanId) -> Result<Vec<Payment>> {
        let mut payments: Vec<Payment> = self
            .tables
            .read()
            .payments
            .iter()
            .filter(|p| p.loan_id == loan_id)
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.paid_at);
        Ok(payments)
    }
}
