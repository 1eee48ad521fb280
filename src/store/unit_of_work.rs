use tracing::{debug, error, warn};

use crate::errors::{LoanError, Result};
use crate::store::TransactionManager;

/// scoped transaction; rolls back on drop unless `commit` was reached
///
/// covers early `?` returns as well as unwinding panics, so a workflow never
/// has to roll back by hand.
pub struct UnitOfWork<'a, M: TransactionManager> {
    manager: &'a M,
    tx: Option<M::Tx>,
    label: &'static str,
}

impl<'a, M: TransactionManager> UnitOfWork<'a, M> {
    pub fn begin(manager: &'a M, label: &'static str) -> Result<Self> {
        let tx = manager.begin()?;
        debug!(unit = label, "unit of work started");
        Ok(Self {
            manager,
            tx: Some(tx),
            label,
        })
    }

    /// transaction handle for repository writes
    pub fn tx(&mut self) -> Result<&mut M::Tx> {
        self.tx.as_mut().ok_or_else(|| LoanError::TransactionError {
            message: format!("unit of work {} is already settled", self.label),
        })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn commit(mut self) -> Result<()> {
        let tx = self.tx.take().ok_or_else(|| LoanError::TransactionError {
            message: format!("unit of work {} is already settled", self.label),
        })?;
        self.manager.commit(tx)?;
        debug!(unit = self.label, "unit of work committed");
        Ok(())
    }

    pub fn rollback(mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) => self.manager.rollback(tx),
            None => Ok(()),
        }
    }
}

impl<M: TransactionManager> Drop for UnitOfWork<'_, M> {
    fn drop(&mut self) {
        let Some(tx) = self.tx.take() else {
            return;
        };

        let panicking = std::thread::panicking();
        warn!(unit = self.label, panicking, "rolling back uncommitted unit of work");
        if let Err(e) = self.manager.rollback(tx) {
            error!(unit = self.label, error = %e, "rollback failed");
        }
    }
}
