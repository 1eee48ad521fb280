pub mod delinquency;
pub mod origination;
pub mod repayment;

use std::time::{Duration, Instant};

use tracing::warn;

use crate::errors::{LoanError, Result};

/// wall-clock budget of one workflow invocation
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Duration,
}

impl Deadline {
    pub fn start(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.started.elapsed())
    }

    /// fail with `Timeout` once the budget is spent
    pub fn check(&self, step: &'static str) -> Result<()> {
        let elapsed = self.started.elapsed();
        if elapsed >= self.limit {
            warn!(
                step,
                elapsed_ms = elapsed.as_millis() as u64,
                limit_ms = self.limit.as_millis() as u64,
                "workflow deadline passed"
            );
            return Err(LoanError::Timeout {
                elapsed_ms: elapsed.as_millis(),
                limit_ms: self.limit.as_millis(),
            });
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_budget_is_spent_immediately() {
        let deadline = Deadline::start(Duration::ZERO);

        assert!(matches!(deadline.check("begin"), Err(LoanError::Timeout { limit_ms: 0, .. })));
        assert_eq!(deadline.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_generous_budget_passes() {
        let deadline = Deadline::start(Duration::from_secs(30));

        assert!(deadline.check("begin").is_ok());
        assert!(deadline.remaining() > Duration::ZERO);
    }
}
