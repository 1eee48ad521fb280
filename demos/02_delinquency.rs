/// delinquency - missed weeks across two loans flip the borrower to delinquent
use chrono::{Duration, TimeZone, Utc};
use loan_engine_rs::{
    InMemoryStore, LoanEngine, LoanRequest, Money, NewBorrower, Rate, SafeTimeProvider, TimeSource,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    let mut engine = LoanEngine::new(InMemoryStore::new());
    let borrower = engine.create_borrower(NewBorrower::new("Alan", "Turing", "alan@example.com"), &time)?;

    for principal in [2_000, 800] {
        engine.create_loan(
            LoanRequest {
                borrower_id: borrower.id,
                principal: Money::from_major(principal),
                annual_interest_rate: Rate::from_percentage(12),
                term_weeks: 8,
                start_date: time.now(),
            },
            &time,
        )?;
    }

    // first due date, the day after it, then a week later
    for step in [0, 7, 1, 7] {
        controller.advance(Duration::days(step));
        let report = engine.delinquency_report(borrower.id, &time)?;
        println!(
            "{}: {} overdue across {} loans, delinquent: {}",
            time.now().format("%Y-%m-%d"),
            report.overdue_installments,
            report.loan_count,
            report.delinquent
        );
    }

    Ok(())
}
