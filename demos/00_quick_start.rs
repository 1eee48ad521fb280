/// quick start - register a borrower and originate a weekly loan
use loan_engine_rs::{InMemoryStore, LoanEngine, LoanRequest, Money, NewBorrower, Rate};
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut engine = LoanEngine::new(InMemoryStore::new());

    let borrower =
        engine.create_borrower_now(NewBorrower::new("Ada", "Lovelace", "ada@example.com"))?;

    // $1,000 at 5% over two weeks
    let created = engine.create_loan_now(LoanRequest {
        borrower_id: borrower.id,
        principal: Money::from_major(1_000),
        annual_interest_rate: Rate::from_percent(dec!(5.00)),
        term_weeks: 2,
        start_date: LoanRequest::parse_start_date("2023-01-01")?,
    })?;

    println!("{}", created.to_json_pretty()?);

    Ok(())
}
