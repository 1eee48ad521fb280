/// json state - loan details, due quotes and config as json
use chrono::{Duration, TimeZone, Utc};
use loan_engine_rs::{
    EngineConfig, InMemoryStore, LoanEngine, LoanRequest, Money, NewBorrower, Rate,
    SafeTimeProvider, TimeSource,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== json state serialization ===\n");

    let config = EngineConfig::from_json(r#"{ "strict_installment_match": true, "workflow_timeout_ms": 5000 }"#)?;
    println!("config: {}\n", serde_json::to_string(&config)?);

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    let mut engine = LoanEngine::with_config(InMemoryStore::new(), config)?;
    let borrower = engine.create_borrower(NewBorrower::new("Ada", "Lovelace", "ada@example.com"), &time)?;
    let created = engine.create_loan(
        LoanRequest {
            borrower_id: borrower.id,
            principal: Money::from_major(1_200),
            annual_interest_rate: Rate::from_bps(650),
            term_weeks: 3,
            start_date: time.now(),
        },
        &time,
    )?;

    controller.advance(Duration::days(14));
    let quote = engine.quote_due(created.loan.id, &time)?;
    println!("due quote after two weeks");
    println!("-------------------------");
    println!("{}\n", quote.to_json_pretty()?);

    engine.apply_payment(created.loan.id, &quote.installment_ids(), quote.total_due, &time)?;
    println!("loan details after payment");
    println!("--------------------------");
    println!("{}", engine.loan_details(created.loan.id)?.to_json_pretty()?);

    Ok(())
}
