/// repayment - quote what is due each week and pay it off with controlled time
use chrono::{Duration, TimeZone, Utc};
use loan_engine_rs::{
    InMemoryStore, LoanEngine, LoanError, LoanRequest, Money, NewBorrower, Rate, SafeTimeProvider,
    TimeSource,
};
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== weekly repayment ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    let mut engine = LoanEngine::new(InMemoryStore::new());
    let borrower = engine.create_borrower(NewBorrower::new("Grace", "Hopper", "grace@example.com"), &time)?;
    let created = engine.create_loan(
        LoanRequest {
            borrower_id: borrower.id,
            principal: Money::from_major(5_000),
            annual_interest_rate: Rate::from_percent(dec!(10)),
            term_weeks: 4,
            start_date: time.now(),
        },
        &time,
    )?;
    println!("loan {} originated, outstanding ${}", created.loan.id, created.loan.outstanding_amount);

    // a partial payment is refused outright
    controller.advance(Duration::days(7));
    match engine.apply_payment(created.loan.id, &created.installment_ids()[..1], Money::from_major(100), &time) {
        Err(LoanError::AmountMismatch { expected, provided }) => {
            println!("refused ${provided}: exactly ${expected} is due");
        }
        other => println!("unexpected outcome: {other:?}"),
    }

    for week in 1..=4 {
        let quote = engine.quote_due(created.loan.id, &time)?;
        let payment = engine.apply_payment(created.loan.id, &quote.installment_ids(), quote.total_due, &time)?;
        println!(
            "week {week} ({}): paid ${}, outstanding ${}",
            time.now().format("%Y-%m-%d"),
            payment.amount,
            engine.outstanding_amount(created.loan.id)?
        );
        controller.advance(Duration::days(7));
    }

    println!("\nevents:");
    for event in engine.take_events() {
        println!("  {event:?}");
    }

    Ok(())
}
