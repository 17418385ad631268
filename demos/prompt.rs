//! Example Airtel Money client.
//!
//! This example authorizes against the sandbox, sends a USSD payment prompt
//! and polls its status once.
//!
//! Run with:
//! ```bash
//! cargo run --example prompt
//! ```
//!
//! Environment variables (a `.env` file is read if present):
//! - AIRTEL_CLIENT_ID / AIRTEL_CLIENT_SECRET: API credentials
//! - AIRTEL_ENV: `live` or `sandbox` (default: live)
//! - AIRTEL_COUNTRY / AIRTEL_CURRENCY: market defaults (default: KE / KES)
//! - PHONE: subscriber to prompt
//! - AMOUNT: amount to collect (default: 10)

use airtel_money_rs::{AirtelClient, AirtelConfig, AirtelError, PaymentRequest, TransactionKind};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = AirtelConfig::from_env()?;
    let phone = std::env::var("PHONE").unwrap_or_else(|_| "+254712345678".to_string());
    let amount: f64 = std::env::var("AMOUNT")
        .ok()
        .and_then(|a| a.parse().ok())
        .unwrap_or(10.0);

    println!("Airtel Money prompt example");
    println!("   Environment: {}", config.environment);
    println!("   Host:        {}", config.resolved_base_url());
    println!("   Phone:       {}", phone);
    println!("   Amount:      {} {}", amount, config.currency);
    println!();

    let client = AirtelClient::new(config)?;
    client.authorize().await?;
    println!("Authorized");

    let response = match client.prompt(PaymentRequest::new(&phone, amount)).await {
        Ok(response) => response,
        Err(AirtelError::Payment { code, message }) => {
            eprintln!("Provider rejected the prompt ({}): {}", code, message);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let Some(transaction) = response.transaction() else {
        println!("Prompt accepted without a transaction id: {}", response.status.message);
        return Ok(());
    };
    println!("Prompt sent, transaction {}", transaction.id);

    // Give the subscriber a moment to enter the PIN.
    tokio::time::sleep(Duration::from_secs(20)).await;

    let status = client.status(&transaction.id, TransactionKind::Payment).await?;
    println!("State: {:?}", status.state());
    println!("{}", serde_json::to_string_pretty(&status)?);

    Ok(())
}
