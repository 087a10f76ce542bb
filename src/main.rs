use chrono::{TimeDelta, Utc};
use clap::Parser;
use cv_billing::application::dunning::DunningProcessor;
use cv_billing::application::webhook::WebhookProcessor;
use cv_billing::domain::action::{ActionEntry, Actor};
use cv_billing::domain::order::{Amount, Order, OrderId};
use cv_billing::domain::ports::{ActionLog, OrderStore, PaymentOutcome};
use cv_billing::infrastructure::in_memory::{InMemoryActionLog, InMemoryOrderStore};
use cv_billing::infrastructure::simulated::{LoggingEmailDispatcher, SimulatedPaymentGateway};
use cv_billing::interfaces::trigger::{DunningTrigger, TriggerRequest};
use cv_billing::interfaces::webhook::{WebhookEndpoint, WebhookRequest};
use miette::{IntoDiagnostic, Result};
use rust_decimal_macros::dec;

/// Demo harness for the order billing pipeline.
///
/// Seeds one order and drives the dunning trigger over virtual time (each
/// sweep advances the clock by one interval instead of sleeping), so a full
/// lifecycle run is instant and deterministic.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Shared secret expected by the trigger endpoint.
    #[arg(long, default_value = "change-me")]
    secret: String,

    /// Use the accelerated timing profile (seconds instead of hours/days).
    #[arg(long)]
    accelerated: bool,

    /// Number of sweeps to run.
    #[arg(long, default_value_t = 6)]
    sweeps: u32,

    /// Virtual seconds between sweeps.
    #[arg(long, default_value_t = 30)]
    interval_secs: i64,

    /// Settle the hosted payment once it exists and deliver the webhook.
    #[arg(long)]
    simulate_payment: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let store = InMemoryOrderStore::new();
    let log = InMemoryActionLog::new();
    let emails = LoggingEmailDispatcher::new();
    let gateway = SimulatedPaymentGateway::new();

    let t0 = Utc::now();
    let order = Order::new(
        OrderId::new("ord_0001"),
        "CV-2026-0001",
        "customer@example.com",
        Amount::new(dec!(14.95)).into_diagnostic()?,
        t0,
    );
    let order_id = order.id.clone();
    store.insert(order.clone()).await.into_diagnostic()?;
    log.append(&order_id, ActionEntry::created(&order.dossier_number, Actor::System))
        .await
        .into_diagnostic()?;

    let trigger = DunningTrigger::new(
        cli.secret.clone(),
        DunningProcessor::new(
            Box::new(store.clone()),
            Box::new(log.clone()),
            Box::new(emails.clone()),
            Box::new(gateway.clone()),
        ),
    );
    let webhook = WebhookEndpoint::new(WebhookProcessor::new(
        Box::new(store.clone()),
        Box::new(log.clone()),
        Box::new(emails),
        Box::new(gateway.clone()),
    ));

    let mut settled = false;
    for i in 1..=cli.sweeps {
        let now = t0 + TimeDelta::seconds(cli.interval_secs * i64::from(i));
        let request = TriggerRequest {
            secret: cli.secret.clone(),
            accelerated: cli.accelerated,
        };
        let response = trigger.handle(&request, now).await.into_diagnostic()?;
        println!(
            "sweep {i}: {}",
            serde_json::to_string(&response).into_diagnostic()?
        );

        if cli.simulate_payment && !settled {
            let current = store
                .get(&order_id)
                .await
                .into_diagnostic()?
                .ok_or_else(|| miette::miette!("seeded order missing"))?;
            if let Some(payment_id) = current.payment_request_id {
                gateway
                    .settle(&payment_id, PaymentOutcome::Paid)
                    .await
                    .into_diagnostic()?;
                let ack = webhook
                    .handle(&WebhookRequest { id: payment_id }, now)
                    .await;
                println!(
                    "webhook: {}",
                    serde_json::to_string(&ack).into_diagnostic()?
                );
                settled = true;
            }
        }
    }

    let final_order = store
        .get(&order_id)
        .await
        .into_diagnostic()?
        .ok_or_else(|| miette::miette!("seeded order missing"))?;
    println!(
        "order: {}",
        serde_json::to_string_pretty(&final_order).into_diagnostic()?
    );

    let trail = log.for_order(&order_id).await.into_diagnostic()?;
    println!(
        "audit: {}",
        serde_json::to_string_pretty(&trail).into_diagnostic()?
    );

    Ok(())
}
