mod common;

use chrono::{TimeDelta, Utc};
use common::*;
use cv_billing::application::webhook::WebhookOutcome;
use cv_billing::domain::action::ActionType;
use cv_billing::domain::order::{OrderId, OrderStatus};
use cv_billing::domain::policy::TimingPolicy;
use cv_billing::domain::ports::{ActionLog, OrderStore, PaymentOutcome};
use cv_billing::infrastructure::in_memory::{InMemoryActionLog, InMemoryOrderStore};
use cv_billing::infrastructure::simulated::SimulatedPaymentGateway;

#[tokio::test]
async fn test_full_production_lifecycle_is_monotone_and_audited() {
    let store = InMemoryOrderStore::new();
    let log = InMemoryActionLog::new();
    let emails = RecordingEmailDispatcher::new();
    let gateway = SimulatedPaymentGateway::new();
    let processor = dunning_processor(&store, &log, &emails, &gateway);
    let policy = TimingPolicy::production();

    let t0 = Utc::now();
    let id = OrderId::new("ord_1");
    store.insert(sample_order("ord_1", t0)).await.unwrap();

    let mut observed = vec![OrderStatus::New];
    for hours in [4, 24, 7 * 24, 14 * 24] {
        let report = processor.run(t0 + TimeDelta::hours(hours), &policy).await;
        assert_eq!(report.processed, 1, "sweep at {hours}h should advance");
        observed.push(store.get(&id).await.unwrap().unwrap().status);
    }

    assert_eq!(
        observed,
        vec![
            OrderStatus::New,
            OrderStatus::Confirmed,
            OrderStatus::Invoiced,
            OrderStatus::Reminder1,
            OrderStatus::Reminder2,
        ]
    );
    for pair in observed.windows(2) {
        assert!(pair[0].rank() < pair[1].rank());
    }

    // Each email type went out exactly once and its guard is set.
    let order = store.get(&id).await.unwrap().unwrap();
    assert!(order.confirmation_sent_at.is_some());
    assert!(order.invoice_sent_at.is_some());
    assert!(order.reminder1_sent_at.is_some());
    assert!(order.reminder2_sent_at.is_some());
    assert_eq!(emails.sent().await.len(), 4);

    // Audit completeness: one status_changed entry per transition, chaining
    // old to new without gaps.
    let actions = log.for_order(&id).await.unwrap();
    let transitions: Vec<_> = actions
        .iter()
        .filter(|a| a.action_type == ActionType::StatusChanged)
        .collect();
    assert_eq!(transitions.len(), 4);
    for (i, action) in transitions.iter().enumerate() {
        assert_eq!(
            action.metadata["from"],
            serde_json::to_value(observed[i]).unwrap()
        );
        assert_eq!(
            action.metadata["to"],
            serde_json::to_value(observed[i + 1]).unwrap()
        );
    }

    // One email_sent entry per status change.
    let emails_logged = actions
        .iter()
        .filter(|a| a.action_type == ActionType::EmailSent)
        .count();
    assert_eq!(emails_logged, 4);
}

#[tokio::test]
async fn test_payment_mid_pipeline_halts_dunning() {
    let store = InMemoryOrderStore::new();
    let log = InMemoryActionLog::new();
    let emails = RecordingEmailDispatcher::new();
    let gateway = SimulatedPaymentGateway::new();
    let processor = dunning_processor(&store, &log, &emails, &gateway);
    let webhook = webhook_processor(&store, &log, &emails, &gateway);
    let policy = TimingPolicy::accelerated();

    let t0 = Utc::now();
    let id = OrderId::new("ord_1");
    store.insert(sample_order("ord_1", t0)).await.unwrap();

    // Reach reminder_1, then the customer finally pays the invoice link.
    for secs in [10, 30, 60] {
        processor.run(t0 + TimeDelta::seconds(secs), &policy).await;
    }
    let order = store.get(&id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Reminder1);
    let payment_id = order.payment_request_id.clone().unwrap();

    gateway.settle(&payment_id, PaymentOutcome::Paid).await.unwrap();
    let outcome = webhook
        .handle(&payment_id, t0 + TimeDelta::seconds(90))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::Paid);

    // The final-notice threshold passes, but the order is settled.
    let email_count = emails.sent().await.len();
    let report = processor.run(t0 + TimeDelta::seconds(120), &policy).await;
    assert_eq!(report.processed, 0);
    assert_eq!(emails.sent().await.len(), email_count);
    assert!(store.get(&id).await.unwrap().unwrap().reminder2_sent_at.is_none());
}

#[tokio::test]
async fn test_independent_orders_progress_independently() {
    let store = InMemoryOrderStore::new();
    let log = InMemoryActionLog::new();
    let emails = RecordingEmailDispatcher::new();
    let gateway = SimulatedPaymentGateway::new();
    let processor = dunning_processor(&store, &log, &emails, &gateway);
    let policy = TimingPolicy::accelerated();

    let t0 = Utc::now();
    store.insert(sample_order("ord_1", t0)).await.unwrap();
    store
        .insert(sample_order("ord_2", t0 + TimeDelta::seconds(25)))
        .await
        .unwrap();

    // ord_1 is past the invoice threshold, ord_2 only past confirmation.
    let report = processor.run(t0 + TimeDelta::seconds(40), &policy).await;
    assert_eq!(report.processed, 2);

    let ord_1 = store.get(&OrderId::new("ord_1")).await.unwrap().unwrap();
    let ord_2 = store.get(&OrderId::new("ord_2")).await.unwrap().unwrap();
    // One step per sweep, even when several thresholds have passed.
    assert_eq!(ord_1.status, OrderStatus::Confirmed);
    assert_eq!(ord_2.status, OrderStatus::Confirmed);

    let report = processor.run(t0 + TimeDelta::seconds(70), &policy).await;
    assert_eq!(report.processed, 2);
    let ord_1 = store.get(&OrderId::new("ord_1")).await.unwrap().unwrap();
    let ord_2 = store.get(&OrderId::new("ord_2")).await.unwrap().unwrap();
    assert_eq!(ord_1.status, OrderStatus::Invoiced);
    assert_eq!(ord_2.status, OrderStatus::Invoiced);
    assert_ne!(ord_1.payment_request_id, ord_2.payment_request_id);
}
