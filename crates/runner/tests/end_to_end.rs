//! End-to-End Pipeline Tests
//!
//! Run whole scenarios through the bootstrapped stack: funding, market and
//! limit orders, price triggers, concurrent submissions, and offline
//! replay of the credits history.

use chrono::Utc;
use plutus_core::{OrderStatus, Side, TradeRequest};
use plutus_ports::{AuditTrail, CreditsStore, OrderStore, PortfolioStore};
use plutus_runner::{PipelineBootstrap, RunnerConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn app() -> PipelineBootstrap {
    let _ = env_logger::try_init();
    PipelineBootstrap::new()
}

async fn balance(app: &PipelineBootstrap, user: &str) -> Decimal {
    app.credits.balance(user).await.unwrap().unwrap().balance
}

#[tokio::test]
async fn test_buy_buy_sell_scenario() {
    let app = app();
    app.funding.deposit("user1", dec!(1000)).await.unwrap();
    app.feed.update("BTCUSDT", dec!(50000));

    // BUY 0.01 @ 50000, fee 0.50
    let req = TradeRequest::market("a", "user1", "BTCUSDT", Side::Buy, dec!(0.01), Utc::now());
    let result = app.submit(req).await.unwrap().await.unwrap();
    assert_eq!(result.status, OrderStatus::Filled);
    assert_eq!(balance(&app, "user1").await, dec!(499.50));

    let entry = app.portfolio.get("user1", "BTCUSDT").await.unwrap().unwrap();
    assert_eq!(entry.quantity, dec!(0.01));
    assert_eq!(entry.avg_buy_price, dec!(50000));

    // Top up, then BUY 0.01 @ 60000: average moves to 55000
    app.funding.deposit("user1", dec!(200)).await.unwrap();
    app.feed.update("BTCUSDT", dec!(60000));
    let req = TradeRequest::market("b", "user1", "BTCUSDT", Side::Buy, dec!(0.01), Utc::now());
    app.submit(req).await.unwrap().await.unwrap();

    let entry = app.portfolio.get("user1", "BTCUSDT").await.unwrap().unwrap();
    assert_eq!(entry.quantity, dec!(0.02));
    assert_eq!(entry.avg_buy_price, dec!(55000));
    assert_eq!(balance(&app, "user1").await, dec!(98.90));

    // SELL 0.02 @ 70000: entry deleted, proceeds 1400 - 1.40
    app.feed.update("BTCUSDT", dec!(70000));
    let req = TradeRequest::market("c", "user1", "BTCUSDT", Side::Sell, dec!(0.02), Utc::now());
    let result = app.submit(req).await.unwrap().await.unwrap();
    assert_eq!(result.status, OrderStatus::Filled);

    assert!(app.portfolio.get("user1", "BTCUSDT").await.unwrap().is_none());
    assert_eq!(balance(&app, "user1").await, dec!(1497.50));

    app.shutdown().await;
}

#[tokio::test]
async fn test_limit_order_waits_for_price_trigger() {
    let app = app();
    app.funding.deposit("user1", dec!(1000)).await.unwrap();
    app.feed.update("BTCUSDT", dec!(50000));

    let req = TradeRequest::limit(
        "d",
        "user1",
        "BTCUSDT",
        Side::Buy,
        dec!(0.01),
        dec!(48000),
        Utc::now(),
    );
    let result = app.submit(req).await.unwrap().await.unwrap();
    assert_eq!(result.status, OrderStatus::Open);

    // No ledger mutation while open
    assert_eq!(balance(&app, "user1").await, dec!(1000));
    assert!(app.portfolio.get("user1", "BTCUSDT").await.unwrap().is_none());

    // Price crosses; the trigger fans out a re-evaluation
    let enqueued = app.publish_price("BTCUSDT", dec!(47500)).await.unwrap();
    assert_eq!(enqueued, 1);

    let orders = app.orders.clone();
    app.shutdown().await;

    let order = orders.get(result.order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Filled);
    assert_eq!(order.fill_price, Some(dec!(47500)));
}

#[tokio::test]
async fn test_buy_beyond_balance_is_rejected_cleanly() {
    let app = app();
    app.funding.deposit("user1", dec!(100)).await.unwrap();
    app.feed.update("BTCUSDT", dec!(50000));

    let req = TradeRequest::market("e", "user1", "BTCUSDT", Side::Buy, dec!(1), Utc::now());
    let result = app.submit(req).await.unwrap().await.unwrap();

    assert_eq!(result.status, OrderStatus::Rejected);
    assert_eq!(balance(&app, "user1").await, dec!(100));
    assert!(app.portfolio.get("user1", "BTCUSDT").await.unwrap().is_none());
    assert!(app.audit.transactions("user1").await.unwrap().is_empty());

    app.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_buys_lose_no_updates() {
    let app = app();
    let workers = 8;
    app.funding.deposit("user1", dec!(1000)).await.unwrap();
    app.feed.update("TOKUSDT", dec!(100));

    // N concurrent buys of 1 @ 100; each costs 100 + 0.10 fee
    let mut receivers = Vec::new();
    for i in 0..workers {
        let req = TradeRequest::market(
            format!("cc-{}", i),
            "user1",
            "TOKUSDT",
            Side::Buy,
            dec!(1),
            Utc::now(),
        );
        receivers.push(app.submit(req).await.unwrap());
    }
    for rx in receivers {
        assert_eq!(rx.await.unwrap().status, OrderStatus::Filled);
    }

    let entry = app.portfolio.get("user1", "TOKUSDT").await.unwrap().unwrap();
    assert_eq!(entry.quantity, Decimal::from(workers));
    assert_eq!(entry.avg_buy_price, dec!(100));
    assert_eq!(balance(&app, "user1").await, dec!(199.20));

    app.shutdown().await;
}

#[tokio::test]
async fn test_duplicate_submissions_yield_one_transaction() {
    let app = app();
    app.funding.deposit("user1", dec!(1000)).await.unwrap();
    app.feed.update("BTCUSDT", dec!(50000));

    // The broker re-delivers the same logical request three times
    let mut receivers = Vec::new();
    for _ in 0..3 {
        let req =
            TradeRequest::market("same-key", "user1", "BTCUSDT", Side::Buy, dec!(0.01), Utc::now());
        receivers.push(app.submit(req).await.unwrap());
    }
    let mut order_ids = Vec::new();
    for rx in receivers {
        order_ids.push(rx.await.unwrap().order_id);
    }

    order_ids.dedup();
    assert_eq!(order_ids.len(), 1);
    assert_eq!(app.audit.transactions("user1").await.unwrap().len(), 1);
    assert_eq!(balance(&app, "user1").await, dec!(499.50));

    app.shutdown().await;
}

#[tokio::test]
async fn test_credits_history_replays_to_live_balance() {
    let app = app();
    app.funding.deposit("user1", dec!(1000)).await.unwrap();
    app.feed.update("BTCUSDT", dec!(50000));

    let buy = TradeRequest::market("h1", "user1", "BTCUSDT", Side::Buy, dec!(0.01), Utc::now());
    app.submit(buy).await.unwrap().await.unwrap();

    app.feed.update("BTCUSDT", dec!(52000));
    let sell = TradeRequest::market("h2", "user1", "BTCUSDT", Side::Sell, dec!(0.01), Utc::now());
    app.submit(sell).await.unwrap().await.unwrap();

    app.funding.withdraw("user1", dec!(300)).await.unwrap();

    // Replaying the signed amounts reconstructs every balance_after and
    // lands on the live balance
    let history = app.audit.credits_history("user1").await.unwrap();
    assert_eq!(history.len(), 4); // deposit, debit, credit, withdraw

    let mut running = Decimal::ZERO;
    for row in &history {
        running += row.amount;
        assert_eq!(row.balance_after, running);
    }
    assert_eq!(running, balance(&app, "user1").await);

    app.shutdown().await;
}

#[tokio::test]
async fn test_cancel_races_price_trigger() {
    let app = app();
    app.funding.deposit("user1", dec!(1000)).await.unwrap();
    app.feed.update("BTCUSDT", dec!(50000));

    let req = TradeRequest::limit(
        "r1",
        "user1",
        "BTCUSDT",
        Side::Buy,
        dec!(0.01),
        dec!(48000),
        Utc::now(),
    );
    let open = app.submit(req).await.unwrap().await.unwrap();
    assert_eq!(open.status, OrderStatus::Open);

    // Fire the trigger and the cancel together; exactly one conditional
    // transition wins
    app.feed.update("BTCUSDT", dec!(47000));
    let trigger = app.pool.trigger_price("BTCUSDT");
    let cancel = app.cancel(open.order_id);
    let (trigger_result, cancel_result) = tokio::join!(trigger, cancel);
    trigger_result.unwrap();
    let reported = cancel_result.unwrap();

    let orders = app.orders.clone();
    let audit = app.audit.clone();
    let credits = app.credits.clone();
    app.shutdown().await;

    let order = orders.get(open.order_id).await.unwrap().unwrap();
    assert!(matches!(
        order.status,
        OrderStatus::Filled | OrderStatus::Cancelled
    ));
    // The cancel reported a coherent status either way
    assert!(matches!(
        reported.status,
        OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Pricing | OrderStatus::Open
    ));

    // A filled winner mutated the ledger exactly once; a cancelled winner
    // left it untouched
    match order.status {
        OrderStatus::Filled => {
            assert_eq!(audit.transactions("user1").await.unwrap().len(), 1);
        }
        OrderStatus::Cancelled => {
            let account = credits.balance("user1").await.unwrap().unwrap();
            assert_eq!(account.balance, dec!(1000));
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_custom_config_is_honored() {
    let _ = env_logger::try_init();
    let config = RunnerConfig {
        workers: 2,
        queue_capacity: 16,
        ..Default::default()
    };
    let app = PipelineBootstrap::with_config(config);
    app.funding.deposit("user1", dec!(500)).await.unwrap();
    app.feed.update("ETHUSDT", dec!(3000));

    let req = TradeRequest::market("cfg", "user1", "ETHUSDT", Side::Buy, dec!(0.1), Utc::now());
    let result = app.submit(req).await.unwrap().await.unwrap();
    assert_eq!(result.status, OrderStatus::Filled);
    // 0.1 * 3000 = 300, fee 0.30
    assert_eq!(balance(&app, "user1").await, dec!(199.70));

    app.shutdown().await;
}
