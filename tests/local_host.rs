//! Behavior of the tokio-backed reference host: tick cadence, failure
//! containment, durable reminders shared across activations, and the
//! deactivation delay policy. Time is paused so the tests are deterministic.

use cadence::{ActivityContext, HostRuntime, LocalHost};
use chrono::TimeDelta;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn context_over(host: LocalHost<i64>) -> (ActivityContext<i64>, Arc<LocalHost<i64>>) {
    let host = Arc::new(host);
    (ActivityContext::new(host.clone()), host)
}

#[test_log::test(tokio::test(start_paused = true))]
async fn timer_ticks_fire_on_schedule() {
    let (mut ctx, _host) = context_over(LocalHost::new(1));
    let (tx, mut rx) = mpsc::unbounded_channel();

    ctx.register_timer(
        "tick",
        |tx: mpsc::UnboundedSender<()>| async move {
            let _ = tx.send(());
            Ok(())
        },
        tx,
        Duration::from_millis(10),
        Duration::from_millis(10),
    )
    .unwrap();

    for _ in 0..3 {
        rx.recv().await.unwrap();
    }
}

#[test_log::test(tokio::test(start_paused = true))]
async fn ticks_of_one_timer_never_overlap() {
    let (mut ctx, _host) = context_over(LocalHost::new(1));
    let (tx, mut rx) = mpsc::unbounded_channel();

    struct Gauge {
        in_flight: AtomicUsize,
        max_seen: AtomicUsize,
    }

    let gauge = Arc::new(Gauge {
        in_flight: AtomicUsize::new(0),
        max_seen: AtomicUsize::new(0),
    });

    // Each tick runs far longer than the period; overlap would push
    // in_flight above one.
    ctx.register_timer(
        "slow",
        {
            let gauge = gauge.clone();
            move |tx: mpsc::UnboundedSender<()>| {
                let gauge = gauge.clone();
                async move {
                    let current = gauge.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    gauge.max_seen.fetch_max(current, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    gauge.in_flight.fetch_sub(1, Ordering::SeqCst);
                    let _ = tx.send(());
                    Ok(())
                }
            }
        },
        tx,
        Duration::from_millis(1),
        Duration::from_millis(1),
    )
    .unwrap();

    for _ in 0..4 {
        rx.recv().await.unwrap();
    }
    assert_eq!(gauge.max_seen.load(Ordering::SeqCst), 1);
}

#[test_log::test(tokio::test(start_paused = true))]
async fn failed_tick_does_not_cancel_the_timer() {
    let (mut ctx, _host) = context_over(LocalHost::new(1));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let ticks = Arc::new(AtomicUsize::new(0));

    ctx.register_timer(
        "flaky",
        {
            let ticks = ticks.clone();
            move |tx: mpsc::UnboundedSender<()>| {
                let ticks = ticks.clone();
                async move {
                    let tick = ticks.fetch_add(1, Ordering::SeqCst);
                    let _ = tx.send(());
                    if tick == 0 {
                        anyhow::bail!("first tick fails");
                    }
                    Ok(())
                }
            }
        },
        tx,
        Duration::from_millis(5),
        Duration::from_millis(5),
    )
    .unwrap();

    // The failed first tick is logged by the host; later ticks still arrive
    for _ in 0..3 {
        rx.recv().await.unwrap();
    }
}

#[test_log::test(tokio::test(start_paused = true))]
async fn unregistering_stops_the_ticks() {
    let (mut ctx, _host) = context_over(LocalHost::new(1));
    let (tx, mut rx) = mpsc::unbounded_channel();

    ctx.register_timer(
        "tick",
        |tx: mpsc::UnboundedSender<()>| async move {
            let _ = tx.send(());
            Ok(())
        },
        tx,
        Duration::from_millis(10),
        Duration::from_millis(10),
    )
    .unwrap();

    rx.recv().await.unwrap();
    ctx.unregister_timer("tick").unwrap();

    // Drain anything already sent, then give the (cancelled) timer plenty of
    // periods to misbehave in
    while rx.try_recv().is_ok() {}
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(rx.try_recv().is_err());
}

#[test_log::test(tokio::test(start_paused = true))]
async fn deactivation_discards_timers_without_notice() {
    let (mut ctx, _host) = context_over(LocalHost::new(1));
    let (tx, mut rx) = mpsc::unbounded_channel();

    ctx.register_timer(
        "tick",
        |tx: mpsc::UnboundedSender<()>| async move {
            let _ = tx.send(());
            Ok(())
        },
        tx,
        Duration::from_millis(10),
        Duration::from_millis(10),
    )
    .unwrap();

    rx.recv().await.unwrap();
    ctx.discard_timers();
    assert!(ctx.registered_timers().is_empty());

    while rx.try_recv().is_ok() {}
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(rx.try_recv().is_err());
}

#[test_log::test(tokio::test)]
async fn reminders_survive_into_the_next_activation() {
    let first_host = LocalHost::new("orders-7".to_string());
    let store = first_host.reminder_store();
    let mut first = ActivityContext::new(Arc::new(first_host) as Arc<dyn HostRuntime<String>>);

    first
        .register_reminder("settle", Duration::from_secs(60), Duration::from_secs(3600))
        .await
        .unwrap();

    // A new activation of the same logical identity, empty cache, same store
    let second_host = LocalHost::with_store("orders-7".to_string(), store.clone());
    let mut second = ActivityContext::new(Arc::new(second_host) as Arc<dyn HostRuntime<String>>);

    assert!(second.is_reminder_registered("settle").await.unwrap());
    assert_eq!(second.registered_reminders().await.unwrap(), vec!["settle"]);

    second.unregister_reminder("settle").await.unwrap();
    assert!(store.lock().unwrap().is_empty());
    assert!(!first.is_reminder_registered("settle").await.unwrap());
}

#[test_log::test(tokio::test)]
async fn delay_deactivation_is_extend_only() {
    let host = Arc::new(LocalHost::new(7i64));
    let mut ctx = ActivityContext::new(host.clone() as Arc<dyn HostRuntime<i64>>);

    ctx.delay_deactivation(TimeDelta::seconds(5));
    let deadline = host.keep_alive_until().unwrap();

    // A shorter delay never moves the deadline earlier
    ctx.delay_deactivation(TimeDelta::seconds(1));
    assert_eq!(host.keep_alive_until(), Some(deadline));

    // A longer delay extends it
    ctx.delay_deactivation(TimeDelta::seconds(30));
    assert!(host.keep_alive_until().unwrap() > deadline);

    // A negative delay unlocks the activation
    ctx.delay_deactivation(TimeDelta::seconds(-1));
    assert_eq!(host.keep_alive_until(), None);
}

#[test_log::test(tokio::test)]
async fn deactivate_on_idle_overrides_a_pending_delay() {
    let host = Arc::new(LocalHost::new(7i64));
    let mut ctx = ActivityContext::new(host.clone() as Arc<dyn HostRuntime<i64>>);

    ctx.delay_deactivation(TimeDelta::minutes(10));
    assert!(host.keep_alive_until().is_some());

    ctx.deactivate_on_idle();
    assert!(host.is_deactivation_requested());
    assert_eq!(host.keep_alive_until(), None);
    assert!(ctx.is_deactivation_requested());
}
