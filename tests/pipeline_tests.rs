//! End-to-end pipeline tests: limiter and pool composed with the builder.

use std::collections::HashSet;
use std::time::Duration;

use pipepool::domain::Message;
use pipepool::limiter::new_rate_limiter;
use pipepool::pipeline::{channel, FilterMapStage, MapStage, Pipeline};
use pipepool::pool::ConnectionPool;
use pipepool::testkit;
use pipepool::testkit::clock::tokio_seconds;
use pipepool::testkit::connection::ScriptedDialer;

#[tokio::test(start_paused = true)]
async fn limiter_then_pool_delivers_everything_and_shuts_down() {
    let limiter = new_rate_limiter::<Message<u32>>(&testkit::config::limiter(4, 50))
        .unwrap()
        .with_time_source(tokio_seconds());
    let dialer = ScriptedDialer::new()
        .with_process_delay(Duration::from_millis(20))
        .failing_seqs([5]);
    let probe = dialer.probe();
    let pool = ConnectionPool::new(testkit::config::pool(2, 100), dialer).unwrap();
    let monitor = pool.monitor();

    let (head, first) = channel();
    let (results, handle) = Pipeline::from_inlet(first)
        .pipe(MapStage::new(|n: u32| Message::new(u64::from(n), n)))
        .pipe(limiter)
        .pipe(pool)
        .into_inlet();
    assert_eq!(handle.len(), 3);

    let start = tokio::time::Instant::now();
    tokio::spawn(async move {
        for n in 0..12u32 {
            head.send(n).await.unwrap();
        }
        head.close();
    });

    let mut got = Vec::new();
    while let Some(m) = results.recv().await {
        got.push(m);
    }
    handle.join_all().await.unwrap();

    assert_eq!(got.len(), 12);
    let seqs: HashSet<u64> = got.iter().map(Message::seq).collect();
    assert_eq!(seqs, (0..12).collect::<HashSet<u64>>());
    let failed: Vec<u64> = got
        .iter()
        .filter(|m| m.outcome().is_failed())
        .map(Message::seq)
        .collect();
    assert_eq!(failed, vec![5]);

    // 12 messages at 4 per second: the last batch enters in second 2.
    assert!(start.elapsed() >= Duration::from_secs(2));
    assert!(probe.max_in_flight() <= 2);
    assert_eq!(probe.dispatched_while_dead(), 0);
    assert_eq!(monitor.stats().processed, 12);
}

#[tokio::test(start_paused = true)]
async fn empty_input_closes_terminal_output() {
    let pool = ConnectionPool::new(testkit::config::pool(2, 100), ScriptedDialer::new()).unwrap();
    let limiter = new_rate_limiter::<Message<u32>>(&testkit::config::limiter(1, 100))
        .unwrap()
        .with_time_source(tokio_seconds());

    let (head, first) = channel::<Message<u32>>();
    let (results, handle) = Pipeline::from_inlet(first)
        .pipe(limiter)
        .pipe(pool)
        .into_inlet();

    head.close();
    let closed = tokio::time::timeout(Duration::from_secs(1), results.recv()).await;
    assert!(matches!(closed, Ok(None)));
    handle.join_all().await.unwrap();
}

#[tokio::test]
async fn filter_stage_drops_items_without_breaking_close() {
    let (head, first) = channel();
    let (results, handle) = Pipeline::from_inlet(first)
        .pipe(FilterMapStage::new(|n: u32| (n % 2 == 0).then_some(n)))
        .pipe(MapStage::new(|n: u32| n + 1))
        .into_inlet();

    tokio::spawn(async move {
        for n in 0..6u32 {
            head.send(n).await.unwrap();
        }
        head.close();
    });

    let mut got = Vec::new();
    while let Some(n) = results.recv().await {
        got.push(n);
    }
    assert_eq!(got, vec![1, 3, 5]);
    handle.join_all().await.unwrap();
}
