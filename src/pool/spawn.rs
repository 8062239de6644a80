use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::domain::Message;
use crate::pipeline::{Inlet, Outlet};

use super::connection::Connection;
use super::state::{ConnectionState, SharedCounters, WorkerExit};

/// Spawn the worker owning `connection`.
///
/// The worker pulls from the pool's shared input, so whichever worker is
/// idle takes the next message. Liveness is checked before every receive:
/// once `process` marks the connection dead the worker forwards that last
/// message and exits without touching the connection again. It never redials;
/// replacing capacity is the management loop's job.
///
/// `stopped` is notified when the worker exits for a pool-wide reason
/// (input drained, downstream gone).
fn spawn_worker<P: Send + 'static>(
    mut connection: Box<dyn Connection<P>>,
    input: Inlet<Message<P>>,
    output: Outlet<Message<P>>,
    live: Arc<AtomicBool>,
    counters: Arc<SharedCounters>,
    stopped: Arc<Notify>,
) -> tokio::task::JoinHandle<WorkerExit> {
    tokio::spawn(async move {
        let connection_id = connection.id().get();
        debug!(connection_id, "Worker starting");

        let exit = loop {
            if !connection.is_live() {
                break WorkerExit::ConnectionDead;
            }
            let Some(message) = input.recv().await else {
                break WorkerExit::InputDrained;
            };

            counters.in_flight.fetch_add(1, Ordering::SeqCst);
            let message = connection.process(message).await;
            counters.in_flight.fetch_sub(1, Ordering::SeqCst);
            live.store(connection.is_live(), Ordering::Release);

            counters.processed.fetch_add(1, Ordering::Relaxed);
            if message.outcome().is_failed() {
                counters.failed.fetch_add(1, Ordering::Relaxed);
            }

            if output.send(message).await.is_err() {
                break WorkerExit::DownstreamClosed;
            }
        };

        live.store(false, Ordering::Release);
        match exit {
            WorkerExit::ConnectionDead => info!(connection_id, "Connection died, retiring worker"),
            WorkerExit::InputDrained => {
                debug!(connection_id, "Input drained");
                stopped.notify_one();
            }
            WorkerExit::DownstreamClosed => {
                warn!(connection_id, "Downstream closed");
                stopped.notify_one();
            }
        }
        exit
    })
}

/// Build a fresh [`ConnectionState`], spawning its worker immediately.
pub(super) fn new_connection<P: Send + 'static>(
    connection: Box<dyn Connection<P>>,
    input: Inlet<Message<P>>,
    output: Outlet<Message<P>>,
    counters: Arc<SharedCounters>,
    stopped: Arc<Notify>,
) -> ConnectionState {
    let id = connection.id();
    let live = Arc::new(AtomicBool::new(connection.is_live()));
    let handle = spawn_worker(connection, input, output, live.clone(), counters, stopped);
    ConnectionState {
        id,
        live,
        spawned_at: Instant::now(),
        handle,
    }
}
