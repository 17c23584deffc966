use std::sync::Arc;

use gophermart_engine::{
    db_types::{Order, OrderStatus, SettleOutcome},
    traits::LedgerDatabase,
    OrdersApi,
    SqliteDatabase,
};
use log::*;
use tokio::{
    sync::{mpsc, watch, Mutex},
    task::JoinHandle,
};

use super::{AccrualClient, AccrualSource, FetchOutcome, RateGate};
use crate::config::AccrualConfig;

/// What a worker decided about one fetched order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OrderOutcome {
    /// A terminal verdict was applied (or had already been applied).
    Settled,
    /// Transient trouble; the row stays `PROCESSING` and a later claim
    /// re-surfaces it.
    Abandoned,
    /// Rate limited; wait for the gate and try the same order again.
    RetryAfterGate,
}

/// Starts the dispatcher and worker tasks. They run until `shutdown` flips,
/// at which point in-flight work is drained and the tasks exit; await the
/// returned handles to join them.
pub fn start_accrual_pipeline(
    db: SqliteDatabase,
    client: AccrualClient,
    config: &AccrualConfig,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    let (tx, rx) = mpsc::channel::<Order>(config.workers);
    let rx = Arc::new(Mutex::new(rx));
    let gate = Arc::new(RateGate::new());

    let mut handles = Vec::with_capacity(config.workers + 1);
    let dispatcher_api = OrdersApi::new(db.clone());
    let interval = config.poll_interval;
    handles.push(tokio::spawn(dispatch_loop(dispatcher_api, tx, interval, shutdown.clone())));
    for worker_id in 0..config.workers {
        let api = OrdersApi::new(db.clone());
        handles.push(tokio::spawn(worker_loop(
            worker_id,
            api,
            client.clone(),
            Arc::clone(&rx),
            Arc::clone(&gate),
            shutdown.clone(),
        )));
    }
    handles
}

/// Ticks at the configured interval, claims every unprocessed order and fans
/// them out to the workers. Sends are abandoned as soon as shutdown is
/// signalled so the task can never hang on a full channel.
async fn dispatch_loop(
    api: OrdersApi<SqliteDatabase>,
    tx: mpsc::Sender<Order>,
    interval: std::time::Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut timer = tokio::time::interval(interval);
    info!("🕰️ Accrual dispatcher started");
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = timer.tick() => {},
        }
        let orders = match api.claim_unprocessed().await {
            Ok(orders) => orders,
            Err(e) => {
                error!("🕰️ Failed to claim unprocessed orders: {e}");
                continue;
            },
        };
        if orders.is_empty() {
            continue;
        }
        debug!("🕰️ Claimed {} orders for accrual processing", orders.len());
        for order in orders {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("🕰️ Accrual dispatcher stopped");
                    return;
                },
                sent = tx.send(order) => {
                    if sent.is_err() {
                        // All workers are gone; nothing left to dispatch to.
                        return;
                    }
                },
            }
        }
    }
    info!("🕰️ Accrual dispatcher stopped");
}

/// One worker: receive an order, wait for the shared rate gate, query the
/// accrual service and apply the verdict. A rate-limited order is retried by
/// the same worker once the gate opens.
async fn worker_loop<C: AccrualSource>(
    worker_id: usize,
    api: OrdersApi<SqliteDatabase>,
    client: C,
    rx: Arc<Mutex<mpsc::Receiver<Order>>>,
    gate: Arc<RateGate>,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!("⚙️ Accrual worker {worker_id} started");
    'orders: loop {
        let order = {
            let mut rx = rx.lock().await;
            tokio::select! {
                _ = shutdown.changed() => break 'orders,
                received = rx.recv() => match received {
                    Some(order) => order,
                    None => break 'orders,
                },
            }
        };
        loop {
            tokio::select! {
                _ = shutdown.changed() => break 'orders,
                _ = gate.wait_until_open() => {},
            }
            match handle_order(&api, &client, &gate, &order).await {
                OrderOutcome::Settled | OrderOutcome::Abandoned => break,
                OrderOutcome::RetryAfterGate => continue,
            }
        }
    }
    debug!("⚙️ Accrual worker {worker_id} stopped");
}

pub(crate) async fn handle_order<B, C>(
    api: &OrdersApi<B>,
    client: &C,
    gate: &RateGate,
    order: &Order,
) -> OrderOutcome
where
    B: LedgerDatabase,
    C: AccrualSource,
{
    match client.fetch(&order.number).await {
        FetchOutcome::Known(reply) => {
            let status = reply.status.into_order_status();
            if status == OrderStatus::Processing {
                // Not scored yet. The row keeps its claim and the next tick asks again.
                trace!("⚙️ Order {} is still being scored", order.number);
                return OrderOutcome::Abandoned;
            }
            let mut verdict = order.clone();
            verdict.status = status;
            // A positive award is only legal on PROCESSED orders.
            verdict.accrual = if status == OrderStatus::Processed { reply.accrual } else { Default::default() };
            match api.settle(&verdict).await {
                Ok(SettleOutcome::Applied) => {
                    info!("⚙️ Order {} settled as {} with {} points", verdict.number, verdict.status, verdict.accrual);
                    OrderOutcome::Settled
                },
                Ok(SettleOutcome::AlreadySettled) => {
                    debug!("⚙️ Order {} had already been settled", verdict.number);
                    OrderOutcome::Settled
                },
                Err(e) => {
                    error!("⚙️ Failed to settle order {}: {e}", verdict.number);
                    OrderOutcome::Abandoned
                },
            }
        },
        FetchOutcome::RateLimited(wait) => {
            warn!("⚙️ Accrual service rate limit hit; deferring lookups for {}s", wait.as_secs());
            gate.defer(wait);
            OrderOutcome::RetryAfterGate
        },
        FetchOutcome::Transport | FetchOutcome::HttpOther => {
            debug!("⚙️ Abandoning order {} until the next claim", order.number);
            OrderOutcome::Abandoned
        },
    }
}
