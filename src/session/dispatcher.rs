use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, info, warn};

use super::controller::SessionController;
use crate::gateway::{Gateway, InboundEvent, OutboundInstruction, UserId};

/// Where a worker sends the instruction it produced
enum ReplyTo {
    Caller(oneshot::Sender<OutboundInstruction>),
    Gateway(Arc<dyn Gateway>),
}

struct Envelope {
    event: InboundEvent,
    reply_to: ReplyTo,
}

struct WorkerHandle {
    mailbox: mpsc::UnboundedSender<Envelope>,
    generation: u64,
}

#[derive(Default)]
struct WorkerTable {
    workers: HashMap<UserId, WorkerHandle>,
    next_generation: u64,
}

/// Routes events to one worker task per user
///
/// A worker owns its user's mailbox and handles events one at a time, in the order
/// they were enqueued. Different users run in parallel. All sends happen while the
/// table lock is held, so a worker that finds its mailbox empty under the lock can
/// retire without dropping anything.
pub struct SessionDispatcher {
    controller: Arc<SessionController>,
    table: Arc<Mutex<WorkerTable>>,
    idle_timeout: Duration,
}

impl SessionDispatcher {
    pub fn new(controller: Arc<SessionController>, idle_timeout: Duration) -> Self {
        Self {
            controller,
            table: Arc::new(Mutex::new(WorkerTable::default())),
            idle_timeout,
        }
    }

    pub fn controller(&self) -> &Arc<SessionController> {
        &self.controller
    }

    /// Handle an event and wait for its instruction
    pub async fn submit(&self, event: InboundEvent) -> Result<OutboundInstruction> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(event, ReplyTo::Caller(tx)).await;

        rx.await.context("Session worker dropped the reply")
    }

    /// Handle an event; the worker delivers the instruction through `gateway`
    pub async fn dispatch(&self, event: InboundEvent, gateway: Arc<dyn Gateway>) {
        self.enqueue(event, ReplyTo::Gateway(gateway)).await;
    }

    /// Feed events from a push-style transport until its channel closes
    pub async fn run(&self, gateway: Arc<dyn Gateway>, mut inbound: mpsc::Receiver<InboundEvent>) {
        info!("Dispatcher attached to gateway: {}", gateway.name());

        while let Some(event) = inbound.recv().await {
            self.dispatch(event, Arc::clone(&gateway)).await;
        }

        info!("Gateway {} closed its inbound channel", gateway.name());
    }

    /// Number of users with a live worker
    pub async fn active_workers(&self) -> usize {
        self.table.lock().await.workers.len()
    }

    async fn enqueue(&self, event: InboundEvent, reply_to: ReplyTo) {
        let user_id = event.user_id.clone();
        let mut envelope = Envelope { event, reply_to };
        let mut table = self.table.lock().await;

        if let Some(handle) = table.workers.get(&user_id) {
            match handle.mailbox.send(envelope) {
                Ok(()) => return,
                Err(mpsc::error::SendError(returned)) => {
                    // Worker is gone without retiring (panicked); replace it
                    warn!(user_id = %user_id, "Session worker vanished, restarting");
                    table.workers.remove(&user_id);
                    envelope = returned;
                }
            }
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let generation = table.next_generation;
        table.next_generation += 1;

        // Cannot fail: we hold the receiver
        let _ = tx.send(envelope);
        table.workers.insert(
            user_id.clone(),
            WorkerHandle {
                mailbox: tx,
                generation,
            },
        );

        debug!(user_id = %user_id, generation, "Spawning session worker");

        tokio::spawn(run_worker(
            user_id,
            generation,
            rx,
            Arc::clone(&self.controller),
            Arc::clone(&self.table),
            self.idle_timeout,
        ));
    }
}

async fn run_worker(
    user_id: UserId,
    generation: u64,
    mut mailbox: mpsc::UnboundedReceiver<Envelope>,
    controller: Arc<SessionController>,
    table: Arc<Mutex<WorkerTable>>,
    idle_timeout: Duration,
) {
    loop {
        let received = tokio::time::timeout(idle_timeout, mailbox.recv()).await;
        let envelope = match received {
            Ok(Some(envelope)) => envelope,
            Ok(None) => break,
            Err(_) => {
                let mut table = table.lock().await;
                match mailbox.try_recv() {
                    Ok(envelope) => {
                        drop(table);
                        envelope
                    }
                    Err(_) => {
                        let ours = table
                            .workers
                            .get(&user_id)
                            .map_or(false, |h| h.generation == generation);
                        if ours {
                            table.workers.remove(&user_id);
                        }
                        mailbox.close();
                        debug!(user_id = %user_id, generation, "Session worker retired");
                        break;
                    }
                }
            }
        };

        process(&controller, envelope).await;
    }
}

async fn process(controller: &SessionController, envelope: Envelope) {
    let Envelope { event, reply_to } = envelope;
    let user_id = event.user_id.clone();
    let instruction = controller.handle(event).await;

    match reply_to {
        ReplyTo::Caller(tx) => {
            if tx.send(instruction).is_err() {
                debug!(user_id = %user_id, "Caller went away before the reply");
            }
        }
        ReplyTo::Gateway(gateway) => {
            if let Err(e) = gateway.deliver(&user_id, instruction).await {
                error!(user_id = %user_id, "Failed to deliver via {}: {:#}", gateway.name(), e);
            }
        }
    }
}
