//! One task per light, draining that light's request queue in order

use crate::error::{HueError, Result};
use crate::reconciler::LightReconciler;
use crate::types::{LightId, PartialUpdate};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

type Reply = oneshot::Sender<Result<()>>;

enum LightCommand {
    Apply { update: PartialUpdate, reply: Reply },
    Refresh { reply: Reply },
    Identify { reply: Reply },
}

/// Sending side of a light's request queue
///
/// Cheap to clone. Requests from every clone are processed one at a time,
/// in arrival order; each call resolves when its own request has finished.
#[derive(Clone)]
pub struct LightHandle {
    light: LightId,
    tx: mpsc::Sender<LightCommand>,
}

impl std::fmt::Debug for LightHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightHandle").field("light", &self.light).finish()
    }
}

impl LightHandle {
    pub fn light_id(&self) -> &LightId {
        &self.light
    }

    /// Queue a partial update and wait for the bridge's answer
    pub async fn apply(&self, update: PartialUpdate) -> Result<()> {
        self.request(|reply| LightCommand::Apply { update, reply }).await
    }

    /// Queue a re-read of the light's state
    pub async fn refresh(&self) -> Result<()> {
        self.request(|reply| LightCommand::Refresh { reply }).await
    }

    /// Queue an identify blink
    pub async fn identify(&self) -> Result<()> {
        self.request(|reply| LightCommand::Identify { reply }).await
    }

    async fn request(&self, command: impl FnOnce(Reply) -> LightCommand) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(command(reply_tx))
            .await
            .map_err(|_| HueError::WorkerStopped(self.light.clone()))?;

        reply_rx
            .await
            .map_err(|_| HueError::WorkerStopped(self.light.clone()))?
    }
}

/// Spawn the worker owning `reconciler`
///
/// The worker exits when `stop_rx` fires or every handle is dropped. A
/// request already being processed always runs to completion first.
pub(crate) fn spawn_worker(
    reconciler: LightReconciler,
    queue_depth: usize,
    mut stop_rx: broadcast::Receiver<()>,
) -> (LightHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel(queue_depth.max(1));
    let handle = LightHandle {
        light: reconciler.light_id().clone(),
        tx,
    };

    let task = tokio::spawn(async move {
        let mut reconciler = reconciler;
        loop {
            tokio::select! {
                _ = stop_rx.recv() => {
                    tracing::info!("Light {}: worker stopped", reconciler.light_id());
                    break;
                }
                command = rx.recv() => match command {
                    Some(command) => run_command(&mut reconciler, command).await,
                    None => {
                        tracing::debug!("Light {}: all handles dropped", reconciler.light_id());
                        break;
                    }
                },
            }
        }
    });

    (handle, task)
}

async fn run_command(reconciler: &mut LightReconciler, command: LightCommand) {
    let (result, reply) = match command {
        LightCommand::Apply { update, reply } => (reconciler.apply(update).await, reply),
        LightCommand::Refresh { reply } => (reconciler.refresh().await, reply),
        LightCommand::Identify { reply } => (reconciler.identify().await, reply),
    };

    if let Err(e) = &result {
        tracing::warn!("Light {}: request failed: {}", reconciler.light_id(), e);
    }
    // The caller may have given up waiting
    let _ = reply.send(result);
}
