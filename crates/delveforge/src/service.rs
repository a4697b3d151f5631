//! The instance service: one game task that owns the manager and the world.
//!
//! Every lifecycle operation and the periodic expiry sweep run on this one
//! task, one at a time, so the manager never needs a lock. Other tasks
//! talk to it through an [`InstanceHandle`], the same way rooms are
//! reached through their command channel.

use delveforge_instance::{
    CloseReport, InstanceConfig, InstanceManager, InstanceSummary,
};
use delveforge_tick::{RepeatingTask, TaskMetrics};
use delveforge_types::{InstanceId, PlayerId};
use delveforge_world::{Clock, World};
use tokio::sync::{mpsc, oneshot};

use crate::{ServiceConfig, ServiceError};

/// Close reason used for instances still open when the service stops.
pub const SHUTDOWN_REASON: &str = "server shutdown";

/// A closure run on the game task with exclusive access to its state.
type Job<W> = Box<dyn FnOnce(&mut InstanceManager, &mut W) + Send>;

type Reply<T> = oneshot::Sender<Result<T, ServiceError>>;

/// Commands sent to the game task.
enum ServiceCommand<W> {
    Create {
        config: InstanceConfig,
        reply: Reply<InstanceId>,
    },
    BindPlayer {
        player: PlayerId,
        id: InstanceId,
        reply: Reply<()>,
    },
    BindParty {
        leader: PlayerId,
        id: InstanceId,
        reply: Reply<()>,
    },
    TeleportInto {
        id: InstanceId,
        player: PlayerId,
        reply: Reply<()>,
    },
    Close {
        id: InstanceId,
        reason: String,
        reply: Reply<CloseReport>,
    },
    PlayerLeave {
        player: PlayerId,
        reply: oneshot::Sender<bool>,
    },
    IsPlayerBound {
        player: PlayerId,
        id: InstanceId,
        reply: oneshot::Sender<bool>,
    },
    List {
        reply: oneshot::Sender<Vec<InstanceSummary>>,
    },
    Run(Job<W>),
    PauseSweep,
    ResumeSweep,
    SweepMetrics {
        reply: oneshot::Sender<TaskMetrics>,
    },
    Shutdown {
        reply: oneshot::Sender<Vec<CloseReport>>,
    },
}

/// Handle to a running instance service.
///
/// Cheap to clone. Every method returns [`ServiceError::Unavailable`]
/// once the game task has stopped.
pub struct InstanceHandle<W> {
    sender: mpsc::Sender<ServiceCommand<W>>,
}

impl<W> Clone for InstanceHandle<W> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<W: World + Send + 'static> InstanceHandle<W> {
    async fn send(&self, cmd: ServiceCommand<W>) -> Result<(), ServiceError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| ServiceError::Unavailable)
    }

    async fn request<T>(
        &self,
        cmd: impl FnOnce(Reply<T>) -> ServiceCommand<W>,
    ) -> Result<T, ServiceError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(cmd(reply_tx)).await?;
        reply_rx.await.map_err(|_| ServiceError::Unavailable)?
    }

    async fn query<T>(
        &self,
        cmd: impl FnOnce(oneshot::Sender<T>) -> ServiceCommand<W>,
    ) -> Result<T, ServiceError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(cmd(reply_tx)).await?;
        reply_rx.await.map_err(|_| ServiceError::Unavailable)
    }

    /// Creates an instance from `config`. See [`InstanceManager::create`].
    pub async fn create(&self, config: InstanceConfig) -> Result<InstanceId, ServiceError> {
        self.request(|reply| ServiceCommand::Create { config, reply })
            .await
    }

    pub async fn bind_player(&self, player: PlayerId, id: InstanceId) -> Result<(), ServiceError> {
        self.request(|reply| ServiceCommand::BindPlayer { player, id, reply })
            .await
    }

    pub async fn bind_party(&self, leader: PlayerId, id: InstanceId) -> Result<(), ServiceError> {
        self.request(|reply| ServiceCommand::BindParty { leader, id, reply })
            .await
    }

    pub async fn teleport_into(
        &self,
        id: InstanceId,
        player: PlayerId,
    ) -> Result<(), ServiceError> {
        self.request(|reply| ServiceCommand::TeleportInto { id, player, reply })
            .await
    }

    pub async fn close(
        &self,
        id: InstanceId,
        reason: impl Into<String>,
    ) -> Result<CloseReport, ServiceError> {
        let reason = reason.into();
        self.request(|reply| ServiceCommand::Close { id, reason, reply })
            .await
    }

    /// Returns whether the player was a member of any instance.
    pub async fn player_leave(&self, player: PlayerId) -> Result<bool, ServiceError> {
        self.query(|reply| ServiceCommand::PlayerLeave { player, reply })
            .await
    }

    pub async fn is_player_bound(
        &self,
        player: PlayerId,
        id: InstanceId,
    ) -> Result<bool, ServiceError> {
        self.query(|reply| ServiceCommand::IsPlayerBound { player, id, reply })
            .await
    }

    /// Snapshots of every open instance, in identifier order.
    pub async fn list(&self) -> Result<Vec<InstanceSummary>, ServiceError> {
        self.query(|reply| ServiceCommand::List { reply }).await
    }

    /// Runs `job` on the game task and returns its result.
    ///
    /// The job sees the manager and the world exactly as the next queued
    /// command will; nothing else runs while it does.
    pub async fn submit<F, R>(&self, job: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut InstanceManager, &mut W) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(ServiceCommand::Run(Box::new(move |manager, world| {
            let _ = reply_tx.send(job(manager, world));
        })))
        .await?;
        reply_rx.await.map_err(|_| ServiceError::Unavailable)
    }

    /// Stops the expiry sweep until [`resume_sweep`](Self::resume_sweep).
    /// Instances past their end time stay open meanwhile.
    pub async fn pause_sweep(&self) -> Result<(), ServiceError> {
        self.send(ServiceCommand::PauseSweep).await
    }

    /// Restarts the expiry sweep. The next sweep runs one full interval
    /// later.
    pub async fn resume_sweep(&self) -> Result<(), ServiceError> {
        self.send(ServiceCommand::ResumeSweep).await
    }

    /// Run counts and timings of the expiry sweep.
    pub async fn sweep_metrics(&self) -> Result<TaskMetrics, ServiceError> {
        self.query(|reply| ServiceCommand::SweepMetrics { reply })
            .await
    }

    /// Closes every open instance with [`SHUTDOWN_REASON`] and stops the
    /// game task.
    pub async fn shutdown(&self) -> Result<Vec<CloseReport>, ServiceError> {
        self.query(|reply| ServiceCommand::Shutdown { reply }).await
    }

    /// Whether the game task is still accepting commands.
    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Starts instance services.
pub struct InstanceService;

impl InstanceService {
    /// Spawns the game task on the current tokio runtime.
    ///
    /// The task owns a fresh [`InstanceManager`] reading time from
    /// `clock`, and `world`. It runs until [`InstanceHandle::shutdown`] is
    /// called or every handle is dropped; either way open instances are
    /// closed first.
    pub fn spawn<W, C>(config: &ServiceConfig, world: W, clock: C) -> InstanceHandle<W>
    where
        W: World + Send + 'static,
        C: Clock,
    {
        let (sender, receiver) = mpsc::channel(config.command_queue.max(1));
        let actor = ServiceActor {
            manager: InstanceManager::with_clock(config.manager.clone(), clock),
            world,
            sweep: RepeatingTask::new("instance-expiry", config.sweep_task()),
            receiver,
        };
        tokio::spawn(actor.run());
        InstanceHandle { sender }
    }
}

/// State owned by the game task.
struct ServiceActor<W> {
    manager: InstanceManager,
    world: W,
    sweep: RepeatingTask,
    receiver: mpsc::Receiver<ServiceCommand<W>>,
}

impl<W: World + Send + 'static> ServiceActor<W> {
    async fn run(mut self) {
        tracing::info!(
            sweep_interval_ms = self.sweep.interval().map(|d| d.as_millis() as u64),
            "instance service started"
        );

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else {
                        tracing::info!("all instance handles dropped");
                        self.close_all();
                        break;
                    };
                    if let Some(reply) = self.handle(cmd) {
                        let _ = reply.send(self.close_all());
                        break;
                    }
                }
                tick = self.sweep.wait_for_tick() => {
                    let closed = self.manager.sweep_expired(&mut self.world);
                    self.sweep.record_run_end();
                    if !closed.is_empty() {
                        tracing::debug!(tick = tick.tick, closed = closed.len(), "expiry sweep done");
                    }
                }
            }
        }

        tracing::info!(
            sweeps = self.sweep.tick_count(),
            "instance service stopped"
        );
    }

    /// Handles one command. Returns the reply channel if the command was
    /// a shutdown request.
    fn handle(&mut self, cmd: ServiceCommand<W>) -> Option<oneshot::Sender<Vec<CloseReport>>> {
        let manager = &mut self.manager;
        let world = &mut self.world;
        match cmd {
            ServiceCommand::Create { config, reply } => {
                let _ = reply.send(manager.create(world, config).map_err(Into::into));
            }
            ServiceCommand::BindPlayer { player, id, reply } => {
                let _ = reply.send(manager.bind_player(world, player, id).map_err(Into::into));
            }
            ServiceCommand::BindParty { leader, id, reply } => {
                let _ = reply.send(manager.bind_party(world, leader, id).map_err(Into::into));
            }
            ServiceCommand::TeleportInto { id, player, reply } => {
                let _ = reply.send(manager.teleport_into(world, id, player).map_err(Into::into));
            }
            ServiceCommand::Close { id, reason, reply } => {
                let _ = reply.send(manager.close(world, id, &reason).map_err(Into::into));
            }
            ServiceCommand::PlayerLeave { player, reply } => {
                let _ = reply.send(manager.player_leave(world, player));
            }
            ServiceCommand::IsPlayerBound { player, id, reply } => {
                let _ = reply.send(manager.is_player_bound(player, id));
            }
            ServiceCommand::List { reply } => {
                let _ = reply.send(manager.summaries());
            }
            ServiceCommand::Run(job) => job(manager, world),
            ServiceCommand::PauseSweep => self.sweep.pause(),
            ServiceCommand::ResumeSweep => self.sweep.resume(),
            ServiceCommand::SweepMetrics { reply } => {
                let _ = reply.send(self.sweep.metrics().clone());
            }
            ServiceCommand::Shutdown { reply } => return Some(reply),
        }
        None
    }

    fn close_all(&mut self) -> Vec<CloseReport> {
        let open: Vec<InstanceId> = self.manager.list().map(|i| i.id()).collect();
        if !open.is_empty() {
            tracing::info!(open = open.len(), "closing instances for shutdown");
        }
        open.into_iter()
            .filter_map(|id| self.manager.close(&mut self.world, id, SHUTDOWN_REASON).ok())
            .collect()
    }
}
