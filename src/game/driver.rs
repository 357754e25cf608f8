//! Board event loop
//!
//! A single task owns the [`BoardSession`] and serializes everything that
//! touches it: player commands, animation completions and location updates.
//! The location poller and the current animation are scoped to the loop and
//! are released on every exit path.

use std::future::Future;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::game::animation::{spawn_animation, AnimationHandle, SpinTimeline};
use crate::game::deck::Deck;
use crate::game::spinner::SpinGeneration;
use crate::game::turn::{BoardSession, ChanceState, Landing, TaskState, TurnError};
use crate::location::{GeolocationProvider, LocationPoller, LocationUpdate};
use crate::metrics::ClientMetrics;
use crate::models::{Chance, Task, UserGameStats};

/// Where game progress is saved
pub trait GameBackend: Send + Sync + 'static {
    type Error: std::fmt::Display + Send;

    fn save_stats(
        &self,
        stats: &UserGameStats,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Keeps progress in memory only
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineBackend;

impl GameBackend for OfflineBackend {
    type Error = std::convert::Infallible;

    async fn save_stats(&self, stats: &UserGameStats) -> Result<(), Self::Error> {
        debug!("Offline: not saving {:?}", stats);
        Ok(())
    }
}

/// Player input
#[derive(Debug)]
pub enum BoardCommand {
    Spin,
    OpenTask,
    CloseTask,
    CompleteTask,
    OpenChance,
    CloseChance,
    ClaimChance,
    Snapshot(oneshot::Sender<BoardSnapshot>),
    Shutdown,
}

/// What the board tells the view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BoardNotice {
    SpinStarted {
        generation: SpinGeneration,
        start_angle: f64,
        end_angle: f64,
    },
    Landed {
        landing: Landing,
        square: &'static str,
        task: Option<Task>,
        chance: Option<Chance>,
    },
    GateChanged {
        square: &'static str,
        open: bool,
    },
    TaskOpened {
        square: &'static str,
        task: Option<Task>,
        completable: bool,
    },
    TaskCompleted {
        points: i64,
        score: i64,
    },
    ChanceOpened {
        card: Option<Chance>,
    },
    ChanceClaimed {
        points: i64,
        score: i64,
    },
    Refused(TurnError),
}

/// Read-only view of the board
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardSnapshot {
    pub position: usize,
    pub square: &'static str,
    pub can_spin: bool,
    pub spinning: bool,
    pub gate_open: bool,
    pub task_completable: bool,
    pub score: i64,
    pub wheel_angle: f64,
    pub task: TaskState,
    pub chance: ChanceState,
}

impl BoardSnapshot {
    fn of(session: &BoardSession) -> Self {
        Self {
            position: session.position(),
            square: session.square().name,
            can_spin: session.can_spin(),
            spinning: session.is_spinning(),
            gate_open: session.gate_open(),
            task_completable: session.is_task_completable(),
            score: session.score(),
            wheel_angle: session.wheel_angle(),
            task: session.task().clone(),
            chance: session.chance().clone(),
        }
    }
}

/// Client side of a running board
#[derive(Debug)]
pub struct BoardHandle {
    commands: mpsc::UnboundedSender<BoardCommand>,
    notices: mpsc::UnboundedReceiver<BoardNotice>,
    angle: watch::Receiver<f64>,
    task: JoinHandle<BoardSession>,
}

impl BoardHandle {
    /// Queue a command; false once the board has stopped
    pub fn send(&self, command: BoardCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Next notice, None once the board has stopped
    pub async fn next_notice(&mut self) -> Option<BoardNotice> {
        self.notices.recv().await
    }

    pub async fn snapshot(&self) -> Option<BoardSnapshot> {
        let (tx, rx) = oneshot::channel();
        if !self.send(BoardCommand::Snapshot(tx)) {
            return None;
        }
        rx.await.ok()
    }

    /// Live wheel angle for rendering
    pub fn wheel_angle(&self) -> watch::Receiver<f64> {
        self.angle.clone()
    }

    /// Stop the board and return its final state
    pub async fn shutdown(self) -> Option<BoardSession> {
        let _ = self.commands.send(BoardCommand::Shutdown);
        self.task.await.ok()
    }
}

pub struct BoardDriver<B: GameBackend, P: GeolocationProvider> {
    session: BoardSession,
    deck: Deck,
    backend: Arc<B>,
    provider: Arc<P>,
    config: ClientConfig,
    metrics: Arc<ClientMetrics>,
    rng: StdRng,
}

impl<B: GameBackend, P: GeolocationProvider> BoardDriver<B, P> {
    pub fn new(
        session: BoardSession,
        deck: Deck,
        backend: Arc<B>,
        provider: Arc<P>,
        config: ClientConfig,
        metrics: Arc<ClientMetrics>,
    ) -> Self {
        Self {
            session,
            deck,
            backend,
            provider,
            config,
            metrics,
            rng: StdRng::from_entropy(),
        }
    }

    /// Use a fixed random source (reproducible spins)
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Activate the board on the runtime
    pub fn spawn(self) -> BoardHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let (angle_tx, angle_rx) = watch::channel(self.session.wheel_angle());

        let running = RunningBoard {
            driver: self,
            notices: notice_tx,
            angle: Arc::new(angle_tx),
            animation: None,
        };
        let task = tokio::spawn(running.run(command_rx));

        BoardHandle {
            commands: command_tx,
            notices: notice_rx,
            angle: angle_rx,
            task,
        }
    }
}

struct RunningBoard<B: GameBackend, P: GeolocationProvider> {
    driver: BoardDriver<B, P>,
    notices: mpsc::UnboundedSender<BoardNotice>,
    angle: Arc<watch::Sender<f64>>,
    animation: Option<AnimationHandle>,
}

impl<B: GameBackend, P: GeolocationProvider> RunningBoard<B, P> {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<BoardCommand>) -> BoardSession {
        let (location_tx, mut locations) = mpsc::unbounded_channel();
        let poller = LocationPoller::spawn(
            self.driver.provider.clone(),
            self.driver.config.poll_interval,
            location_tx,
            self.driver.metrics.clone(),
        );
        let (done_tx, mut done) = mpsc::unbounded_channel();

        info!("Board active at {}", self.driver.session.square().name);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    None | Some(BoardCommand::Shutdown) => break,
                    Some(command) => self.handle_command(command, &done_tx).await,
                },
                Some(generation) = done.recv() => self.handle_animation_done(generation).await,
                Some(update) = locations.recv() => self.handle_location(update),
            }
        }

        drop(poller);
        if let Some(animation) = self.animation.take() {
            animation.cancel();
        }
        info!(
            "Board stopped at {} with {} points",
            self.driver.session.square().name,
            self.driver.session.score()
        );
        self.driver.session
    }

    fn notify(&self, notice: BoardNotice) {
        if self.notices.send(notice).is_err() {
            debug!("No view listening for board notices");
        }
    }

    async fn handle_command(
        &mut self,
        command: BoardCommand,
        done: &mpsc::UnboundedSender<SpinGeneration>,
    ) {
        match command {
            BoardCommand::Spin => self.start_spin(done),
            BoardCommand::OpenTask => match self.driver.session.open_task() {
                Ok(()) => {
                    let session = &self.driver.session;
                    self.notify(BoardNotice::TaskOpened {
                        square: session.square().name,
                        task: session.task().current.clone(),
                        completable: session.is_task_completable(),
                    });
                }
                Err(e) => self.notify(BoardNotice::Refused(e)),
            },
            BoardCommand::CloseTask => self.driver.session.close_task(),
            BoardCommand::CompleteTask => match self.driver.session.complete_task() {
                Ok(points) => {
                    self.driver.metrics.record_points(points, true);
                    self.notify(BoardNotice::TaskCompleted {
                        points,
                        score: self.driver.session.score(),
                    });
                    self.save().await;
                }
                Err(e) => self.notify(BoardNotice::Refused(e)),
            },
            BoardCommand::OpenChance => match self.driver.session.open_chance() {
                Ok(()) => self.notify(BoardNotice::ChanceOpened {
                    card: self.driver.session.chance().card.clone(),
                }),
                Err(e) => self.notify(BoardNotice::Refused(e)),
            },
            BoardCommand::CloseChance => self.driver.session.close_chance(),
            BoardCommand::ClaimChance => match self.driver.session.claim_chance() {
                Ok(points) => {
                    self.driver.metrics.record_points(points, false);
                    self.notify(BoardNotice::ChanceClaimed {
                        points,
                        score: self.driver.session.score(),
                    });
                    self.save().await;
                }
                Err(e) => self.notify(BoardNotice::Refused(e)),
            },
            BoardCommand::Snapshot(reply) => {
                let _ = reply.send(BoardSnapshot::of(&self.driver.session));
            }
            // Handled by the loop
            BoardCommand::Shutdown => {}
        }
    }

    fn start_spin(&mut self, done: &mpsc::UnboundedSender<SpinGeneration>) {
        let Some(ticket) = self.driver.session.request_spin(&mut self.driver.rng) else {
            return;
        };

        if let Some(previous) = self.animation.take() {
            previous.cancel();
        }
        self.driver.metrics.record_spin_started(ticket.superseded.is_some());

        let timeline = SpinTimeline::new(&ticket, self.driver.config.spin_duration);
        self.animation = Some(spawn_animation(
            ticket.generation,
            timeline,
            self.driver.config.frame_interval,
            self.angle.clone(),
            done.clone(),
        ));

        self.notify(BoardNotice::SpinStarted {
            generation: ticket.generation,
            start_angle: ticket.start_angle,
            end_angle: ticket.end_angle,
        });
    }

    async fn handle_animation_done(&mut self, generation: SpinGeneration) {
        let was_open = self.driver.session.gate_open();
        let Some(landing) = self.driver.session.finish_spin(generation) else {
            return;
        };
        if self
            .animation
            .as_ref()
            .is_some_and(|a| a.generation() == generation)
        {
            self.animation = None;
        }

        self.driver.metrics.record_spin_resolved(landing.outcome.is_chance);
        if landing.gate_open && !was_open {
            self.driver.metrics.record_gate_opened();
        }

        let task = self
            .driver
            .deck
            .draw_task(landing.position, &mut self.driver.rng);
        self.driver.session.assign_task(task.clone());

        let chance = if landing.outcome.is_chance {
            let card = self.driver.deck.draw_chance(&mut self.driver.rng);
            self.driver.session.assign_chance(card.clone());
            card
        } else {
            None
        };

        self.notify(BoardNotice::Landed {
            landing,
            square: self.driver.session.square().name,
            task,
            chance,
        });
        self.save().await;
    }

    fn handle_location(&mut self, update: LocationUpdate) {
        let was_open = self.driver.session.gate_open();
        let open = self.driver.session.on_location(&update);
        if open != was_open {
            if open {
                self.driver.metrics.record_gate_opened();
            }
            self.notify(BoardNotice::GateChanged {
                square: self.driver.session.square().name,
                open,
            });
        }
    }

    async fn save(&self) {
        let stats = self.driver.session.stats();
        if let Err(e) = self.driver.backend.save_stats(&stats).await {
            warn!("Failed to save game stats: {}", e);
            self.driver.metrics.record_save_failure();
        }
    }
}
