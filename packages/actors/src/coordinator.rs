//! Coordinator actor: bootstraps the population and detects quiescence.

use std::sync::Arc;
use std::time::{Duration, Instant};

use matching_core::{
    MatchEvent, MatchSet, MatchingError, PreferenceTable, ProposerId, ReviewerId, validate_tables,
};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use tokio::sync::broadcast;

use crate::directory::Directory;
use crate::messages::{CoordinatorMessage, ProposerMessage};
use crate::proposer::{ProposerActor, ProposerArgs};
use crate::reviewer::{ReviewerActor, ReviewerArgs};

/// Tuning knobs for the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How long the event stream must stay silent before the run is
    /// declared quiescent. The clock re-arms on every event.
    pub idle_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_millis(100),
        }
    }
}

impl CoordinatorConfig {
    /// Probe interval for the idle clock.
    fn tick_interval(&self) -> Duration {
        (self.idle_timeout / 4).max(Duration::from_millis(5))
    }
}

/// Final result published at quiescence.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// The frozen match set.
    pub matches: MatchSet,
    /// Proposers that exhausted their lists unmatched.
    pub impossible: Vec<ProposerId>,
}

/// Coordinator actor arguments: the two validated-at-bootstrap tables.
pub struct CoordinatorArgs {
    pub proposer_prefs: PreferenceTable<ProposerId, ReviewerId>,
    pub reviewer_prefs: PreferenceTable<ReviewerId, ProposerId>,
    pub config: CoordinatorConfig,
}

/// State for the coordinator actor.
pub struct CoordinatorState {
    /// Tuning knobs.
    pub config: CoordinatorConfig,
    /// Peer lookup table handed to every spawned actor.
    pub directory: Arc<Directory>,
    /// All proposer actors, for the launch round.
    pub proposers: Vec<ActorRef<ProposerMessage>>,
    /// Live engagement bookkeeping.
    pub matches: MatchSet,
    /// Proposers reported impossible, for the final outcome.
    pub impossible: Vec<ProposerId>,
    /// Event broadcaster.
    pub event_tx: broadcast::Sender<MatchEvent>,
    /// Instant of launch or of the last event, whichever is later.
    last_activity: Instant,
    /// Whether Launch has been issued.
    launched: bool,
    /// Terminal flag; set exactly once.
    quiescent: bool,
    /// Callers waiting on the final outcome.
    waiters: Vec<RpcReplyPort<MatchOutcome>>,
}

impl CoordinatorState {
    fn outcome(&self) -> MatchOutcome {
        MatchOutcome {
            matches: self.matches.clone(),
            impossible: self.impossible.clone(),
        }
    }

    /// Record an event: update bookkeeping, fan out, re-arm the clock.
    fn record(&mut self, event: MatchEvent) {
        if self.quiescent {
            tracing::warn!("Event after quiescence ignored: {}", event.description());
            return;
        }
        tracing::debug!("{}", event.description());
        match &event {
            MatchEvent::Matched {
                proposer, reviewer, ..
            } => {
                self.matches.insert(proposer.clone(), reviewer.clone());
            }
            MatchEvent::Unmatched { proposer, .. } => {
                self.matches.remove(proposer);
            }
            MatchEvent::Impossible { proposer, .. } => {
                self.impossible.push(proposer.clone());
            }
        }
        let _ = self.event_tx.send(event);
        self.last_activity = Instant::now();
    }
}

/// Coordinator that spawns the population, kicks off the matching
/// round, and infers convergence from event silence alone.
pub struct CoordinatorActor;

impl Actor for CoordinatorActor {
    type Msg = CoordinatorMessage;
    type State = CoordinatorState;
    type Arguments = CoordinatorArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        validate_tables(&args.proposer_prefs, &args.reviewer_prefs)?;

        let n = args.proposer_prefs.len();
        tracing::info!("Bootstrapping matching run with {} pairs", n);

        let directory = Arc::new(Directory::new());

        // Reviewers first, so every proposer can reach its full list.
        for (id, preferences) in args.reviewer_prefs {
            let (actor, _handle) = Actor::spawn(
                None,
                ReviewerActor,
                ReviewerArgs {
                    id: id.clone(),
                    preferences,
                    directory: directory.clone(),
                },
            )
            .await
            .map_err(|e| ActorProcessingErr::from(format!("Failed to spawn reviewer: {e}")))?;
            directory.register_reviewer(id, actor);
        }

        let mut proposers = Vec::with_capacity(n);
        for (id, preferences) in args.proposer_prefs {
            let (actor, _handle) = Actor::spawn(
                None,
                ProposerActor,
                ProposerArgs {
                    id: id.clone(),
                    preferences,
                    directory: directory.clone(),
                    coordinator: myself.clone(),
                },
            )
            .await
            .map_err(|e| ActorProcessingErr::from(format!("Failed to spawn proposer: {e}")))?;
            directory.register_proposer(id, actor.clone());
            proposers.push(actor);
        }

        // Idle-clock probe, in the style of a heartbeat loop.
        let myself_clone = myself.clone();
        let tick = args.config.tick_interval();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            loop {
                interval.tick().await;
                if myself_clone
                    .send_message(CoordinatorMessage::IdleCheck)
                    .is_err()
                {
                    break;
                }
            }
        });

        let (event_tx, _) = broadcast::channel(1024);
        Ok(CoordinatorState {
            config: args.config,
            directory,
            proposers,
            matches: MatchSet::new(),
            impossible: Vec::new(),
            event_tx,
            last_activity: Instant::now(),
            launched: false,
            quiescent: false,
            waiters: Vec::new(),
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            CoordinatorMessage::Launch => {
                if state.launched {
                    return Ok(());
                }
                state.launched = true;
                state.last_activity = Instant::now();
                tracing::info!("Launching {} proposers", state.proposers.len());
                for proposer in &state.proposers {
                    if proposer.send_message(ProposerMessage::Run).is_err() {
                        tracing::warn!("Failed to trigger a proposer at launch");
                    }
                }
            }

            CoordinatorMessage::Matched { proposer, reviewer } => {
                state.record(MatchEvent::matched(proposer, reviewer));
            }

            CoordinatorMessage::Unmatched { proposer, reviewer } => {
                state.record(MatchEvent::unmatched(proposer, reviewer));
            }

            CoordinatorMessage::Impossible { proposer } => {
                state.record(MatchEvent::impossible(proposer));
            }

            CoordinatorMessage::IdleCheck => {
                if state.launched
                    && !state.quiescent
                    && state.last_activity.elapsed() >= state.config.idle_timeout
                {
                    state.quiescent = true;
                    tracing::info!(
                        "Quiescent: {} matched, {} impossible",
                        state.matches.len(),
                        state.impossible.len()
                    );
                    let outcome = state.outcome();
                    for reply in state.waiters.drain(..) {
                        let _ = reply.send(outcome.clone());
                    }
                }
            }

            CoordinatorMessage::GetMatches { reply } => {
                let _ = reply.send(state.matches.clone());
            }

            CoordinatorMessage::AwaitResult { reply } => {
                if state.quiescent {
                    let _ = reply.send(state.outcome());
                } else {
                    state.waiters.push(reply);
                }
            }

            CoordinatorMessage::Subscribe { sender } => {
                // Forward from our channel to the subscriber's.
                let mut rx = state.event_tx.subscribe();
                tokio::spawn(async move {
                    while let Ok(event) = rx.recv().await {
                        if sender.send(event).is_err() {
                            break;
                        }
                    }
                });
            }

            CoordinatorMessage::Shutdown => {
                tracing::info!("Shutting down coordinator");
                state.directory.stop_all();
                myself.stop(None);
            }
        }

        Ok(())
    }
}

/// Start a coordinator over the given preference tables.
pub async fn start_coordinator(
    args: CoordinatorArgs,
) -> Result<(ActorRef<CoordinatorMessage>, tokio::task::JoinHandle<()>), MatchingError> {
    Actor::spawn(None, CoordinatorActor, args)
        .await
        .map_err(|e| MatchingError::Spawn(e.to_string()))
}

/// Run one full matching round to quiescence and return the outcome.
///
/// Validates the tables, spawns the population, launches the round,
/// awaits the quiescent result, and tears the population down.
pub async fn run_matching(
    proposer_prefs: PreferenceTable<ProposerId, ReviewerId>,
    reviewer_prefs: PreferenceTable<ReviewerId, ProposerId>,
    config: CoordinatorConfig,
) -> Result<MatchOutcome, MatchingError> {
    validate_tables(&proposer_prefs, &reviewer_prefs)?;

    let (coordinator, handle) = start_coordinator(CoordinatorArgs {
        proposer_prefs,
        reviewer_prefs,
        config,
    })
    .await?;

    coordinator
        .send_message(CoordinatorMessage::Launch)
        .map_err(|e| MatchingError::Unavailable(e.to_string()))?;

    let result = ractor::rpc::call(
        &coordinator,
        |reply| CoordinatorMessage::AwaitResult { reply },
        None,
    )
    .await
    .map_err(|e| MatchingError::Unavailable(e.to_string()))?;

    let outcome = match result {
        ractor::rpc::CallResult::Success(outcome) => outcome,
        _ => {
            return Err(MatchingError::Unavailable(
                "coordinator dropped the result".into(),
            ));
        }
    };

    let _ = coordinator.send_message(CoordinatorMessage::Shutdown);
    let _ = handle.await;

    Ok(outcome)
}
