use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use actors::{
    CoordinatorArgs, CoordinatorConfig, CoordinatorMessage, Directory, ProposalReply,
    ProposerActor, ProposerArgs, ProposerMessage, ReviewerActor, ReviewerArgs, ReviewerMessage,
    run_matching, start_coordinator,
};
use matching_core::{
    MatchEvent, MatchingError, PreferenceList, PreferenceTable, ProposerId, ReviewerId,
};
use ractor::{Actor, ActorProcessingErr, ActorRef};
use tokio::sync::{broadcast, mpsc};

fn proposer_table(entries: Vec<(&str, Vec<&str>)>) -> PreferenceTable<ProposerId, ReviewerId> {
    entries
        .into_iter()
        .map(|(id, prefs)| {
            (
                ProposerId::from(id),
                PreferenceList::new(prefs.into_iter().map(ReviewerId::from).collect()),
            )
        })
        .collect()
}

fn reviewer_table(entries: Vec<(&str, Vec<&str>)>) -> PreferenceTable<ReviewerId, ProposerId> {
    entries
        .into_iter()
        .map(|(id, prefs)| {
            (
                ReviewerId::from(id),
                PreferenceList::new(prefs.into_iter().map(ProposerId::from).collect()),
            )
        })
        .collect()
}

fn tables_3x3() -> (
    PreferenceTable<ProposerId, ReviewerId>,
    PreferenceTable<ReviewerId, ProposerId>,
) {
    (
        proposer_table(vec![
            ("a", vec!["x", "y", "z"]),
            ("b", vec!["y", "x", "z"]),
            ("c", vec!["x", "y", "z"]),
        ]),
        reviewer_table(vec![
            ("x", vec!["b", "a", "c"]),
            ("y", vec!["a", "b", "c"]),
            ("z", vec!["a", "b", "c"]),
        ]),
    )
}

/// Test double standing in for the coordinator: forwards every message
/// it receives into an mpsc channel for inspection.
struct EventProbe;

impl Actor for EventProbe {
    type Msg = CoordinatorMessage;
    type State = mpsc::UnboundedSender<CoordinatorMessage>;
    type Arguments = mpsc::UnboundedSender<CoordinatorMessage>;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        Ok(args)
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let _ = state.send(message);
        Ok(())
    }
}

/// Test double standing in for a proposer: records displacement
/// notifications delivered by reviewers.
struct ProposerProbe;

impl Actor for ProposerProbe {
    type Msg = ProposerMessage;
    type State = mpsc::UnboundedSender<ProposerMessage>;
    type Arguments = mpsc::UnboundedSender<ProposerMessage>;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        Ok(args)
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let _ = state.send(message);
        Ok(())
    }
}

/// Forwarding tap in front of a real reviewer: records who proposed,
/// then passes the proposal (reply port included) straight through.
struct ProposalTap;

struct ProposalTapArgs {
    reviewer: ReviewerId,
    target: ActorRef<ReviewerMessage>,
    seen: mpsc::UnboundedSender<(ProposerId, ReviewerId)>,
}

impl Actor for ProposalTap {
    type Msg = ReviewerMessage;
    type State = ProposalTapArgs;
    type Arguments = ProposalTapArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        Ok(args)
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let ReviewerMessage::Propose { proposer, reply } = message;
        let _ = state
            .seen
            .send((proposer.clone(), state.reviewer.clone()));
        state
            .target
            .send_message(ReviewerMessage::Propose { proposer, reply })?;
        Ok(())
    }
}

#[tokio::test]
async fn three_by_three_converges_to_proposer_optimal() {
    let (proposers, reviewers) = tables_3x3();
    let outcome = run_matching(
        proposers.clone(),
        reviewers.clone(),
        CoordinatorConfig::default(),
    )
    .await
    .expect("matching should converge");

    assert!(outcome.matches.is_perfect(3));
    assert!(outcome.impossible.is_empty());
    assert!(
        outcome
            .matches
            .blocking_pairs(&proposers, &reviewers)
            .is_empty()
    );

    // Deferred acceptance gives proposers their best stable partner:
    // a and b keep their first choices, c falls through to z.
    assert_eq!(outcome.matches.get(&"a".into()), Some(&"x".into()));
    assert_eq!(outcome.matches.get(&"b".into()), Some(&"y".into()));
    assert_eq!(outcome.matches.get(&"c".into()), Some(&"z".into()));
}

#[tokio::test]
async fn contested_run_is_stable_and_deterministic() {
    // Every proposer wants r1 first and every reviewer ranks the
    // proposers in the opposite order, forcing displacement chains.
    let proposers = proposer_table(vec![
        ("p1", vec!["r1", "r2", "r3", "r4"]),
        ("p2", vec!["r1", "r2", "r3", "r4"]),
        ("p3", vec!["r1", "r2", "r3", "r4"]),
        ("p4", vec!["r1", "r2", "r3", "r4"]),
    ]);
    let reviewers = reviewer_table(vec![
        ("r1", vec!["p4", "p3", "p2", "p1"]),
        ("r2", vec!["p4", "p3", "p2", "p1"]),
        ("r3", vec!["p4", "p3", "p2", "p1"]),
        ("r4", vec!["p4", "p3", "p2", "p1"]),
    ]);

    let mut results = Vec::new();
    for _ in 0..5 {
        let outcome = run_matching(
            proposers.clone(),
            reviewers.clone(),
            CoordinatorConfig::default(),
        )
        .await
        .expect("matching should converge");

        assert!(outcome.matches.is_perfect(4));
        assert!(outcome.impossible.is_empty());
        assert!(
            outcome
                .matches
                .blocking_pairs(&proposers, &reviewers)
                .is_empty()
        );
        results.push(outcome.matches);
    }

    // Identical final match set on every run, regardless of actor
    // interleaving.
    for matches in &results[1..] {
        assert_eq!(matches, &results[0]);
    }
    assert_eq!(results[0].get(&"p4".into()), Some(&"r1".into()));
    assert_eq!(results[0].get(&"p3".into()), Some(&"r2".into()));
    assert_eq!(results[0].get(&"p2".into()), Some(&"r3".into()));
    assert_eq!(results[0].get(&"p1".into()), Some(&"r4".into()));
}

#[tokio::test]
async fn no_proposer_proposes_to_the_same_reviewer_twice() {
    // Same displacement-heavy tables as the contested run: every
    // acceptance above the stable partner gets evicted again, so each
    // proposer walks a long way down its list. In deferred acceptance
    // each proposer proposes exactly once to every reviewer it ranks
    // above (and including) its final match: 4 + 3 + 2 + 1 pairs here,
    // with no pair repeated even across displacements.
    let proposers = proposer_table(vec![
        ("p1", vec!["r1", "r2", "r3", "r4"]),
        ("p2", vec!["r1", "r2", "r3", "r4"]),
        ("p3", vec!["r1", "r2", "r3", "r4"]),
        ("p4", vec!["r1", "r2", "r3", "r4"]),
    ]);
    let reviewers = reviewer_table(vec![
        ("r1", vec!["p4", "p3", "p2", "p1"]),
        ("r2", vec!["p4", "p3", "p2", "p1"]),
        ("r3", vec!["p4", "p3", "p2", "p1"]),
        ("r4", vec!["p4", "p3", "p2", "p1"]),
    ]);

    let (events_tx, _events_rx) = mpsc::unbounded_channel();
    let (coordinator_probe, _probe_handle) = Actor::spawn(None, EventProbe, events_tx)
        .await
        .expect("probe should spawn");

    // Assemble the population by hand so every reviewer sits behind a
    // recording tap.
    let directory = Arc::new(Directory::new());
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
    let mut real_reviewers = Vec::new();
    for (id, preferences) in reviewers {
        let (real, _handle) = Actor::spawn(
            None,
            ReviewerActor,
            ReviewerArgs {
                id: id.clone(),
                preferences,
                directory: directory.clone(),
            },
        )
        .await
        .expect("reviewer should spawn");
        let (tap, _tap_handle) = Actor::spawn(
            None,
            ProposalTap,
            ProposalTapArgs {
                reviewer: id.clone(),
                target: real.clone(),
                seen: seen_tx.clone(),
            },
        )
        .await
        .expect("tap should spawn");
        directory.register_reviewer(id, tap);
        real_reviewers.push(real);
    }

    let mut proposer_refs = Vec::new();
    for (id, preferences) in proposers {
        let (actor, _handle) = Actor::spawn(
            None,
            ProposerActor,
            ProposerArgs {
                id: id.clone(),
                preferences,
                directory: directory.clone(),
                coordinator: coordinator_probe.clone(),
            },
        )
        .await
        .expect("proposer should spawn");
        directory.register_proposer(id, actor.clone());
        proposer_refs.push(actor);
    }

    for proposer in &proposer_refs {
        proposer.send_message(ProposerMessage::Run).unwrap();
    }
    tokio::time::sleep(Duration::from_millis(500)).await;

    let mut counts: HashMap<(ProposerId, ReviewerId), usize> = HashMap::new();
    while let Ok(pair) = seen_rx.try_recv() {
        *counts.entry(pair).or_default() += 1;
    }

    assert_eq!(
        counts.len(),
        10,
        "each proposer proposes to exactly the reviewers down to its stable partner"
    );
    for ((proposer, reviewer), count) in &counts {
        assert_eq!(
            *count, 1,
            "{proposer} proposed to {reviewer} {count} times"
        );
    }

    for actor in real_reviewers {
        actor.stop(None);
    }
    directory.stop_all();
    coordinator_probe.stop(None);
}

#[tokio::test]
async fn single_pair_matches() {
    let proposers = proposer_table(vec![("a", vec!["x"])]);
    let reviewers = reviewer_table(vec![("x", vec!["a"])]);
    let outcome = run_matching(proposers, reviewers, CoordinatorConfig::default())
        .await
        .expect("matching should converge");
    assert_eq!(outcome.matches.get(&"a".into()), Some(&"x".into()));
    assert!(outcome.impossible.is_empty());
}

#[tokio::test]
async fn bootstrap_rejects_invalid_tables() {
    // Group size mismatch.
    let proposers = proposer_table(vec![("a", vec!["x", "y"])]);
    let reviewers = reviewer_table(vec![("x", vec!["a"]), ("y", vec!["a"])]);
    let err = run_matching(proposers, reviewers, CoordinatorConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, MatchingError::InvalidPreferenceList(_)));

    // Incomplete preference list.
    let proposers = proposer_table(vec![("a", vec!["x", "y"]), ("b", vec!["x"])]);
    let reviewers = reviewer_table(vec![("x", vec!["a", "b"]), ("y", vec!["b", "a"])]);
    let err = run_matching(proposers, reviewers, CoordinatorConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, MatchingError::InvalidPreferenceList(_)));
}

#[tokio::test]
async fn exhausted_proposer_reports_impossible_exactly_once() {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let (probe, _probe_handle) = Actor::spawn(None, EventProbe, events_tx)
        .await
        .expect("probe should spawn");

    // No reviewers registered: every proposal target is unavailable,
    // so the whole list is consumed as implicit rejects.
    let directory = Arc::new(Directory::new());
    let (proposer, _handle) = Actor::spawn(
        None,
        ProposerActor,
        ProposerArgs {
            id: "loner".into(),
            preferences: PreferenceList::new(vec!["x".into(), "y".into()]),
            directory,
            coordinator: probe.clone(),
        },
    )
    .await
    .expect("proposer should spawn");

    proposer.send_message(ProposerMessage::Run).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    // A stale trigger after exhaustion must not re-report.
    proposer.send_message(ProposerMessage::Run).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut impossible = 0;
    while let Ok(message) = events_rx.try_recv() {
        match message {
            CoordinatorMessage::Impossible { proposer } => {
                assert_eq!(proposer, "loner".into());
                impossible += 1;
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
    assert_eq!(impossible, 1);

    proposer.stop(None);
    probe.stop(None);
}

#[tokio::test]
async fn reviewer_trades_up_and_notifies_displaced() {
    let directory = Arc::new(Directory::new());

    let (rejections_tx, mut rejections_rx) = mpsc::unbounded_channel();
    let (displaced, _displaced_handle) = Actor::spawn(None, ProposerProbe, rejections_tx)
        .await
        .expect("probe should spawn");
    directory.register_proposer("p1".into(), displaced.clone());

    let (reviewer, _handle) = Actor::spawn(
        None,
        ReviewerActor,
        ReviewerArgs {
            id: "x".into(),
            preferences: PreferenceList::new(vec!["p2".into(), "p1".into()]),
            directory: directory.clone(),
        },
    )
    .await
    .expect("reviewer should spawn");

    let propose = |proposer: &str| {
        let proposer = ProposerId::from(proposer);
        let reviewer = reviewer.clone();
        async move {
            match ractor::rpc::call(
                &reviewer,
                |reply| ReviewerMessage::Propose { proposer, reply },
                Some(Duration::from_secs(1)),
            )
            .await
            .expect("call should not fail")
            {
                ractor::rpc::CallResult::Success(reply) => reply,
                other => panic!("no reply: {other:?}"),
            }
        }
    };

    // First proposal is always accepted.
    assert_eq!(propose("p1").await, ProposalReply::Accept);
    // A better-ranked proposer displaces the current match.
    assert_eq!(propose("p2").await, ProposalReply::Accept);
    // A worse (here: unranked) proposer is rejected without state change.
    assert_eq!(propose("p3").await, ProposalReply::Reject);

    let notification = tokio::time::timeout(Duration::from_millis(500), rejections_rx.recv())
        .await
        .expect("displaced proposer should be notified")
        .expect("channel open");
    match notification {
        ProposerMessage::RejectedBy { reviewer } => assert_eq!(reviewer, "x".into()),
        other => panic!("unexpected message: {other:?}"),
    }

    reviewer.stop(None);
    displaced.stop(None);
}

#[tokio::test]
async fn quiescence_fires_once_strictly_after_last_event() {
    let (proposers, reviewers) = tables_3x3();
    let (coordinator, _handle) = start_coordinator(CoordinatorArgs {
        proposer_prefs: proposers,
        reviewer_prefs: reviewers,
        config: CoordinatorConfig {
            idle_timeout: Duration::from_millis(150),
        },
    })
    .await
    .expect("coordinator should start");

    let (events_tx, mut events_rx) = broadcast::channel(64);
    coordinator
        .send_message(CoordinatorMessage::Subscribe { sender: events_tx })
        .unwrap();
    coordinator.send_message(CoordinatorMessage::Launch).unwrap();

    let outcome = match ractor::rpc::call(
        &coordinator,
        |reply| CoordinatorMessage::AwaitResult { reply },
        None,
    )
    .await
    .expect("call should not fail")
    {
        ractor::rpc::CallResult::Success(outcome) => outcome,
        other => panic!("no result: {other:?}"),
    };
    assert!(outcome.matches.is_perfect(3));

    // Let the forwarding task drain, then collect the stream.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut matched = 0;
    while let Ok(event) = events_rx.try_recv() {
        if matches!(event, MatchEvent::Matched { .. }) {
            matched += 1;
        }
    }
    assert!(matched >= 3, "every proposer should have matched");

    // No activity after quiescence.
    let silent = tokio::time::timeout(Duration::from_millis(200), events_rx.recv()).await;
    assert!(silent.is_err(), "no events may follow quiescence");

    // The result is frozen: a second waiter gets the same snapshot
    // immediately.
    let again = match ractor::rpc::call(
        &coordinator,
        |reply| CoordinatorMessage::AwaitResult { reply },
        Some(Duration::from_millis(100)),
    )
    .await
    .expect("call should not fail")
    {
        ractor::rpc::CallResult::Success(outcome) => outcome,
        other => panic!("no result: {other:?}"),
    };
    assert_eq!(again.matches, outcome.matches);

    let live: HashMap<ProposerId, ReviewerId> = match ractor::rpc::call(
        &coordinator,
        |reply| CoordinatorMessage::GetMatches { reply },
        Some(Duration::from_millis(100)),
    )
    .await
    .expect("call should not fail")
    {
        ractor::rpc::CallResult::Success(set) => {
            set.iter().map(|(p, r)| (p.clone(), r.clone())).collect()
        }
        other => panic!("no snapshot: {other:?}"),
    };
    assert_eq!(live.len(), 3);

    let _ = coordinator.send_message(CoordinatorMessage::Shutdown);
}
