//! Run Panel use case
//!
//! Drives one panel session through its phases. Members speak strictly one
//! after another in roster order, because every discussion and rebuttal
//! prompt quotes everyone who has already spoken. Phase order comes from the
//! session's state machine; this loop only asks it what comes next.

use crate::config::DeliberationParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::event_notifier::{NoEvents, PanelEventNotifier};
use crate::ports::llm_gateway::{GatewayError, GenerationRequest, LlmGateway};
use crate::ports::session_store::SessionStore;
use crate::ports::usage::{NoUsageTracking, UsageTracker};
use crate::use_cases::analyze_consensus::ConsensusEngine;
use crate::use_cases::shared::{check_cancelled, generate_tracked};
use panel_domain::{
    DomainError, PanelConfiguration, PanelEvent, PanelPhase, PanelPromptTemplate, PanelSession,
    SessionId,
};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Errors that can occur while running a panel
#[derive(Error, Debug)]
pub enum RunPanelError {
    #[error("Invalid panel configuration: {0}")]
    InvalidConfiguration(DomainError),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Session {0} was cancelled")]
    Cancelled(SessionId),

    #[error("Generation failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Domain(DomainError),
}

impl From<DomainError> for RunPanelError {
    fn from(error: DomainError) -> Self {
        if error.is_configuration_error() {
            RunPanelError::InvalidConfiguration(error)
        } else {
            RunPanelError::Domain(error)
        }
    }
}

impl RunPanelError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunPanelError::Cancelled(_))
    }
}

/// Use case for running panel sessions
///
/// Sessions live in the injected [`SessionStore`] from [`open`](Self::open)
/// until they complete, fail or are cancelled.
pub struct PanelOrchestrator<G: LlmGateway + 'static, S: SessionStore + 'static> {
    gateway: Arc<G>,
    store: Arc<S>,
    params: DeliberationParams,
    usage: Arc<dyn UsageTracker>,
    logger: Arc<dyn ConversationLogger>,
}

impl<G: LlmGateway + 'static, S: SessionStore + 'static> PanelOrchestrator<G, S> {
    pub fn new(gateway: Arc<G>, store: Arc<S>) -> Self {
        Self {
            gateway,
            store,
            params: DeliberationParams::default(),
            usage: Arc::new(NoUsageTracking),
            logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_params(mut self, params: DeliberationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_usage_tracker(mut self, usage: Arc<dyn UsageTracker>) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    fn consensus_engine(&self) -> ConsensusEngine<G> {
        ConsensusEngine::new(Arc::clone(&self.gateway))
            .with_params(&self.params)
            .with_usage_tracker(Arc::clone(&self.usage))
    }

    /// Register a new session for `config` without running it.
    pub fn open(&self, config: PanelConfiguration) -> Result<SessionId, RunPanelError> {
        let id = SessionId::new(Uuid::new_v4().to_string());
        let session = PanelSession::new(id.clone(), config)?;
        self.store.insert(session, CancellationToken::new());
        debug!(session_id = %id, "Session opened");
        Ok(id)
    }

    /// Snapshot of an active session
    pub fn get_session(&self, id: &SessionId) -> Option<PanelSession> {
        self.store.get(id)
    }

    pub fn active_sessions(&self) -> Vec<SessionId> {
        self.store.active_ids()
    }

    /// Cancel a session. Turns already dispatched finish, but their replies
    /// are discarded and no further turn starts.
    pub fn cancel(&self, id: &SessionId) -> bool {
        match self.store.remove(id) {
            Some(stored) => {
                stored.cancellation.cancel();
                info!(session_id = %id, "Session cancelled");
                true
            }
            None => false,
        }
    }

    /// Open and run a session with no event listener
    pub async fn execute(&self, config: PanelConfiguration) -> Result<PanelSession, RunPanelError> {
        self.execute_with_events(config, &NoEvents).await
    }

    /// Open and run a session, reporting every event to `events`
    pub async fn execute_with_events(
        &self,
        config: PanelConfiguration,
        events: &dyn PanelEventNotifier,
    ) -> Result<PanelSession, RunPanelError> {
        let id = self.open(config)?;
        self.run(&id, events).await
    }

    /// Drive an opened session to completion and return its final state.
    ///
    /// The session leaves the store whichever way this ends. Failures are
    /// reported as an `error` event before being returned.
    pub async fn run(
        &self,
        id: &SessionId,
        events: &dyn PanelEventNotifier,
    ) -> Result<PanelSession, RunPanelError> {
        let (mut session, token) = match (self.store.get(id), self.store.cancellation(id)) {
            (Some(session), Some(token)) => (session, token),
            _ => return Err(RunPanelError::SessionNotFound(id.clone())),
        };

        info!(
            session_id = %id,
            members = session.members().len(),
            max_rounds = session.config().max_rounds,
            "Starting panel"
        );
        self.logger.log(ConversationEvent::panel_started(&session));

        match self.drive(&mut session, &token, events).await {
            Ok(()) => {
                self.store.remove(id);
                self.logger
                    .log(ConversationEvent::panel_completed(&session));
                info!(
                    session_id = %id,
                    utterances = session.utterance_count(),
                    "Panel complete"
                );
                Ok(session)
            }
            Err(e) => {
                warn!(session_id = %id, "Panel failed: {}", e);
                events.notify(&PanelEvent::Error {
                    message: e.to_string(),
                });
                self.store.remove(id);
                self.logger
                    .log(ConversationEvent::panel_failed(id, &e.to_string()));
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        session: &mut PanelSession,
        token: &CancellationToken,
        events: &dyn PanelEventNotifier,
    ) -> Result<(), RunPanelError> {
        while let Some(next) = session.next_phase() {
            check_cancelled(token, session.id())?;
            session.advance_to(next)?;
            self.sync(session)?;
            debug!(session_id = %session.id(), phase = %next, "Phase change");
            events.notify(&PanelEvent::PhaseChange { phase: next });

            match next {
                PanelPhase::OpeningStatements | PanelPhase::Rebuttals => {
                    self.run_turns(session, token, events).await?;
                }
                PanelPhase::Discussion => {
                    for _ in 0..session.config().max_rounds {
                        let round = session.begin_round()?;
                        self.sync(session)?;
                        events.notify(&PanelEvent::RoundStart { round });
                        self.run_turns(session, token, events).await?;
                    }
                }
                PanelPhase::ConsensusBuilding => {
                    self.build_consensus(session, token, events).await?;
                }
                PanelPhase::Init | PanelPhase::Closing => {}
            }
        }

        session.complete()?;
        self.sync(session)?;
        events.notify(&PanelEvent::Complete {
            session_id: session.id().clone(),
        });
        Ok(())
    }

    /// Every member speaks once in the current phase, in roster order.
    async fn run_turns(
        &self,
        session: &mut PanelSession,
        token: &CancellationToken,
        events: &dyn PanelEventNotifier,
    ) -> Result<(), RunPanelError> {
        let phase = session.phase();
        let members = session.members().to_vec();

        for member in &members {
            check_cancelled(token, session.id())?;

            let topic = &session.config().topic;
            let prompt = match phase {
                PanelPhase::OpeningStatements => PanelPromptTemplate::opening(topic),
                PanelPhase::Discussion => PanelPromptTemplate::discussion(
                    topic,
                    &session.transcript(),
                    session.round(),
                    session.config().max_rounds,
                ),
                PanelPhase::Rebuttals => PanelPromptTemplate::rebuttal(topic, &session.transcript()),
                other => return Err(DomainError::SilentPhase(other).into()),
            };
            let request = GenerationRequest::new(prompt)
                .with_system_prompt(PanelPromptTemplate::member_system(member))
                .with_temperature(self.params.discussion_temperature);

            events.notify(&PanelEvent::member_speaking(member));
            debug!(session_id = %session.id(), member = member.id(), phase = %phase, "Member speaking");

            let content =
                generate_tracked(self.gateway.as_ref(), self.usage.as_ref(), phase.as_str(), &request)
                    .await?;

            // A reply that arrives after cancellation is dropped
            check_cancelled(token, session.id())?;
            let utterance = session.record(member.id(), content.clone())?.clone();
            self.sync(session)?;
            self.logger.log(ConversationEvent::utterance(
                session.id(),
                member.id(),
                &utterance,
            ));

            if let Some(event) = PanelEvent::utterance(phase, member, session.round(), content) {
                events.notify(&event);
            }
        }
        Ok(())
    }

    async fn build_consensus(
        &self,
        session: &mut PanelSession,
        token: &CancellationToken,
        events: &dyn PanelEventNotifier,
    ) -> Result<(), RunPanelError> {
        let responses = session.member_responses();
        let result = self
            .consensus_engine()
            .analyze(
                &session.config().topic,
                &responses,
                self.params.detailed_consensus,
            )
            .await;

        check_cancelled(token, session.id())?;
        self.logger
            .log(ConversationEvent::consensus(session.id(), &result));
        events.notify(&PanelEvent::Consensus {
            result: Box::new(result.clone()),
        });
        session.set_consensus(result);
        self.sync(session)
    }

    /// Publish the latest snapshot. A session missing from the store has
    /// been cancelled.
    fn sync(&self, session: &PanelSession) -> Result<(), RunPanelError> {
        if self.store.update(session) {
            Ok(())
        } else {
            Err(RunPanelError::Cancelled(session.id().clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::event_notifier::ChannelEventNotifier;
    use crate::ports::session_store::InMemorySessionStore;
    use async_trait::async_trait;
    use panel_domain::{ConsensusLevel, PanelMember};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ==================== Test Mocks ====================

    /// Member turns get a numbered reply; analysis prompts get a fixed JSON
    /// score. Optionally fails on the n-th member turn.
    struct MockGateway {
        turns: AtomicUsize,
        fail_on_turn: Option<usize>,
        prompts: Mutex<Vec<GenerationRequest>>,
    }

    impl MockGateway {
        fn new() -> Self {
            Self {
                turns: AtomicUsize::new(0),
                fail_on_turn: None,
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing_on_turn(turn: usize) -> Self {
            Self {
                fail_on_turn: Some(turn),
                ..Self::new()
            }
        }

        fn member_prompts(&self) -> Vec<GenerationRequest> {
            self.prompts
                .lock()
                .unwrap()
                .iter()
                .filter(|r| !r.prompt.starts_with("[analysis"))
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl LlmGateway for MockGateway {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, GatewayError> {
            self.prompts.lock().unwrap().push(request.clone());
            if request.prompt.starts_with("[analysis: synthesis]") {
                return Ok("Adopt the proposal.".to_string());
            }
            if request.prompt.starts_with("[analysis") {
                return Ok(r#"{"score": 0.9, "overlap": 0.9, "alignment": 0.9}"#.to_string());
            }
            let turn = self.turns.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on_turn == Some(turn) {
                return Err(GatewayError::RequestFailed("provider down".to_string()));
            }
            Ok(format!("Contribution {turn}.\nConfidence: 0.9"))
        }
    }

    /// Cancels its session when the given member turn starts.
    struct CancellingGateway {
        store: Arc<InMemorySessionStore>,
        cancel_on_turn: usize,
        turns: AtomicUsize,
    }

    #[async_trait]
    impl LlmGateway for CancellingGateway {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GatewayError> {
            let turn = self.turns.fetch_add(1, Ordering::SeqCst) + 1;
            if turn == self.cancel_on_turn {
                for id in self.store.active_ids() {
                    if let Some(stored) = self.store.remove(&id) {
                        stored.cancellation.cancel();
                    }
                }
            }
            Ok("reply".to_string())
        }
    }

    struct RecordingLogger {
        events: Mutex<VecDeque<&'static str>>,
    }

    impl ConversationLogger for RecordingLogger {
        fn log(&self, event: ConversationEvent) {
            self.events.lock().unwrap().push_back(event.event_type);
        }
    }

    fn roster(n: usize) -> Vec<PanelMember> {
        (1..=n)
            .map(|i| PanelMember::new(format!("m{i}"), format!("Member {i}"), "Expert", "persona"))
            .collect()
    }

    fn config(n: usize) -> PanelConfiguration {
        PanelConfiguration::new("Should we adopt the proposal?", roster(n))
    }

    fn orchestrator(
        gateway: MockGateway,
    ) -> (
        Arc<MockGateway>,
        PanelOrchestrator<MockGateway, InMemorySessionStore>,
    ) {
        let gateway = Arc::new(gateway);
        let store = Arc::new(InMemorySessionStore::new());
        (
            Arc::clone(&gateway),
            PanelOrchestrator::new(Arc::clone(&gateway), store),
        )
    }

    fn drain(receiver: &mut tokio::sync::mpsc::UnboundedReceiver<PanelEvent>) -> Vec<PanelEvent> {
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }

    fn event_types(events: &[PanelEvent]) -> Vec<&'static str> {
        events.iter().map(PanelEvent::event_type).collect()
    }

    #[tokio::test]
    async fn test_full_panel_event_sequence() {
        let (_, orchestrator) = orchestrator(MockGateway::new());
        let (notifier, mut receiver) = ChannelEventNotifier::new();

        let session = orchestrator
            .execute_with_events(config(5).with_max_rounds(2), &notifier)
            .await
            .unwrap();
        let events = drain(&mut receiver);

        let mut expected = vec!["phase_change"];
        expected.extend(["member_speaking", "statement"].repeat(5));
        expected.push("phase_change");
        for _ in 0..2 {
            expected.push("round_start");
            expected.extend(["member_speaking", "discussion"].repeat(5));
        }
        expected.push("phase_change");
        expected.extend(["member_speaking", "rebuttal"].repeat(5));
        expected.extend(["phase_change", "consensus", "phase_change", "complete"]);
        assert_eq!(event_types(&events), expected);

        assert!(session.is_complete());
        assert_eq!(session.phase(), PanelPhase::Closing);
        assert_eq!(session.utterance_count(), 20);
        let consensus = session.consensus().unwrap();
        assert_eq!(consensus.level, ConsensusLevel::High);
        assert_eq!(consensus.recommendation, "Adopt the proposal.");
    }

    #[tokio::test]
    async fn test_phase_changes_follow_flags() {
        let (_, orchestrator) = orchestrator(MockGateway::new());
        let (notifier, mut receiver) = ChannelEventNotifier::new();

        let session = orchestrator
            .execute_with_events(
                config(2).with_rebuttals(false).with_consensus(false),
                &notifier,
            )
            .await
            .unwrap();

        let phases: Vec<_> = drain(&mut receiver)
            .into_iter()
            .filter_map(|e| match e {
                PanelEvent::PhaseChange { phase } => Some(phase),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases,
            vec![
                PanelPhase::OpeningStatements,
                PanelPhase::Discussion,
                PanelPhase::Closing
            ]
        );
        assert!(session.consensus().is_none());
    }

    #[tokio::test]
    async fn test_discussion_rounds_are_tagged() {
        let (_, orchestrator) = orchestrator(MockGateway::new());
        let (notifier, mut receiver) = ChannelEventNotifier::new();
        orchestrator
            .execute_with_events(config(2).with_max_rounds(3).with_consensus(false), &notifier)
            .await
            .unwrap();

        let rounds: Vec<u32> = drain(&mut receiver)
            .into_iter()
            .filter_map(|e| match e {
                PanelEvent::Discussion { round, .. } => Some(round),
                _ => None,
            })
            .collect();
        assert_eq!(rounds, vec![1, 1, 2, 2, 3, 3]);
    }

    #[tokio::test]
    async fn test_prompts_quote_earlier_speakers() {
        let (gateway, orchestrator) = orchestrator(MockGateway::new());
        orchestrator
            .execute(config(2).with_max_rounds(1).with_rebuttals(false).with_consensus(false))
            .await
            .unwrap();

        let prompts = gateway.member_prompts();
        assert_eq!(prompts.len(), 4);
        // opening statements carry only the topic
        assert!(!prompts[1].prompt.contains("Contribution 1"));
        // second speaker in round 1 sees the first speaker's round-1 reply
        assert!(prompts[3].prompt.contains("Member 1 (discussion round 1): Contribution 3."));
        assert!(
            prompts[3]
                .system_prompt
                .as_deref()
                .unwrap()
                .contains("Member 2")
        );
    }

    #[tokio::test]
    async fn test_generation_failure_emits_error_and_propagates() {
        let (_, orchestrator) = orchestrator(MockGateway::failing_on_turn(3));
        let (notifier, mut receiver) = ChannelEventNotifier::new();

        let result = orchestrator
            .execute_with_events(config(2), &notifier)
            .await;
        assert!(matches!(result, Err(RunPanelError::Gateway(_))));

        let events = drain(&mut receiver);
        let last = events.last().unwrap();
        assert_eq!(last.event_type(), "error");
        assert!(!events.iter().any(|e| e.event_type() == "complete"));
        assert!(orchestrator.active_sessions().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_configuration_is_rejected() {
        let (_, orchestrator) = orchestrator(MockGateway::new());
        let result = orchestrator.execute(config(0)).await;
        assert!(matches!(
            result,
            Err(RunPanelError::InvalidConfiguration(DomainError::EmptyRoster))
        ));

        let result = orchestrator.execute(config(2).with_max_rounds(0)).await;
        assert!(matches!(
            result,
            Err(RunPanelError::InvalidConfiguration(
                DomainError::NoDiscussionRounds
            ))
        ));
    }

    #[tokio::test]
    async fn test_open_get_cancel() {
        let (_, orchestrator) = orchestrator(MockGateway::new());
        let id = orchestrator.open(config(2)).unwrap();

        let snapshot = orchestrator.get_session(&id).unwrap();
        assert_eq!(snapshot.phase(), PanelPhase::Init);

        assert!(orchestrator.cancel(&id));
        assert!(orchestrator.get_session(&id).is_none());
        assert!(!orchestrator.cancel(&id));

        let result = orchestrator.run(&id, &NoEvents).await;
        assert!(matches!(result, Err(RunPanelError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_cancel_mid_run_stops_new_turns() {
        let store = Arc::new(InMemorySessionStore::new());
        let gateway = Arc::new(CancellingGateway {
            store: Arc::clone(&store),
            cancel_on_turn: 2,
            turns: AtomicUsize::new(0),
        });
        let orchestrator = PanelOrchestrator::new(Arc::clone(&gateway), Arc::clone(&store));
        let (notifier, mut receiver) = ChannelEventNotifier::new();

        let result = orchestrator
            .execute_with_events(config(3), &notifier)
            .await;
        assert!(result.as_ref().is_err_and(RunPanelError::is_cancelled));

        // the in-flight second turn completed but was discarded
        assert_eq!(gateway.turns.load(Ordering::SeqCst), 2);
        let events = drain(&mut receiver);
        let statements = events
            .iter()
            .filter(|e| e.event_type() == "statement")
            .count();
        assert_eq!(statements, 1);
        assert_eq!(events.last().map(PanelEvent::event_type), Some("error"));
        assert!(store.active_ids().is_empty());
    }

    #[tokio::test]
    async fn test_conversation_log_events() {
        let logger = Arc::new(RecordingLogger {
            events: Mutex::new(VecDeque::new()),
        });
        let (_, orchestrator) = orchestrator(MockGateway::new());
        let orchestrator = orchestrator.with_conversation_logger(logger.clone());

        orchestrator
            .execute(config(2).with_max_rounds(1).with_rebuttals(false))
            .await
            .unwrap();

        let events: Vec<_> = logger.events.lock().unwrap().iter().copied().collect();
        assert_eq!(events.first(), Some(&"panel_started"));
        assert_eq!(events.iter().filter(|e| **e == "utterance").count(), 4);
        assert!(events.contains(&"consensus"));
        assert_eq!(events.last(), Some(&"panel_completed"));
    }
}
