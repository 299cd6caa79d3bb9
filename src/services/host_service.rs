//! Host side of a room: the only owner allowed to mutate the game state.
//!
//! Every successful action is persisted immediately (no batching); rejected
//! actions leave both the state and the stores untouched.

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    dto::question::CustomQuestionInput,
    state::{
        bank::QuestionBank,
        game::{GameError, GameState, Team},
        room::RoomCode,
    },
    sync::{StateSync, SyncError, session},
};

/// Errors surfaced to the host.
#[derive(Debug, Error)]
pub enum HostError {
    /// The action was rejected; nothing changed.
    #[error(transparent)]
    Game(#[from] GameError),
    /// The local write failed; the session can no longer be trusted.
    #[error("failed to persist game state")]
    Persist(#[from] SyncError),
}

/// A host's live session on one room.
pub struct HostSession {
    state: GameState,
    bank: QuestionBank,
    sync: StateSync,
}

impl HostSession {
    /// Resume the room from whichever replica is furthest ahead, or start from
    /// an empty state.
    pub async fn open(bank: QuestionBank, sync: StateSync) -> Self {
        let state = sync.load_latest().await.unwrap_or_default();
        info!(
            room = %sync.room(),
            revision = state.revision,
            questions = bank.len(),
            "host session opened"
        );
        Self { state, bank, sync }
    }

    /// Room this session writes to.
    pub fn room(&self) -> &RoomCode {
        self.sync.room()
    }

    /// Current snapshot.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Questions available for selection.
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Make bank entry `index` the active question.
    ///
    /// Returns `true` when this started a new round (another question was
    /// active, or none).
    pub fn select_question(&mut self, index: usize) -> Result<bool, HostError> {
        let question = self.bank.get(index)?.clone();
        let fresh = self.state.begin_round(question);
        self.persist()?;
        Ok(fresh)
    }

    /// Reveal the next hidden answer in display order.
    pub fn reveal_next(&mut self) -> Result<Option<usize>, HostError> {
        let revealed = self.state.reveal_next()?;
        if revealed.is_some() {
            self.persist()?;
        }
        Ok(revealed)
    }

    /// Flip answer `index` between shown and hidden; returns whether it is shown.
    pub fn toggle_reveal(&mut self, index: usize) -> Result<bool, HostError> {
        let shown = self.state.toggle_reveal(index)?;
        self.persist()?;
        Ok(shown)
    }

    /// Add a strike and return the new count.
    pub fn register_strike(&mut self) -> Result<u32, HostError> {
        let strikes = self.state.register_strike();
        self.persist()?;
        if self.state.strikes_exhausted() {
            warn!(room = %self.room(), strikes, "strike limit reached; round over");
        }
        Ok(strikes)
    }

    /// Credit the revealed points to `team` and return the amount.
    pub fn award_points(&mut self, team: Team) -> Result<u32, HostError> {
        let awarded = self.state.award_points(team);
        self.persist()?;
        info!(room = %self.room(), %team, awarded, "points awarded");
        Ok(awarded)
    }

    /// Clear the board for the next question; scores are kept.
    pub fn start_new_round(&mut self) -> Result<(), HostError> {
        self.state.start_new_round();
        self.persist()
    }

    /// Set both scores to zero.
    pub fn reset_scores(&mut self) -> Result<(), HostError> {
        self.state.reset_scores();
        self.persist()
    }

    /// Overwrite `team`'s score. Negative values are rejected.
    pub fn set_score(&mut self, team: Team, value: i64) -> Result<(), HostError> {
        let score = u32::try_from(value).map_err(|_| GameError::InvalidScore(value.to_string()))?;
        self.state.set_score(team, score);
        self.persist()
    }

    /// [`Self::set_score`] for raw text typed by the host.
    pub fn set_score_from_input(&mut self, team: Team, raw: &str) -> Result<(), HostError> {
        let value = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| GameError::InvalidScore(raw.trim().to_string()))?;
        self.set_score(team, value)
    }

    /// Validate and append a custom question, then select it.
    ///
    /// The question lives in this session's bank only.
    pub fn add_custom_question(&mut self, input: CustomQuestionInput) -> Result<usize, HostError> {
        let question = input.into_question()?;
        let index = self.bank.push(question);
        self.select_question(index)?;
        Ok(index)
    }

    /// Tear the room down: flush the outbox, wipe both replicas and forget the
    /// device's session keys.
    pub async fn end_room(mut self) -> Result<(), HostError> {
        let room = self.room().clone();
        self.sync.shutdown().await;
        self.sync.clear().await?;
        session::leave_room(self.sync.local(), &room)?;
        info!(room = %room, "room ended");
        Ok(())
    }

    /// Leave the room running and flush pending remote deliveries.
    pub async fn close(mut self) {
        self.sync.shutdown().await;
    }

    fn persist(&mut self) -> Result<(), HostError> {
        self.state.bump_revision();
        self.sync.write(&self.state)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::{
        dto::question::AnswerInput,
        state::game::{Answer, Question},
        sync::{
            LocalStore, LocalStoreError, MemoryStore, WritePolicy, state_key,
            testing::{FakeRemote, remote_of},
        },
    };

    /// Memory store counting writes.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        writes: AtomicUsize,
    }

    impl LocalStore for CountingStore {
        fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), LocalStoreError> {
            self.inner.remove(key)
        }
    }

    fn room() -> RoomCode {
        RoomCode::parse("FRUIT1").unwrap()
    }

    fn fruit_bank() -> QuestionBank {
        QuestionBank::new(vec![Question {
            question: "Name a fruit".into(),
            answers: vec![
                Answer {
                    text: "Apple".into(),
                    points: 40,
                },
                Answer {
                    text: "Banana".into(),
                    points: 30,
                },
            ],
        }])
    }

    async fn open_session(local: Arc<CountingStore>) -> HostSession {
        let sync = StateSync::new(room(), local, None, WritePolicy::LocalOnly);
        HostSession::open(fruit_bank(), sync).await
    }

    #[tokio::test]
    async fn fruit_round_awards_seventy_to_team_a() {
        let local = Arc::new(CountingStore::default());
        let mut host = open_session(local.clone()).await;

        host.select_question(0).unwrap();
        assert_eq!(host.reveal_next().unwrap(), Some(0));
        assert_eq!(host.reveal_next().unwrap(), Some(1));
        assert_eq!(host.award_points(Team::A).unwrap(), 70);

        assert_eq!(host.state().score_a, 70);
        assert_eq!(host.state().revealed_answers, BTreeSet::from([0, 1]));

        let stored: GameState =
            serde_json::from_str(&local.get(&state_key(&room())).unwrap().unwrap()).unwrap();
        assert_eq!(&stored, host.state());
    }

    #[tokio::test]
    async fn negative_score_is_rejected_without_writing() {
        let local = Arc::new(CountingStore::default());
        let mut host = open_session(local.clone()).await;
        host.set_score(Team::B, 12).unwrap();
        let writes = local.writes.load(Ordering::SeqCst);
        let revision = host.state().revision;

        let err = host.set_score(Team::B, -5).unwrap_err();
        assert!(matches!(err, HostError::Game(GameError::InvalidScore(_))));
        assert_eq!(host.state().score_b, 12);
        assert_eq!(host.state().revision, revision);
        assert_eq!(local.writes.load(Ordering::SeqCst), writes);
    }

    #[tokio::test]
    async fn non_numeric_score_input_is_rejected() {
        let local = Arc::new(CountingStore::default());
        let mut host = open_session(local.clone()).await;
        assert!(host.set_score_from_input(Team::A, "lots").is_err());
        assert_eq!(local.writes.load(Ordering::SeqCst), 0);

        host.set_score_from_input(Team::A, " 25 ").unwrap();
        assert_eq!(host.state().score_a, 25);
    }

    #[tokio::test]
    async fn every_mutation_persists_with_a_new_revision() {
        let local = Arc::new(CountingStore::default());
        let mut host = open_session(local.clone()).await;

        host.select_question(0).unwrap();
        host.toggle_reveal(1).unwrap();
        host.register_strike().unwrap();
        host.reset_scores().unwrap();
        host.start_new_round().unwrap();

        assert_eq!(local.writes.load(Ordering::SeqCst), 5);
        assert_eq!(host.state().revision, 5);
    }

    #[tokio::test]
    async fn reveal_next_when_complete_does_not_persist() {
        let local = Arc::new(CountingStore::default());
        let mut host = open_session(local.clone()).await;
        host.select_question(0).unwrap();
        host.reveal_next().unwrap();
        host.reveal_next().unwrap();
        let writes = local.writes.load(Ordering::SeqCst);

        assert_eq!(host.reveal_next().unwrap(), None);
        assert_eq!(local.writes.load(Ordering::SeqCst), writes);
    }

    #[tokio::test]
    async fn rejected_actions_leave_state_alone() {
        let local = Arc::new(CountingStore::default());
        let mut host = open_session(local.clone()).await;

        assert!(matches!(
            host.select_question(5),
            Err(HostError::Game(GameError::QuestionOutOfRange { index: 5, len: 1 }))
        ));
        assert!(matches!(
            host.toggle_reveal(0),
            Err(HostError::Game(GameError::NoActiveQuestion))
        ));
        assert_eq!(local.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn custom_question_is_added_and_selected() {
        let local = Arc::new(CountingStore::default());
        let mut host = open_session(local.clone()).await;

        let index = host
            .add_custom_question(CustomQuestionInput {
                question: "Name a pet".into(),
                answers: vec![
                    AnswerInput {
                        text: "Dog".into(),
                        points: 40,
                    },
                    AnswerInput {
                        text: "Cat".into(),
                        points: 35,
                    },
                ],
            })
            .unwrap();

        assert_eq!(index, 1);
        assert_eq!(host.bank().len(), 2);
        let current = host.state().current.as_ref().unwrap();
        assert_eq!(current.question, "Name a pet");
        assert!(host.state().round_id.is_some());
    }

    #[tokio::test]
    async fn invalid_custom_question_changes_nothing() {
        let local = Arc::new(CountingStore::default());
        let mut host = open_session(local.clone()).await;

        let err = host
            .add_custom_question(CustomQuestionInput {
                question: "Name a pet".into(),
                answers: vec![AnswerInput {
                    text: "Dog".into(),
                    points: 0,
                }],
            })
            .unwrap_err();

        assert!(matches!(err, HostError::Game(GameError::InvalidInput(_))));
        assert_eq!(host.bank().len(), 1);
        assert_eq!(local.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reopening_resumes_stored_state() {
        let local = Arc::new(CountingStore::default());
        {
            let mut host = open_session(local.clone()).await;
            host.select_question(0).unwrap();
            host.reveal_next().unwrap();
            host.register_strike().unwrap();
        }

        let host = open_session(local).await;
        assert_eq!(host.state().strikes, 1);
        assert_eq!(host.state().revision, 3);
        assert_eq!(host.state().revealed_answers, BTreeSet::from([0]));
    }

    #[tokio::test]
    async fn end_room_clears_local_and_remote() {
        let local = Arc::new(CountingStore::default());
        let fake = FakeRemote::shared();
        let sync = StateSync::new(
            room(),
            local.clone(),
            Some(remote_of(&fake)),
            WritePolicy::BestEffort,
        );
        session::join_room(local.as_ref(), &room(), crate::state::room::Role::Host).unwrap();
        let mut host = HostSession::open(fruit_bank(), sync).await;
        host.select_question(0).unwrap();

        host.end_room().await.unwrap();
        assert_eq!(local.get(&state_key(&room())).unwrap(), None);
        assert_eq!(session::current_room(local.as_ref()).unwrap(), None);
        assert!(fake.rooms.get(&room()).is_none());
    }
}
