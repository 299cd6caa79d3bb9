//! Game domain: the shared snapshot a host mutates and viewers mirror.

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Strike count at which the round is considered lost (warning only).
pub const STRIKE_LIMIT: u32 = 3;

/// A single survey answer shown on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Answer {
    /// Display text.
    pub text: String,
    /// Points granted when the answer is on the board at award time.
    pub points: u32,
}

/// A survey question and its ranked answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Question {
    /// Display text.
    pub question: String,
    /// Answers in reveal order; indices into this list identify answers.
    pub answers: Vec<Answer>,
}

/// One of the two competing teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Team {
    /// Team A.
    A,
    /// Team B.
    B,
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::A => f.write_str("A"),
            Team::B => f.write_str("B"),
        }
    }
}

impl FromStr for Team {
    type Err = GameError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "A" | "a" => Ok(Team::A),
            "B" | "b" => Ok(Team::B),
            other => Err(GameError::UnknownTeam(other.to_string())),
        }
    }
}

/// Errors raised when a host action cannot be applied to the game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The question bank has no entry at the requested position.
    #[error("question {index} does not exist (bank holds {len})")]
    QuestionOutOfRange { index: usize, len: usize },
    /// The action needs an active question.
    #[error("no question is currently selected")]
    NoActiveQuestion,
    /// The answer index is outside the active question.
    #[error("answer {index} does not exist (question has {len})")]
    AnswerOutOfRange { index: usize, len: usize },
    /// Scores must be non-negative integers.
    #[error("invalid score `{0}`: enter a number (0 or more)")]
    InvalidScore(String),
    /// Team names are `A` or `B`.
    #[error("unknown team `{0}`")]
    UnknownTeam(String),
    /// Room codes are non-empty uppercase alphanumerics.
    #[error("invalid room code: {0}")]
    InvalidRoomCode(String),
    /// User supplied data failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Snapshot of one room's progress.
///
/// Serialized in camelCase so the JSON written to storage matches the payload
/// exchanged with `/api/rooms/{code}/state`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Question being played, if any.
    #[serde(default)]
    pub current: Option<Question>,
    /// Indices of answers currently shown.
    #[serde(default)]
    pub revealed_answers: BTreeSet<usize>,
    /// Strikes registered in the current round.
    #[serde(default)]
    pub strikes: u32,
    /// Cumulative score of team A.
    #[serde(default)]
    pub score_a: u32,
    /// Cumulative score of team B.
    #[serde(default)]
    pub score_b: u32,
    /// Bumped on every persisted host mutation; zero for unversioned payloads.
    #[serde(default)]
    pub revision: u64,
    /// Identifier of the active round, absent between rounds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_id: Option<Uuid>,
}

impl GameState {
    /// Score currently held by `team`.
    pub fn score(&self, team: Team) -> u32 {
        match team {
            Team::A => self.score_a,
            Team::B => self.score_b,
        }
    }

    /// Sum of points over the revealed answers of the active question.
    pub fn revealed_points(&self) -> u32 {
        let Some(question) = &self.current else {
            return 0;
        };
        self.revealed_answers
            .iter()
            .filter_map(|idx| question.answers.get(*idx))
            .fold(0u32, |acc, answer| acc.saturating_add(answer.points))
    }

    /// Number of answers on the active question.
    pub fn answer_count(&self) -> usize {
        self.current.as_ref().map_or(0, |q| q.answers.len())
    }

    /// Whether `idx` is currently on the board.
    pub fn is_revealed(&self, idx: usize) -> bool {
        self.revealed_answers.contains(&idx)
    }

    /// True once the strike limit has been reached.
    pub fn strikes_exhausted(&self) -> bool {
        self.strikes >= STRIKE_LIMIT
    }

    /// Check that every revealed index points into the active question and that
    /// the reveal set is empty between rounds.
    pub fn is_consistent(&self) -> bool {
        match &self.current {
            Some(question) => self
                .revealed_answers
                .iter()
                .all(|idx| *idx < question.answers.len()),
            None => self.revealed_answers.is_empty(),
        }
    }

    /// Install `question` as the active one.
    ///
    /// Returns `true` when a new round started. Re-selecting the question that is
    /// already active keeps its round progress.
    pub(crate) fn begin_round(&mut self, question: Question) -> bool {
        if self.current.as_ref() == Some(&question) && self.round_id.is_some() {
            return false;
        }

        self.current = Some(question);
        self.revealed_answers.clear();
        self.strikes = 0;
        self.round_id = Some(Uuid::new_v4());
        true
    }

    /// Reveal the lowest-index hidden answer, returning it.
    pub(crate) fn reveal_next(&mut self) -> Result<Option<usize>, GameError> {
        let len = self.current_len()?;
        let next = (0..len).find(|idx| !self.revealed_answers.contains(idx));
        if let Some(idx) = next {
            self.revealed_answers.insert(idx);
        }
        Ok(next)
    }

    /// Flip the visibility of answer `idx`, returning whether it is now shown.
    pub(crate) fn toggle_reveal(&mut self, idx: usize) -> Result<bool, GameError> {
        let len = self.current_len()?;
        if idx >= len {
            return Err(GameError::AnswerOutOfRange { index: idx, len });
        }

        if self.revealed_answers.remove(&idx) {
            Ok(false)
        } else {
            self.revealed_answers.insert(idx);
            Ok(true)
        }
    }

    pub(crate) fn register_strike(&mut self) -> u32 {
        self.strikes = self.strikes.saturating_add(1);
        self.strikes
    }

    /// Add the revealed points to `team`, returning the amount awarded.
    pub(crate) fn award_points(&mut self, team: Team) -> u32 {
        let sum = self.revealed_points();
        let score = self.score_mut(team);
        *score = score.saturating_add(sum);
        sum
    }

    pub(crate) fn start_new_round(&mut self) {
        self.current = None;
        self.revealed_answers.clear();
        self.strikes = 0;
        self.round_id = None;
    }

    pub(crate) fn reset_scores(&mut self) {
        self.score_a = 0;
        self.score_b = 0;
    }

    pub(crate) fn set_score(&mut self, team: Team, value: u32) {
        *self.score_mut(team) = value;
    }

    pub(crate) fn bump_revision(&mut self) -> u64 {
        self.revision = self.revision.saturating_add(1);
        self.revision
    }

    fn score_mut(&mut self, team: Team) -> &mut u32 {
        match team {
            Team::A => &mut self.score_a,
            Team::B => &mut self.score_b,
        }
    }

    fn current_len(&self) -> Result<usize, GameError> {
        self.current
            .as_ref()
            .map(|q| q.answers.len())
            .ok_or(GameError::NoActiveQuestion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fruit() -> Question {
        Question {
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
                Answer {
                    text: "Cherry".into(),
                    points: 10,
                },
            ],
        }
    }

    fn with_question() -> GameState {
        let mut state = GameState::default();
        state.begin_round(fruit());
        state
    }

    #[test]
    fn toggle_twice_restores_reveal_set() {
        let mut state = with_question();
        state.toggle_reveal(2).unwrap();
        let before = state.revealed_answers.clone();

        for idx in 0..3 {
            state.toggle_reveal(idx).unwrap();
            state.toggle_reveal(idx).unwrap();
            assert_eq!(state.revealed_answers, before);
        }
    }

    #[test]
    fn reveal_next_picks_lowest_hidden_index() {
        let mut state = with_question();
        state.toggle_reveal(0).unwrap();
        state.toggle_reveal(2).unwrap();

        assert_eq!(state.reveal_next().unwrap(), Some(1));
        assert_eq!(state.revealed_answers, BTreeSet::from([0, 1, 2]));
        assert_eq!(state.reveal_next().unwrap(), None);
        assert_eq!(state.revealed_answers, BTreeSet::from([0, 1, 2]));
    }

    #[test]
    fn reveal_requires_active_question() {
        let mut state = GameState::default();
        assert_eq!(state.reveal_next(), Err(GameError::NoActiveQuestion));
        assert_eq!(state.toggle_reveal(0), Err(GameError::NoActiveQuestion));
    }

    #[test]
    fn toggle_rejects_out_of_range_index() {
        let mut state = with_question();
        assert_eq!(
            state.toggle_reveal(3),
            Err(GameError::AnswerOutOfRange { index: 3, len: 3 })
        );
        assert!(state.revealed_answers.is_empty());
    }

    #[test]
    fn award_adds_revealed_sum_only() {
        let mut state = with_question();
        assert_eq!(state.award_points(Team::B), 0);
        assert_eq!(state.score_b, 0);

        state.toggle_reveal(0).unwrap();
        state.toggle_reveal(2).unwrap();
        assert_eq!(state.award_points(Team::A), 50);
        assert_eq!(state.score_a, 50);
        assert_eq!(state.revealed_answers.len(), 2);
    }

    #[test]
    fn new_round_clears_progress_but_keeps_scores() {
        let mut state = with_question();
        state.reveal_next().unwrap();
        state.register_strike();
        state.award_points(Team::A);

        state.start_new_round();
        assert_eq!(state.current, None);
        assert!(state.revealed_answers.is_empty());
        assert_eq!(state.strikes, 0);
        assert_eq!(state.round_id, None);
        assert_eq!(state.score_a, 40);
    }

    #[test]
    fn selecting_another_question_starts_a_fresh_round() {
        let mut state = with_question();
        let first_round = state.round_id;
        state.reveal_next().unwrap();
        state.register_strike();

        let mut other = fruit();
        other.question = "Name a vegetable".into();
        assert!(state.begin_round(other));
        assert_ne!(state.round_id, first_round);
        assert!(state.revealed_answers.is_empty());
        assert_eq!(state.strikes, 0);
        assert!(state.is_consistent());
    }

    #[test]
    fn reselecting_active_question_keeps_progress() {
        let mut state = with_question();
        let round = state.round_id;
        state.reveal_next().unwrap();
        state.register_strike();

        assert!(!state.begin_round(fruit()));
        assert_eq!(state.round_id, round);
        assert_eq!(state.revealed_answers, BTreeSet::from([0]));
        assert_eq!(state.strikes, 1);
    }

    #[test]
    fn strikes_are_not_capped() {
        let mut state = with_question();
        for _ in 0..4 {
            state.register_strike();
        }
        assert_eq!(state.strikes, 4);
        assert!(state.strikes_exhausted());
    }

    #[test]
    fn serde_round_trip_preserves_state() {
        let mut state = with_question();
        state.toggle_reveal(1).unwrap();
        state.register_strike();
        state.set_score(Team::B, 120);
        state.bump_revision();

        let json = serde_json::to_string(&state).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn legacy_payload_without_revision_deserializes() {
        let raw = r#"{
            "current": {"question": "Q", "answers": [{"text": "x", "points": 5}]},
            "revealedAnswers": [0],
            "strikes": 2,
            "scoreA": 10,
            "scoreB": 3
        }"#;
        let state: GameState = serde_json::from_str(raw).unwrap();
        assert_eq!(state.revision, 0);
        assert_eq!(state.round_id, None);
        assert_eq!(state.revealed_points(), 5);
        assert_eq!(state.strikes, 2);
    }

    #[test]
    fn team_parses_case_insensitively() {
        assert_eq!("a".parse::<Team>(), Ok(Team::A));
        assert_eq!(" B ".parse::<Team>(), Ok(Team::B));
        assert!("C".parse::<Team>().is_err());
    }
}
