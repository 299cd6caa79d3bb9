//! Plain-text board rendering for the terminal clients.

use std::{fmt::Write as _, io::Write};

use tracing::warn;

use crate::state::game::{GameState, Team};

use super::viewer_service::Renderer;

const WAITING_FOR_QUESTION: &str = "(Waiting for question...)";
const HIDDEN_ANSWER: &str = "?";

/// Board as the audience sees it: unrevealed answers are masked.
pub fn render_board(state: &GameState) -> String {
    let mut out = String::new();
    write_scores(&mut out, state);

    let Some(question) = &state.current else {
        let _ = writeln!(out, "{WAITING_FOR_QUESTION}");
        let _ = writeln!(out, "Revealed: 0/0");
        return out;
    };

    let _ = writeln!(out, "{}", question.question);
    for (idx, answer) in question.answers.iter().enumerate() {
        if state.is_revealed(idx) {
            let _ = writeln!(out, "  {:>2}. {:<28} {:>3}", idx + 1, answer.text, answer.points);
        } else {
            let _ = writeln!(out, "  {:>2}. {HIDDEN_ANSWER}", idx + 1);
        }
    }
    let _ = writeln!(
        out,
        "Revealed: {}/{}",
        state.revealed_answers.len(),
        question.answers.len()
    );
    out
}

/// Board as the host sees it: every answer with its reveal marker and the
/// points currently on the board.
pub fn render_host_board(state: &GameState) -> String {
    let mut out = String::new();
    write_scores(&mut out, state);

    let Some(question) = &state.current else {
        let _ = writeln!(out, "No question selected. Use `list` and `select N`.");
        return out;
    };

    let _ = writeln!(out, "{}", question.question);
    for (idx, answer) in question.answers.iter().enumerate() {
        let marker = if state.is_revealed(idx) { "x" } else { " " };
        let _ = writeln!(
            out,
            "  [{marker}] {:>2}. {:<28} {:>3}",
            idx + 1,
            answer.text,
            answer.points
        );
    }
    let _ = writeln!(out, "On the board: {} points", state.revealed_points());
    if state.strikes_exhausted() {
        let _ = writeln!(out, "Three strikes: the round is over.");
    }
    out
}

fn write_scores(out: &mut String, state: &GameState) {
    let _ = writeln!(
        out,
        "Team {}: {:>4}   Team {}: {:>4}   Strikes: {}",
        Team::A,
        state.score_a,
        Team::B,
        state.score_b,
        strike_marks(state.strikes)
    );
}

fn strike_marks(strikes: u32) -> String {
    if strikes == 0 {
        return "-".to_owned();
    }
    "X".repeat(strikes.min(9) as usize)
}

/// [`Renderer`] redrawing the audience board on a terminal.
pub struct TerminalRenderer<W> {
    out: W,
    clear_screen: bool,
}

impl<W: Write + Send + 'static> TerminalRenderer<W> {
    /// Draw into `out`, clearing the screen before each frame when
    /// `clear_screen` is set.
    pub fn new(out: W, clear_screen: bool) -> Self {
        Self { out, clear_screen }
    }
}

impl<W: Write + Send + 'static> Renderer for TerminalRenderer<W> {
    fn render(&mut self, state: &GameState) {
        let mut frame = String::new();
        if self.clear_screen {
            frame.push_str("\x1b[2J\x1b[H");
        }
        frame.push_str(&render_board(state));
        if let Err(err) = self
            .out
            .write_all(frame.as_bytes())
            .and_then(|()| self.out.flush())
        {
            warn!(error = %err, "failed to draw board");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::game::{Answer, Question};

    fn fruit_round() -> GameState {
        GameState {
            current: Some(Question {
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
            }),
            revealed_answers: [1].into_iter().collect(),
            strikes: 2,
            score_a: 70,
            ..GameState::default()
        }
    }

    #[test]
    fn audience_board_masks_hidden_answers() {
        let board = render_board(&fruit_round());
        assert!(board.contains("Name a fruit"));
        assert!(board.contains("1. ?"));
        assert!(!board.contains("Apple"));
        assert!(board.contains("Banana"));
        assert!(board.contains("Revealed: 1/2"));
        assert!(board.contains("Strikes: XX"));
    }

    #[test]
    fn empty_board_waits_for_question() {
        let board = render_board(&GameState::default());
        assert!(board.contains(WAITING_FOR_QUESTION));
        assert!(board.contains("Revealed: 0/0"));
        assert!(board.contains("Strikes: -"));
    }

    #[test]
    fn host_board_shows_everything() {
        let mut state = fruit_round();
        state.strikes = 3;
        let board = render_host_board(&state);
        assert!(board.contains("[ ]  1. Apple"));
        assert!(board.contains("[x]  2. Banana"));
        assert!(board.contains("On the board: 30 points"));
        assert!(board.contains("Three strikes"));
    }

    #[test]
    fn terminal_renderer_writes_frame() {
        let mut renderer = TerminalRenderer::new(Vec::new(), false);
        renderer.render(&fruit_round());
        let written = String::from_utf8(renderer.out).unwrap();
        assert_eq!(written, render_board(&fruit_round()));
    }
}
