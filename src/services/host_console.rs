//! Line-oriented command language of the terminal host console.

use std::{fmt::Write as _, str::FromStr};

use thiserror::Error;

use crate::{
    dto::question::{AnswerInput, CustomQuestionInput, suggested_points},
    state::game::{STRIKE_LIMIT, Team},
};

use super::{
    board::render_host_board,
    host_service::{HostError, HostSession},
};

/// Help text listing every console command.
pub const HELP: &str = "\
Commands:
  list                      show the question bank
  select N                  make question N active
  reveal                    reveal the next hidden answer
  toggle N                  show or hide answer N
  strike                    add a strike
  award A|B                 give the revealed points to a team
  score A|B VALUE           set a team's score
  round                     clear the board for a new round
  reset                     set both scores to zero
  custom Q | ANS[=PTS] | ...  add a question and select it
  show                      print the board
  end                       end the room and wipe its state
  quit                      leave the room running and exit
  help                      print this text";

/// Console input that could not be understood.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// Blank line.
    #[error("empty command")]
    Empty,
    /// First word is not a command.
    #[error("unknown command `{0}`; type `help`")]
    Unknown(String),
    /// Required argument left out.
    #[error("`{command}` needs {argument}")]
    MissingArgument {
        /// Command word.
        command: &'static str,
        /// What was expected.
        argument: &'static str,
    },
    /// Position or point value that is not a number.
    #[error("`{0}` is not a positive number")]
    InvalidNumber(String),
    /// Team other than A or B.
    #[error("`{0}` is not a team; use A or B")]
    InvalidTeam(String),
}

/// One parsed console command. Positions are 1-based as typed.
#[derive(Debug, Clone)]
pub enum HostCommand {
    /// `list`: print the question bank.
    List,
    /// `select N`: make bank entry N active.
    Select(usize),
    /// `reveal`: show the next hidden answer.
    Reveal,
    /// `toggle N`: flip answer N.
    Toggle(usize),
    /// `strike`
    Strike,
    /// `award A|B`: credit the revealed points.
    Award(Team),
    /// `score A|B VALUE`. Raw value, validated by the session.
    Score(Team, String),
    /// `round`: clear the board, keep scores.
    Round,
    /// `reset`: zero both scores.
    Reset,
    /// `custom Q | A=40 | B`
    Custom(CustomQuestionInput),
    /// `show`: print the host board.
    Show,
    /// `end`: tear the room down.
    End,
    /// `quit`: leave the room running.
    Quit,
    /// `help`
    Help,
}

/// What the console loop should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Print the message and read the next command.
    Continue(String),
    /// End the room, then exit.
    End,
    /// Exit, leaving the room in place.
    Quit,
}

impl FromStr for HostCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(word, rest)| (word, rest.trim()))
            .unwrap_or((line, ""));

        match word.to_ascii_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "list" | "ls" => Ok(HostCommand::List),
            "select" | "q" => position(rest, "select", "a question number").map(HostCommand::Select),
            "reveal" | "next" => Ok(HostCommand::Reveal),
            "toggle" | "t" => position(rest, "toggle", "an answer number").map(HostCommand::Toggle),
            "strike" | "x" => Ok(HostCommand::Strike),
            "award" => team(rest, "award").map(HostCommand::Award),
            "score" => {
                let (raw_team, value) = rest.split_once(char::is_whitespace).ok_or(
                    CommandError::MissingArgument {
                        command: "score",
                        argument: "a team and a value",
                    },
                )?;
                Ok(HostCommand::Score(team(raw_team, "score")?, value.trim().to_string()))
            }
            "round" => Ok(HostCommand::Round),
            "reset" => Ok(HostCommand::Reset),
            "custom" => custom(rest).map(HostCommand::Custom),
            "show" => Ok(HostCommand::Show),
            "end" => Ok(HostCommand::End),
            "quit" | "exit" => Ok(HostCommand::Quit),
            "help" | "?" => Ok(HostCommand::Help),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn position(raw: &str, command: &'static str, argument: &'static str) -> Result<usize, CommandError> {
    if raw.is_empty() {
        return Err(CommandError::MissingArgument { command, argument });
    }
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(CommandError::InvalidNumber(raw.to_string())),
    }
}

fn team(raw: &str, command: &'static str) -> Result<Team, CommandError> {
    if raw.is_empty() {
        return Err(CommandError::MissingArgument {
            command,
            argument: "a team",
        });
    }
    raw.parse::<Team>()
        .map_err(|_| CommandError::InvalidTeam(raw.to_string()))
}

/// `Question | Answer=40 | Answer` where missing points take the suggested
/// value for that row.
fn custom(rest: &str) -> Result<CustomQuestionInput, CommandError> {
    if rest.is_empty() {
        return Err(CommandError::MissingArgument {
            command: "custom",
            argument: "a question and answers",
        });
    }
    let mut parts = rest.split('|').map(str::trim);
    let question = parts.next().unwrap_or_default().to_string();

    let mut answers = Vec::new();
    for (idx, part) in parts.enumerate() {
        let (text, points) = match part.rsplit_once('=') {
            Some((text, points)) => {
                let points = points
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| CommandError::InvalidNumber(points.trim().to_string()))?;
                (text.trim(), points)
            }
            None => (part, i64::from(suggested_points(idx + 1))),
        };
        answers.push(AnswerInput {
            text: text.to_string(),
            points,
        });
    }

    Ok(CustomQuestionInput { question, answers })
}

/// Run `command` against the session and describe the result.
///
/// `End` and `Quit` only report back; the caller owns the session teardown.
pub fn apply(session: &mut HostSession, command: HostCommand) -> Result<Outcome, HostError> {
    let message = match command {
        HostCommand::List => list_questions(session),
        HostCommand::Select(n) => {
            let fresh = session.select_question(zero_based(n))?;
            let mut message = render_host_board(session.state());
            if !fresh {
                message.push_str("(question already active; progress kept)\n");
            }
            message
        }
        HostCommand::Reveal => match session.reveal_next()? {
            Some(idx) => format!("Revealed answer {}.\n{}", idx + 1, render_host_board(session.state())),
            None => "Every answer is already revealed.".to_string(),
        },
        HostCommand::Toggle(n) => {
            let shown = session.toggle_reveal(zero_based(n))?;
            let verb = if shown { "Revealed" } else { "Hid" };
            format!("{verb} answer {n}.\n{}", render_host_board(session.state()))
        }
        HostCommand::Strike => {
            let strikes = session.register_strike()?;
            if strikes >= STRIKE_LIMIT {
                format!("Strike {strikes}! The round is over.")
            } else {
                format!("Strike {strikes}.")
            }
        }
        HostCommand::Award(team) => {
            let awarded = session.award_points(team)?;
            format!(
                "Team {team} receives {awarded} points (now {}).",
                session.state().score(team)
            )
        }
        HostCommand::Score(team, raw) => {
            session.set_score_from_input(team, &raw)?;
            format!("Team {team} score set to {}.", session.state().score(team))
        }
        HostCommand::Round => {
            session.start_new_round()?;
            "Board cleared for a new round.".to_string()
        }
        HostCommand::Reset => {
            session.reset_scores()?;
            "Scores reset.".to_string()
        }
        HostCommand::Custom(input) => {
            let index = session.add_custom_question(input)?;
            format!(
                "Added question {}.\n{}",
                index + 1,
                render_host_board(session.state())
            )
        }
        HostCommand::Show => render_host_board(session.state()),
        HostCommand::Help => HELP.to_string(),
        HostCommand::End => return Ok(Outcome::End),
        HostCommand::Quit => return Ok(Outcome::Quit),
    };
    Ok(Outcome::Continue(message))
}

/// Position 0 maps past the end so it is rejected as out of range.
fn zero_based(position: usize) -> usize {
    position.checked_sub(1).unwrap_or(usize::MAX)
}

fn list_questions(session: &HostSession) -> String {
    let mut out = String::new();
    for (idx, question) in session.bank().iter().enumerate() {
        let active = session.state().current.as_ref() == Some(question);
        let marker = if active { '*' } else { ' ' };
        let _ = writeln!(
            out,
            "{marker}{:>3}. {} ({} answers)",
            idx + 1,
            question.question,
            question.answers.len()
        );
    }
    if out.is_empty() {
        out.push_str("The question bank is empty; add one with `custom`.\n");
    }
    out
}
