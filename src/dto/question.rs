use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dto::validation::{first_message, validate_not_blank},
    state::game::{Answer, GameError, Question},
};

/// Custom question typed in by the host.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CustomQuestionInput {
    /// Prompt shown on the board.
    pub question: String,
    /// Answers in display order.
    pub answers: Vec<AnswerInput>,
}

/// One answer row of a custom question.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AnswerInput {
    /// Answer text.
    pub text: String,
    /// Points as typed; must fit a `u32` and be at least 1.
    pub points: i64,
}

impl Validate for CustomQuestionInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_not_blank(&self.question, "question must not be empty".into()) {
            errors.add("question", e);
        }

        if self.answers.is_empty() {
            let mut err = ValidationError::new("answers_empty");
            err.message = Some("add at least one answer".into());
            errors.add("answers", err);
        }

        for (idx, answer) in self.answers.iter().enumerate() {
            let position = idx + 1;
            if let Err(e) =
                validate_not_blank(&answer.text, format!("answer {position} must not be empty"))
            {
                errors.add("answers", e);
            }
            if answer.points < 1 {
                let mut err = ValidationError::new("answer_points");
                err.message = Some(format!("answer {position} needs at least 1 point").into());
                errors.add("answers", err);
            } else if answer.points > i64::from(u32::MAX) {
                let mut err = ValidationError::new("answer_points_overflow");
                err.message = Some(
                    format!("answer {position} is worth more than {} points", u32::MAX).into(),
                );
                errors.add("answers", err);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl CustomQuestionInput {
    /// Validate the input and convert it into a trimmed [`Question`].
    pub fn into_question(self) -> Result<Question, GameError> {
        self.validate().map_err(|errors| {
            let message = first_message(&errors, "question")
                .or_else(|| first_message(&errors, "answers"))
                .unwrap_or_else(|| errors.to_string());
            GameError::InvalidInput(message)
        })?;

        let answers = self
            .answers
            .into_iter()
            .map(|answer| Answer {
                text: answer.text.trim().to_string(),
                points: answer.points as u32,
            })
            .collect();

        Ok(Question {
            question: self.question.trim().to_string(),
            answers,
        })
    }
}

/// Default point value offered for the n-th (1-based) answer row.
pub fn suggested_points(position: usize) -> u32 {
    let step = position.saturating_sub(1).min(7) as u32;
    40 - step * 5
}
