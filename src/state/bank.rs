//! Question bank loaded once at startup and extended with custom questions.

use std::{fs, path::Path};

use thiserror::Error;

use crate::state::game::{GameError, Question};

/// Failures while reading the question bank file.
#[derive(Debug, Error)]
pub enum BankError {
    /// The file could not be read.
    #[error("failed to read question bank `{path}`")]
    Read {
        /// File that was read.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a JSON array of questions.
    #[error("failed to parse question bank `{path}`")]
    Parse {
        /// File that was parsed.
        path: String,
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Ordered list of selectable questions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Build a bank from already parsed questions.
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// Read a JSON array of questions from `path`.
    pub fn load(path: &Path) -> Result<Self, BankError> {
        let contents = fs::read_to_string(path).map_err(|source| BankError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let questions =
            serde_json::from_str::<Vec<Question>>(&contents).map_err(|source| BankError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self { questions })
    }

    /// Question stored at `index`.
    pub fn get(&self, index: usize) -> Result<&Question, GameError> {
        self.questions
            .get(index)
            .ok_or(GameError::QuestionOutOfRange {
                index,
                len: self.questions.len(),
            })
    }

    /// Number of questions in the bank.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the bank is empty.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Iterate over the questions in selection order.
    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    /// Append a question and return its index. Not written back to disk.
    pub(crate) fn push(&mut self, question: Question) -> usize {
        self.questions.push(question);
        self.questions.len() - 1
    }
}
