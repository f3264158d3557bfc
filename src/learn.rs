//! Character lessons, per-character progress and quizzes.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::cw::char_to_morse;
use crate::error::Result;
use crate::store;

const PUNCTUATION: [char; 18] = [
    '.', ',', '?', '\'', '!', '/', '(', ')', '&', ':', ';', '=', '+', '-', '_', '"', '$', '@',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Letters,
    Numbers,
    Punctuation,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Letters, Category::Numbers, Category::Punctuation];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Letters => "Letters",
            Category::Numbers => "Numbers",
            Category::Punctuation => "Punctuation",
        };
        f.write_str(name)
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "letters" | "letter" => Ok(Category::Letters),
            "numbers" | "number" | "digits" => Ok(Category::Numbers),
            "punctuation" => Ok(Category::Punctuation),
            other => Err(format!("unknown category '{}'", other)),
        }
    }
}

/// A character as shown in a lesson
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MorseCharacter {
    pub symbol: char,
    pub code: &'static str,
    pub category: Category,
}

fn lesson(symbols: impl Iterator<Item = char>, category: Category) -> Vec<MorseCharacter> {
    symbols
        .filter_map(|symbol| {
            char_to_morse(symbol).map(|code| MorseCharacter {
                symbol,
                code,
                category,
            })
        })
        .collect()
}

/// Every lesson character: letters, then digits, then punctuation
pub fn catalog() -> Vec<MorseCharacter> {
    let mut all = by_category(Category::Letters);
    all.extend(by_category(Category::Numbers));
    all.extend(by_category(Category::Punctuation));
    all
}

pub fn by_category(category: Category) -> Vec<MorseCharacter> {
    match category {
        Category::Letters => lesson('A'..='Z', category),
        Category::Numbers => lesson('0'..='9', category),
        Category::Punctuation => lesson(PUNCTUATION.iter().copied(), category),
    }
}

/// Learning record for one character
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterProgress {
    pub character: char,
    pub times_learned: u32,
    pub last_learned_ms: u64,
    pub quiz_score: u32,
    pub total_quiz_attempts: u32,
}

impl CharacterProgress {
    fn new(character: char) -> Self {
        Self {
            character,
            times_learned: 0,
            last_learned_ms: store::now_ms(),
            quiz_score: 0,
            total_quiz_attempts: 0,
        }
    }

    /// Fraction of quiz answers that were correct
    pub fn accuracy(&self) -> Option<f32> {
        if self.total_quiz_attempts == 0 {
            None
        } else {
            Some(self.quiz_score as f32 / self.total_quiz_attempts as f32)
        }
    }
}

/// JSON-backed per-character progress
#[derive(Debug)]
pub struct ProgressStore {
    entries: Vec<CharacterProgress>,
    path: PathBuf,
}

impl ProgressStore {
    pub fn default_path(data_dir: &Path) -> PathBuf {
        data_dir.join("progress.json")
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = store::load_json(&path);
        Self { entries, path }
    }

    /// Record a lesson view and/or a quiz answer for `symbol`.
    ///
    /// `learned` counts a lesson view; `quiz_correct` counts one quiz
    /// attempt, scoring it when true.
    pub fn record(&mut self, symbol: char, learned: bool, quiz_correct: Option<bool>) -> Result<()> {
        let character = symbol.to_ascii_uppercase();
        let index = match self.entries.iter().position(|e| e.character == character) {
            Some(index) => index,
            None => {
                self.entries.push(CharacterProgress::new(character));
                self.entries.len() - 1
            }
        };

        let entry = &mut self.entries[index];
        if learned {
            entry.times_learned += 1;
        }
        if let Some(correct) = quiz_correct {
            entry.total_quiz_attempts += 1;
            if correct {
                entry.quiz_score += 1;
            }
        }
        entry.last_learned_ms = store::now_ms();

        tracing::debug!(
            "Progress for {:?}: learned={} score={}/{}",
            character,
            entry.times_learned,
            entry.quiz_score,
            entry.total_quiz_attempts
        );
        store::save_json(&self.path, &self.entries)
    }

    pub fn get(&self, symbol: char) -> Option<&CharacterProgress> {
        let character = symbol.to_ascii_uppercase();
        self.entries.iter().find(|e| e.character == character)
    }

    pub fn all(&self) -> &[CharacterProgress] {
        &self.entries
    }

    /// Characters viewed in at least one lesson
    pub fn learned_count(&self) -> usize {
        self.entries.iter().filter(|e| e.times_learned > 0).count()
    }

    pub fn reset(&mut self) -> Result<()> {
        self.entries.clear();
        store::save_json(&self.path, &self.entries)
    }
}

/// A quiz over a shuffled set of characters, one answer per question
#[derive(Debug, Clone)]
pub struct Quiz {
    questions: Vec<MorseCharacter>,
    index: usize,
    score: usize,
    answered: bool,
}

impl Quiz {
    pub fn new<R: Rng + ?Sized>(mut characters: Vec<MorseCharacter>, rng: &mut R) -> Self {
        characters.shuffle(rng);
        Self {
            questions: characters,
            index: 0,
            score: 0,
            answered: false,
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Zero-based position of the current question
    pub fn position(&self) -> usize {
        self.index
    }

    /// The character being asked, `None` once the quiz is complete
    pub fn current(&self) -> Option<&MorseCharacter> {
        self.questions.get(self.index)
    }

    /// Check an answer for the current question.
    ///
    /// Only the first answer to a question is scored; later calls return
    /// whether they would have been right without changing the score.
    pub fn submit(&mut self, answer: &str) -> bool {
        let Some(current) = self.current() else {
            return false;
        };

        let mut chars = answer.trim().chars();
        let correct = match (chars.next(), chars.next()) {
            (Some(c), None) => c.to_ascii_uppercase() == current.symbol,
            _ => false,
        };

        if !self.answered {
            self.answered = true;
            if correct {
                self.score += 1;
            }
        }
        correct
    }

    /// Move to the next question. Returns false when the quiz is complete.
    pub fn advance(&mut self) -> bool {
        if self.index < self.questions.len() {
            self.index += 1;
        }
        self.answered = false;
        self.index < self.questions.len()
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn is_complete(&self) -> bool {
        self.index >= self.questions.len()
    }
}
