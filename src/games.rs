//! Practice games and their score board.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::cw::char_to_morse;
use crate::error::Result;
use crate::store;

pub const POINTS_CORRECT: i32 = 10;
pub const POINTS_WRONG: i32 = -5;
pub const QUESTIONS_PER_GAME: usize = 10;

/// Entries kept per game in the top-score listing
const TOP_SCORES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameType {
    Decoder,
    SpeedChallenge,
    MemoryMatch,
    SosRescue,
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameType::Decoder => "Decoder",
            GameType::SpeedChallenge => "Speed Challenge",
            GameType::MemoryMatch => "Memory Match",
            GameType::SosRescue => "SOS Rescue",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Time allowed per question
    pub fn time_limit(self) -> Duration {
        match self {
            Difficulty::Easy => Duration::from_secs(10),
            Difficulty::Medium => Duration::from_secs(7),
            Difficulty::Hard => Duration::from_secs(5),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(name)
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

/// Outcome of a finished game, ready for the score board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    pub game_type: GameType,
    pub difficulty: Difficulty,
    pub score: u32,
    pub duration: Duration,
}

fn apply_points(score: u32, correct: bool) -> u32 {
    let points = if correct { POINTS_CORRECT } else { POINTS_WRONG };
    (score as i32 + points).max(0) as u32
}

/// Result of one decoder answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Correct,
    Wrong { expected: char },
    TooSlow { expected: char },
}

impl Answer {
    pub fn is_correct(self) -> bool {
        matches!(self, Answer::Correct)
    }
}

/// Identify the character behind a played code.
///
/// Speed Challenge and SOS Rescue play the same rounds with their own
/// score board entries.
#[derive(Debug, Clone)]
pub struct DecoderGame {
    game_type: GameType,
    difficulty: Difficulty,
    questions: Vec<char>,
    index: usize,
    score: u32,
    started: Instant,
}

impl DecoderGame {
    pub fn new<R: Rng + ?Sized>(game_type: GameType, difficulty: Difficulty, rng: &mut R) -> Self {
        let pool: Vec<char> = ('A'..='Z').chain('0'..='9').collect();
        let questions = (0..QUESTIONS_PER_GAME)
            .filter_map(|_| pool.choose(&mut *rng).copied())
            .collect();

        Self {
            game_type,
            difficulty,
            questions,
            index: 0,
            score: 0,
            started: Instant::now(),
        }
    }

    pub fn game_type(&self) -> GameType {
        self.game_type
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// One-based number of the current question
    pub fn question_number(&self) -> usize {
        (self.index + 1).min(self.questions.len())
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Code to play for the current question
    pub fn current_code(&self) -> Option<&'static str> {
        self.questions.get(self.index).and_then(|&c| char_to_morse(c))
    }

    /// Answer the current question and move on.
    ///
    /// Answers slower than the difficulty's time limit count as wrong.
    pub fn submit(&mut self, answer: &str, response_time: Duration) -> Option<Answer> {
        let expected = *self.questions.get(self.index)?;
        let matches = answer.trim().eq_ignore_ascii_case(&expected.to_string());

        let outcome = if response_time > self.difficulty.time_limit() {
            Answer::TooSlow { expected }
        } else if matches {
            Answer::Correct
        } else {
            Answer::Wrong { expected }
        };

        self.score = apply_points(self.score, outcome.is_correct());
        self.index += 1;
        Some(outcome)
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_complete(&self) -> bool {
        self.index >= self.questions.len()
    }

    /// Final result, available once every question is answered
    pub fn result(&self) -> Option<GameResult> {
        self.is_complete().then(|| GameResult {
            game_type: self.game_type,
            difficulty: self.difficulty,
            score: self.score,
            duration: self.started.elapsed(),
        })
    }
}

/// What a memory card shows when face up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardFace {
    Letter(char),
    Code(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryCard {
    pub letter: char,
    pub face: CardFace,
    pub matched: bool,
}

/// Result of turning a card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flip {
    /// First card of a pair is face up
    Revealed,
    Match,
    Mismatch,
    /// Index out of range, or the card is already face up or matched
    Ignored,
}

/// Pair each letter with its code
#[derive(Debug, Clone)]
pub struct MemoryGame {
    difficulty: Difficulty,
    cards: Vec<MemoryCard>,
    revealed: Option<usize>,
    score: u32,
    started: Instant,
}

impl MemoryGame {
    pub fn new<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Self {
        let mut cards = Vec::with_capacity(16);
        for letter in 'A'..='H' {
            if let Some(code) = char_to_morse(letter) {
                cards.push(MemoryCard { letter, face: CardFace::Letter(letter), matched: false });
                cards.push(MemoryCard { letter, face: CardFace::Code(code), matched: false });
            }
        }
        cards.shuffle(rng);

        Self {
            difficulty,
            cards,
            revealed: None,
            score: 0,
            started: Instant::now(),
        }
    }

    pub fn cards(&self) -> &[MemoryCard] {
        &self.cards
    }

    /// Index of the card waiting for its partner
    pub fn revealed(&self) -> Option<usize> {
        self.revealed
    }

    pub fn flip(&mut self, index: usize) -> Flip {
        let Some(card) = self.cards.get(index).copied() else {
            return Flip::Ignored;
        };
        if card.matched || self.revealed == Some(index) {
            return Flip::Ignored;
        }

        let Some(first) = self.revealed.take() else {
            self.revealed = Some(index);
            return Flip::Revealed;
        };

        let matched = self.cards[first].letter == card.letter;
        if matched {
            self.cards[first].matched = true;
            self.cards[index].matched = true;
        }
        self.score = apply_points(self.score, matched);

        if matched {
            Flip::Match
        } else {
            Flip::Mismatch
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_complete(&self) -> bool {
        self.cards.iter().all(|c| c.matched)
    }

    pub fn result(&self) -> Option<GameResult> {
        self.is_complete().then(|| GameResult {
            game_type: GameType::MemoryMatch,
            difficulty: self.difficulty,
            score: self.score,
            duration: self.started.elapsed(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameScore {
    pub id: u64,
    pub game_type: GameType,
    pub score: u32,
    pub difficulty: Difficulty,
    pub timestamp_ms: u64,
    pub duration_ms: u64,
}

/// JSON-backed list of finished games
#[derive(Debug)]
pub struct ScoreBoard {
    scores: Vec<GameScore>,
    path: PathBuf,
}

impl ScoreBoard {
    pub fn default_path(data_dir: &Path) -> PathBuf {
        data_dir.join("scores.json")
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let scores = store::load_json(&path);
        Self { scores, path }
    }

    pub fn save(&mut self, result: &GameResult) -> Result<GameScore> {
        let id = self.scores.iter().map(|s| s.id).max().map_or(1, |max| max + 1);
        let score = GameScore {
            id,
            game_type: result.game_type,
            score: result.score,
            difficulty: result.difficulty,
            timestamp_ms: store::now_ms(),
            duration_ms: result.duration.as_millis() as u64,
        };
        self.scores.push(score.clone());
        store::save_json(&self.path, &self.scores)?;
        tracing::info!("{} ({}) scored {}", score.game_type, score.difficulty, score.score);
        Ok(score)
    }

    /// Best score for a game at a difficulty, 0 when never played
    pub fn high_score(&self, game_type: GameType, difficulty: Difficulty) -> u32 {
        self.scores
            .iter()
            .filter(|s| s.game_type == game_type && s.difficulty == difficulty)
            .map(|s| s.score)
            .max()
            .unwrap_or(0)
    }

    /// Best scores for a game, highest first
    pub fn top_scores(&self, game_type: GameType) -> Vec<&GameScore> {
        let mut scores: Vec<&GameScore> = self.scores.iter().filter(|s| s.game_type == game_type).collect();
        scores.sort_by(|a, b| b.score.cmp(&a.score));
        scores.truncate(TOP_SCORES);
        scores
    }

    /// Every score, newest first
    pub fn all(&self) -> Vec<&GameScore> {
        let mut scores: Vec<&GameScore> = self.scores.iter().rev().collect();
        scores.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        scores
    }

    pub fn clear(&mut self) -> Result<()> {
        self.scores.clear();
        store::save_json(&self.path, &self.scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cw::morse_to_char;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn answer_for(game: &DecoderGame) -> char {
        morse_to_char(game.current_code().unwrap()).unwrap()
    }

    #[test]
    fn test_decoder_all_correct() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut game = DecoderGame::new(GameType::Decoder, Difficulty::Easy, &mut rng);
        assert_eq!(game.total_questions(), QUESTIONS_PER_GAME);

        while !game.is_complete() {
            let answer = answer_for(&game).to_ascii_lowercase().to_string();
            assert_eq!(game.submit(&answer, Duration::ZERO), Some(Answer::Correct));
        }

        let result = game.result().unwrap();
        assert_eq!(result.score, 100);
        assert_eq!(result.game_type, GameType::Decoder);
        assert_eq!(game.submit("A", Duration::ZERO), None);
    }

    #[test]
    fn test_decoder_score_never_negative() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut game = DecoderGame::new(GameType::SosRescue, Difficulty::Hard, &mut rng);

        let expected = answer_for(&game);
        assert_eq!(game.submit("#", Duration::ZERO), Some(Answer::Wrong { expected }));
        assert_eq!(game.score(), 0);

        let answer = answer_for(&game).to_string();
        game.submit(&answer, Duration::ZERO);
        assert_eq!(game.score(), 10);
        game.submit("#", Duration::ZERO);
        assert_eq!(game.score(), 5);
        assert_eq!(game.question_number(), 4);
    }

    #[test]
    fn test_decoder_time_limit() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut game = DecoderGame::new(GameType::SpeedChallenge, Difficulty::Medium, &mut rng);
        let expected = answer_for(&game);
        let outcome = game.submit(&expected.to_string(), Duration::from_secs(8));
        assert_eq!(outcome, Some(Answer::TooSlow { expected }));
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn test_memory_game() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut game = MemoryGame::new(Difficulty::Easy, &mut rng);
        assert_eq!(game.cards().len(), 16);

        // Find a mismatching pair first
        let first_letter = game.cards()[0].letter;
        let other = game.cards().iter().position(|c| c.letter != first_letter).unwrap();
        assert_eq!(game.flip(0), Flip::Revealed);
        assert_eq!(game.flip(0), Flip::Ignored);
        assert_eq!(game.flip(other), Flip::Mismatch);
        assert_eq!(game.score(), 0);
        assert_eq!(game.revealed(), None);

        // Then solve the board
        for letter in 'A'..='H' {
            let indices: Vec<usize> = game
                .cards()
                .iter()
                .enumerate()
                .filter(|(_, c)| c.letter == letter)
                .map(|(i, _)| i)
                .collect();
            assert_eq!(indices.len(), 2);
            assert_eq!(game.flip(indices[0]), Flip::Revealed);
            assert_eq!(game.flip(indices[1]), Flip::Match);
            assert_eq!(game.flip(indices[0]), Flip::Ignored);
        }

        assert!(game.is_complete());
        assert_eq!(game.result().unwrap().score, 80);
        assert_eq!(game.flip(99), Flip::Ignored);
    }

    #[test]
    fn test_memory_cards_pair_letters_with_codes() {
        let mut rng = StdRng::seed_from_u64(2);
        let game = MemoryGame::new(Difficulty::Easy, &mut rng);
        for letter in 'A'..='H' {
            let faces: Vec<CardFace> = game.cards().iter().filter(|c| c.letter == letter).map(|c| c.face).collect();
            assert!(faces.contains(&CardFace::Letter(letter)));
            assert!(faces.contains(&CardFace::Code(char_to_morse(letter).unwrap())));
        }
    }

    #[test]
    fn test_score_board() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        let mut board = ScoreBoard::open(&path);
        assert_eq!(board.high_score(GameType::Decoder, Difficulty::Easy), 0);

        for score in [30, 90, 60] {
            board
                .save(&GameResult {
                    game_type: GameType::Decoder,
                    difficulty: Difficulty::Easy,
                    score,
                    duration: Duration::from_secs(12),
                })
                .unwrap();
        }
        board
            .save(&GameResult {
                game_type: GameType::MemoryMatch,
                difficulty: Difficulty::Hard,
                score: 200,
                duration: Duration::from_millis(1500),
            })
            .unwrap();

        assert_eq!(board.high_score(GameType::Decoder, Difficulty::Easy), 90);
        assert_eq!(board.high_score(GameType::Decoder, Difficulty::Hard), 0);

        let top: Vec<u32> = board.top_scores(GameType::Decoder).iter().map(|s| s.score).collect();
        assert_eq!(top, vec![90, 60, 30]);

        let reopened = ScoreBoard::open(&path);
        assert_eq!(reopened.all().len(), 4);
        assert_eq!(reopened.all()[0].game_type, GameType::MemoryMatch);
        assert_eq!(reopened.all()[0].duration_ms, 1500);

        board.clear().unwrap();
        assert!(ScoreBoard::open(&path).all().is_empty());
    }

    #[test]
    fn test_top_scores_are_capped() {
        let dir = tempfile::tempdir().unwrap();
        let mut board = ScoreBoard::open(dir.path().join("scores.json"));
        for score in 0..15 {
            board
                .save(&GameResult {
                    game_type: GameType::SpeedChallenge,
                    difficulty: Difficulty::Medium,
                    score,
                    duration: Duration::ZERO,
                })
                .unwrap();
        }
        let top = board.top_scores(GameType::SpeedChallenge);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].score, 14);
    }
}
