use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use morse_trainer::cipher::{self, Cipher, CipherKind};
use morse_trainer::config::Settings;
use morse_trainer::cw::{
    is_valid_morse, morse_timing, speed_for_wpm, total_duration_ms, wpm_for_speed, MorseTiming,
};
use morse_trainer::games::{
    Answer, CardFace, DecoderGame, Difficulty, Flip, GameResult, GameType, MemoryGame, ScoreBoard,
};
use morse_trainer::history::{Direction, HistoryStore, NewTranslation, TranslationRecord};
use morse_trainer::learn::{self, Category, ProgressStore, Quiz};
use morse_trainer::playback::{
    vibration_waveform, write_wav, ConsoleLamp, KeySink, Player, SidetoneGenerator,
    ERROR_PATTERN, LESSON_SPEED, SUCCESS_PATTERN,
};

#[derive(Parser, Debug)]
#[command(name = "morse-trainer", version, about = "Translate, play and practice Morse code")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Playback speed multiplier (1.0 = 12 WPM)
    #[arg(long, global = true)]
    speed: Option<f32>,

    /// Playback speed in words per minute
    #[arg(long, global = true, conflicts_with = "speed")]
    wpm: Option<f32>,

    /// Tone volume, 0.0 to 1.0
    #[arg(long, global = true)]
    volume: Option<f32>,

    /// Tone frequency in Hz
    #[arg(long, global = true)]
    frequency: Option<f32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encrypt (optionally) and encode text as Morse code
    Encode {
        #[command(flatten)]
        cipher: CipherArgs,
        /// Record the translation in history
        #[arg(long)]
        save: bool,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Decode Morse code and decrypt (optionally) the result
    Decode {
        #[command(flatten)]
        cipher: CipherArgs,
        #[arg(long)]
        save: bool,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        code: Vec<String>,
    },
    /// Check that a string contains only Morse symbols
    Validate {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        code: Vec<String>,
    },
    /// Print the playback schedule
    Timing(SourceArgs),
    /// Sound the code as a sidetone
    Play(SourceArgs),
    /// Flash the code as a lamp in the terminal
    Flash(SourceArgs),
    /// Print a vibration pattern
    Vibrate {
        /// Print a fixed feedback pattern instead
        #[arg(long, value_enum)]
        feedback: Option<Feedback>,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Render the code to a WAV file
    Wav {
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Saved translations
    #[command(subcommand)]
    History(HistoryCommand),
    /// Lessons and quizzes
    #[command(subcommand)]
    Learn(LearnCommand),
    /// Practice games
    #[command(subcommand)]
    Game(GameCommand),
    /// Persistent settings
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// List audio output devices
    Devices,
}

#[derive(Args, Debug)]
struct CipherArgs {
    /// none, shift, reverse, substitution or combined
    #[arg(long, default_value = "none")]
    cipher: CipherKind,
    /// Shift amount, or the 26-letter substitution alphabet
    #[arg(long)]
    key: Option<String>,
}

impl CipherArgs {
    fn resolve(&self, settings: &Settings) -> Result<Cipher> {
        let cipher = match (self.cipher, self.key.as_deref()) {
            (CipherKind::Shift, None) => Cipher::Shift(settings.default_shift),
            (CipherKind::Combined, None) => Cipher::Combined(settings.default_shift),
            (CipherKind::Shift | CipherKind::Combined, Some(key)) => {
                let shift: i32 = key.trim().parse().with_context(|| format!("Invalid shift '{}'", key))?;
                cipher::validate_shift(shift)?;
                if self.cipher == CipherKind::Shift {
                    Cipher::Shift(shift)
                } else {
                    Cipher::Combined(shift)
                }
            }
            (CipherKind::Substitution, key) => {
                let key = key.context("A substitution cipher needs --key")?;
                cipher::validate_substitution_key(key)?;
                Cipher::Substitution(key.to_string())
            }
            (kind, key) => Cipher::from_parts(kind, key),
        };
        Ok(cipher)
    }
}

/// Input shared by the playback commands
#[derive(Args, Debug)]
struct SourceArgs {
    /// Treat the input as Morse code instead of text
    #[arg(long)]
    morse: bool,
    #[command(flatten)]
    cipher: CipherArgs,
    /// Text (or code with --morse); options must come first
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    input: Vec<String>,
}

impl SourceArgs {
    fn code(&self, settings: &Settings) -> Result<String> {
        let input = self.input.join(" ");
        if input.trim().is_empty() {
            bail!("Nothing to send");
        }
        if self.morse {
            if !is_valid_morse(&input) {
                bail!("'{}' is not valid Morse code", input);
            }
            return Ok(input);
        }
        let cipher = self.cipher.resolve(settings)?;
        Ok(cipher::encrypt_and_encode(&input, &cipher))
    }

    fn timings(&self, settings: &Settings) -> Result<Vec<MorseTiming>> {
        Ok(morse_timing(&self.code(settings)?, settings.playback_speed))
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Feedback {
    Success,
    Error,
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// Show saved translations, newest first
    List {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    Favorites,
    Search { query: String },
    Favorite { id: u64 },
    Unfavorite { id: u64 },
    Delete { id: u64 },
    Clear,
}

#[derive(Subcommand, Debug)]
enum LearnCommand {
    /// List characters with their codes
    List {
        #[arg(short, long)]
        category: Option<Category>,
    },
    /// Study one character: show it, play it and count it as learned
    Show {
        symbol: char,
        #[arg(long)]
        silent: bool,
    },
    /// Quiz yourself on a category
    Quiz {
        #[arg(short, long)]
        category: Option<Category>,
    },
    Progress,
    Reset,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum GameArg {
    Decoder,
    Speed,
    Memory,
    Sos,
}

impl From<GameArg> for GameType {
    fn from(game: GameArg) -> Self {
        match game {
            GameArg::Decoder => GameType::Decoder,
            GameArg::Speed => GameType::SpeedChallenge,
            GameArg::Memory => GameType::MemoryMatch,
            GameArg::Sos => GameType::SosRescue,
        }
    }
}

#[derive(Subcommand, Debug)]
enum GameCommand {
    /// Decode ten characters against the clock
    Decoder {
        /// decoder, speed or sos
        #[arg(long, value_enum, default_value = "decoder")]
        mode: GameArg,
        #[arg(short, long, default_value = "easy")]
        difficulty: Difficulty,
    },
    /// Match letters with their codes
    Memory {
        #[arg(short, long, default_value = "easy")]
        difficulty: Difficulty,
    },
    /// Show best scores
    Scores {
        #[arg(long, value_enum)]
        game: Option<GameArg>,
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    Show,
    /// Set a value: speed, volume, frequency, sample_rate, shift,
    /// history_limit or device
    Set { key: String, value: String },
    /// Print the settings file and data directory locations
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut settings = Settings::load();
    apply_overrides(&mut settings, &cli)?;
    tracing::debug!("Effective settings: {:?}", settings);

    match cli.command {
        Command::Encode { cipher, save, text } => encode(&settings, &cipher, save, &text.join(" ")),
        Command::Decode { cipher, save, code } => decode(&settings, &cipher, save, &code.join(" ")),
        Command::Validate { code } => {
            let code = code.join(" ");
            if is_valid_morse(&code) {
                println!("valid");
                Ok(())
            } else {
                bail!("'{}' is not valid Morse code", code)
            }
        }
        Command::Timing(source) => print_timing(&settings, &source),
        Command::Play(source) => play_tone(&settings, source.timings(&settings)?),
        Command::Flash(source) => flash(source.timings(&settings)?),
        Command::Vibrate { feedback, source } => {
            let pattern = match feedback {
                Some(Feedback::Success) => SUCCESS_PATTERN.to_vec(),
                Some(Feedback::Error) => ERROR_PATTERN.to_vec(),
                None => vibration_waveform(&source.timings(&settings)?),
            };
            println!("{}", serde_json::to_string(&pattern)?);
            Ok(())
        }
        Command::Wav { output, source } => export_wav(&settings, &source, &output),
        Command::History(command) => history(&settings, command),
        Command::Learn(command) => learn(&settings, command),
        Command::Game(command) => game(command),
        Command::Settings(command) => {
            let path = Settings::config_path().context("No config directory on this system")?;
            settings_command(command, &path)
        }
        Command::Devices => list_devices(),
    }
}

#[cfg(feature = "audio")]
fn list_devices() -> Result<()> {
    for device in morse_trainer::playback::AudioEngineHandle::list_output_devices() {
        let marker = if device.is_default { "*" } else { " " };
        println!("{} {}", marker, device.name);
    }
    Ok(())
}

#[cfg(not(feature = "audio"))]
fn list_devices() -> Result<()> {
    bail!("Built without audio support; rebuild with --features audio")
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn ensure_positive(value: f32, name: &str) -> Result<f32> {
    if !(value.is_finite() && value > 0.0) {
        bail!("{} must be positive, got {}", name, value);
    }
    Ok(value)
}

/// Apply the global flags for this run only; they are never saved
fn apply_overrides(settings: &mut Settings, cli: &Cli) -> Result<()> {
    if let Some(speed) = cli.speed {
        settings.playback_speed = ensure_positive(speed, "Speed")?;
    }
    if let Some(wpm) = cli.wpm {
        settings.playback_speed = speed_for_wpm(ensure_positive(wpm, "WPM")?);
    }
    if let Some(volume) = cli.volume {
        settings.volume = volume.clamp(0.0, 1.0);
    }
    if let Some(frequency) = cli.frequency {
        settings.tone_frequency = ensure_positive(frequency, "Frequency")?;
    }
    Ok(())
}

fn open_history(settings: &Settings) -> Result<HistoryStore> {
    let dir = Settings::data_dir()?;
    Ok(HistoryStore::open(HistoryStore::default_path(&dir), settings.history_limit))
}

fn encode(settings: &Settings, args: &CipherArgs, save: bool, text: &str) -> Result<()> {
    let cipher = args.resolve(settings)?;
    let code = cipher::encrypt_and_encode(text, &cipher);
    println!("{}", code);

    if save {
        let record = open_history(settings)?.insert(NewTranslation {
            original_text: text.to_string(),
            morse_code: code,
            direction: Direction::TextToMorse,
            cipher,
        })?;
        eprintln!("Saved as #{}", record.id);
    }
    Ok(())
}

fn decode(settings: &Settings, args: &CipherArgs, save: bool, code: &str) -> Result<()> {
    if !is_valid_morse(code) {
        bail!("'{}' is not valid Morse code", code);
    }
    let cipher = args.resolve(settings)?;
    let text = cipher::decode_and_decrypt(code, &cipher);
    println!("{}", text);

    if save {
        let record = open_history(settings)?.insert(NewTranslation {
            original_text: text,
            morse_code: code.to_string(),
            direction: Direction::MorseToText,
            cipher,
        })?;
        eprintln!("Saved as #{}", record.id);
    }
    Ok(())
}

fn print_timing(settings: &Settings, source: &SourceArgs) -> Result<()> {
    let timings = source.timings(settings)?;
    for timing in &timings {
        let state = if timing.kind.is_keyed() { "on " } else { "off" };
        println!("{} {:>5} ms  {:?}", state, timing.duration_ms, timing.kind);
    }
    println!(
        "total {} ms at {:.1} WPM",
        total_duration_ms(&timings),
        wpm_for_speed(settings.playback_speed)
    );
    Ok(())
}

/// Play on a background player, drawing progress until it finishes
fn run_player<S>(player: &Player<S>, timings: Vec<MorseTiming>, show_progress: bool) -> bool
where
    S: KeySink + Clone + Send + 'static,
{
    let progress = player.play(timings);
    if show_progress {
        while !progress.is_finished() {
            eprint!("\r{:>3}%", (progress.fraction() * 100.0) as u32);
            thread::sleep(Duration::from_millis(100));
        }
        eprintln!("\r100%");
    }
    player.wait()
}

#[cfg(feature = "audio")]
fn play_tone(settings: &Settings, timings: Vec<MorseTiming>) -> Result<()> {
    use morse_trainer::playback::AudioEngineHandle;

    let engine = AudioEngineHandle::new(settings.tone_frequency, settings.volume);
    engine
        .start(settings.output_device.clone())
        .context("Failed to open audio output")?;

    let player = Player::new(engine.key());
    run_player(&player, timings, true);
    engine.stop()?;
    Ok(())
}

#[cfg(not(feature = "audio"))]
fn play_tone(_settings: &Settings, timings: Vec<MorseTiming>) -> Result<()> {
    tracing::warn!("Built without audio support, flashing instead");
    flash(timings)
}

fn flash(timings: Vec<MorseTiming>) -> Result<()> {
    let player = Player::new(ConsoleLamp);
    run_player(&player, timings, false);
    println!();
    Ok(())
}

fn export_wav(settings: &Settings, source: &SourceArgs, output: &Path) -> Result<()> {
    let timings = source.timings(settings)?;
    let mut generator = SidetoneGenerator::new(
        settings.tone_frequency,
        settings.volume,
        settings.sample_rate as f32,
    );
    let samples = generator.render(&timings);
    write_wav(output, &samples, generator.sample_rate() as u32)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Wrote {} ms of audio to {}", total_duration_ms(&timings), output.display());
    Ok(())
}

fn print_record(record: &TranslationRecord) {
    let star = if record.is_favorite { "*" } else { " " };
    let arrow = match record.direction {
        Direction::TextToMorse => "->",
        Direction::MorseToText => "<-",
    };
    let cipher = match record.cipher {
        CipherKind::None => String::new(),
        kind => format!("  [{}]", kind),
    };
    println!(
        "{:>4} {} {} {} {}{}",
        record.id, star, record.original_text, arrow, record.morse_code, cipher
    );
}

fn history(settings: &Settings, command: HistoryCommand) -> Result<()> {
    let mut store = open_history(settings)?;
    match command {
        HistoryCommand::List { limit } => store.all().into_iter().take(limit).for_each(print_record),
        HistoryCommand::Favorites => store.favorites().into_iter().for_each(print_record),
        HistoryCommand::Search { query } => store.search(&query).into_iter().for_each(print_record),
        HistoryCommand::Favorite { id } => store.set_favorite(id, true)?,
        HistoryCommand::Unfavorite { id } => store.set_favorite(id, false)?,
        HistoryCommand::Delete { id } => {
            let removed = store.delete(id)?;
            println!("Deleted #{} ({})", removed.id, removed.original_text);
        }
        HistoryCommand::Clear => store.clear()?,
    }
    Ok(())
}

/// Print `label` and read one trimmed line. `None` on end of input.
fn prompt(label: &str) -> Result<Option<String>> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn open_progress() -> Result<ProgressStore> {
    let dir = Settings::data_dir()?;
    Ok(ProgressStore::open(ProgressStore::default_path(&dir)))
}

fn learn(settings: &Settings, command: LearnCommand) -> Result<()> {
    match command {
        LearnCommand::List { category } => {
            let categories = category.map_or(Category::ALL.to_vec(), |c| vec![c]);
            for category in categories {
                println!("{}", category);
                for c in learn::by_category(category) {
                    println!("  {}  {}", c.symbol, c.code);
                }
            }
        }
        LearnCommand::Show { symbol, silent } => {
            let character = learn::catalog()
                .into_iter()
                .find(|c| c.symbol == symbol.to_ascii_uppercase())
                .with_context(|| format!("'{}' is not in the lessons", symbol))?;
            println!("{}  {}", character.symbol, character.code);
            if !silent {
                play_tone(settings, morse_timing(character.code, LESSON_SPEED))?;
            }
            open_progress()?.record(character.symbol, true, None)?;
        }
        LearnCommand::Quiz { category } => {
            let characters = category.map_or_else(learn::catalog, learn::by_category);
            run_quiz(Quiz::new(characters, &mut rand::thread_rng()))?;
        }
        LearnCommand::Progress => {
            let progress = open_progress()?;
            println!("Learned {} of {}", progress.learned_count(), learn::catalog().len());
            for entry in progress.all() {
                let accuracy = entry
                    .accuracy()
                    .map_or("-".to_string(), |a| format!("{:.0}%", a * 100.0));
                println!(
                    "  {}  viewed {:>3}  quiz {}/{} ({})",
                    entry.character, entry.times_learned, entry.quiz_score, entry.total_quiz_attempts, accuracy
                );
            }
        }
        LearnCommand::Reset => open_progress()?.reset()?,
    }
    Ok(())
}

fn run_quiz(mut quiz: Quiz) -> Result<()> {
    let mut progress = open_progress()?;
    println!("{} questions, enter q to stop", quiz.len());

    while let Some(current) = quiz.current().copied() {
        let label = format!("[{}/{}] {}  = ", quiz.position() + 1, quiz.len(), current.code);
        let Some(answer) = prompt(&label)? else { break };
        if answer.eq_ignore_ascii_case("q") {
            break;
        }

        let correct = quiz.submit(&answer);
        progress.record(current.symbol, false, Some(correct))?;
        if correct {
            println!("Correct");
        } else {
            println!("No, that was {}", current.symbol);
        }
        quiz.advance();
    }

    println!("Score {}/{}", quiz.score(), quiz.len());
    Ok(())
}

fn open_scores() -> Result<ScoreBoard> {
    let dir = Settings::data_dir()?;
    Ok(ScoreBoard::open(ScoreBoard::default_path(&dir)))
}

fn finish_game(result: GameResult) -> Result<()> {
    let mut board = open_scores()?;
    let best = board.high_score(result.game_type, result.difficulty);
    let saved = board.save(&result)?;
    println!("{} ({}): {} points in {} s", saved.game_type, saved.difficulty, saved.score, saved.duration_ms / 1000);
    if saved.score > best {
        println!("New high score!");
    }
    Ok(())
}

fn game(command: GameCommand) -> Result<()> {
    match command {
        GameCommand::Decoder { mode, difficulty } => {
            let game_type = GameType::from(mode);
            if game_type == GameType::MemoryMatch {
                bail!("Use `game memory` for Memory Match");
            }
            run_decoder(DecoderGame::new(game_type, difficulty, &mut rand::thread_rng()))
        }
        GameCommand::Memory { difficulty } => run_memory(MemoryGame::new(difficulty, &mut rand::thread_rng())),
        GameCommand::Scores { game, clear } => {
            let mut board = open_scores()?;
            if clear {
                return Ok(board.clear()?);
            }
            let games = game.map_or(
                vec![GameType::Decoder, GameType::SpeedChallenge, GameType::MemoryMatch, GameType::SosRescue],
                |g| vec![g.into()],
            );
            for game_type in games {
                println!("{}", game_type);
                for score in board.top_scores(game_type) {
                    println!("  {:>4}  {}", score.score, score.difficulty);
                }
            }
            Ok(())
        }
    }
}

fn run_decoder(mut game: DecoderGame) -> Result<()> {
    println!(
        "{}: {} questions, {} s each",
        game.game_type(),
        game.total_questions(),
        game.difficulty().time_limit().as_secs()
    );

    while let Some(code) = game.current_code() {
        let started = Instant::now();
        let label = format!("[{}/{}] {}  = ", game.question_number(), game.total_questions(), code);
        let Some(answer) = prompt(&label)? else { return Ok(()) };

        match game.submit(&answer, started.elapsed()) {
            Some(Answer::Correct) => {
                tracing::debug!("Feedback vibration {:?}", SUCCESS_PATTERN);
                println!("Correct  (score {})", game.score());
            }
            Some(Answer::Wrong { expected }) => {
                tracing::debug!("Feedback vibration {:?}", ERROR_PATTERN);
                println!("Wrong, it was {}  (score {})", expected, game.score());
            }
            Some(Answer::TooSlow { expected }) => {
                tracing::debug!("Feedback vibration {:?}", ERROR_PATTERN);
                println!("Too slow, it was {}  (score {})", expected, game.score());
            }
            None => break,
        }
    }

    match game.result() {
        Some(result) => finish_game(result),
        None => Ok(()),
    }
}

fn print_board(game: &MemoryGame, shown: &[usize]) {
    for (index, card) in game.cards().iter().enumerate() {
        let face = if card.matched || shown.contains(&index) {
            match card.face {
                CardFace::Letter(c) => c.to_string(),
                CardFace::Code(code) => code.to_string(),
            }
        } else {
            "?".to_string()
        };
        print!("{:>2}:{:<6}", index, face);
        if index % 4 == 3 {
            println!();
        }
    }
}

fn run_memory(mut game: MemoryGame) -> Result<()> {
    println!("Pick two cards by number, q to stop");

    while !game.is_complete() {
        let shown: Vec<usize> = game.revealed().into_iter().collect();
        print_board(&game, &shown);

        let Some(answer) = prompt("card> ")? else { return Ok(()) };
        if answer.eq_ignore_ascii_case("q") {
            return Ok(());
        }
        let Ok(index) = answer.parse::<usize>() else {
            println!("Enter a card number");
            continue;
        };

        let first = game.revealed();
        match game.flip(index) {
            Flip::Revealed => {}
            Flip::Match => println!("Match!  (score {})", game.score()),
            Flip::Mismatch => {
                print_board(&game, &[first.unwrap_or(index), index]);
                println!("No match  (score {})", game.score());
            }
            Flip::Ignored => println!("Pick another card"),
        }
    }

    match game.result() {
        Some(result) => finish_game(result),
        None => Ok(()),
    }
}

/// Settings subcommands work on the stored file, never on the values
/// overridden by global flags
fn settings_command(command: SettingsCommand, path: &Path) -> Result<()> {
    match command {
        SettingsCommand::Show => {
            let settings = Settings::load_from(path);
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsCommand::Path => {
            println!("settings: {}", path.display());
            println!("data:     {}", Settings::data_dir()?.display());
        }
        SettingsCommand::Set { key, value } => {
            let mut settings = Settings::load_from(path);
            set_value(&mut settings, &key, &value)?;
            settings.save_to(path)?;
        }
    }
    Ok(())
}

fn set_value(settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    let invalid = || format!("Invalid value '{}' for {}", value, key);
    match key {
        "speed" | "playback_speed" => {
            settings.playback_speed = ensure_positive(value.parse().with_context(invalid)?, "Speed")?;
        }
        "wpm" => settings.playback_speed = speed_for_wpm(ensure_positive(value.parse().with_context(invalid)?, "WPM")?),
        "volume" => settings.volume = value.parse::<f32>().with_context(invalid)?.clamp(0.0, 1.0),
        "frequency" | "tone_frequency" => {
            settings.tone_frequency = ensure_positive(value.parse().with_context(invalid)?, "Frequency")?;
        }
        "sample_rate" => settings.sample_rate = value.parse().with_context(invalid)?,
        "shift" | "default_shift" => {
            let shift = value.parse().with_context(invalid)?;
            cipher::validate_shift(shift)?;
            settings.default_shift = shift;
        }
        "history_limit" => settings.history_limit = value.parse::<usize>().with_context(invalid)?.max(1),
        "device" | "output_device" => {
            settings.output_device = match value {
                "" | "default" | "none" => None,
                name => Some(name.to_string()),
            }
        }
        other => bail!("Unknown setting '{}'", other),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_settings_set_ignores_global_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        Settings::default().save_to(&path).unwrap();

        let cli = parse(&[
            "morse-trainer", "--wpm", "30", "--volume", "0.1", "settings", "set", "shift", "5",
        ]);
        let mut effective = Settings::load_from(&path);
        apply_overrides(&mut effective, &cli).unwrap();
        assert_eq!(effective.playback_speed, 2.5);

        let Command::Settings(command) = cli.command else {
            panic!("expected a settings command");
        };
        settings_command(command, &path).unwrap();

        let stored = Settings::load_from(&path);
        assert_eq!(stored.default_shift, 5);
        assert_eq!(stored.playback_speed, 1.0);
        assert_eq!(stored.volume, 1.0);
    }

    #[test]
    fn test_set_value_validates() {
        let mut settings = Settings::default();
        set_value(&mut settings, "wpm", "24").unwrap();
        assert_eq!(settings.playback_speed, 2.0);
        set_value(&mut settings, "device", "none").unwrap();
        assert_eq!(settings.output_device, None);

        assert!(set_value(&mut settings, "speed", "0").is_err());
        assert!(set_value(&mut settings, "shift", "26").is_err());
        assert!(set_value(&mut settings, "colour", "red").is_err());
        assert_eq!(settings.default_shift, 3);
    }

    #[test]
    fn test_non_positive_speed_flags_are_rejected() {
        for args in [
            &["morse-trainer", "--speed", "0", "timing", "."][..],
            &["morse-trainer", "--speed=-1", "timing", "."][..],
            &["morse-trainer", "--wpm", "0", "timing", "."][..],
            &["morse-trainer", "--frequency", "0", "timing", "."][..],
        ] {
            let mut settings = Settings::default();
            assert!(apply_overrides(&mut settings, &parse(args)).is_err(), "{:?}", args);
            assert_eq!(settings.playback_speed, 1.0);
        }
    }

    #[test]
    fn test_shift_key_out_of_range_is_rejected() {
        let args = CipherArgs { cipher: CipherKind::Shift, key: Some("30".to_string()) };
        assert!(args.resolve(&Settings::default()).is_err());

        let args = CipherArgs { cipher: CipherKind::Combined, key: Some("7".to_string()) };
        assert_eq!(args.resolve(&Settings::default()).unwrap(), Cipher::Combined(7));
    }
}
