//! Application entry point — Language Coach terminal front-end.
//!
//! # Startup sequence
//!
//! 1. Parse the command line.
//! 2. Initialise logging (`-v` raises the default filter to `debug`).
//! 3. Load [`AppConfig`] from disk (defaults on first run).
//! 4. Build the gateway and spawn the [`Dispatcher`] worker.
//! 5. Run the chosen command until stdin closes or the learner quits.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;

use language_coach::{
    config::{AppConfig, AppPaths},
    dispatch::Dispatcher,
    gateway,
    llm::{Coach, CoachError, CoachFeature, PromptBuilder},
    pipeline::{ConversationEvent, ConversationPipeline, ConversationUpdate},
    quiz::{QuizEngine, OPTION_COUNT},
    speech::{ConsoleSynthesizer, TypedInputRecognizer},
};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "language-coach")]
#[command(author, version, about = "Practise a language with an AI conversation coach")]
struct Cli {
    /// Settings file to use instead of the default location
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Conversation practice: each line you type is corrected and answered
    Chat,
    /// Multiple-choice quiz (answer A-D or 1-4, `r` restarts, `q` quits)
    Quiz,
    /// Grammar, clarity and tone feedback on a passage
    Analyze { text: Vec<String> },
    /// Correct a passage and list the changes
    Correct { text: Vec<String> },
    /// Definition, synonyms and examples for a word
    Word { word: Vec<String> },
    /// Write the default settings file if missing and print its path
    Config,
}

type StdinLines = Lines<BufReader<Stdin>>;

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Logging
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let settings_file = AppPaths::resolve(cli.config.as_deref()).settings_file;

    if let Command::Config = cli.command {
        return write_default_config(&settings_file);
    }

    // 2. Configuration
    let config = match AppConfig::load_from(&settings_file) {
        Ok(config) => config,
        // An explicitly requested file must load.
        Err(e) if cli.config.is_some() => {
            return Err(e).with_context(|| format!("failed to load {}", settings_file.display()));
        }
        Err(e) => {
            log::warn!("Failed to load config ({e}); using defaults");
            AppConfig::default()
        }
    };

    // 3. Gateway + dispatcher
    let dispatcher = Dispatcher::spawn(gateway::from_config(&config.gateway), &config.dispatcher);
    let prompts = PromptBuilder::new(&config.coach.target_language);
    log::info!(
        "Language Coach starting ({:?} gateway, practising {})",
        config.gateway.mode,
        prompts.language()
    );

    match cli.command {
        Command::Chat => run_chat(dispatcher, prompts).await,
        Command::Quiz => run_quiz(QuizEngine::from_config(dispatcher, prompts, &config.quiz)).await,
        Command::Analyze { text } => {
            run_coach(Coach::new(dispatcher, prompts), CoachFeature::SpeechAnalysis, &text).await
        }
        Command::Correct { text } => {
            run_coach(Coach::new(dispatcher, prompts), CoachFeature::TextCorrection, &text).await
        }
        Command::Word { word } => {
            run_coach(Coach::new(dispatcher, prompts), CoachFeature::WordInsights, &word).await
        }
        Command::Config => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn write_default_config(path: &std::path::Path) -> anyhow::Result<()> {
    if !path.exists() {
        AppConfig::default().save_to(path)?;
        log::info!("Wrote default settings");
    }
    println!("{}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// chat
// ---------------------------------------------------------------------------

async fn run_chat(dispatcher: Dispatcher, prompts: PromptBuilder) -> anyhow::Result<()> {
    let (event_tx, event_rx) = mpsc::channel::<ConversationEvent>(16);
    let (update_tx, mut update_rx) = mpsc::unbounded_channel::<ConversationUpdate>();

    let pipeline = ConversationPipeline::new(
        dispatcher,
        prompts,
        Arc::new(TypedInputRecognizer::new()),
        Arc::new(ConsoleSynthesizer::default()),
    )
    .with_updates(update_tx);

    let pipeline_task = tokio::spawn(pipeline.run(event_rx));
    let printer_task = tokio::spawn(async move {
        while let Some(update) = update_rx.recv().await {
            print_update(update);
        }
    });

    println!("Type a sentence and press Enter. /stop pauses, /start resumes, /quit exits.");
    event_tx.send(ConversationEvent::Start).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let event = match line.trim() {
            "" => continue,
            "/quit" => break,
            "/stop" => ConversationEvent::Stop,
            "/start" => ConversationEvent::Start,
            text => ConversationEvent::Typed(text.to_string()),
        };
        if event_tx.send(event).await.is_err() {
            break;
        }
    }

    drop(event_tx);
    pipeline_task.await?;
    printer_task.await?;
    Ok(())
}

fn print_update(update: ConversationUpdate) {
    match update {
        ConversationUpdate::Stage(stage) if stage.is_busy() => {
            log::debug!("{}…", stage.label());
        }
        ConversationUpdate::Stage(_) => {}
        ConversationUpdate::Turn(turn) => {
            println!("Corrected: {}", turn.corrected);
            if let Some(suggestion) = turn.suggestion {
                println!("Try saying: {suggestion}");
            }
        }
        ConversationUpdate::Error(message) => println!("Error: {message}"),
        ConversationUpdate::Discarded(text) => {
            println!("(still working on the last sentence; ignored \"{text}\")");
        }
    }
}

// ---------------------------------------------------------------------------
// quiz
// ---------------------------------------------------------------------------

const LETTERS: [char; OPTION_COUNT] = ['A', 'B', 'C', 'D'];

enum QuizInput {
    Answer(usize),
    Restart,
    Quit,
}

fn parse_quiz_input(input: &str) -> Option<QuizInput> {
    let input = input.trim();
    let mut chars = input.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return None;
    };
    match c.to_ascii_uppercase() {
        'Q' => Some(QuizInput::Quit),
        'R' => Some(QuizInput::Restart),
        'A'..='D' => Some(QuizInput::Answer(c.to_ascii_uppercase() as usize - 'A' as usize)),
        '1'..='4' => Some(QuizInput::Answer(c as usize - '1' as usize)),
        _ => None,
    }
}

async fn run_quiz(mut engine: QuizEngine) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    'questions: loop {
        let question = engine.advance().await;
        println!();
        println!("Question: {}", question.text());
        for (letter, option) in LETTERS.iter().zip(question.options()) {
            println!("  {letter}) {option}");
        }

        loop {
            print!("Your answer: ");
            std::io::stdout().flush()?;

            let Some(line) = read_line(&mut lines).await? else {
                break 'questions;
            };
            match parse_quiz_input(&line) {
                Some(QuizInput::Quit) => break 'questions,
                Some(QuizInput::Restart) => {
                    engine.restart();
                    println!("Score reset.");
                    continue 'questions;
                }
                Some(QuizInput::Answer(index)) => match engine.submit_answer(index) {
                    Ok(outcome) => {
                        if outcome.correct {
                            println!("Correct!");
                        } else {
                            println!("Not quite. The answer was {}.", LETTERS[outcome.correct_index]);
                        }
                        if let Some(explanation) = outcome.explanation {
                            println!("{explanation}");
                        }
                        println!("Score: {}", outcome.score);
                        break;
                    }
                    Err(e) => println!("{e}"),
                },
                None => println!("Answer with A-D or 1-4 (r restarts, q quits)."),
            }
        }
    }

    println!("Final score: {}", engine.score());
    Ok(())
}

async fn read_line(lines: &mut StdinLines) -> anyhow::Result<Option<String>> {
    Ok(lines.next_line().await?)
}

// ---------------------------------------------------------------------------
// coach features
// ---------------------------------------------------------------------------

async fn run_coach(coach: Coach, feature: CoachFeature, words: &[String]) -> anyhow::Result<()> {
    let input = words.join(" ");
    let result = match feature {
        CoachFeature::SpeechAnalysis => coach.analyze_speech(&input).await,
        CoachFeature::TextCorrection => coach.correct_text(&input).await,
        CoachFeature::WordInsights => coach.explain_word(&input).await,
    };

    match result {
        Ok(feedback) => {
            println!("{}", feature.title());
            println!("{feedback}");
        }
        Err(e @ CoachError::EmptyInput(_)) => println!("{e}"),
        Err(e) => {
            log::error!("{feature:?} failed: {e:?}");
            println!("{e}");
        }
    }
    Ok(())
}
