//! CLI interface for learn-unknown

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{self, Config};
use crate::console::ConsoleHost;
use crate::dialog::DialogRenderer;
use crate::learning::LearnOutcome;
use crate::normalize::{Normalizer, TextNormalizer};
use crate::settings::JsonSettings;
use crate::skill::LearnUnknownSkill;
use crate::types::Message;

#[derive(Parser)]
#[command(name = "learn-unknown")]
#[command(
    about = "Learn answers for utterances the assistant did not understand",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Config file (default: platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Language code (default: from config)
    #[arg(short, long, global = true)]
    lang: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Talk to the skill: learned intents answer, everything else is recorded
    Chat,
    /// Record an utterance as not understood
    Fallback {
        /// The utterance, as heard
        utterance: String,
    },
    /// Ask for an answer to one recorded utterance
    Learn,
    /// Store an answer for an utterance directly
    Teach {
        /// The utterance to answer
        utterance: String,
        /// The answer to give
        answer: String,
    },
    /// Write intent and dialog files for answered utterances
    Materialize,
    /// Show recorded utterances and their answers
    List {
        /// Only utterances still waiting for answers
        #[arg(short, long)]
        pending: bool,
    },
    /// Show the active configuration
    Config {
        /// Print the config file path only
        #[arg(long)]
        path: bool,
    },
}

/// Skill wired to a console host
struct Session {
    skill: LearnUnknownSkill,
    host: Arc<ConsoleHost>,
    normalizer: TextNormalizer,
}

impl Session {
    fn open(config: &Config) -> Result<Self> {
        let settings = Arc::new(JsonSettings::new(config.skill.settings_path()));
        let renderer = DialogRenderer::new(config.skill.dialog_dir(), &config.skill.lang);
        let host = Arc::new(ConsoleHost::new(renderer));

        let skill = LearnUnknownSkill::new(config, settings, host.clone())
            .context("Failed to load the utterance store")?;
        skill.initialize().context("Failed to initialize learned intents")?;

        Ok(Self {
            skill,
            host,
            normalizer: TextNormalizer::new(),
        })
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::config_path()?,
    };
    let mut config = Config::load_from(&config_path)?;
    if let Some(lang) = &cli.lang {
        config.skill.lang = lang.clone();
    }

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => chat(&config)?,
        Commands::Fallback { utterance } => {
            let session = Session::open(&config)?;
            session.skill.handle_fallback(&Message::new(utterance).with_lang(&config.skill.lang))?;
            println!("Recorded.");
        }
        Commands::Learn => {
            let session = Session::open(&config)?;
            print_outcome(&session.skill.handle_learn(None)?);
        }
        Commands::Teach { utterance, answer } => {
            let session = Session::open(&config)?;
            session.skill.teach(&utterance, &answer, None)?;
            let normalized = session.normalizer.normalize(&utterance, &config.skill.lang);
            println!("Learned an answer for '{}'.", normalized);
        }
        Commands::Materialize => {
            // Opening the session runs materialization
            let session = Session::open(&config)?;
            let intents = session.skill.learned_intents();
            println!("{} learned intent(s) in {}", intents.len(), config.skill.skill_dir.display());
            for intent in intents {
                println!("  {}", intent.name());
            }
        }
        Commands::List { pending } => list(&config, pending)?,
        Commands::Config { path } => {
            if path {
                println!("{}", config_path.display());
            } else {
                let contents = toml::to_string_pretty(&config)
                    .context("Failed to serialize config")?;
                print!("{}", contents);
            }
        }
    }

    Ok(())
}

fn chat(config: &Config) -> Result<()> {
    let session = Session::open(config)?;

    println!("learn-unknown v{} ({})", crate::VERSION, config.skill.lang);
    println!("Type an utterance. '/learn' answers a recorded one, '/quit' exits.\n");

    while let Some(line) = session.host.read_line("> ") {
        match line.as_str() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/learn" => print_outcome(&session.skill.handle_learn(None)?),
            text => {
                let normalized = session.normalizer.normalize(text, &config.skill.lang);
                if let Some(intent) = session.host.match_intent(&normalized) {
                    session.skill.dispatch(&intent);
                    continue;
                }

                let message = Message::new(text).with_lang(&config.skill.lang);
                if session.host.run_fallbacks(&message).is_none() {
                    println!("I don't know how to answer that yet.");
                }
            }
        }
    }

    Ok(())
}

fn list(config: &Config, pending_only: bool) -> Result<()> {
    let session = Session::open(config)?;
    let threshold = config.learning.answer_threshold;
    let partition = session.skill.store().partition(&config.skill.lang);

    let mut shown = 0;
    for (utterance, answers) in &partition {
        if pending_only && answers.len() >= threshold {
            continue;
        }
        shown += 1;
        println!("{}", utterance);
        for answer in answers {
            println!("    - {}", answer);
        }
    }

    if shown == 0 {
        println!("No utterances recorded for {}.", config.skill.lang);
    }
    Ok(())
}

fn print_outcome(outcome: &LearnOutcome) {
    match outcome {
        LearnOutcome::Learned { utterance, answer } => {
            println!("Got it: '{}' → '{}'", utterance, answer)
        }
        LearnOutcome::NoResponse { utterance } => {
            println!("No answer for '{}'. I'll ask again later.", utterance)
        }
        LearnOutcome::NothingToLearn => println!("Nothing to learn right now."),
    }
}
