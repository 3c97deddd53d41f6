// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use smartdub::app_config::{self, Config};
use smartdub::app_controller::{is_timeline_path, Collaborators, Controller};
use smartdub::file_utils::FileManager;
use smartdub::media::FfmpegTools;
use smartdub::providers::elevenlabs::ElevenLabs;
use smartdub::providers::openai::{transcript_path_for, OpenAIChat, OpenAITranscriber};
use smartdub::providers::FillerSuggester;
use smartdub::reconcile::Adjustment;
use smartdub::timeline::TimeFormat;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for TimeFormat to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTimeFormat {
    Dotted,
    Comma,
}

impl From<CliTimeFormat> for TimeFormat {
    fn from(format: CliTimeFormat) -> Self {
        match format {
            CliTimeFormat::Dotted => TimeFormat::Dotted,
            CliTimeFormat::Comma => TimeFormat::Comma,
        }
    }
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone)]
struct GlobalArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Timestamp style used when writing timelines
    #[arg(long, value_enum, global = true)]
    time_format: Option<CliTimeFormat>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge and split a timeline into narration-sized entries
    Reflow {
        /// Input timeline file
        input: PathBuf,

        /// Output file (defaults to <input>.reflowed.srt)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minimum words per entry
        #[arg(long)]
        min_words: Option<usize>,

        /// Maximum words per entry
        #[arg(long)]
        max_words: Option<usize>,
    },

    /// Fit an audio file to the duration of a timeline
    Reconcile {
        /// Audio file to adjust
        audio: PathBuf,

        /// Timeline whose span is the target duration
        timeline: PathBuf,

        /// Output audio file; stretched output gets a timestamp suffix
        output: PathBuf,
    },

    /// Show the copy-or-stretch decision for two durations (seconds)
    Plan {
        /// Audio duration in seconds
        audio_secs: f64,

        /// Target duration in seconds
        target_secs: f64,
    },

    /// Transcribe audio into a timeline
    Transcribe {
        /// Audio file
        audio: PathBuf,

        /// Output timeline (defaults to <audio>.srt)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// OpenAI API key
        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        openai_api_key: Option<String>,
    },

    /// Translate, reflow, synthesize and time-fit a timeline or an audio file
    Dub {
        /// Input timeline (.srt) or audio file; audio is transcribed first
        input: PathBuf,

        /// Directory for all produced files
        #[arg(short, long, default_value = "dub_output")]
        output_dir: PathBuf,

        /// Source language (ISO code or English name)
        #[arg(short, long)]
        source_language: Option<String>,

        /// Target language (ISO code or English name)
        #[arg(short, long)]
        target_language: Option<String>,

        /// Skip filler words for single-word entries
        #[arg(long)]
        no_fillers: bool,

        /// OpenAI API key
        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        openai_api_key: Option<String>,

        /// ElevenLabs API key
        #[arg(long, env = "ELEVEN_LABS_API_KEY", hide_env_values = true)]
        eleven_labs_api_key: Option<String>,
    },

    /// Reflow every timeline file in a directory
    Batch {
        /// Directory to scan (recursive)
        input_dir: PathBuf,

        /// Output directory (defaults to the input directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Force overwrite of existing output files
        #[arg(short, long)]
        force_overwrite: bool,
    },

    /// Generate shell completions for smartdub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// smartdub - subtitle reflow and narration timing
#[derive(Parser, Debug)]
#[command(name = "smartdub")]
#[command(version)]
#[command(about = "Reflow subtitles for narration and fit speech audio to their timeline")]
#[command(long_about = "smartdub merges fine-grained subtitles into narration-sized entries and fits
synthesized speech back onto the subtitle timeline.

EXAMPLES:
    smartdub reflow talk.srt                          # Write talk.reflowed.srt
    smartdub reflow talk.srt --max-words 10 -o out.srt
    smartdub reconcile speech.mp3 talk.srt fitted.mp3 # Stretch or copy to fit
    smartdub plan 11.0 10.0                           # Show the decision only
    smartdub transcribe talk.mp3                      # Write talk.srt
    smartdub dub talk.srt -s en -t es                 # Full dubbing pipeline
    smartdub dub talk.mp3 -s en -t es                 # Same, transcribing first
    smartdub batch ./subs -f                          # Reflow a whole directory
    smartdub completions bash > smartdub.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default
    one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "smartdub", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = &cli.global.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = load_or_create_config(&cli.global.config_path)?;

    if let Some(level) = &cli.global.log_level {
        config.log_level = level.clone().into();
    } else {
        log::set_max_level(config.log_level.to_level_filter());
    }
    if let Some(format) = &cli.global.time_format {
        config.time_format = format.clone().into();
    }

    run_command(cli.command, config).await
}

async fn run_command(command: Commands, mut config: Config) -> Result<()> {
    match command {
        Commands::Reflow { input, output, min_words, max_words } => {
            if let Some(min_words) = min_words {
                config.reflow.min_words = min_words;
            }
            if let Some(max_words) = max_words {
                config.reflow.max_words = max_words;
            }

            let controller = Controller::with_config(config)?;
            let output = output.unwrap_or_else(|| sibling_output(&input, "reflowed", "srt"));
            controller.reflow_file(&input, &output)?;
            info!("Success: {}", output.display());
        }

        Commands::Reconcile { audio, timeline, output } => {
            let controller = Controller::with_config(config)?;
            let media = FfmpegTools::new(&controller.config().media);
            let outcome = controller.reconcile(media, &audio, &timeline, &output).await?;
            info!("Success: {}", outcome.output.display());
        }

        Commands::Plan { audio_secs, target_secs } => {
            let controller = Controller::with_config(config)?;
            match controller.plan(audio_secs, target_secs)? {
                Adjustment::Copy => println!("copy (factor {:.4})", audio_secs / target_secs),
                Adjustment::Stretch(plan) => println!(
                    "stretch (raw factor {:.4}, applied {:.4}, stages {:?})",
                    plan.raw_factor, plan.factor, plan.stages
                ),
            }
        }

        Commands::Transcribe { audio, output, openai_api_key } => {
            if let Some(key) = openai_api_key {
                config.transcription.api_key = key;
            }
            config.validate_for_transcription()?;

            let controller = Controller::with_config(config)?;
            let transcriber = OpenAITranscriber::from_config(
                &controller.config().transcription,
                &controller.config().transcription_api_key(),
            );
            let output = output.unwrap_or_else(|| transcript_path_for(&audio));
            controller.transcribe(&transcriber, &audio, &output).await?;
            info!("Success: {}", output.display());
        }

        Commands::Dub {
            input,
            output_dir,
            source_language,
            target_language,
            no_fillers,
            openai_api_key,
            eleven_labs_api_key,
        } => {
            if let Some(lang) = source_language {
                config.source_language = lang;
            }
            if let Some(lang) = target_language {
                config.target_language = lang;
            }
            if no_fillers {
                config.translation.add_fillers = false;
            }
            if let Some(key) = openai_api_key {
                config.translation.api_key = key;
            }
            if let Some(key) = eleven_labs_api_key {
                config.speech.api_key = key;
            }
            config.validate_for_translation()?;
            config.validate_for_speech()?;

            let controller = Controller::with_config(config)?;
            let chat = Arc::new(OpenAIChat::from_config(&controller.config().translation));
            let collaborators = Collaborators {
                translator: chat.clone(),
                filler: Some(chat as Arc<dyn FillerSuggester>),
                speech: Arc::new(ElevenLabs::from_config(&controller.config().speech)),
            };
            let media = FfmpegTools::new(&controller.config().media);

            let artifacts = if is_timeline_path(&input) {
                controller.run_pipeline(&collaborators, media, &input, &output_dir).await?
            } else {
                controller.config().validate_for_transcription()?;
                let transcriber = OpenAITranscriber::from_config(
                    &controller.config().transcription,
                    &controller.config().transcription_api_key(),
                );
                controller
                    .run_pipeline_from_audio(&collaborators, &transcriber, media, &input, &output_dir)
                    .await?
            };

            if let Some(transcript) = &artifacts.transcript {
                info!("Transcript: {}", transcript.display());
            }

            info!("Translated subtitles: {}", artifacts.reflowed.display());
            info!("Generated audio: {}", artifacts.audio.display());
            match &artifacts.adjusted {
                Some(outcome) => info!("Timing-adjusted audio: {}", outcome.output.display()),
                None => warn!("Audio was not adjusted; see errors above"),
            }
        }

        Commands::Batch { input_dir, output_dir, force_overwrite } => {
            let controller = Controller::with_config(config)?;
            let output_dir = output_dir.unwrap_or_else(|| input_dir.clone());
            let summary = controller.run_folder(&input_dir, &output_dir, force_overwrite)?;
            if summary.failed > 0 {
                return Err(anyhow!("{} file(s) failed to reflow", summary.failed));
            }
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}

// <dir>/<stem>.<suffix>.<ext> next to the input
fn sibling_output(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let dir = input.parent().unwrap_or(Path::new("."));
    FileManager::generate_output_path(input, dir, suffix, extension)
}

fn load_or_create_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?;
        Ok(config)
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        FileManager::write_to_file(config_path, &config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        Ok(config)
    }
}
