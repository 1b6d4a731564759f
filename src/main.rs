// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use course_localizer::app_config::{self, Config};
use course_localizer::app_controller::{Controller, LocalizeOptions};
use course_localizer::course::Version;

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

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate, narrate and assemble a course into target languages
    Localize(LocalizeArgs),

    /// Regenerate audio and video for artifacts edited since the previous version
    Review(ReviewArgs),

    /// Estimate the speech synthesis cost still pending for a language version
    EstimateCost(ReviewArgs),

    /// Generate shell completions for course-localizer
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct LocalizeArgs {
    /// Course root directory (defaults to course_root from the config)
    #[arg(short, long, value_name = "COURSE_DIR")]
    course: Option<PathBuf>,

    /// Source language code (defaults to course.yml, then the config)
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language codes, comma separated (e.g. 'fr,es,de')
    #[arg(short, long, value_delimiter = ',')]
    target_languages: Vec<String>,

    /// Source version to localize, e.g. v002 (defaults to the latest)
    #[arg(long)]
    version: Option<String>,

    /// Start a new target version instead of filling the latest one
    #[arg(long)]
    new_version: bool,
}

#[derive(Args, Debug)]
struct ReviewArgs {
    /// Course root directory (defaults to course_root from the config)
    #[arg(short, long, value_name = "COURSE_DIR")]
    course: Option<PathBuf>,

    /// Language code of the version to inspect
    #[arg(short, long)]
    language: String,

    /// Version to inspect, e.g. v002 (defaults to the latest)
    #[arg(long)]
    version: Option<String>,
}

/// course-localizer - Localize video courses with AI services
///
/// Translates slide decks and narration of a versioned course tree,
/// synthesizes narration in the target language and assembles chapter videos.
#[derive(Parser, Debug)]
#[command(name = "course-localizer")]
#[command(version)]
#[command(about = "AI-powered video course localization")]
#[command(long_about = "course-localizer translates the slide decks and narration of a course tree
(<course>/<language>/<vNNN>/<chapter>/...), synthesizes narration in each target
language and assembles one video per chapter. Existing artifacts are never redone.

EXAMPLES:
    course-localizer localize -c ./btc101 -t fr,es      # Localize into French and Spanish
    course-localizer localize -c ./btc101 -t de --new-version
    course-localizer review -c ./btc101 -l fr           # Redo audio/video for edited files
    course-localizer estimate-cost -c ./btc101 -l fr    # Pending synthesis cost
    course-localizer completions bash > course-localizer.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file does not exist,
    a default one is created. Empty API keys are read from the environment:
    API_KEY_ANTHROPIC, API_KEY_OPENAI and ELEVENLABS_API_KEY.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, global = true, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
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
        // Dependencies (reqwest, hyper) stay quiet below warnings
        metadata.level() <= self.level
            && (metadata.target().starts_with("course_localizer") || metadata.level() <= Level::Warn)
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
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
    // Trace here; the effective level is set through set_max_level once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "course-localizer", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    let controller = Controller::with_config(config)?;

    match cli.command {
        Commands::Localize(args) => run_localize(&controller, args).await,
        Commands::Review(args) => run_review(&controller, args).await,
        Commands::EstimateCost(args) => run_estimate_cost(&controller, args),
        Commands::Completions { .. } => Ok(()),
    }
}

// @loads: Config file (created when missing) with environment secrets and CLI level applied
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    if let Some(level) = &cli.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let (mut config, created) = Config::load_or_create(&cli.config_path)?;
    if created {
        warn!("Config file not found at '{}', created a default one.", cli.config_path);
    }

    match &cli.log_level {
        Some(level) => config.log_level = level.clone().into(),
        None => log::set_max_level(config.log_level.to_level_filter()),
    }

    Ok(config.with_secrets(|name| std::env::var(name).ok()))
}

fn parse_version(version: Option<String>) -> Result<Option<Version>> {
    version
        .map(|v| v.parse::<Version>().map_err(|e| anyhow!(e)))
        .transpose()
}

async fn run_localize(controller: &Controller, args: LocalizeArgs) -> Result<()> {
    let course_root = controller.course_root(args.course)?;
    let options = LocalizeOptions {
        source_language: args.source_language,
        target_languages: args.target_languages,
        source_version: parse_version(args.version)?,
        new_version: args.new_version,
    };

    let report = controller.localize(&course_root, options).await?;
    for language in &report.languages {
        info!("{} ({}): {}", language.language, language.version_dir.display(), language.counts);
        for failure in &language.failures {
            error!("  {}", failure);
        }
    }
    for (language, reason) in &report.aborted {
        error!("{} aborted: {}", language, reason);
    }

    if report.languages.is_empty() {
        return Err(anyhow!("No language could be localized"));
    }
    Ok(())
}

async fn run_review(controller: &Controller, args: ReviewArgs) -> Result<()> {
    let course_root = controller.course_root(args.course)?;
    let version = parse_version(args.version)?;
    let report = controller.review(&course_root, &args.language, version).await?;
    info!(
        "Review of {}: {} document(s) rasterized, {} audio file(s), {} video(s)",
        args.language, report.documents_rasterized, report.audio_synthesized, report.videos_assembled
    );
    for failure in &report.failures {
        error!("  {}", failure);
    }
    Ok(())
}

fn run_estimate_cost(controller: &Controller, args: ReviewArgs) -> Result<()> {
    let course_root = controller.course_root(args.course)?;
    let version = parse_version(args.version)?;
    let estimate = controller.estimate_cost(&course_root, &args.language, version)?;
    println!(
        "{} transcript(s) without audio, {} characters, estimated cost ${:.2}",
        estimate.transcripts, estimate.characters, estimate.cost
    );
    Ok(())
}
