//! tonetext CLI - play note/chord text from the command line or a watched file.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tonetext::{
    poll_interval, ConsoleDevice, FileWatcher, NotationTable, PlaybackConfig, RawConfig,
    RecordingDevice, Scheduler, SessionOutcome, SoundDevice, StatusEvent, SymbolKind, ToneError,
};
use tracing::{info, warn, Level};

/// How often `watch` prints pending status lines while waiting for changes.
const STATUS_REFRESH: Duration = Duration::from_millis(100);

/// tonetext - play note and chord symbols
#[derive(Parser)]
#[command(name = "tonetext")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log every token and device call
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play symbols, e.g. `tonetext play q w e r` or `tonetext play "1 3 5"`
    Play {
        /// Symbols to play (joined with spaces)
        #[arg(required = true)]
        text: Vec<String>,

        #[command(flatten)]
        playback: PlaybackArgs,

        /// Do not print device commands live; dump them as YAML when done
        #[arg(long)]
        dry_run: bool,
    },

    /// List every symbol and the pitches it plays
    Keys,

    /// Play a file's contents each time it changes
    Watch {
        /// File to watch
        file: PathBuf,

        /// Seconds between checks of the file
        #[arg(long, default_value_t = 1.0)]
        interval: f64,

        #[command(flatten)]
        playback: PlaybackArgs,
    },
}

#[derive(Args)]
struct PlaybackArgs {
    /// Seconds each note or chord sounds (0.1 - 1.5)
    #[arg(long)]
    hold: Option<f64>,

    /// Seconds of silence between symbols (0.0 - 0.5)
    #[arg(long)]
    gap: Option<f64>,

    /// Note velocity (0 - 127)
    #[arg(long)]
    velocity: Option<i64>,

    /// General MIDI program number (0 - 127)
    #[arg(long)]
    instrument: Option<i64>,

    /// YAML config file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
}

impl PlaybackArgs {
    fn resolve(&self) -> Result<PlaybackConfig, ToneError> {
        let mut config = match &self.config {
            Some(path) => PlaybackConfig::load(path)?,
            None => PlaybackConfig::default(),
        };
        config.apply(&RawConfig {
            hold: self.hold,
            gap: self.gap,
            velocity: self.velocity,
            instrument: self.instrument,
            release_on_failure: None,
        })?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = match cli.command {
        Commands::Play {
            text,
            playback,
            dry_run,
        } => run_play(&text.join(" "), &playback, dry_run),
        Commands::Keys => {
            print_keys();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Watch {
            file,
            interval,
            playback,
        } => run_watch(file, interval, &playback),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn new_scheduler<D: SoundDevice + 'static>(
    device: D,
    config: &PlaybackConfig,
) -> Result<(Scheduler, flume::Receiver<StatusEvent>), ToneError> {
    let (scheduler, events) = Scheduler::with_channel(NotationTable::standard(), device);
    scheduler.set_instrument(config.instrument())?;
    Ok((scheduler, events))
}

fn run_play(text: &str, args: &PlaybackArgs, dry_run: bool) -> Result<ExitCode, ToneError> {
    let config = args.resolve()?;

    let outcome = if dry_run {
        let device = RecordingDevice::new();
        let log = device.log();
        let (scheduler, events) = new_scheduler(device, &config)?;
        let outcome = play_to_end(&scheduler, &events, text, &config)?;
        let yaml = serde_yaml::to_string(&log.commands())
            .map_err(|e| ToneError::ConfigFile(e.to_string()))?;
        print!("{}", yaml);
        outcome
    } else {
        let (scheduler, events) = new_scheduler(ConsoleDevice::new(std::io::stdout()), &config)?;
        play_to_end(&scheduler, &events, text, &config)?
    };

    Ok(match outcome {
        Some(SessionOutcome::Failed { .. }) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

fn play_to_end(
    scheduler: &Scheduler,
    events: &flume::Receiver<StatusEvent>,
    text: &str,
    config: &PlaybackConfig,
) -> Result<Option<SessionOutcome>, ToneError> {
    scheduler.play_text(text, config)?;
    while let Ok(event) = events.recv() {
        eprintln!("status: {}", event);
        if event.is_terminal() {
            break;
        }
    }
    Ok(scheduler.wait())
}

fn print_keys() {
    let table = NotationTable::standard();
    for (symbol, pitches) in table.entries() {
        let kind = match table.kind(symbol) {
            Some(SymbolKind::Chord) => "chord",
            _ => "note",
        };
        let list: Vec<String> = pitches.pitches().iter().map(|p| p.to_string()).collect();
        println!("{:<3} {:<6} {}", symbol, kind, list.join(" "));
    }
}

fn run_watch(file: PathBuf, interval: f64, args: &PlaybackArgs) -> Result<ExitCode, ToneError> {
    let interval = poll_interval(interval)?;
    let config = args.resolve()?;
    let (scheduler, events) = new_scheduler(ConsoleDevice::new(std::io::stdout()), &config)?;
    let mut watcher = FileWatcher::new(&file, interval)?;

    info!(file = %file.display(), "watching for note text");
    loop {
        if let Some(text) = watcher.next_text(STATUS_REFRESH)? {
            // new text replaces whatever is playing
            scheduler.cancel();
            scheduler.wait();
            if let Err(e) = scheduler.play_text(&text, &config) {
                warn!(error = %e, "could not start playback");
            }
        }
        for event in events.try_iter() {
            eprintln!("status: {}", event);
        }
    }
}
