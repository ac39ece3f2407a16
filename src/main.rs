mod shared;
mod tui;
mod audio_api;
mod audio;
mod config;
mod middle;
mod pipeline;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use crossterm::terminal;
use rand::rngs::StdRng;
use rand::SeedableRng;

use audio::{Category, SoundDefinition, SoundRegistry, Synth};
use config::Config;
use middle::Middle;
use pipeline::outline::{build_prompt, FileOutlineProvider, SongOutlineProvider};
use pipeline::{acquire_outline, compose, FallbackTable, NoteEvent, TransportStatus};
use tui::keymap::KeyMap;

// how long to keep the stream open after the last note so tails can decay
const RING_OUT: Duration = Duration::from_millis(2500);

#[derive(Parser)]
#[command(name = "dubboard", version, about = "Keyboard soundboard synth with a procedural song composer")]
struct Cli {
    /// Config file (default ./dubboard.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Master volume, 0.0 - 1.0
    #[arg(long, global = true)]
    volume: Option<f32>,

    /// Fixed composer seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List the built-in sounds
    Sounds {
        /// bass, wobble, drums, synth or fx
        #[arg(long)]
        category: Option<String>,
    },
    /// Play sounds one after another
    Play {
        #[arg(required = true)]
        ids: Vec<String>,
        /// Time between sounds
        #[arg(long, default_value_t = 250)]
        gap_ms: u64,
    },
    /// Interactive keyboard (the default)
    Keys,
    /// Generate a song and print it as JSON
    Compose { style: Option<String> },
    /// Generate a song and play it
    Song { style: Option<String> },
    /// Print the outline request for a style
    Prompt { style: Option<String> },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Keys);

    // keep the keyboard screen quiet unless asked
    let default_filter = if matches!(command, Command::Keys) { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load(&config_path)?;
    if let Some(v) = cli.volume {
        config.volume = v.clamp(0.0, 1.0);
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let registry = Arc::new(SoundRegistry::builtin());

    match command {
        Command::Sounds { category } => list_sounds(&registry, category.as_deref()),
        Command::Prompt { style } => {
            println!("{}", build_prompt(style.as_deref().unwrap_or(&config.style)));
            Ok(())
        }
        Command::Compose { style } => {
            let style = style.unwrap_or_else(|| config.style.clone());
            let provider = outline_provider(&config);
            let (structure, source) = acquire_outline(provider.as_ref(), &style);
            let song = compose(&structure, &mut composer_rng(&config));
            tracing::info!(?source, notes = song.notes.len(), "composed");
            println!("{}", serde_json::to_string_pretty(&song)?);
            Ok(())
        }
        Command::Play { ids, gap_ms } => {
            let (_audio, mut board) = open_board(&config, &registry)?;
            let events: Vec<NoteEvent> = ids
                .iter()
                .enumerate()
                .map(|(i, id)| NoteEvent::new(id, (i as u64 * gap_ms) as f64))
                .collect();
            board.start_playback(&events, Instant::now())?;
            drive_until_idle(&mut board, Duration::from_millis(config.tick_ms));
            Ok(())
        }
        Command::Song { style } => {
            let style = style.unwrap_or_else(|| config.style.clone());
            let (_audio, mut board) = open_board(&config, &registry)?;
            let (song, _) = board.generate_song(&style);
            println!("{} ({} bpm, {:.1}s)", song.description, song.bpm, song.total_duration_ms / 1000.0);
            board.play_song(Instant::now())?;
            drive_until_idle(&mut board, Duration::from_millis(config.tick_ms));
            Ok(())
        }
        Command::Keys => {
            let (_audio, board) = open_board(&config, &registry)?;
            run_keys(board, &registry, Duration::from_millis(config.tick_ms))
        }
    }
}

fn list_sounds(registry: &SoundRegistry, category: Option<&str>) -> anyhow::Result<()> {
    let filter = match category {
        Some(name) => Some(Category::parse(name).with_context(|| format!("unknown category {name:?}"))?),
        None => None,
    };
    let defs: Vec<&SoundDefinition> = match filter {
        Some(c) => registry.in_category(c).collect(),
        None => registry.ids().filter_map(|id| registry.lookup(id)).collect(),
    };
    let keys = KeyMap::new(registry);
    for def in defs {
        let key = keys.key_for(def.id).unwrap_or(' ');
        let freq = def.base_frequency.map_or("-".to_string(), |f| format!("{f} Hz"));
        println!("{key}  {:<8} {:<8} {:<8} {freq}", def.id, format!("{:?}", def.category), format!("{:?}", def.voice));
    }
    Ok(())
}

fn outline_provider(config: &Config) -> Box<dyn SongOutlineProvider> {
    match &config.outline_dir {
        Some(dir) => Box::new(FileOutlineProvider::new(dir)),
        None => Box::new(FallbackTable),
    }
}

fn composer_rng(config: &Config) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

// the audio handle must outlive the board or the stream stops
fn open_board(config: &Config, registry: &Arc<SoundRegistry>) -> anyhow::Result<(audio::AudioHandle, Middle<Synth>)> {
    let audio = audio::start_audio(config.volume, config.command_capacity)?;
    let board = Middle::new(
        audio.synth(registry.clone()),
        audio.bus().clone(),
        outline_provider(config),
        composer_rng(config),
    );
    Ok((audio, board))
}

fn drive_until_idle(board: &mut Middle<Synth>, tick: Duration) {
    while board.status() == TransportStatus::Playing {
        let now = Instant::now();
        board.tick(now);
        let wait = board.next_deadline().map_or(tick, |d| d.saturating_duration_since(now).min(tick));
        std::thread::sleep(wait);
    }
    std::thread::sleep(RING_OUT);
}

fn run_keys(mut board: Middle<Synth>, registry: &SoundRegistry, tick: Duration) -> anyhow::Result<()> {
    let keys = KeyMap::new(registry);
    terminal::enable_raw_mode()?;
    // Enable keyboard enhancement for real press/release detection.
    // Falls back gracefully if the terminal doesn't support it.
    let _ = crossterm::execute!(
        std::io::stdout(),
        crossterm::event::PushKeyboardEnhancementFlags(
            crossterm::event::KeyboardEnhancementFlags::REPORT_EVENT_TYPES
        )
    );
    let _guard = RawModeGuard; // auto drops when out of scope

    let mut out = std::io::stdout();
    write!(out, "{}", tui::status::help_text(&keys))?;

    loop {
        tui::status::draw(&mut out, &board.status_line(Instant::now()))?;

        // wake early when a scheduled note is due
        let timeout = board
            .next_deadline()
            .map_or(tick, |d| d.saturating_duration_since(Instant::now()).min(tick));
        for event in tui::input::poll_input(timeout, &keys)? {
            if !board.handle_input(event, Instant::now()) {
                write!(out, "\r\n")?;
                return Ok(());
            }
        }
        board.tick(Instant::now());
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::event::PopKeyboardEnhancementFlags
        );
        let _ = terminal::disable_raw_mode();
    }
}
