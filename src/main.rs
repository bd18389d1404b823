//! flick-shade - drive the Flick notification shade from the command line
//!
//! - Toggle and inspect the location tile
//! - Read and write shade settings
//! - Resolve the panel background
//! - Replay recorded touch traces through the panel gestures

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use smithay::utils::{Point, Size};
use tracing::{debug, info};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use flick_shade::config::{state_dir, ShadeConfig};
use flick_shade::input::{PanelHost, TouchAction, TouchEvent, TouchPointer};
use flick_shade::settings::{SettingKey, SettingValue, SettingsSnapshot, SettingsStore};
use flick_shade::shell::background::Rotation;
use flick_shade::shell::location_tile::TileAction;
use flick_shade::state::ShadeState;

#[derive(Parser, Debug)]
#[command(name = "flick-shade")]
#[command(about = "Flick notification shade tools", long_about = None)]
struct Args {
    /// Shade config file (default: <state dir>/shade.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Settings file (overrides the config)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Location quick settings tile
    Location {
        #[command(subcommand)]
        action: LocationCommand,
    },
    /// Print a setting
    Get { key: SettingKey },
    /// Write a setting
    Set { key: SettingKey, value: String },
    /// Reset a setting to its default
    Unset { key: SettingKey },
    /// Print every tracked setting
    Dump {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve the panel background and print the draw ops
    Background {
        /// Display rotation in degrees
        #[arg(long, default_value_t = 0)]
        rotation: u32,
        #[arg(long, default_value_t = 1080.0)]
        width: f64,
        #[arg(long, default_value_t = 1920.0)]
        height: f64,
    },
    /// Feed a touch trace through the notification panel
    Replay { trace: PathBuf },
}

#[derive(Subcommand, Debug)]
enum LocationCommand {
    /// Tap the tile
    Toggle,
    /// Show the tile state
    Show,
    /// Long press the tile
    Settings,
}

/// Recorded touch sequence with the panel state it was recorded in
#[derive(Debug, Deserialize)]
struct Trace {
    #[serde(default = "default_width")]
    width: f64,
    #[serde(default = "default_height")]
    height: f64,
    #[serde(default)]
    expanded_height: f64,
    #[serde(default)]
    just_peeked: bool,
    #[serde(default)]
    showing_settings: bool,
    /// Notifications on the shade: (app, clearable)
    #[serde(default)]
    notifications: Vec<(String, bool)>,
    #[serde(rename = "event", default)]
    events: Vec<TraceEvent>,
}

fn default_width() -> f64 { 1080.0 }
fn default_height() -> f64 { 1920.0 }

#[derive(Debug, Deserialize)]
struct TraceEvent {
    action: TouchAction,
    #[serde(default)]
    at_ms: u64,
    pointers: Vec<[f64; 2]>,
}

impl TraceEvent {
    fn to_touch(&self, down_ms: u64) -> TouchEvent {
        let pointers = self
            .pointers
            .iter()
            .enumerate()
            .map(|(id, [x, y])| TouchPointer::new(id as i32, Point::from((*x, *y))))
            .collect();
        TouchEvent::new(self.action, pointers).at_time(
            Duration::from_millis(down_ms),
            Duration::from_millis(self.at_ms),
        )
    }
}

fn init_logging(debug: bool) -> tracing_appender::non_blocking::WorkerGuard {
    let log_dir = state_dir();
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = rolling::daily(&log_dir, "shade.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Quiet by default, verbose with --debug
    let default_filter = if debug {
        "debug,flick_shade=debug"
    } else {
        "warn,flick_shade=info"
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    guard
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC: {}", panic_info);
        let crash_log = state_dir().join("crash.log");
        if let Ok(mut f) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&crash_log)
        {
            use std::io::Write;
            let _ = writeln!(f, "[{}] PANIC: {}", chrono::Local::now(), panic_info);
        }
    }));
}

fn open_state(args: &Args) -> Result<ShadeState> {
    let config_path = args.config.clone().unwrap_or_else(ShadeConfig::default_path);
    let config = ShadeConfig::load(&config_path);
    let settings_path = args.settings.clone().unwrap_or_else(|| config.settings_path());
    let store = SettingsStore::open(&settings_path)
        .with_context(|| format!("opening settings at {}", settings_path.display()))?;

    let mut state = ShadeState::new(&config, store);
    state.apply_settings(&SettingsSnapshot::read(&state.store));
    Ok(state)
}

fn location(state: &mut ShadeState, action: &LocationCommand) -> Result<()> {
    match action {
        LocationCommand::Toggle => {
            let mode = state.click_location()?;
            println!("{}", mode.label());
        }
        LocationCommand::Show => {
            let toggle = state.tile.toggle();
            println!(
                "{} ({}, {}) mask={:04b}",
                toggle.name,
                toggle.icon,
                if toggle.enabled { "on" } else { "off" },
                state.tile.mask().bits()
            );
        }
        LocationCommand::Settings => match state.long_click_location() {
            TileAction::OpenSettings(screen) => println!("open {}", screen),
        },
    }
    Ok(())
}

fn replay(state: &mut ShadeState, path: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading trace {}", path.display()))?;
    let trace: Trace = toml::from_str(&contents)
        .with_context(|| format!("parsing trace {}", path.display()))?;

    state.panel.layout(Size::from((trace.width, trace.height)));
    state.panel.set_expanded_height(trace.expanded_height);
    state.panel.set_just_peeked(trace.just_peeked);
    state.controller.record_history();
    for (app, clearable) in &trace.notifications {
        state.controller.notifications.add(app, "", *clearable);
    }
    if trace.showing_settings {
        state.controller.flip_to_settings();
        state.controller.take_history();
    }
    info!(events = trace.events.len(), "Replaying touch trace");

    let mut down_ms = 0;
    for (index, event) in trace.events.iter().enumerate() {
        if event.action == TouchAction::Down {
            down_ms = event.at_ms;
        }
        let touch = event.to_touch(down_ms);
        let handled = state.touch(&touch);
        let requests = state.controller.take_history();
        debug!(index, ?requests, "Trace event");
        println!(
            "#{:<3} {:<12} handled={:<5} phase={:?} handle={:?} host={:?}",
            index,
            format!("{:?}", event.action),
            handled,
            state.panel.gesture().phase(),
            state.handle.last_position().map(|p| (p.x, p.y)),
            requests,
        );
    }
    println!("face: {:?}", state.controller.face());
    Ok(())
}

fn main() -> Result<()> {
    install_panic_hook();
    let args = Args::parse();
    let _guard = init_logging(args.debug);

    let mut state = open_state(&args)?;

    match &args.command {
        Command::Location { action } => location(&mut state, action)?,
        Command::Get { key } => match state.store.get_or_default(*key) {
            Some(value) => println!("{}", value),
            None => println!("(unset)"),
        },
        Command::Set { key, value } => {
            let value = SettingValue::parse(*key, value)?;
            state.store.put(*key, value)?;
        }
        Command::Unset { key } => state.store.remove(*key)?,
        Command::Dump { json } => {
            let snapshot = SettingsSnapshot::read(&state.store);
            if *json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                for key in SettingKey::ALL {
                    let value = state
                        .store
                        .get_or_default(key)
                        .map_or_else(|| "(unset)".to_string(), |v| v.to_string());
                    println!("{} = {}", key, value);
                }
            }
        }
        Command::Background { rotation, width, height } => {
            let rotation = Rotation::from_degrees(*rotation)
                .with_context(|| format!("unsupported rotation {}", rotation))?;
            state.panel.layout(Size::from((*width, *height)));
            state.panel.on_configuration_changed(rotation);
            for op in state.panel.draw(&state.handle) {
                println!("{:?}", op);
            }
        }
        Command::Replay { trace } => replay(&mut state, trace)?,
    }

    Ok(())
}
