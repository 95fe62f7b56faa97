use clap::Parser;
use eframe::egui;
use game_intro_player::logging::{setup_logging, trim_log};
use game_intro_player::media::MediaSession;
use game_intro_player::{locate_source, Config, PlaybackEvent, PlayerApp, VideoFile};
use log::{error, info};
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, watch};

#[cfg(feature = "gstreamer")]
use game_intro_player::video_player::VideoPlayer;

#[derive(Parser)]
#[command(about = "Plays the intro video, then shows the loading screen")]
struct Cli {
    /// Configuration file (defaults to config.toml next to the executable)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[cfg(feature = "gstreamer")]
fn open_session(
    source: &VideoFile,
    events: mpsc::UnboundedSender<PlaybackEvent>,
    frames: watch::Sender<Option<egui::ColorImage>>,
) -> anyhow::Result<Box<dyn MediaSession>> {
    // Portable builds ship their plugins next to the executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let gstreamer_plugin_path = exe_dir.join("lib").join("gstreamer-1.0");
            if gstreamer_plugin_path.exists() {
                info!(
                    "Found bundled GStreamer plugins at: {}",
                    gstreamer_plugin_path.display()
                );
                std::env::set_var("GST_PLUGIN_PATH", gstreamer_plugin_path);
            }
        }
    }

    gstreamer::init()?;
    let player = VideoPlayer::open(&source.path, events, frames)?;
    Ok(Box::new(player))
}

#[cfg(not(feature = "gstreamer"))]
fn open_session(
    source: &VideoFile,
    _events: mpsc::UnboundedSender<PlaybackEvent>,
    _frames: watch::Sender<Option<egui::ColorImage>>,
) -> anyhow::Result<Box<dyn MediaSession>> {
    Err(anyhow::anyhow!(
        "built without gstreamer, cannot play {}",
        source.path.display()
    ))
}

fn load_config(path: &Path) -> (Config, Option<String>) {
    match Config::load(path) {
        Ok(Some(config)) => (config, Some(format!("Config loaded from {}", path.display()))),
        Ok(None) => (
            Config::default(),
            Some(format!("Config file {} not found, using defaults", path.display())),
        ),
        Err(e) => (Config::default(), Some(format!("{:#}, using defaults", e))),
    }
}

fn main() -> eframe::Result<()> {
    let args = Cli::parse();
    let config_path = args.config.unwrap_or_else(Config::default_path);
    let (config, config_note) = load_config(&config_path);

    if let Err(e) = setup_logging(&config.logging) {
        eprintln!("Failed to set up logging: {}", e);
    }
    info!("Starting Game Intro Player");
    if let Some(note) = config_note {
        info!("{}", note);
    }
    trim_log(&config.logging);

    let source = match locate_source(
        Path::new(&config.video.directory),
        &config.video.extensions,
        config.video.position,
    ) {
        Ok(source) => source,
        Err(e) => {
            error!("{}", e);
            return Ok(());
        }
    };

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (frames_tx, frames_rx) = watch::channel(None);
    let session = match open_session(&source, events_tx, frames_tx) {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to open {}: {}", source.name, e);
            return Ok(());
        }
    };

    let viewport = egui::ViewportBuilder::default()
        .with_title("Game Intro")
        .with_inner_size(config.window.size())
        .with_decorations(false)
        .with_resizable(false);
    let options = eframe::NativeOptions {
        viewport,
        centered: true,
        ..Default::default()
    };

    eframe::run_native(
        "Game Intro Player",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(PlayerApp::new(
                config,
                Some(session),
                events_rx,
                frames_rx,
            )))
        }),
    )
}
