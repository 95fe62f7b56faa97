pub mod app;
pub mod config;
pub mod controller;
pub mod file_scanner;
pub mod logging;
pub mod media;
pub mod reveal;
#[cfg(feature = "gstreamer")]
pub mod video_player;
pub mod wait_window;
pub mod window_chrome;

pub use app::PlayerApp;
pub use config::Config;
pub use controller::{Command, PlaybackController, PlaybackEvent, PlaybackState};
pub use file_scanner::{locate_source, scan_video_files, VideoFile};
