use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

use game_intro_player::config::WAIT_MESSAGE;
use game_intro_player::reveal::TextReveal;
use game_intro_player::window_chrome::centered_position;
use game_intro_player::{
    locate_source, Command, Config, PlaybackController, PlaybackEvent, PlaybackState,
};

fn create_videos(dir: &std::path::Path, names: &[&str]) {
    for name in names {
        fs::File::create(dir.join(name)).unwrap();
    }
}

fn controller_from(config: &Config) -> PlaybackController {
    PlaybackController::new(
        config.video.playback_rate,
        config.video.near_end_margin(),
        config.window.size(),
    )
}

#[test]
fn test_too_few_videos_aborts_startup() {
    let temp_dir = TempDir::new().unwrap();
    create_videos(temp_dir.path(), &["a.mp4", "b.mkv", "c.avi", "d.mov", "e.txt"]);

    let config = Config::default();
    let result = locate_source(temp_dir.path(), &config.video.extensions, config.video.position);
    assert!(result.is_err());
}

#[test]
fn test_fifth_matching_video_is_selected() {
    let temp_dir = TempDir::new().unwrap();
    create_videos(
        temp_dir.path(),
        &["01.mp4", "02.txt", "03.MKV", "04.avi", "05.png", "06.mp4", "07.mkv", "08.mp4"],
    );

    let config = Config::default();
    let listed: Vec<PathBuf> = fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            let ext = p.extension().unwrap().to_str().unwrap().to_lowercase();
            ["mp4", "avi", "mkv"].contains(&ext.as_str())
        })
        .collect();
    assert_eq!(listed.len(), 6);

    let selected =
        locate_source(temp_dir.path(), &config.video.extensions, config.video.position).unwrap();
    assert_eq!(selected.path, listed[4]);
}

#[test]
fn test_config_file_changes_selection() {
    let temp_dir = TempDir::new().unwrap();
    let videos = temp_dir.path().join("videos");
    fs::create_dir(&videos).unwrap();
    create_videos(&videos, &["only.webm"]);

    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        format!(
            "[video]\ndirectory = {:?}\nposition = 1\nextensions = [\"webm\"]\n",
            videos.to_string_lossy()
        ),
    )
    .unwrap();

    let config = Config::load(&config_path).unwrap().unwrap();
    let selected = locate_source(
        std::path::Path::new(&config.video.directory),
        &config.video.extensions,
        config.video.position,
    )
    .unwrap();
    assert_eq!(selected.name, "only.webm");
}

#[test]
fn test_full_playback_run() {
    let config = Config::default();
    let mut controller = controller_from(&config);
    let work_area = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(1920.0, 1080.0));
    controller.set_work_area(work_area);

    assert_eq!(
        controller.handle(PlaybackEvent::Ready(Some(Duration::from_secs(12)))),
        vec![Command::SetRate(0.8)]
    );

    let mut created = 0;
    let mut position = Duration::ZERO;
    while controller.is_polling() {
        position += Duration::from_millis(16);
        for command in controller.handle(PlaybackEvent::Tick(position)) {
            if let Command::CreateSecondWindow { position: window_pos } = command {
                created += 1;
                assert_eq!(
                    window_pos,
                    Some(centered_position(work_area, egui::vec2(1000.0, 600.0)))
                );
            }
        }
    }
    assert!(position >= Duration::from_millis(11900));
    assert!(position < Duration::from_secs(12));

    let end = controller.handle(PlaybackEvent::EndOfMedia);
    assert!(end.contains(&Command::FocusSecondWindow));
    assert!(!end
        .iter()
        .any(|c| matches!(c, Command::CreateSecondWindow { .. })));
    assert_eq!(created, 1);
    assert_eq!(controller.state(), PlaybackState::Done);
}

#[test]
fn test_both_windows_share_centre() {
    let work_area = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(1920.0, 1080.0));
    let config = Config::default();
    let mut controller = controller_from(&config);
    controller.set_work_area(work_area);

    let primary = centered_position(work_area, config.window.size());
    assert_eq!(controller.window_position(), Some(primary));
    assert_eq!(primary, egui::pos2(460.0, 240.0));
}

#[test]
fn test_wait_message_reveal_sequence() {
    let config = Config::default();
    let mut reveal = TextReveal::new(&config.wait_screen.message, config.wait_screen.reveal_interval());

    let mut ticks = 0;
    while reveal.advance(Duration::from_millis(200)) {
        ticks += 1;
        assert_eq!(reveal.revealed(), ticks);
    }
    assert_eq!(ticks, WAIT_MESSAGE.chars().count());
    assert_eq!(reveal.visible_text(), WAIT_MESSAGE);
    assert!(!reveal.advance(Duration::from_secs(10)));
}
