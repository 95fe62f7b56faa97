//! Playback state machine driving the video → wait-window transition.

use crate::window_chrome::centered_position;
use egui::{Pos2, Rect, Vec2};
use log::{debug, error, info, warn};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// Media prerolled; carries the total duration when the backend knows it.
    Ready(Option<Duration>),
    Tick(Duration),
    EndOfMedia,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Loading,
    Playing,
    Transitioning,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetRate(f64),
    CreateSecondWindow { position: Option<Pos2> },
    FocusSecondWindow,
    ReleaseMedia,
    ClosePrimary,
}

pub struct PlaybackController {
    state: PlaybackState,
    playback_rate: f64,
    near_end_margin: Duration,
    near_end: Option<Duration>,
    second_window_created: bool,
    work_area: Option<Rect>,
    window_size: Vec2,
}

impl PlaybackController {
    pub fn new(playback_rate: f64, near_end_margin: Duration, window_size: Vec2) -> Self {
        Self {
            state: PlaybackState::Loading,
            playback_rate,
            near_end_margin,
            near_end: None,
            second_window_created: false,
            work_area: None,
            window_size,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn near_end(&self) -> Option<Duration> {
        self.near_end
    }

    pub fn second_window_created(&self) -> bool {
        self.second_window_created
    }

    /// Position polling only runs between a usable `Ready` and the transition.
    pub fn is_polling(&self) -> bool {
        self.state == PlaybackState::Playing && self.near_end.is_some()
    }

    pub fn set_work_area(&mut self, work_area: Rect) {
        self.work_area = Some(work_area);
    }

    pub fn window_position(&self) -> Option<Pos2> {
        self.work_area
            .map(|area| centered_position(area, self.window_size))
    }

    /// Used when the primary window is closed by hand before the video ends.
    pub fn abandon(&mut self) {
        info!("Playback abandoned in state {:?}", self.state);
        self.state = PlaybackState::Done;
        self.near_end = None;
    }

    pub fn handle(&mut self, event: PlaybackEvent) -> Vec<Command> {
        match event {
            PlaybackEvent::Ready(duration) => self.on_ready(duration),
            PlaybackEvent::Tick(position) => self.on_tick(position),
            PlaybackEvent::EndOfMedia => self.on_end_of_media(),
            PlaybackEvent::Error(message) => {
                error!("Media player error: {}", message);
                Vec::new()
            }
        }
    }

    /// The rate is requested on every accepted `Ready`, whatever the duration.
    fn on_ready(&mut self, duration: Option<Duration>) -> Vec<Command> {
        if self.state != PlaybackState::Loading {
            debug!("Ignoring ready notification in state {:?}", self.state);
            return Vec::new();
        }
        self.state = PlaybackState::Playing;

        match duration {
            Some(total) if !total.is_zero() => {
                let near_end = total.saturating_sub(self.near_end_margin);
                info!(
                    "Media ready, duration {:.3}s, opening next window at {:.3}s (rate {})",
                    total.as_secs_f64(),
                    near_end.as_secs_f64(),
                    self.playback_rate
                );
                self.near_end = Some(near_end);
            }
            _ => {
                warn!(
                    "Media ready without a usable duration ({:?}); relying on end of media",
                    duration
                );
            }
        }
        vec![Command::SetRate(self.playback_rate)]
    }

    fn on_tick(&mut self, position: Duration) -> Vec<Command> {
        let Some(near_end) = self.near_end else {
            return Vec::new();
        };
        if !self.is_polling() || position < near_end || self.second_window_created {
            return Vec::new();
        }

        self.second_window_created = true;
        self.state = PlaybackState::Transitioning;
        self.near_end = None;
        info!(
            "Near end reached at {:.3}s, creating next window",
            position.as_secs_f64()
        );
        vec![Command::CreateSecondWindow {
            position: self.window_position(),
        }]
    }

    fn on_end_of_media(&mut self) -> Vec<Command> {
        if self.state == PlaybackState::Done {
            debug!("Ignoring end of media after playback finished");
            return Vec::new();
        }
        info!("End of media");
        self.state = PlaybackState::Done;
        self.near_end = None;

        let mut commands = vec![Command::ReleaseMedia, Command::ClosePrimary];
        if self.second_window_created {
            commands.push(Command::FocusSecondWindow);
        } else {
            warn!("Media ended before the next window was created, creating it now");
            self.second_window_created = true;
            commands.push(Command::CreateSecondWindow {
                position: self.window_position(),
            });
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> PlaybackController {
        PlaybackController::new(0.8, Duration::from_millis(100), egui::vec2(1000.0, 600.0))
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn count_creates(commands: &[Command]) -> usize {
        commands
            .iter()
            .filter(|c| matches!(c, Command::CreateSecondWindow { .. }))
            .count()
    }

    #[test]
    fn test_starts_loading_without_polling() {
        let c = controller();
        assert_eq!(c.state(), PlaybackState::Loading);
        assert!(!c.is_polling());
        assert!(!c.second_window_created());
    }

    #[test]
    fn test_ready_sets_near_end_threshold() {
        let mut c = controller();
        assert_eq!(
            c.handle(PlaybackEvent::Ready(Some(secs(10.0)))),
            vec![Command::SetRate(0.8)]
        );
        assert_eq!(c.state(), PlaybackState::Playing);
        assert_eq!(c.near_end(), Some(Duration::from_millis(9900)));
        assert!(c.is_polling());
    }

    #[test]
    fn test_tick_before_threshold_does_nothing() {
        let mut c = controller();
        c.handle(PlaybackEvent::Ready(Some(secs(10.0))));
        assert!(c.handle(PlaybackEvent::Tick(secs(9.0))).is_empty());
        assert!(!c.second_window_created());
        assert!(c.is_polling());
    }

    #[test]
    fn test_tick_at_threshold_creates_window_once() {
        let mut c = controller();
        c.set_work_area(Rect::from_min_size(Pos2::ZERO, egui::vec2(1920.0, 1040.0)));
        c.handle(PlaybackEvent::Ready(Some(secs(10.0))));

        let commands = c.handle(PlaybackEvent::Tick(Duration::from_millis(9900)));
        assert_eq!(
            commands,
            vec![Command::CreateSecondWindow {
                position: Some(egui::pos2(460.0, 220.0))
            }]
        );
        assert_eq!(c.state(), PlaybackState::Transitioning);
        assert!(!c.is_polling());

        assert!(c.handle(PlaybackEvent::Tick(secs(9.95))).is_empty());
    }

    #[test]
    fn test_end_after_transition_focuses_existing_window() {
        let mut c = controller();
        c.handle(PlaybackEvent::Ready(Some(secs(3.0))));
        let first = c.handle(PlaybackEvent::Tick(secs(2.95)));
        let end = c.handle(PlaybackEvent::EndOfMedia);

        assert_eq!(count_creates(&first) + count_creates(&end), 1);
        assert_eq!(
            end,
            vec![
                Command::ReleaseMedia,
                Command::ClosePrimary,
                Command::FocusSecondWindow
            ]
        );
        assert_eq!(c.state(), PlaybackState::Done);
    }

    #[test]
    fn test_end_without_transition_falls_back_to_creation() {
        let mut c = controller();
        c.handle(PlaybackEvent::Ready(Some(secs(3.0))));
        c.handle(PlaybackEvent::Tick(secs(1.0)));

        let end = c.handle(PlaybackEvent::EndOfMedia);
        assert_eq!(
            end,
            vec![
                Command::ReleaseMedia,
                Command::ClosePrimary,
                Command::CreateSecondWindow { position: None }
            ]
        );
        assert!(c.second_window_created());
    }

    #[test]
    fn test_repeated_end_of_media_is_ignored() {
        let mut c = controller();
        c.handle(PlaybackEvent::Ready(Some(secs(1.0))));
        let first = c.handle(PlaybackEvent::EndOfMedia);
        assert_eq!(count_creates(&first), 1);
        assert!(c.handle(PlaybackEvent::EndOfMedia).is_empty());
        assert!(c.handle(PlaybackEvent::Tick(secs(5.0))).is_empty());
    }

    #[test]
    fn test_missing_or_zero_duration_disables_polling() {
        for duration in [None, Some(Duration::ZERO)] {
            let mut c = controller();
            c.handle(PlaybackEvent::Ready(duration));
            assert_eq!(c.state(), PlaybackState::Playing);
            assert!(!c.is_polling());
            assert!(c.handle(PlaybackEvent::Tick(secs(100.0))).is_empty());

            let end = c.handle(PlaybackEvent::EndOfMedia);
            assert_eq!(count_creates(&end), 1);
        }
    }

    #[test]
    fn test_duration_shorter_than_margin_triggers_on_first_tick() {
        let mut c = controller();
        c.handle(PlaybackEvent::Ready(Some(Duration::from_millis(50))));
        assert_eq!(c.near_end(), Some(Duration::ZERO));
        let commands = c.handle(PlaybackEvent::Tick(Duration::ZERO));
        assert_eq!(count_creates(&commands), 1);
    }

    #[test]
    fn test_error_keeps_state() {
        let mut c = controller();
        c.handle(PlaybackEvent::Ready(Some(secs(10.0))));
        assert!(c
            .handle(PlaybackEvent::Error("decoder exploded".to_string()))
            .is_empty());
        assert_eq!(c.state(), PlaybackState::Playing);
        assert!(c.is_polling());
    }

    #[test]
    fn test_second_ready_is_ignored() {
        let mut c = controller();
        c.handle(PlaybackEvent::Ready(Some(secs(10.0))));
        assert!(c.handle(PlaybackEvent::Ready(Some(secs(2.0)))).is_empty());
        assert_eq!(c.near_end(), Some(Duration::from_millis(9900)));
    }

    #[test]
    fn test_abandon_stops_transitions() {
        let mut c = controller();
        c.handle(PlaybackEvent::Ready(Some(secs(10.0))));
        c.abandon();
        assert_eq!(c.state(), PlaybackState::Done);
        assert!(c.handle(PlaybackEvent::Tick(secs(9.99))).is_empty());
        assert!(c.handle(PlaybackEvent::EndOfMedia).is_empty());
        assert!(!c.second_window_created());
    }

    #[test]
    fn test_rate_is_independent_of_duration() {
        for duration in [None, Some(Duration::ZERO), Some(secs(0.05)), Some(secs(3600.0))] {
            let mut c = controller();
            assert_eq!(
                c.handle(PlaybackEvent::Ready(duration)),
                vec![Command::SetRate(0.8)]
            );
        }
    }
}
