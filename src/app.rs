use crate::config::Config;
use crate::controller::{Command, PlaybackController, PlaybackEvent, PlaybackState};
use crate::media::MediaSession;
use crate::wait_window::{self, WaitWindow};
use crate::window_chrome::{centered_position, fit_within, hex_to_color, title_bar};
use egui::{Pos2, Rect, ViewportCommand, ViewportId};
use log::{error, info, warn};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};

pub struct PlayerApp {
    config: Config,
    controller: PlaybackController,
    session: Option<Box<dyn MediaSession>>,
    events: mpsc::UnboundedReceiver<PlaybackEvent>,
    texture_receiver: watch::Receiver<Option<egui::ColorImage>>,
    current_texture: Option<egui::TextureHandle>,
    wait_window: Option<Arc<Mutex<WaitWindow>>>,
    wait_position: Option<Pos2>,
    focus_wait_window: bool,
    primary_open: bool,
    work_area_known: bool,
}

impl PlayerApp {
    /// Starts playback right away; a failure to start is logged and leaves
    /// the window up without video.
    pub fn new(
        config: Config,
        session: Option<Box<dyn MediaSession>>,
        events: mpsc::UnboundedReceiver<PlaybackEvent>,
        texture_receiver: watch::Receiver<Option<egui::ColorImage>>,
    ) -> Self {
        let controller = PlaybackController::new(
            config.video.playback_rate,
            config.video.near_end_margin(),
            config.window.size(),
        );

        match &session {
            Some(session) => match session.play() {
                Ok(()) => info!("Playback started"),
                Err(e) => error!("Failed to play video: {}", e),
            },
            None => warn!("No media session, nothing to play"),
        }

        Self {
            config,
            controller,
            session,
            events,
            texture_receiver,
            current_texture: None,
            wait_window: None,
            wait_position: None,
            focus_wait_window: false,
            primary_open: true,
            work_area_known: false,
        }
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_primary_open(&self) -> bool {
        self.primary_open
    }

    pub fn wait_window(&self) -> Option<&Arc<Mutex<WaitWindow>>> {
        self.wait_window.as_ref()
    }

    /// One UI pass: drain backend events, poll the position, draw both windows.
    pub fn ui(&mut self, ctx: &egui::Context) {
        self.detect_work_area(ctx);

        while let Ok(event) = self.events.try_recv() {
            let commands = self.controller.handle(event);
            self.apply(ctx, commands);
        }

        if self.controller.is_polling() {
            if let Some(position) = self.session.as_ref().and_then(|s| s.position()) {
                let commands = self.controller.handle(PlaybackEvent::Tick(position));
                self.apply(ctx, commands);
            }
        }

        if self.primary_open {
            if self.texture_receiver.has_changed().unwrap_or(false) {
                if let Some(image) = self.texture_receiver.borrow_and_update().clone() {
                    self.current_texture =
                        Some(ctx.load_texture("video_frame", image, Default::default()));
                }
            }
            self.show_primary(ctx);
            ctx.request_repaint();
        }

        self.show_wait_window(ctx);
    }

    fn detect_work_area(&mut self, ctx: &egui::Context) {
        if self.work_area_known {
            return;
        }
        let Some(monitor) = ctx.input(|i| i.viewport().monitor_size) else {
            return;
        };
        // egui has no work-area query; the whole monitor stands in for it
        let work_area = Rect::from_min_size(Pos2::ZERO, monitor);
        self.controller.set_work_area(work_area);
        self.work_area_known = true;

        let position = centered_position(work_area, self.config.window.size());
        info!("Primary window position: x={}, y={}", position.x, position.y);
        ctx.send_viewport_cmd_to(ViewportId::ROOT, ViewportCommand::OuterPosition(position));
    }

    fn apply(&mut self, ctx: &egui::Context, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::SetRate(rate) => self.set_rate(rate),
                Command::CreateSecondWindow { position } => self.create_wait_window(position),
                Command::FocusSecondWindow => {
                    info!("Bringing wait window to front");
                    self.focus_wait_window = true;
                }
                Command::ReleaseMedia => self.release_media(),
                Command::ClosePrimary => self.hide_primary(ctx),
            }
        }
    }

    fn create_wait_window(&mut self, position: Option<Pos2>) {
        if self.wait_window.is_some() {
            warn!("Wait window already exists");
            return;
        }
        match position {
            Some(pos) => info!("Creating wait window at x={}, y={}", pos.x, pos.y),
            None => info!("Creating wait window, screen size unknown"),
        }
        self.wait_window = Some(Arc::new(Mutex::new(WaitWindow::from_config(&self.config))));
        self.wait_position = position;
    }

    fn set_rate(&self, rate: f64) {
        let Some(session) = &self.session else {
            return;
        };
        if let Err(e) = session.set_rate(rate) {
            error!("Failed to set playback rate: {}", e);
        }
    }

    fn release_media(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.stop() {
                error!("Error stopping player: {}", e);
            }
            info!("Media session released");
        }
    }

    fn hide_primary(&mut self, ctx: &egui::Context) {
        self.primary_open = false;
        self.current_texture = None;
        ctx.send_viewport_cmd_to(ViewportId::ROOT, ViewportCommand::Visible(false));
    }

    fn close_primary_by_user(&mut self, ctx: &egui::Context) {
        info!("Primary window closed");
        self.controller.abandon();
        self.release_media();
        if self.wait_window.is_some() {
            self.hide_primary(ctx);
        } else {
            self.primary_open = false;
            ctx.send_viewport_cmd_to(ViewportId::ROOT, ViewportCommand::Close);
        }
    }

    fn show_primary(&mut self, ctx: &egui::Context) {
        let background = hex_to_color(&self.config.window.background_color);
        let title_bar_height = self.config.window.title_bar_height;
        let video_fit = self.config.window.video_fit();

        let mut close_clicked = false;
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(background))
            .show(ctx, |ui| {
                close_clicked = title_bar(ui, title_bar_height, background);

                let content = ui.available_rect_before_wrap();
                if let Some(texture) = &self.current_texture {
                    let size = fit_within(texture.size_vec2(), video_fit);
                    let rect = Rect::from_center_size(content.center(), size);
                    ui.painter().image(
                        texture.id(),
                        rect,
                        Rect::from_min_max(Pos2::ZERO, egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );
                }
            });

        if close_clicked {
            self.close_primary_by_user(ctx);
        }
    }

    fn show_wait_window(&mut self, ctx: &egui::Context) {
        let Some(state) = &self.wait_window else {
            return;
        };
        let state = Arc::clone(state);
        let viewport_id = wait_window::wait_viewport_id();

        ctx.show_viewport_deferred(
            viewport_id,
            wait_window::viewport_builder(&self.config, self.wait_position),
            move |ctx, class| wait_window::show_wait_window(ctx, class, &state),
        );

        if self.focus_wait_window {
            self.focus_wait_window = false;
            ctx.send_viewport_cmd_to(viewport_id, ViewportCommand::Focus);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.controller.state() == PlaybackState::Done && !self.primary_open
    }
}

impl eframe::App for PlayerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui(ctx);
    }
}
