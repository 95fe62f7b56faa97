use crate::config::{Config, WaitScreenConfig};
use crate::reveal::TextReveal;
use crate::window_chrome::{hex_to_color, title_bar};
use egui::{Color32, Pos2, ViewportBuilder, ViewportClass, ViewportCommand, ViewportId};
use log::{error, info};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn wait_viewport_id() -> ViewportId {
    ViewportId::from_hash_of("wait_window")
}

/// State of the borderless "please wait" window.
pub struct WaitWindow {
    reveal: TextReveal,
    last_time: Option<f64>,
    font_size: f32,
    text_color: Color32,
    background: Color32,
    title_bar_height: f32,
}

impl WaitWindow {
    pub fn new(wait_screen: &WaitScreenConfig, background: Color32, title_bar_height: f32) -> Self {
        Self {
            reveal: TextReveal::new(&wait_screen.message, wait_screen.reveal_interval()),
            last_time: None,
            font_size: wait_screen.font_size,
            text_color: hex_to_color(&wait_screen.text_color),
            background,
            title_bar_height,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.wait_screen,
            hex_to_color(&config.window.background_color),
            config.window.title_bar_height,
        )
    }

    pub fn reveal(&self) -> &TextReveal {
        &self.reveal
    }

    /// Advances the animation to `now` (seconds, egui input time).
    pub fn update_clock(&mut self, now: f64) -> bool {
        let dt = match self.last_time {
            Some(last) if now > last => Duration::from_secs_f64(now - last),
            _ => Duration::ZERO,
        };
        self.last_time = Some(now);
        self.reveal.advance(dt)
    }
}

pub fn viewport_builder(config: &Config, position: Option<Pos2>) -> ViewportBuilder {
    let builder = ViewportBuilder::default()
        .with_title("Game Intro")
        .with_inner_size(config.window.size())
        .with_decorations(false)
        .with_resizable(false);
    match position {
        Some(pos) => builder.with_position(pos),
        None => builder,
    }
}

/// Draws the window; runs inside the deferred viewport callback.
pub fn show_wait_window(ctx: &egui::Context, class: ViewportClass, state: &Arc<Mutex<WaitWindow>>) {
    let mut window = match state.lock() {
        Ok(window) => window,
        Err(e) => {
            error!("Wait window state poisoned: {}", e);
            return;
        }
    };

    let now = ctx.input(|i| i.time);
    window.update_clock(now);
    if let Some(next) = window.reveal.time_until_next() {
        ctx.request_repaint_after(next);
    }

    let mut close_clicked = false;
    if class == ViewportClass::Embedded {
        egui::Window::new("Game Intro").show(ctx, |ui| {
            close_clicked = draw_contents(ui, &window);
        });
    } else {
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(window.background))
            .show(ctx, |ui| {
                close_clicked = draw_contents(ui, &window);
            });
    }

    let os_close = ctx.input(|i| i.viewport().close_requested());
    if close_clicked || os_close {
        info!("Wait window closed, exiting");
        ctx.send_viewport_cmd_to(ViewportId::ROOT, ViewportCommand::Close);
    }
}

fn draw_contents(ui: &mut egui::Ui, window: &WaitWindow) -> bool {
    let close = title_bar(ui, window.title_bar_height, window.background);
    let rect = ui.available_rect_before_wrap();
    ui.painter().rect_filled(rect, 0.0, window.background);
    ui.allocate_new_ui(egui::UiBuilder::new().max_rect(rect), |ui| {
        ui.centered_and_justified(|ui| {
            ui.label(
                egui::RichText::new(window.reveal.visible_text())
                    .size(window.font_size)
                    .color(window.text_color),
            );
        });
    });
    close
}
