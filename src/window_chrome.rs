use egui::{Color32, Pos2, Rect, Vec2};

/// Top-left corner that centres a window of `size` inside `work_area`.
pub fn centered_position(work_area: Rect, size: Vec2) -> Pos2 {
    work_area.min + (work_area.size() - size) / 2.0
}

/// Largest size with the aspect ratio of `content` that fits in `bounds`.
pub fn fit_within(content: Vec2, bounds: Vec2) -> Vec2 {
    if content.x <= 0.0 || content.y <= 0.0 {
        return Vec2::ZERO;
    }
    let scale = (bounds.x / content.x).min(bounds.y / content.y);
    content * scale
}

pub fn hex_to_color(hex: &str) -> Color32 {
    let hex = hex.trim_start_matches('#');
    if hex.len() == 6 && hex.is_ascii() {
        if let (Ok(r), Ok(g), Ok(b)) = (
            u8::from_str_radix(&hex[0..2], 16),
            u8::from_str_radix(&hex[2..4], 16),
            u8::from_str_radix(&hex[4..6], 16),
        ) {
            return Color32::from_rgb(r, g, b);
        }
    }
    Color32::WHITE
}

/// Draws the draggable title bar with a single "X" button.
/// Returns true when the button was clicked.
pub fn title_bar(ui: &mut egui::Ui, height: f32, background: Color32) -> bool {
    let (rect, response) = ui.allocate_exact_size(
        egui::vec2(ui.available_width(), height),
        egui::Sense::click_and_drag(),
    );
    ui.painter().rect_filled(rect, 0.0, background);

    if response.drag_started_by(egui::PointerButton::Primary) {
        ui.ctx().send_viewport_cmd(egui::ViewportCommand::StartDrag);
    }

    let button_rect = Rect::from_min_max(
        egui::pos2(rect.right() - height - 10.0, rect.top()),
        egui::pos2(rect.right() - 10.0, rect.bottom()),
    );
    let close = ui.put(
        button_rect,
        egui::Button::new(egui::RichText::new("X").color(Color32::WHITE))
            .fill(background)
            .frame(false),
    );
    close.clicked()
}
