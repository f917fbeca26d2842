//! API key gate shown between sign-in and chat when the build asks for one.

use egui::{self, Align, Layout, RichText, Vec2};
use crate::state::UiState;
use crate::theme::*;

/// Render the key prompt. Returns the entered key on submit.
pub fn api_key_panel(ui: &mut egui::Ui, state: &mut UiState) -> Option<String> {
    let mut submitted = None;

    ui.with_layout(Layout::top_down(Align::Center), |ui| {
        ui.add_space(ui.available_height() * 0.2);
        egui::Frame::default()
            .fill(BG_SECONDARY)
            .corner_radius(PANEL_ROUNDING)
            .inner_margin(PANEL_PADDING * 2.0)
            .show(ui, |ui| {
                ui.set_width(FORM_WIDTH);
                ui.heading(RichText::new("Enter API Key").color(TEXT_PRIMARY).strong());
                ui.label(
                    RichText::new("The key is kept for this session only.")
                        .color(TEXT_SECONDARY)
                        .small(),
                );
                ui.add_space(8.0);

                let field = ui.add(
                    egui::TextEdit::singleline(&mut state.api_key_input)
                        .password(true)
                        .hint_text("sk-...")
                        .desired_width(f32::INFINITY),
                );
                ui.add_space(8.0);

                let enabled = !state.api_key_input.trim().is_empty();
                let button = ui.add_enabled(
                    enabled,
                    egui::Button::new(RichText::new("Continue").color(TEXT_PRIMARY))
                        .fill(if enabled { ACCENT } else { BG_SURFACE })
                        .corner_radius(PANEL_ROUNDING)
                        .min_size(Vec2::new(FORM_WIDTH, 28.0)),
                );
                let enter = field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

                if button.clicked() || (enter && enabled) {
                    submitted = Some(std::mem::take(&mut state.api_key_input));
                }
            });
    });

    submitted
}
