//! Toast overlay and the full-screen loading state.

use egui::{self, Align, Align2, Layout, RichText};
use crate::state::UiState;
use crate::theme::*;

/// Draw pending toasts in the top-right corner. Clicking one dismisses it.
pub fn toasts_overlay(ctx: &egui::Context, state: &mut UiState) {
    if state.toasts.is_empty() {
        return;
    }

    let mut dismissed = None;
    egui::Area::new(egui::Id::new("toasts"))
        .anchor(Align2::RIGHT_TOP, egui::vec2(-12.0, 12.0))
        .show(ctx, |ui| {
            for (index, entry) in state.toasts.iter().enumerate() {
                let (bg, title_color) = if entry.toast.is_destructive() {
                    (TOAST_ERROR_BG, ERROR)
                } else {
                    (TOAST_BG, SUCCESS)
                };
                let response = egui::Frame::default()
                    .fill(bg)
                    .corner_radius(PANEL_ROUNDING)
                    .inner_margin(PANEL_PADDING)
                    .show(ui, |ui| {
                        ui.set_max_width(280.0);
                        ui.label(RichText::new(&entry.toast.title).color(title_color).strong());
                        ui.label(RichText::new(&entry.toast.description).color(TEXT_PRIMARY).small());
                    })
                    .response
                    .interact(egui::Sense::click());
                if response.clicked() {
                    dismissed = Some(index);
                }
                ui.add_space(4.0);
            }
        });

    if let Some(index) = dismissed {
        state.dismiss_toast(index);
    }
}

/// Spinner shown while the persisted session is being restored.
pub fn loading_screen(ui: &mut egui::Ui, label: &str) {
    ui.with_layout(Layout::top_down(Align::Center), |ui| {
        ui.add_space(ui.available_height() * 0.4);
        ui.spinner();
        ui.label(RichText::new(label).color(TEXT_SECONDARY));
    });
}
