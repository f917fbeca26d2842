//! Auth page — email/password sign in and sign up.

use egui::{self, Align, Layout, RichText, Vec2};
use crate::state::{AuthMode, UiState};
use crate::theme::*;

#[derive(Debug, Clone, PartialEq)]
pub enum AuthAction {
    SignIn { email: String, password: String },
    SignUp { email: String, password: String },
}

/// Render the auth form centered in `ui`.
pub fn auth_panel(ui: &mut egui::Ui, state: &mut UiState) -> Option<AuthAction> {
    let mut action = None;

    ui.with_layout(Layout::top_down(Align::Center), |ui| {
        ui.add_space(ui.available_height() * 0.2);
        egui::Frame::default()
            .fill(BG_SECONDARY)
            .corner_radius(PANEL_ROUNDING)
            .inner_margin(PANEL_PADDING * 2.0)
            .show(ui, |ui| {
                ui.set_width(FORM_WIDTH);
                ui.heading(RichText::new(state.auth_mode.title()).color(TEXT_PRIMARY).strong());
                ui.add_space(8.0);

                ui.label(RichText::new("Email").color(TEXT_SECONDARY).small());
                ui.add(
                    egui::TextEdit::singleline(&mut state.email)
                        .hint_text("you@example.com")
                        .desired_width(f32::INFINITY),
                );
                ui.add_space(4.0);

                ui.label(RichText::new("Password").color(TEXT_SECONDARY).small());
                let password = ui.add(
                    egui::TextEdit::singleline(&mut state.password)
                        .password(true)
                        .desired_width(f32::INFINITY),
                );
                ui.add_space(12.0);

                let enabled = !state.auth_pending && state.credentials().is_some();
                let submit = ui.add_enabled(
                    enabled,
                    egui::Button::new(RichText::new(state.auth_mode.title()).color(TEXT_PRIMARY).strong())
                        .fill(if enabled { ACCENT } else { BG_SURFACE })
                        .corner_radius(PANEL_ROUNDING)
                        .min_size(Vec2::new(FORM_WIDTH, 28.0)),
                );
                let enter = password.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

                if (submit.clicked() || (enter && enabled)) && !state.auth_pending {
                    if let Some((email, password)) = state.credentials() {
                        action = Some(match state.auth_mode {
                            AuthMode::SignIn => AuthAction::SignIn { email, password },
                            AuthMode::SignUp => AuthAction::SignUp { email, password },
                        });
                    }
                }

                if state.auth_pending {
                    ui.add_space(4.0);
                    ui.spinner();
                }

                ui.add_space(8.0);
                let switch_text = match state.auth_mode {
                    AuthMode::SignIn => "Don't have an account? Sign up",
                    AuthMode::SignUp => "Already have an account? Sign in",
                };
                if ui.link(RichText::new(switch_text).color(TEXT_SECONDARY).small()).clicked() {
                    state.auth_mode = state.auth_mode.toggled();
                }
            });
    });

    action
}
