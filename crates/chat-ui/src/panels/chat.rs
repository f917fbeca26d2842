//! Chat panel — message history, composer and account actions.

use egui::{self, Align, Layout, RichText, ScrollArea, Vec2};
use chat_types::message::ChatMessage;
use crate::state::UiState;
use crate::theme::*;

/// What the user asked for this frame
#[derive(Debug, Clone, PartialEq)]
pub enum ChatAction {
    Send { text: String, image: Option<String> },
    ClearHistory,
    SignOut,
}

/// Read-only view of the stores for one frame
pub struct ChatView<'a> {
    pub messages: &'a [ChatMessage],
    pub loading: bool,
    pub busy: bool,
    pub user_label: &'a str,
}

/// Render the chat panel. Returns an action when the user triggers one.
pub fn chat_panel(ui: &mut egui::Ui, state: &mut UiState, view: &ChatView<'_>) -> Option<ChatAction> {
    let mut action = None;

    egui::Frame::default()
        .fill(BG_PRIMARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                // Header
                ui.horizontal(|ui| {
                    ui.heading(RichText::new("Chat").color(TEXT_PRIMARY).strong());
                    ui.label(RichText::new(view.user_label).color(TEXT_SECONDARY).small());
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if ui.button("Sign out").clicked() {
                            action = Some(ChatAction::SignOut);
                        }
                        let can_clear = !view.messages.is_empty() && !view.busy;
                        if ui.add_enabled(can_clear, egui::Button::new("Clear history")).clicked() {
                            action = Some(ChatAction::ClearHistory);
                        }
                        let status_color = if view.busy { WARNING } else { SUCCESS };
                        ui.label(RichText::new(&state.status_text).color(status_color).small());
                    });
                });

                ui.separator();

                // Messages area
                let available_height = ui.available_height() - 90.0;
                ScrollArea::vertical()
                    .max_height(available_height)
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        if view.loading {
                            ui.horizontal(|ui| {
                                ui.spinner();
                                ui.label(RichText::new("Loading messages...").color(TEXT_SECONDARY));
                            });
                        } else if view.messages.is_empty() {
                            ui.label(
                                RichText::new("No messages yet. Say hello!")
                                    .color(TEXT_SECONDARY)
                                    .italics(),
                            );
                        }

                        for message in view.messages {
                            render_message(ui, message);
                            ui.add_space(4.0);
                        }

                        if view.busy {
                            ui.horizontal(|ui| {
                                ui.spinner();
                                ui.label(RichText::new("AI is typing...").color(TEXT_SECONDARY).small());
                            });
                        }
                    });

                ui.add_space(8.0);

                // Input area
                ui.add(
                    egui::TextEdit::singleline(&mut state.image_url)
                        .hint_text("Image URL (optional)")
                        .desired_width(ui.available_width()),
                );
                ui.horizontal(|ui| {
                    let input = egui::TextEdit::singleline(&mut state.input_text)
                        .hint_text("Type a message...")
                        .desired_width(ui.available_width() - 70.0)
                        .font(egui::FontId::proportional(14.0));

                    let response = ui.add(input);

                    let has_content =
                        !state.input_text.trim().is_empty() || !state.image_url.trim().is_empty();
                    let send_enabled = has_content && !view.busy;
                    let send_btn = ui.add_enabled(
                        send_enabled,
                        egui::Button::new(RichText::new("Send").color(TEXT_PRIMARY))
                            .fill(if send_enabled { ACCENT } else { BG_SURFACE })
                            .corner_radius(PANEL_ROUNDING)
                            .min_size(Vec2::new(60.0, 0.0)),
                    );

                    let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    if (enter && send_enabled) || send_btn.clicked() {
                        if let Some((text, image)) = state.take_submission() {
                            action = Some(ChatAction::Send { text, image });
                        }
                        response.request_focus();
                    }
                });
            });
        });

    action
}

fn render_message(ui: &mut egui::Ui, message: &ChatMessage) {
    let (label_color, bg, layout) = if message.is_ai {
        (SUCCESS, AI_BUBBLE, Layout::left_to_right(Align::TOP))
    } else {
        (ACCENT, USER_BUBBLE, Layout::right_to_left(Align::TOP))
    };

    ui.with_layout(layout, |ui| {
        egui::Frame::default()
            .fill(bg)
            .corner_radius(PANEL_ROUNDING)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.set_max_width(ui.available_width() * 0.8);
                ui.vertical(|ui| {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(message.author_label()).color(label_color).strong().small());
                        ui.label(
                            RichText::new(message.created_at.format("%H:%M").to_string())
                                .color(TEXT_SECONDARY)
                                .small(),
                        );
                    });
                    if let Some(url) = &message.image_url {
                        ui.hyperlink_to(RichText::new("Attached image").small(), url);
                    }
                    if !message.content.is_empty() {
                        ui.label(RichText::new(&message.content).color(TEXT_PRIMARY));
                    }
                });
            });
    });
}
