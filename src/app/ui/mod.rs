// src/app/ui/mod.rs
pub mod modals;
pub mod table;
pub mod topbar;

use eframe::egui as eg;

use crate::app::queue_button::ButtonStyle;
use crate::app::types::NoticeKind;
use crate::app::utils::Badge;

pub(crate) fn badge_color(badge: Badge) -> eg::Color32 {
    match badge {
        Badge::Info => eg::Color32::from_rgb(13, 202, 240),
        Badge::Warning => eg::Color32::from_rgb(255, 193, 7),
        Badge::Secondary => eg::Color32::from_rgb(108, 117, 125),
        Badge::Primary => eg::Color32::from_rgb(13, 110, 253),
        Badge::Success => eg::Color32::from_rgb(25, 135, 84),
        Badge::Danger => eg::Color32::from_rgb(220, 53, 69),
        Badge::Dark => eg::Color32::from_rgb(33, 37, 41),
    }
}

/// Rounded pill with dark or light text depending on the fill.
pub(crate) fn badge(ui: &mut eg::Ui, text: &str, kind: Badge) -> eg::Response {
    let fg = match kind {
        Badge::Info | Badge::Warning => eg::Color32::BLACK,
        _ => eg::Color32::WHITE,
    };
    eg::Frame::none()
        .fill(badge_color(kind))
        .rounding(eg::Rounding::same(6.0))
        .inner_margin(eg::Margin::symmetric(6.0, 2.0))
        .show(ui, |ui| {
            ui.label(eg::RichText::new(text).small().color(fg));
        })
        .response
}

pub(crate) fn button_fill(style: ButtonStyle) -> Option<eg::Color32> {
    match style {
        ButtonStyle::Outline => None,
        ButtonStyle::Positive => Some(badge_color(Badge::Success)),
        ButtonStyle::Negative => Some(badge_color(Badge::Danger)),
    }
}

impl crate::app::SceneBrowserApp {
    // ---------- TOASTS ----------
    pub(crate) fn ui_render_notices(&mut self, ctx: &eg::Context) {
        if self.browser.notices().is_empty() {
            return;
        }
        let mut dismiss: Option<usize> = None;
        eg::Area::new(eg::Id::new("notices"))
            .anchor(eg::Align2::RIGHT_TOP, eg::vec2(-12.0, 12.0))
            .order(eg::Order::Foreground)
            .show(ctx, |ui| {
                ui.set_max_width(360.0);
                for (idx, notice) in self.browser.notices().iter().enumerate() {
                    let (fill, title) = match notice.kind {
                        NoticeKind::Success => (badge_color(Badge::Success), "Success"),
                        NoticeKind::Error => (badge_color(Badge::Danger), "Error"),
                    };
                    eg::Frame::popup(ui.style())
                        .stroke(eg::Stroke::new(1.5, fill))
                        .show(ui, |ui| {
                            ui.horizontal(|ui| {
                                ui.label(eg::RichText::new(title).strong().color(fill));
                                ui.with_layout(
                                    eg::Layout::right_to_left(eg::Align::Center),
                                    |ui| {
                                        if ui.small_button("✕").clicked() {
                                            dismiss = Some(idx);
                                        }
                                    },
                                );
                            });
                            ui.label(&notice.text);
                        });
                    ui.add_space(6.0);
                }
            });
        if let Some(idx) = dismiss {
            self.browser.dismiss_notice(idx);
        }
    }
}
