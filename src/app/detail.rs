// src/app/detail.rs
use eframe::egui as eg;
use egui_extras::{Column, TableBuilder};

use crate::api::{QueueTarget, SceneDetail};
use crate::app::queue_button::AddToQueueButton;
use crate::app::types::Modal;
use crate::app::ui::{badge, button_fill};
use crate::app::utils::{self, Badge};
use crate::config::QueueKeyScheme;

pub const QUEUE_LABEL: &str = "Add to Whisparr";

/// Want-list target for a scene under the configured key scheme.
pub fn queue_target_for(scheme: QueueKeyScheme, scene: &SceneDetail) -> QueueTarget {
    let title = scene.summary.title.clone();
    match scheme {
        QueueKeyScheme::Scene => QueueTarget::Scene {
            scene_id: scene.summary.id.to_string(),
            title,
        },
        QueueKeyScheme::WantedScene => QueueTarget::WantedScene {
            scene_id: scene.summary.id.to_string(),
            title,
        },
        QueueKeyScheme::TitleYear => QueueTarget::TitleYear {
            title,
            year: scene
                .release_date
                .as_deref()
                .and_then(|d| d.get(..4))
                .and_then(|y| y.parse().ok()),
        },
    }
}

fn field(ui: &mut eg::Ui, name: &str, value: impl Into<eg::WidgetText>) {
    ui.label(eg::RichText::new(name).strong());
    ui.label(value);
    ui.end_row();
}

impl crate::app::SceneBrowserApp {
    pub(crate) fn ui_render_detail_window(&mut self, ctx: &eg::Context) {
        if self.browser.modal() != Some(Modal::SceneDetails) {
            return;
        }
        let Some(scene) = self.browser.detail().cloned() else {
            return;
        };

        // One button per opened scene; reopening another scene starts fresh.
        if self.queue_button.as_ref().map(|(id, _)| *id) != Some(scene.summary.id) {
            let target = queue_target_for(self.cfg.queue_scheme, &scene);
            self.queue_button = Some((scene.summary.id, AddToQueueButton::new(target, QUEUE_LABEL)));
        }

        let mut open = true;
        let mut create_exception = false;
        eg::Window::new("Scene details")
            .collapsible(false)
            .resizable(true)
            .default_width(640.0)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.horizontal_top(|ui| {
                    // Thumbnail
                    let size = eg::vec2(192.0, 108.0);
                    let tex = scene
                        .summary
                        .thumbnail_url
                        .as_deref()
                        .filter(|u| !u.is_empty())
                        .and_then(|url| self.thumbnail_texture(ctx, url));
                    match tex {
                        Some(tex) => {
                            ui.image((tex.id(), size));
                        }
                        None => {
                            let (rect, _) = ui.allocate_exact_size(size, eg::Sense::hover());
                            ui.painter().rect_filled(rect, 8.0, eg::Color32::from_gray(40));
                        }
                    }

                    ui.vertical(|ui| {
                        ui.heading(&scene.summary.title);
                        eg::Grid::new("scene_detail_fields")
                            .num_columns(2)
                            .spacing([12.0, 4.0])
                            .show(ui, |ui| {
                                let performers = if scene.summary.performers.is_empty() {
                                    "Unknown".to_string()
                                } else {
                                    scene.summary.performers.join(", ")
                                };
                                field(ui, "Performers", performers);
                                field(ui, "Studio", utils::or_unknown(scene.summary.studio.as_deref()));
                                field(
                                    ui,
                                    "Duration",
                                    scene
                                        .summary
                                        .duration_minutes
                                        .map_or_else(|| "Unknown".to_string(), |m| format!("{m} minutes")),
                                );
                                field(ui, "Release date", utils::or_unknown(scene.release_date.as_deref()));
                                let tags = if scene.tags.is_empty() {
                                    "None".to_string()
                                } else {
                                    scene.tags.join(", ")
                                };
                                field(ui, "Tags", tags);

                                ui.label(eg::RichText::new("Filter reason").strong());
                                badge(
                                    ui,
                                    &utils::format_filter_reason(&scene.summary.filter_reason),
                                    utils::filter_reason_badge(&scene.summary.filter_reason),
                                );
                                ui.end_row();

                                field(
                                    ui,
                                    "Filtered",
                                    utils::format_datetime(scene.summary.filtered_date.as_deref()),
                                );

                                ui.label(eg::RichText::new("Status").strong());
                                if scene.summary.is_exception {
                                    badge(ui, "Has exception", Badge::Success);
                                } else {
                                    badge(ui, "Filtered", Badge::Secondary);
                                }
                                ui.end_row();
                            });

                        ui.add_space(6.0);
                        ui.horizontal(|ui| {
                            if let Some(url) = scene.scene_url.as_deref().filter(|u| !u.is_empty()) {
                                if ui.button("View on Source ↗").clicked() {
                                    ctx.open_url(eg::OpenUrl::new_tab(url));
                                }
                            }
                            if !scene.summary.is_exception && ui.button("Create exception").clicked() {
                                create_exception = true;
                            }
                            if let Some((_, button)) = self.queue_button.as_mut() {
                                let mut b = eg::Button::new(button.label());
                                if let Some(fill) = button_fill(button.style()) {
                                    b = b.fill(fill);
                                }
                                if ui.add_enabled(button.enabled(), b).clicked() {
                                    button.click(self.queue_api.clone());
                                }
                            }
                        });
                    });
                });

                if !scene.exceptions.is_empty() {
                    ui.separator();
                    ui.label(eg::RichText::new("Exceptions").strong());
                    ui.push_id("scene_exceptions", |ui| {
                        TableBuilder::new(ui)
                            .striped(true)
                            .column(Column::auto())
                            .column(Column::remainder().at_least(160.0))
                            .column(Column::auto())
                            .column(Column::auto())
                            .column(Column::auto())
                            .header(20.0, |mut header| {
                                for title in ["Type", "Reason", "Created", "Expires", "Status"] {
                                    header.col(|ui| {
                                        ui.strong(title);
                                    });
                                }
                            })
                            .body(|mut body| {
                                for exc in &scene.exceptions {
                                    body.row(22.0, |mut row| {
                                        row.col(|ui| {
                                            badge(ui, &exc.exception_type, Badge::Info);
                                        });
                                        row.col(|ui| {
                                            ui.label(
                                                exc.reason
                                                    .as_deref()
                                                    .filter(|r| !r.is_empty())
                                                    .unwrap_or("No reason provided"),
                                            );
                                        });
                                        row.col(|ui| {
                                            ui.label(utils::format_date(exc.created_at.as_deref()));
                                        });
                                        row.col(|ui| {
                                            let expires = match exc.expires_at.as_deref() {
                                                Some(raw) if !raw.is_empty() => utils::format_date(Some(raw)),
                                                _ => "Never".to_string(),
                                            };
                                            ui.label(expires);
                                        });
                                        row.col(|ui| {
                                            if exc.is_active {
                                                badge(ui, "Active", Badge::Success);
                                            } else {
                                                badge(ui, "Inactive", Badge::Secondary);
                                            }
                                        });
                                    });
                                }
                            });
                    });
                }
            });

        if create_exception {
            self.exception_form = Default::default();
            self.browser.open_exception_modal(scene.summary.id);
        } else if !open {
            self.browser.close_modal();
            self.queue_button = None;
        }
    }
}
