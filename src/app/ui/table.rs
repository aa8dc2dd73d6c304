// src/app/ui/table.rs
use eframe::egui as eg;
use egui_extras::{Column, TableBuilder};

use crate::api::SceneId;
use crate::app::ui::badge;
use crate::app::view::{self, PageItem, RowAction, TableView};

pub const ROW_H: f32 = 64.0;
pub const THUMB_W: f32 = 96.0;
pub const THUMB_H: f32 = 54.0;

/// What a click inside the table asks for; applied after the table is drawn.
enum TableClick {
    Toggle(SceneId),
    ToggleAll,
    Row(SceneId, RowAction),
}

fn thumb_placeholder(ui: &mut eg::Ui) {
    let (rect, _) = ui.allocate_exact_size(eg::vec2(THUMB_W, THUMB_H), eg::Sense::hover());
    ui.painter().rect_filled(rect, 4.0, eg::Color32::from_gray(40));
    ui.painter().text(
        rect.center(),
        eg::Align2::CENTER_CENTER,
        "🖼",
        eg::FontId::proportional(16.0),
        eg::Color32::from_gray(110),
    );
}

impl crate::app::SceneBrowserApp {
    // ---------- SCENE TABLE ----------
    pub(crate) fn ui_render_table(&mut self, ui: &mut eg::Ui, ctx: &eg::Context) {
        let rows = match self.browser.table() {
            TableView::Empty => {
                ui.vertical_centered(|ui| {
                    ui.add_space(48.0);
                    if self.browser.is_loading() {
                        ui.add(eg::Spinner::new().size(20.0));
                    } else {
                        ui.heading(view::EMPTY_TITLE);
                        ui.label(eg::RichText::new(view::EMPTY_HINT).weak());
                    }
                });
                return;
            }
            TableView::Rows(rows) => rows,
        };

        let mut clicks: Vec<TableClick> = Vec::new();
        let mut all_checked = self.browser.select_all_checked();

        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(eg::Layout::left_to_right(eg::Align::Center))
            .column(Column::exact(24.0)) // checkbox
            .column(Column::exact(THUMB_W + 8.0)) // thumbnail
            .column(Column::initial(320.0).at_least(180.0)) // title
            .column(Column::initial(200.0)) // performers
            .column(Column::initial(140.0)) // studio
            .column(Column::initial(140.0)) // reason
            .column(Column::initial(100.0)) // filtered on
            .column(Column::initial(90.0)) // status
            .column(Column::remainder().at_least(160.0)) // actions
            .header(22.0, |mut header| {
                header.col(|ui| {
                    if ui.checkbox(&mut all_checked, "").changed() {
                        clicks.push(TableClick::ToggleAll);
                    }
                });
                for title in [
                    "",
                    "Title",
                    "Performers",
                    "Studio",
                    "Filter reason",
                    "Filtered",
                    "Status",
                    "Actions",
                ] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_H, rows.len(), |mut row| {
                    let Some(r) = rows.get(row.index()) else {
                        return;
                    };
                    row.set_selected(r.checked);

                    row.col(|ui| {
                        let mut checked = r.checked;
                        if ui.checkbox(&mut checked, "").changed() {
                            clicks.push(TableClick::Toggle(r.id));
                        }
                    });
                    row.col(|ui| {
                        let tex = r
                            .thumbnail_url
                            .as_deref()
                            .and_then(|url| self.thumbnail_texture(ctx, url));
                        match tex {
                            Some(tex) => {
                                ui.image((tex.id(), eg::vec2(THUMB_W, THUMB_H)));
                            }
                            None => thumb_placeholder(ui),
                        }
                    });
                    row.col(|ui| {
                        ui.vertical(|ui| {
                            ui.add(eg::Label::new(eg::RichText::new(&r.title).strong()).truncate());
                            if let Some(d) = &r.duration {
                                ui.label(eg::RichText::new(d).small().weak());
                            }
                        });
                    });
                    row.col(|ui| {
                        let resp = ui.label(&r.performers);
                        if r.more_performers > 0 {
                            ui.label(
                                eg::RichText::new(format!("+{} more", r.more_performers))
                                    .small()
                                    .weak(),
                            );
                            resp.on_hover_text(&r.performers_full);
                        }
                    });
                    row.col(|ui| {
                        ui.label(&r.studio);
                    });
                    row.col(|ui| {
                        badge(ui, &r.reason_label, r.reason_badge);
                    });
                    row.col(|ui| {
                        ui.label(&r.filtered_on);
                    });
                    row.col(|ui| {
                        if r.is_exception {
                            badge(ui, "Exception", crate::app::utils::Badge::Success);
                        } else {
                            badge(ui, "Filtered", crate::app::utils::Badge::Secondary);
                        }
                    });
                    row.col(|ui| {
                        for action in &r.actions {
                            let (label, hint) = match action {
                                RowAction::ViewDetails => ("Details", "View scene details"),
                                RowAction::CreateException => ("Add exception", "Create exception"),
                                RowAction::ManageException => ("Manage", "Manage exception"),
                            };
                            if ui.small_button(label).on_hover_text(hint).clicked() {
                                clicks.push(TableClick::Row(r.id, *action));
                            }
                        }
                    });
                });
            });

        for click in clicks {
            match click {
                TableClick::Toggle(id) => self.browser.toggle_scene_selection(id),
                TableClick::ToggleAll => self.browser.toggle_select_all(),
                TableClick::Row(id, RowAction::CreateException) => {
                    self.exception_form = Default::default();
                    self.browser.open_exception_modal(id);
                }
                TableClick::Row(id, RowAction::ViewDetails | RowAction::ManageException) => {
                    self.browser.show_scene_details(id);
                }
            }
        }
    }

    // ---------- PAGINATION ----------
    pub(crate) fn ui_render_pagination(&mut self, ui: &mut eg::Ui) {
        let items = self.browser.page_items();
        let mut goto: Option<u32> = None;

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            if let Some(p) = self.browser.pagination() {
                ui.label(
                    eg::RichText::new(format!("{} scenes · page {} of {}", p.total, p.page, p.pages.max(1)))
                        .weak(),
                );
                ui.separator();
            }
            for item in items {
                match item {
                    PageItem::Prev { target, enabled } => {
                        if ui.add_enabled(enabled, eg::Button::new("‹ Previous")).clicked() {
                            goto = Some(target);
                        }
                    }
                    PageItem::Page { number, active } => {
                        if ui.selectable_label(active, number.to_string()).clicked() && !active {
                            goto = Some(number);
                        }
                    }
                    PageItem::Ellipsis => {
                        ui.label("…");
                    }
                    PageItem::Next { target, enabled } => {
                        if ui.add_enabled(enabled, eg::Button::new("Next ›")).clicked() {
                            goto = Some(target);
                        }
                    }
                }
            }
        });
        ui.add_space(4.0);

        if let Some(page) = goto {
            self.browser.load_filtered_scenes(page);
        }
    }
}
