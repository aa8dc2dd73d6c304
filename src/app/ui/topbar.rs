// src/app/ui/topbar.rs
use std::time::Instant;

use eframe::egui as eg;

use crate::app::filters::EXCEPTION_STATUS_OPTIONS;
use crate::app::types::Modal;
use crate::app::utils;
use crate::app::view;

fn stat_card(ui: &mut eg::Ui, title: &str, value: &str, sub: Option<&str>) {
    eg::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_min_width(150.0);
        ui.vertical(|ui| {
            ui.label(eg::RichText::new(title).small().weak());
            ui.label(eg::RichText::new(value).heading().strong());
            if let Some(sub) = sub {
                ui.label(eg::RichText::new(sub).small().weak());
            }
        });
    });
}

impl crate::app::SceneBrowserApp {
    // ---------- STATS + ACTIONS ----------
    pub(crate) fn ui_render_stats(&mut self, ui: &mut eg::Ui, ctx: &eg::Context) {
        let cards = view::stats_cards(self.browser.stats());
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            stat_card(ui, "Total filtered", &cards.total_filtered, None);
            stat_card(ui, "Exceptions", &cards.total_exceptions, None);
            stat_card(ui, "Exception rate", &cards.exception_rate, None);
            stat_card(
                ui,
                "Top filter reason",
                &cards.top_reason,
                Some(&cards.top_reason_count),
            );

            ui.with_layout(eg::Layout::right_to_left(eg::Align::Center), |ui| {
                if ui
                    .button("Cleanup…")
                    .on_hover_text("Delete old filtered-scene records")
                    .clicked()
                {
                    self.browser.open_cleanup_modal();
                }
                if ui.button("Export CSV").clicked() {
                    let link = self.browser.export_data();
                    ctx.open_url(eg::OpenUrl::new_tab(&link.url));
                }
                let refreshing = self.browser.is_refreshing();
                let label = if refreshing { "Refreshing…" } else { "Refresh" };
                if ui.add_enabled(!refreshing, eg::Button::new(label)).clicked() {
                    self.browser.refresh_data();
                }
            });
        });
        ui.add_space(4.0);
    }

    // ---------- FILTER BAR ----------
    pub(crate) fn ui_render_filters(&mut self, ui: &mut eg::Ui) {
        let mut apply_now = false;
        let mut clear = false;

        ui.add_space(4.0);
        ui.horizontal_wrapped(|ui| {
            // Search: debounced
            let resp = ui.add(
                eg::TextEdit::singleline(&mut self.filter_form.search)
                    .hint_text("Search title, performer, studio…")
                    .desired_width(220.0),
            );
            if resp.changed() {
                self.search_debounce.touch(Instant::now());
            }
            if resp.lost_focus() && ui.input(|i| i.key_pressed(eg::Key::Enter)) {
                apply_now = true;
            }

            ui.separator();

            // Filter reason
            let reason_text = if self.filter_form.filter_reason.is_empty() {
                "All reasons".to_string()
            } else {
                utils::format_filter_reason(&self.filter_form.filter_reason)
            };
            eg::ComboBox::from_id_source("filter_reason_combo")
                .selected_text(reason_text)
                .show_ui(ui, |ui| {
                    apply_now |= ui
                        .selectable_value(&mut self.filter_form.filter_reason, String::new(), "All reasons")
                        .clicked();
                    for (code, label) in utils::known_filter_reasons() {
                        apply_now |= ui
                            .selectable_value(&mut self.filter_form.filter_reason, code.to_string(), label)
                            .clicked();
                    }
                });

            // Exception status
            let status_text = EXCEPTION_STATUS_OPTIONS
                .iter()
                .find(|(v, _)| *v == self.filter_form.exception_status)
                .map_or(self.filter_form.exception_status.as_str(), |(_, label)| *label)
                .to_string();
            eg::ComboBox::from_id_source("exception_status_combo")
                .selected_text(status_text)
                .show_ui(ui, |ui| {
                    for (value, label) in EXCEPTION_STATUS_OPTIONS {
                        apply_now |= ui
                            .selectable_value(
                                &mut self.filter_form.exception_status,
                                value.to_string(),
                                label,
                            )
                            .clicked();
                    }
                });

            ui.separator();

            // Dates: applied on Enter / focus loss
            ui.label("From");
            let from = ui.add(
                eg::TextEdit::singleline(&mut self.filter_form.date_from)
                    .hint_text("YYYY-MM-DD")
                    .desired_width(90.0),
            );
            ui.label("To");
            let to = ui.add(
                eg::TextEdit::singleline(&mut self.filter_form.date_to)
                    .hint_text("YYYY-MM-DD")
                    .desired_width(90.0),
            );
            apply_now |= self.date_from_edit.observe(from.changed(), from.lost_focus());
            apply_now |= self.date_to_edit.observe(to.changed(), to.lost_focus());

            ui.separator();

            if ui.button("Apply").clicked() {
                apply_now = true;
            }
            if ui.button("Clear").clicked() {
                clear = true;
            }
            if self.browser.is_loading() {
                ui.add(eg::Spinner::new().size(14.0));
                ui.label(eg::RichText::new("Loading…").weak());
            }
        });
        ui.add_space(4.0);

        if clear {
            self.search_debounce.cancel();
            self.date_from_edit.reset();
            self.date_to_edit.reset();
            self.browser.clear_filters(&mut self.filter_form);
        } else if apply_now {
            self.search_debounce.cancel();
            self.browser.apply_filters(&self.filter_form);
        }
    }

    // ---------- BULK ACTION BAR ----------
    pub(crate) fn ui_render_bulk_bar(&mut self, ui: &mut eg::Ui) {
        if !self.browser.bulk_bar_visible() {
            return;
        }
        ui.separator();
        ui.horizontal(|ui| {
            let n = self.browser.selected().len();
            ui.label(eg::RichText::new(format!("{n} selected")).strong());
            if ui.button("Create exceptions…").clicked() {
                self.browser.open_bulk_exception_modal();
                if self.browser.modal() == Some(Modal::BulkException) {
                    self.bulk_form = Default::default();
                }
            }
            if ui.button("Deselect all").clicked() {
                self.browser.deselect_all();
            }
        });
        ui.add_space(4.0);
    }
}
