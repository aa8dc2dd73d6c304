// src/app/ui/modals.rs
use chrono::Local;
use eframe::egui as eg;

use crate::api::{ExceptionKind, SceneId};
use crate::app::types::{ExceptionForm, Modal};
use crate::app::utils;

enum FormOutcome {
    Keep,
    Submit,
    Cancel,
}

/// Shared body of the single and bulk exception dialogs.
fn exception_form_ui(ui: &mut eg::Ui, form: &mut ExceptionForm, submit_label: &str) -> FormOutcome {
    let mut outcome = FormOutcome::Keep;

    ui.horizontal(|ui| {
        ui.label("Type");
        for kind in [ExceptionKind::Permanent, ExceptionKind::Temporary] {
            if ui.radio(form.kind == kind, kind.label()).clicked() {
                form.set_kind(kind, || utils::default_expiry(Local::now()));
            }
        }
    });

    if form.kind == ExceptionKind::Temporary {
        ui.horizontal(|ui| {
            ui.label("Expires at");
            ui.add(
                eg::TextEdit::singleline(&mut form.expires_at)
                    .hint_text("YYYY-MM-DDTHH:MM")
                    .desired_width(160.0),
            );
        });
    }

    ui.label("Reason");
    ui.add(
        eg::TextEdit::multiline(&mut form.reason)
            .hint_text("Why should this scene be allowed?")
            .desired_rows(3)
            .desired_width(f32::INFINITY),
    );
    ui.checkbox(&mut form.add_to_queue, "Also add to Whisparr");

    ui.separator();
    ui.horizontal(|ui| {
        if ui
            .add_enabled(form.is_submittable(), eg::Button::new(submit_label))
            .clicked()
        {
            outcome = FormOutcome::Submit;
        }
        if ui.button("Cancel").clicked() {
            outcome = FormOutcome::Cancel;
        }
    });
    outcome
}

impl crate::app::SceneBrowserApp {
    pub(crate) fn ui_render_modals(&mut self, ctx: &eg::Context) {
        match self.browser.modal() {
            Some(Modal::Exception { scene_id }) => self.ui_exception_window(ctx, scene_id),
            Some(Modal::BulkException) => self.ui_bulk_window(ctx),
            Some(Modal::Cleanup) => self.ui_cleanup_window(ctx),
            Some(Modal::SceneDetails) | None => {}
        }
    }

    fn ui_exception_window(&mut self, ctx: &eg::Context, scene_id: SceneId) {
        let title = self
            .browser
            .scene(scene_id)
            .map(|s| s.title.clone())
            .unwrap_or_else(|| format!("Scene {scene_id}"));

        let mut open = true;
        let mut outcome = FormOutcome::Keep;
        eg::Window::new("Create exception")
            .collapsible(false)
            .resizable(false)
            .default_width(380.0)
            .anchor(eg::Align2::CENTER_CENTER, eg::Vec2::ZERO)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label(eg::RichText::new(&title).strong());
                ui.add_space(6.0);
                outcome = exception_form_ui(ui, &mut self.exception_form, "Create exception");
            });

        match outcome {
            FormOutcome::Submit => {
                let form = &self.exception_form;
                self.browser.create_exception(
                    scene_id,
                    form.kind,
                    form.reason.trim(),
                    form.add_to_queue,
                    form.expires_at(),
                );
            }
            FormOutcome::Cancel => self.browser.close_modal(),
            FormOutcome::Keep if !open => self.browser.close_modal(),
            FormOutcome::Keep => {}
        }
    }

    fn ui_bulk_window(&mut self, ctx: &eg::Context) {
        let count = self.browser.selected().len();
        let mut open = true;
        let mut outcome = FormOutcome::Keep;
        eg::Window::new("Bulk exceptions")
            .collapsible(false)
            .resizable(false)
            .default_width(380.0)
            .anchor(eg::Align2::CENTER_CENTER, eg::Vec2::ZERO)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label(format!("Create exceptions for {count} selected scenes."));
                ui.add_space(6.0);
                outcome = exception_form_ui(ui, &mut self.bulk_form, "Create exceptions");
            });

        match outcome {
            FormOutcome::Submit => {
                let form = self.bulk_form.clone();
                self.browser.create_bulk_exceptions(
                    form.kind,
                    form.reason.trim(),
                    form.add_to_queue,
                    form.expires_at(),
                );
            }
            FormOutcome::Cancel => self.browser.close_modal(),
            FormOutcome::Keep if !open => self.browser.close_modal(),
            FormOutcome::Keep => {}
        }
    }

    fn ui_cleanup_window(&mut self, ctx: &eg::Context) {
        let mut open = true;
        let mut confirmed = false;
        let mut cancel = false;
        eg::Window::new("Cleanup old records")
            .collapsible(false)
            .resizable(false)
            .default_width(360.0)
            .anchor(eg::Align2::CENTER_CENTER, eg::Vec2::ZERO)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Keep records from the last");
                    ui.add(eg::DragValue::new(&mut self.cleanup_days).clamp_range(1..=3650));
                    ui.label("days");
                });
                ui.add_space(4.0);
                ui.label(
                    eg::RichText::new(format!(
                        "Filtered-scene records older than {} days will be permanently deleted.",
                        self.cleanup_days
                    ))
                    .color(ui.visuals().warn_fg_color),
                );
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Delete old records").clicked() {
                        confirmed = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                });
            });

        if confirmed {
            self.browser.perform_cleanup(self.cleanup_days);
        } else if cancel || !open {
            self.browser.close_modal();
        }
    }
}
