//! Pure view models for the scene table and its pagination strip.
//!
//! Both are rebuilt from scratch every frame from (scenes, selection,
//! pagination); the egui layer only paints what these functions return.

use std::collections::BTreeSet;

use crate::api::{Pagination, SceneId, SceneSummary, StatsSummary};
use crate::app::utils::{self, Badge};

pub const EMPTY_TITLE: &str = "No filtered scenes found matching your criteria";
pub const EMPTY_HINT: &str = "Try adjusting your filters or search terms";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowAction {
    ViewDetails,
    CreateException,
    ManageException,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RowView {
    pub id: SceneId,
    pub title: String,
    pub duration: Option<String>,
    pub performers: String,
    pub performers_full: String,
    pub more_performers: usize,
    pub studio: String,
    pub reason_label: String,
    pub reason_badge: Badge,
    pub filtered_on: String,
    pub is_exception: bool,
    pub checked: bool,
    pub thumbnail_url: Option<String>,
    pub actions: Vec<RowAction>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TableView {
    Empty,
    Rows(Vec<RowView>),
}

pub fn row_actions(is_exception: bool) -> Vec<RowAction> {
    let toggle = if is_exception {
        RowAction::ManageException
    } else {
        RowAction::CreateException
    };
    vec![RowAction::ViewDetails, toggle]
}

pub fn build_row(scene: &SceneSummary, selected: &BTreeSet<SceneId>) -> RowView {
    let (performers, more_performers) = utils::performers_summary(&scene.performers);
    RowView {
        id: scene.id,
        title: scene.title.clone(),
        duration: scene.duration_minutes.map(|m| format!("{m}min")),
        performers,
        performers_full: scene.performers.join(", "),
        more_performers,
        studio: utils::or_unknown(scene.studio.as_deref()).to_string(),
        reason_label: utils::format_filter_reason(&scene.filter_reason),
        reason_badge: utils::filter_reason_badge(&scene.filter_reason),
        filtered_on: utils::format_date(scene.filtered_date.as_deref()),
        is_exception: scene.is_exception,
        checked: selected.contains(&scene.id),
        thumbnail_url: scene.thumbnail_url.clone().filter(|u| !u.is_empty()),
        actions: row_actions(scene.is_exception),
    }
}

pub fn build_table(scenes: &[SceneSummary], selected: &BTreeSet<SceneId>) -> TableView {
    if scenes.is_empty() {
        return TableView::Empty;
    }
    TableView::Rows(scenes.iter().map(|s| build_row(s, selected)).collect())
}

/// Header cards: total filtered, total exceptions, exception rate, top reason.
/// The top-reason card carries a sub-line with its scene count.
#[derive(Clone, Debug, PartialEq)]
pub struct StatsCards {
    pub total_filtered: String,
    pub total_exceptions: String,
    pub exception_rate: String,
    pub top_reason: String,
    pub top_reason_count: String,
}

pub fn stats_cards(stats: Option<&StatsSummary>) -> StatsCards {
    let stats = stats.cloned().unwrap_or_default();
    let (top_reason, top_reason_count) = match stats.top_reason() {
        Some(top) => (
            utils::format_filter_reason(&top.reason),
            format!("{} scenes", top.count),
        ),
        None => ("None".to_string(), "No data".to_string()),
    };
    StatsCards {
        total_filtered: stats.total_filtered.to_string(),
        total_exceptions: stats.total_exceptions.to_string(),
        exception_rate: format!("{}%", stats.exception_rate),
        top_reason,
        top_reason_count,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageItem {
    Prev { target: u32, enabled: bool },
    Page { number: u32, active: bool },
    Ellipsis,
    Next { target: u32, enabled: bool },
}

/// Window of two pages either side of the current one, with first/last
/// anchors and ellipses. Empty when everything fits on one page.
pub fn pagination_items(p: &Pagination) -> Vec<PageItem> {
    if p.pages <= 1 {
        return Vec::new();
    }
    let current = p.page.clamp(1, p.pages);
    let start = current.saturating_sub(2).max(1);
    let end = (current + 2).min(p.pages);

    let mut out = vec![PageItem::Prev {
        target: current.saturating_sub(1).max(1),
        enabled: p.has_prev,
    }];
    if start > 1 {
        out.push(PageItem::Page {
            number: 1,
            active: false,
        });
        if start > 2 {
            out.push(PageItem::Ellipsis);
        }
    }
    for n in start..=end {
        out.push(PageItem::Page {
            number: n,
            active: n == current,
        });
    }
    if end < p.pages {
        if end + 1 < p.pages {
            out.push(PageItem::Ellipsis);
        }
        out.push(PageItem::Page {
            number: p.pages,
            active: false,
        });
    }
    out.push(PageItem::Next {
        target: (current + 1).min(p.pages),
        enabled: p.has_next,
    });
    out
}
