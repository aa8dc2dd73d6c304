use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use itertools::Itertools;

/// Active listing filters: field name -> non-empty, trimmed value.
pub type FilterCriteria = BTreeMap<String, String>;

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

pub const EXCEPTION_STATUS_OPTIONS: [(&str, &str); 3] = [
    ("", "All scenes"),
    ("filtered", "Filtered only"),
    ("exception", "Exceptions only"),
];

/// Editable contents of the filter bar.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterForm {
    pub search: String,
    pub filter_reason: String,
    pub exception_status: String,
    pub date_from: String,
    pub date_to: String,
}

impl FilterForm {
    pub fn fields(&self) -> [(&'static str, &str); 5] {
        [
            ("search", &self.search),
            ("filter_reason", &self.filter_reason),
            ("exception_status", &self.exception_status),
            ("date_from", &self.date_from),
            ("date_to", &self.date_to),
        ]
    }

    /// Blank and whitespace-only fields are left out entirely.
    pub fn criteria(&self) -> FilterCriteria {
        self.fields()
            .into_iter()
            .filter_map(|(k, v)| {
                let v = v.trim();
                (!v.is_empty()).then(|| (k.to_string(), v.to_string()))
            })
            .collect()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn encode_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .join("&")
}

/// `filters..., page, per_page` in that order.
pub fn listing_query(filters: &FilterCriteria, page: u32, per_page: u32) -> String {
    let page = page.to_string();
    let per_page = per_page.to_string();
    encode_pairs(
        filters
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain([("page", page.as_str()), ("per_page", per_page.as_str())]),
    )
}

pub fn export_query(filters: &FilterCriteria) -> String {
    encode_pairs(
        filters
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain([("export", "true")]),
    )
}

/// Re-apply filters a short while after the last keystroke in the search box.
#[derive(Debug, Default)]
pub struct SearchDebounce {
    due: Option<Instant>,
}

impl SearchDebounce {
    pub fn touch(&mut self, now: Instant) {
        self.due = Some(now + SEARCH_DEBOUNCE);
    }

    pub fn cancel(&mut self) {
        self.due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.due.is_some()
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.due.map(|due| due.saturating_duration_since(now))
    }

    /// True exactly once, when the quiet period has elapsed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                true
            }
            _ => false,
        }
    }
}

/// Tracks an edit in a date box so focus loss only re-applies filters when
/// the text actually changed.
#[derive(Debug, Default)]
pub struct DateFieldEdit {
    dirty: bool,
}

impl DateFieldEdit {
    /// Feed one frame of the field's response; true when filters should apply.
    pub fn observe(&mut self, changed: bool, lost_focus: bool) -> bool {
        self.dirty |= changed;
        if lost_focus {
            return std::mem::take(&mut self.dirty);
        }
        false
    }

    pub fn reset(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_form_has_no_criteria() {
        assert!(FilterForm::default().criteria().is_empty());
    }

    #[test]
    fn whitespace_only_fields_are_absent() {
        let form = FilterForm {
            search: "   ".into(),
            date_from: "\t".into(),
            filter_reason: " unwanted_tags ".into(),
            ..Default::default()
        };
        let c = form.criteria();
        assert_eq!(c.len(), 1);
        assert_eq!(c.get("filter_reason").map(String::as_str), Some("unwanted_tags"));
    }

    #[test]
    fn search_query_scenario() {
        let form = FilterForm {
            search: "foo".into(),
            ..Default::default()
        };
        let q = listing_query(&form.criteria(), 1, 20);
        assert!(q.contains("search=foo&page=1&per_page=20"), "{q}");
    }

    #[test]
    fn values_are_url_encoded() {
        let mut c = FilterCriteria::new();
        c.insert("search".into(), "a&b c".into());
        assert_eq!(listing_query(&c, 2, 20), "search=a%26b%20c&page=2&per_page=20");
    }

    #[test]
    fn export_query_appends_flag() {
        let mut c = FilterCriteria::new();
        c.insert("filter_reason".into(), "date_range".into());
        assert_eq!(export_query(&c), "filter_reason=date_range&export=true");
        assert_eq!(export_query(&FilterCriteria::new()), "export=true");
    }

    #[test]
    fn debounce_fires_once_after_quiet_period() {
        let t0 = Instant::now();
        let mut d = SearchDebounce::default();
        d.touch(t0);
        assert!(!d.fire(t0 + Duration::from_millis(100)));
        d.touch(t0 + Duration::from_millis(300));
        assert!(!d.fire(t0 + Duration::from_millis(600)));
        assert!(d.fire(t0 + Duration::from_millis(800)));
        assert!(!d.fire(t0 + Duration::from_millis(900)));
    }

    #[test]
    fn date_focus_loss_without_edit_does_nothing() {
        let mut edit = DateFieldEdit::default();
        assert!(!edit.observe(false, true));

        assert!(!edit.observe(true, false));
        assert!(!edit.observe(false, false));
        assert!(edit.observe(false, true));
        assert!(!edit.observe(false, true));

        edit.observe(true, false);
        edit.reset();
        assert!(!edit.observe(false, true));
    }
}
