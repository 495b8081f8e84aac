//! Display ordering and paging for the kiosk board.
//!
//! The board cycles through pages of a fixed size. Finished cars lead the
//! list (sorted by plate) so customers see them first; cars still in the shop
//! follow in order of estimated finish, unknown finish times last.

use std::cmp::Ordering;

use super::repair::{RepairRecord, RepairStatus};

pub const DEFAULT_ITEMS_PER_PAGE: usize = 4;

/// Sort records the way the board shows them.
pub fn order_for_display(mut records: Vec<RepairRecord>) -> Vec<RepairRecord> {
    records.sort_by(display_cmp);
    records
}

fn display_cmp(a: &RepairRecord, b: &RepairRecord) -> Ordering {
    let a_done = a.status == RepairStatus::Completed;
    let b_done = b.status == RepairStatus::Completed;
    match (a_done, b_done) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) => a.license_plate.cmp(&b.license_plate),
        (false, false) => match (a.estimated_finish_at, b.estimated_finish_at) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

/// Per-status counts shown in the board header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSummary {
    pub completed: usize,
    pub final_inspection: usize,
    pub in_progress: usize,
}

impl StatusSummary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a RepairRecord>) -> Self {
        let mut summary = Self::default();
        for r in records {
            match r.status {
                RepairStatus::Completed => summary.completed += 1,
                RepairStatus::FinalInspection => summary.final_inspection += 1,
                RepairStatus::InProgress => summary.in_progress += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.completed + self.final_inspection + self.in_progress
    }
}

impl std::fmt::Display for StatusSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "completed: {}, final inspection: {}, in progress: {}",
            self.completed, self.final_inspection, self.in_progress
        )
    }
}

/// Rotating page cursor over the sorted list.
#[derive(Debug, Clone)]
pub struct Pager {
    items_per_page: usize,
    page: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(DEFAULT_ITEMS_PER_PAGE)
    }
}

impl Pager {
    pub fn new(items_per_page: usize) -> Self {
        Self {
            items_per_page: items_per_page.max(1),
            page: 0,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.items_per_page)
    }

    /// Items on the current page. The list may have shrunk since the last
    /// advance; an out-of-range page restarts from the first.
    pub fn current<'a>(&mut self, sorted: &'a [RepairRecord]) -> &'a [RepairRecord] {
        if self.page >= self.page_count(sorted.len()) {
            self.page = 0;
        }
        let start = self.page * self.items_per_page;
        let end = (start + self.items_per_page).min(sorted.len());
        &sorted[start.min(end)..end]
    }

    /// Move to the next page, wrapping to the first after the last.
    pub fn advance(&mut self, total: usize) {
        self.page += 1;
        if self.page >= self.page_count(total) {
            self.page = 0;
        }
    }
}

/// Sample records for demo mode.
pub fn demo_records() -> Vec<RepairRecord> {
    use RepairStatus::*;
    let hm = |h: u32, m: u32| h * 60 + m;
    let hms = |h: u32, m: u32| h * 3600 + m * 60;
    vec![
        RepairRecord::new("001가111", "Sonata", InProgress)
            .with_requested_at(Some(hms(8, 30)))
            .with_estimated_finish_at(Some(hm(10, 30))),
        RepairRecord::new("002나222", "Avante MD", InProgress)
            .with_requested_at(Some(hms(9, 15)))
            .with_estimated_finish_at(Some(hm(12, 15))),
        RepairRecord::new("003다333", "i30", FinalInspection)
            .with_requested_at(Some(hms(10, 0)))
            .with_estimated_finish_at(Some(hm(13, 30))),
        RepairRecord::new("004라444", "Morning", Completed).with_requested_at(Some(hms(7, 45))),
        RepairRecord::new("005마555", "K3", InProgress)
            .with_requested_at(Some(hms(11, 20)))
            .with_estimated_finish_at(Some(hm(15, 30))),
        RepairRecord::new("006바677", "Tucson", InProgress)
            .with_requested_at(Some(hms(8, 0)))
            .with_estimated_finish_at(Some(hm(9, 45))),
        RepairRecord::new("007사777", "Grandeur", FinalInspection)
            .with_requested_at(Some(hms(9, 30)))
            .with_estimated_finish_at(Some(hm(11, 20))),
        RepairRecord::new("008아888", "Spark", InProgress)
            .with_requested_at(Some(hms(10, 45)))
            .with_estimated_finish_at(Some(hm(14, 30))),
        RepairRecord::new("009자999", "Ray", InProgress)
            .with_requested_at(Some(hms(12, 0)))
            .with_estimated_finish_at(Some(hm(15, 30))),
        RepairRecord::new("010차100", "Staria", Completed).with_requested_at(Some(hms(6, 30))),
    ]
}
