use serde::Serialize;
use tera::Context;

use crate::models::Donation;
use crate::views::{Templates, LIST_TEMPLATE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    Loading,
    Empty,
    Populated(usize),
}

impl ListState {
    fn as_str(&self) -> &'static str {
        match self {
            ListState::Loading => "loading",
            ListState::Empty => "empty",
            ListState::Populated(_) => "populated",
        }
    }
}

/// Gate in front of the destructive action: a delete must be requested, then
/// confirmed. At most one row is armed at a time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeleteConfirmation {
    pending: Option<i64>,
}

impl DeleteConfirmation {
    pub fn request(&mut self, id: i64) {
        self.pending = Some(id);
    }

    pub fn pending(&self) -> Option<i64> {
        self.pending
    }

    /// Disarms the gate and hands back the id to delete, if one was armed.
    pub fn confirm(&mut self) -> Option<i64> {
        self.pending.take()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[derive(Serialize)]
struct RowView<'a> {
    id: i64,
    donor_name: &'a str,
    type_label: String,
    amount: String,
    date: String,
    saving: bool,
    confirm_prompt: Option<String>,
}

pub struct DonationList<'a> {
    donations: &'a [Donation],
    is_loading: bool,
    pending_delete: Option<i64>,
}

impl<'a> DonationList<'a> {
    pub fn new(donations: &'a [Donation], is_loading: bool) -> Self {
        Self {
            donations,
            is_loading,
            pending_delete: None,
        }
    }

    pub fn with_pending_delete(mut self, id: Option<i64>) -> Self {
        self.pending_delete = id;
        self
    }

    pub fn state(&self) -> ListState {
        if self.is_loading {
            ListState::Loading
        } else if self.donations.is_empty() {
            ListState::Empty
        } else {
            ListState::Populated(self.donations.len())
        }
    }

    pub fn count_label(&self) -> Option<String> {
        match self.state() {
            ListState::Populated(1) => Some("(1 donation)".to_string()),
            ListState::Populated(n) => Some(format!("({} donations)", n)),
            _ => None,
        }
    }

    pub fn render(&self, templates: &Templates) -> Result<String, tera::Error> {
        let rows: Vec<RowView<'_>> = match self.state() {
            ListState::Populated(_) => self.donations.iter().map(|d| self.row(d)).collect(),
            _ => Vec::new(),
        };

        let mut ctx = Context::new();
        ctx.insert("state", self.state().as_str());
        ctx.insert("count_label", &self.count_label());
        ctx.insert("rows", &rows);
        templates.render(LIST_TEMPLATE, &ctx)
    }

    fn row<'d>(&self, d: &'d Donation) -> RowView<'d> {
        let confirm_prompt = (self.pending_delete == Some(d.id)).then(|| {
            format!(
                "Are you sure you want to delete this donation from {}? This action cannot be undone.",
                d.donor_name
            )
        });
        RowView {
            id: d.id,
            donor_name: &d.donor_name,
            type_label: d.donation_type.label(),
            amount: format!("{:.2}", d.amount),
            date: d.date.format("%b %-d, %Y").to_string(),
            saving: d.is_temporary(),
            confirm_prompt,
        }
    }
}
