use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tera::Context;
use thiserror::Error;

use crate::models::{Donation, DonationType, NewDonation};
use crate::views::{Templates, FORM_TEMPLATE};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("unknown donation type: {0}")]
    InvalidType(String),
    #[error("amount must be a non-negative number in steps of 0.01, got {0:?}")]
    InvalidAmount(String),
    #[error("date must be YYYY-MM-DD, got {0:?}")]
    InvalidDate(String),
}

/// The text the user is typing. Everything stays a string until submission,
/// the way the browser inputs hold it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDraft {
    #[serde(default)]
    pub donor_name: String,
    #[serde(default)]
    pub donation_type: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub date: String,
}

impl FormDraft {
    pub fn blank() -> Self {
        Self {
            donor_name: String::new(),
            donation_type: String::new(),
            amount: String::new(),
            date: today(),
        }
    }

    pub fn from_donation(d: &Donation) -> Self {
        Self {
            donor_name: d.donor_name.clone(),
            donation_type: d.donation_type.as_str().to_string(),
            amount: d.amount.to_string(),
            date: d.date.format("%Y-%m-%d").to_string(),
        }
    }

    fn parse(&self) -> Result<NewDonation, FormError> {
        if self.donor_name.trim().is_empty() {
            return Err(FormError::Missing("donor_name"));
        }
        if self.donation_type.trim().is_empty() {
            return Err(FormError::Missing("donation_type"));
        }
        let donation_type = self
            .donation_type
            .parse::<DonationType>()
            .map_err(|e| FormError::InvalidType(e.0))?;

        if self.amount.trim().is_empty() {
            return Err(FormError::Missing("amount"));
        }
        let amount = self
            .amount
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|a| a.is_finite() && *a >= 0.0 && on_cent_step(*a))
            .ok_or_else(|| FormError::InvalidAmount(self.amount.clone()))?;

        if self.date.trim().is_empty() {
            return Err(FormError::Missing("date"));
        }
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| FormError::InvalidDate(self.date.clone()))?;

        Ok(NewDonation {
            donor_name: self.donor_name.clone(),
            donation_type,
            amount,
            date,
        })
    }
}

impl Default for FormDraft {
    fn default() -> Self {
        Self::blank()
    }
}

/// `step="0.01"` on the amount input.
fn on_cent_step(amount: f64) -> bool {
    let cents = amount * 100.0;
    (cents - cents.round()).abs() < 1e-6
}

fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

#[derive(Serialize)]
struct TypeOption {
    value: &'static str,
    label: String,
    selected: bool,
}

/// Create/edit form for a single donation.
#[derive(Debug, Clone, Default)]
pub struct DonationForm {
    draft: FormDraft,
    is_editing: bool,
}

impl DonationForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    pub fn is_editing(&self) -> bool {
        self.is_editing
    }

    /// Replaces the draft with what the user typed.
    pub fn set_draft(&mut self, draft: FormDraft) {
        self.draft = draft;
    }

    /// Called whenever the record under edit changes. `Some` fully replaces
    /// the draft with a string copy of the record and switches to edit mode;
    /// `None` resets to blank defaults and leaves edit mode.
    pub fn set_initial_data(&mut self, initial: Option<&Donation>) {
        match initial {
            Some(d) => {
                self.draft = FormDraft::from_donation(d);
                self.is_editing = true;
            }
            None => {
                self.draft = FormDraft::blank();
                self.is_editing = false;
            }
        }
    }

    /// Validates the draft. Outside edit mode a successful submission clears
    /// the form for the next entry.
    pub fn submit(&mut self) -> Result<NewDonation, FormError> {
        let donation = self.draft.parse()?;
        if !self.is_editing {
            self.draft = FormDraft::blank();
        }
        Ok(donation)
    }

    pub fn cancel(&mut self) {
        self.draft = FormDraft::blank();
    }

    pub fn render(&self, templates: &Templates) -> Result<String, tera::Error> {
        let (title, submit_label) = if self.is_editing {
            ("Edit Donation", "Update Donation")
        } else {
            ("Add New Donation", "Add Donation")
        };
        let types: Vec<TypeOption> = DonationType::ALL
            .iter()
            .map(|t| TypeOption {
                value: t.as_str(),
                label: t.label(),
                selected: t.as_str() == self.draft.donation_type,
            })
            .collect();

        let mut ctx = Context::new();
        ctx.insert("title", title);
        ctx.insert("submit_label", submit_label);
        ctx.insert("is_editing", &self.is_editing);
        ctx.insert("draft", &self.draft);
        ctx.insert("types", &types);
        templates.render(FORM_TEMPLATE, &ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn donation() -> Donation {
        Donation {
            id: 4,
            donor_name: "Ada".to_string(),
            donation_type: DonationType::Books,
            amount: 12.5,
            date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
        }
    }

    fn filled() -> FormDraft {
        FormDraft {
            donor_name: "B".to_string(),
            donation_type: "food".to_string(),
            amount: "5".to_string(),
            date: "2024-02-02".to_string(),
        }
    }

    #[test]
    fn blank_draft_defaults_to_today() {
        let form = DonationForm::new();
        assert!(form.draft().donor_name.is_empty());
        assert!(form.draft().donation_type.is_empty());
        assert!(form.draft().amount.is_empty());
        assert_eq!(form.draft().date, today());
        assert!(!form.is_editing());
    }

    #[test]
    fn initial_data_is_string_coerced() {
        let mut form = DonationForm::new();
        form.set_initial_data(Some(&donation()));
        assert!(form.is_editing());
        assert_eq!(form.draft().donor_name, "Ada");
        assert_eq!(form.draft().donation_type, "books");
        assert_eq!(form.draft().amount, "12.5");
        assert_eq!(form.draft().date, "2024-03-09");

        let mut whole = donation();
        whole.amount = 10.0;
        form.set_initial_data(Some(&whole));
        assert_eq!(form.draft().amount, "10");
    }

    #[test]
    fn clearing_initial_data_resets_draft() {
        let mut form = DonationForm::new();
        form.set_initial_data(Some(&donation()));
        form.set_initial_data(None);
        assert_eq!(form.draft(), &FormDraft::blank());
        assert!(!form.is_editing());
    }

    #[test]
    fn submit_outside_edit_mode_resets() {
        let mut form = DonationForm::new();
        form.set_draft(filled());
        let submitted = form.submit().expect("valid draft");
        assert_eq!(submitted.donor_name, "B");
        assert_eq!(submitted.donation_type, DonationType::Food);
        assert_eq!(submitted.amount, 5.0);
        assert_eq!(submitted.date, NaiveDate::from_ymd_opt(2024, 2, 2).unwrap());
        assert_eq!(form.draft(), &FormDraft::blank());
    }

    #[test]
    fn submit_in_edit_mode_keeps_draft() {
        let mut form = DonationForm::new();
        form.set_initial_data(Some(&donation()));
        let mut draft = form.draft().clone();
        draft.amount = "20.25".to_string();
        form.set_draft(draft.clone());

        let submitted = form.submit().expect("valid draft");
        assert_eq!(submitted.amount, 20.25);
        assert_eq!(form.draft(), &draft);
    }

    #[test]
    fn amounts_follow_the_cent_step() {
        for ok in ["8.25", "0.29", "10", "0", "1e2", "19.9"] {
            let mut form = DonationForm::new();
            form.set_draft(FormDraft { amount: ok.into(), ..filled() });
            assert!(form.submit().is_ok(), "{ok} should be accepted");
        }
        for bad in ["1.234", "0.001", "5.005"] {
            let mut form = DonationForm::new();
            form.set_draft(FormDraft { amount: bad.into(), ..filled() });
            assert_eq!(form.submit(), Err(FormError::InvalidAmount(bad.into())), "{bad} should be rejected");
        }
    }

    #[test]
    fn submit_reports_native_input_violations() {
        let mut form = DonationForm::new();

        form.set_draft(FormDraft { donor_name: "  ".into(), ..filled() });
        assert_eq!(form.submit(), Err(FormError::Missing("donor_name")));

        form.set_draft(FormDraft { donation_type: String::new(), ..filled() });
        assert_eq!(form.submit(), Err(FormError::Missing("donation_type")));

        form.set_draft(FormDraft { donation_type: "jewelry".into(), ..filled() });
        assert_eq!(form.submit(), Err(FormError::InvalidType("jewelry".into())));

        form.set_draft(FormDraft { amount: "abc".into(), ..filled() });
        assert_eq!(form.submit(), Err(FormError::InvalidAmount("abc".into())));

        form.set_draft(FormDraft { amount: "-1".into(), ..filled() });
        assert_eq!(form.submit(), Err(FormError::InvalidAmount("-1".into())));

        form.set_draft(FormDraft { amount: "NaN".into(), ..filled() });
        assert_eq!(form.submit(), Err(FormError::InvalidAmount("NaN".into())));

        form.set_draft(FormDraft { amount: "1.234".into(), ..filled() });
        assert_eq!(form.submit(), Err(FormError::InvalidAmount("1.234".into())));

        form.set_draft(FormDraft { date: "02/02/2024".into(), ..filled() });
        assert_eq!(form.submit(), Err(FormError::InvalidDate("02/02/2024".into())));

        // a rejected submission leaves the draft for correction
        assert_eq!(form.draft().date, "02/02/2024");
    }

    #[test]
    fn cancel_resets_draft() {
        let mut form = DonationForm::new();
        form.set_draft(filled());
        form.cancel();
        assert_eq!(form.draft(), &FormDraft::blank());
    }

    #[test]
    fn renders_mode_specific_labels() {
        let templates = Templates::new().unwrap();
        let mut form = DonationForm::new();

        let html = form.render(&templates).unwrap();
        assert!(html.contains("Add New Donation"));
        assert!(html.contains("Add Donation"));
        assert!(!html.contains("Cancel"));

        form.set_initial_data(Some(&Donation {
            donor_name: "<script>".to_string(),
            ..donation()
        }));
        let html = form.render(&templates).unwrap();
        assert!(html.contains("Edit Donation"));
        assert!(html.contains("Update Donation"));
        assert!(html.contains("Cancel"));
        assert!(html.contains("value=\"books\" selected"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
