//! Server-rendered presentation components.
//!
//! Components hold no server state of their own: the page controller owns the
//! data and hands it to a component, which renders HTML through [`Templates`].

use tera::{Context, Tera};

pub mod form;
pub mod list;

pub use form::{DonationForm, FormDraft, FormError};
pub use list::{DeleteConfirmation, DonationList, ListState};

pub const PAGE_TEMPLATE: &str = "page.html";
pub const FORM_TEMPLATE: &str = "form.html";
pub const LIST_TEMPLATE: &str = "list.html";

/// Embedded tera templates. Names end in `.html`, so tera auto-escapes every
/// interpolated value.
pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (PAGE_TEMPLATE, include_str!("../../templates/page.html")),
            (FORM_TEMPLATE, include_str!("../../templates/form.html")),
            (LIST_TEMPLATE, include_str!("../../templates/list.html")),
        ])?;
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<String, tera::Error> {
        self.tera.render(name, context)
    }
}
