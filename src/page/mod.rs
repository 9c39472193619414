//! Page controller: owns the donation collection and applies optimistic
//! create/update/delete against the proxy layer, rolling back on failure.
//!
//! Each mutation runs in two phases. `begin_*` applies the optimistic change
//! and returns a [`Mutation`] carrying whatever rollback needs; the caller
//! sends it to the API without holding the page, then hands the [`Settled`]
//! result back to [`DonationPage::settle`]. Mutations are not queued, and a
//! rollback only consults the state its own `begin_*` captured.

use chrono::Utc;
use serde::Serialize;
use tera::Context;

use crate::models::{Donation, NewDonation};
use crate::views::{DeleteConfirmation, DonationForm, DonationList, FormDraft, FormError, Templates, PAGE_TEMPLATE};

pub mod api;

pub use api::{ApiError, DonationsApi, HttpDonationsApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Default,
    Destructive,
}

/// A transient toast shown once on the next render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: Variant,
}

impl Notification {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            title: "Success".to_string(),
            description: description.into(),
            variant: Variant::Default,
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            title: "Error".to_string(),
            description: description.into(),
            variant: Variant::Destructive,
        }
    }
}

/// An optimistic change already applied to the page, waiting for the API.
#[derive(Debug, Clone)]
pub enum Mutation {
    Create {
        temp_id: i64,
        donation: NewDonation,
    },
    Update {
        id: i64,
        attempted: Donation,
        previous: Vec<Donation>,
    },
    Delete {
        id: i64,
        removed: Option<Donation>,
    },
}

/// A [`Mutation`] together with the API's answer.
#[derive(Debug)]
pub enum Settled {
    Create {
        temp_id: i64,
        result: Result<Donation, ApiError>,
    },
    Update {
        id: i64,
        attempted: Donation,
        previous: Vec<Donation>,
        result: Result<Donation, ApiError>,
    },
    Delete {
        id: i64,
        removed: Option<Donation>,
        result: Result<(), ApiError>,
    },
}

impl Mutation {
    pub async fn send<A: DonationsApi + ?Sized>(self, api: &A) -> Settled {
        match self {
            Mutation::Create { temp_id, donation } => Settled::Create {
                temp_id,
                result: api.create(&donation).await,
            },
            Mutation::Update { id, attempted, previous } => {
                let result = api.update(id, &NewDonation::from(&attempted)).await;
                Settled::Update {
                    id,
                    attempted,
                    previous,
                    result,
                }
            }
            Mutation::Delete { id, removed } => Settled::Delete {
                id,
                removed,
                result: api.delete(id).await,
            },
        }
    }
}

pub struct DonationPage<A> {
    api: A,
    donations: Vec<Donation>,
    is_loading: bool,
    mounted: bool,
    editing: Option<Donation>,
    form: DonationForm,
    delete_gate: DeleteConfirmation,
    notifications: Vec<Notification>,
    last_temp_id: i64,
}

impl<A: DonationsApi> DonationPage<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            donations: Vec::new(),
            is_loading: true,
            mounted: false,
            editing: None,
            form: DonationForm::new(),
            delete_gate: DeleteConfirmation::default(),
            notifications: Vec::new(),
            last_temp_id: 0,
        }
    }

    pub fn donations(&self) -> &[Donation] {
        &self.donations
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn editing(&self) -> Option<&Donation> {
        self.editing.as_ref()
    }

    pub fn form(&self) -> &DonationForm {
        &self.form
    }

    pub fn pending_delete(&self) -> Option<i64> {
        self.delete_gate.pending()
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// First-use load. Later calls are no-ops.
    pub async fn mount(&mut self) {
        if self.begin_mount() {
            let result = self.api.list().await;
            self.finish_load(result);
        }
    }

    pub async fn load(&mut self) {
        self.is_loading = true;
        let result = self.api.list().await;
        self.finish_load(result);
    }

    /// Marks the page mounted. Returns true exactly once: the caller then
    /// owes a `list` call and `finish_load`.
    pub fn begin_mount(&mut self) -> bool {
        if self.mounted {
            return false;
        }
        self.mounted = true;
        self.is_loading = true;
        true
    }

    pub fn finish_load(&mut self, result: Result<Vec<Donation>, ApiError>) {
        match result {
            Ok(donations) => self.donations = donations,
            Err(e) => {
                tracing::error!("Error fetching donations: {}", e);
                self.notify(Notification::error("Failed to load donations. Please try again."));
            }
        }
        self.is_loading = false;
    }

    pub async fn add_donation(&mut self, donation: NewDonation) {
        let mutation = self.begin_create(donation);
        self.run(mutation).await;
    }

    pub async fn update_donation(&mut self, id: i64, donation: NewDonation) {
        let mutation = self.begin_update(id, donation);
        self.run(mutation).await;
    }

    pub async fn delete_donation(&mut self, id: i64) {
        let mutation = self.begin_delete(id);
        self.run(mutation).await;
    }

    async fn run(&mut self, mutation: Mutation) {
        let settled = mutation.send(&self.api).await;
        self.settle(settled);
    }

    /// Prepends the donation under a temporary negative id.
    pub fn begin_create(&mut self, donation: NewDonation) -> Mutation {
        let temp_id = self.next_temp_id();
        self.donations.insert(0, Donation::from_new(temp_id, donation.clone()));
        Mutation::Create { temp_id, donation }
    }

    /// Replaces the record with the submitted values and leaves edit mode.
    pub fn begin_update(&mut self, id: i64, donation: NewDonation) -> Mutation {
        let previous = self.donations.clone();
        let attempted = Donation::from_new(id, donation);

        replace_by_id(&mut self.donations, id, &attempted);
        self.set_editing(None);
        Mutation::Update { id, attempted, previous }
    }

    pub fn begin_delete(&mut self, id: i64) -> Mutation {
        let removed = self.donations.iter().find(|d| d.id == id).cloned();
        self.donations.retain(|d| d.id != id);
        Mutation::Delete { id, removed }
    }

    /// Reconciles with the server's answer, or rolls back to what the
    /// matching `begin_*` captured.
    pub fn settle(&mut self, settled: Settled) {
        match settled {
            Settled::Create { temp_id, result: Ok(created) } => {
                self.donations.retain(|d| d.id == temp_id || d.id != created.id);
                match self.donations.iter_mut().find(|d| d.id == temp_id) {
                    Some(slot) => *slot = created,
                    None => self.donations.insert(0, created),
                }
                self.notify(Notification::success("Donation added successfully."));
            }
            Settled::Create { temp_id, result: Err(e) } => {
                tracing::error!("Error adding donation: {}", e);
                self.donations.retain(|d| d.id != temp_id);
                self.notify(Notification::error("Failed to add donation. Please try again."));
            }
            Settled::Update { id, result: Ok(server), .. } => {
                replace_by_id(&mut self.donations, id, &server);
                self.notify(Notification::success("Donation updated successfully."));
            }
            Settled::Update {
                id,
                attempted,
                previous,
                result: Err(e),
            } => {
                tracing::error!("Error updating donation {}: {}", id, e);
                self.donations = previous;
                self.set_editing(Some(attempted));
                self.notify(Notification::error("Failed to update donation. Please try again."));
            }
            Settled::Delete { result: Ok(()), .. } => {
                self.notify(Notification::success("Donation deleted successfully."));
            }
            Settled::Delete {
                id,
                removed,
                result: Err(e),
            } => {
                tracing::error!("Error deleting donation {}: {}", id, e);
                if let Some(donation) = removed {
                    self.donations.insert(0, donation);
                }
                self.notify(Notification::error("Failed to delete donation. Please try again."));
            }
        }
    }

    /// Enters edit mode for the donation with `id`. Returns false when no
    /// such donation is held.
    pub fn edit(&mut self, id: i64) -> bool {
        match self.donations.iter().find(|d| d.id == id).cloned() {
            Some(donation) => {
                tracing::debug!(id, "editing donation");
                self.set_editing(Some(donation));
                true
            }
            None => false,
        }
    }

    pub fn cancel_edit(&mut self) {
        self.form.cancel();
        self.set_editing(None);
    }

    pub fn update_draft(&mut self, draft: FormDraft) {
        self.form.set_draft(draft);
    }

    /// Submits the form: update while editing, create otherwise.
    pub async fn submit_form(&mut self) -> Result<(), FormError> {
        let mutation = self.begin_submit()?;
        self.run(mutation).await;
        Ok(())
    }

    pub fn begin_submit(&mut self) -> Result<Mutation, FormError> {
        let donation = self.form.submit()?;
        Ok(match self.editing.as_ref().map(|d| d.id) {
            Some(id) => self.begin_update(id, donation),
            None => self.begin_create(donation),
        })
    }

    pub fn request_delete(&mut self, id: i64) {
        self.delete_gate.request(id);
    }

    pub fn cancel_delete(&mut self) {
        self.delete_gate.cancel();
    }

    /// Deletes the donation armed by `request_delete`. Returns false when
    /// nothing was armed.
    pub async fn confirm_delete(&mut self) -> bool {
        match self.begin_confirmed_delete() {
            Some(mutation) => {
                self.run(mutation).await;
                true
            }
            None => false,
        }
    }

    pub fn begin_confirmed_delete(&mut self) -> Option<Mutation> {
        let id = self.delete_gate.confirm()?;
        Some(self.begin_delete(id))
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub fn render(&self, templates: &Templates, notifications: &[Notification]) -> Result<String, tera::Error> {
        let form_html = self.form.render(templates)?;
        let list_html = DonationList::new(&self.donations, self.is_loading)
            .with_pending_delete(self.delete_gate.pending())
            .render(templates)?;

        let mut ctx = Context::new();
        ctx.insert("form_html", &form_html);
        ctx.insert("list_html", &list_html);
        ctx.insert("notifications", notifications);
        templates.render(PAGE_TEMPLATE, &ctx)
    }

    fn set_editing(&mut self, donation: Option<Donation>) {
        self.form.set_initial_data(donation.as_ref());
        self.editing = donation;
    }

    /// Negated epoch milliseconds, forced strictly below every id handed out
    /// before so two creates never share a placeholder.
    fn next_temp_id(&mut self) -> i64 {
        let candidate = -Utc::now().timestamp_millis();
        let id = candidate.min(self.last_temp_id - 1);
        self.last_temp_id = id;
        id
    }
}

fn replace_by_id(donations: &mut [Donation], id: i64, replacement: &Donation) {
    for d in donations.iter_mut().filter(|d| d.id == id) {
        *d = replacement.clone();
    }
}
