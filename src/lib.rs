use std::sync::Arc;

use tokio::sync::Mutex;

pub mod config;
pub mod models;
pub mod page;
pub mod routes;
pub mod upstream;
pub mod views;

use page::DonationPage;
use upstream::DonationProxy;
use views::Templates;

#[derive(Clone)]
pub struct AppState {
    pub proxy: DonationProxy,
    /// The single process-local page. Locked only to read or change it,
    /// never across an API call.
    pub page: Arc<Mutex<DonationPage<DonationProxy>>>,
    pub templates: Arc<Templates>,
}

impl AppState {
    pub fn new(proxy: DonationProxy) -> Result<Self, tera::Error> {
        let templates = Templates::new()?;
        Ok(Self {
            page: Arc::new(Mutex::new(DonationPage::new(proxy.clone()))),
            proxy,
            templates: Arc::new(templates),
        })
    }
}
