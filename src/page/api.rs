use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::models::{Donation, NewDonation};
use crate::upstream::{DonationProxy, ProxyError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("server responded with {status}: {message}")]
    Status { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        ApiError::Status {
            status: err.status().as_u16(),
            message: err.public_message().to_string(),
        }
    }
}

/// The donation operations the page controller needs from the proxy layer.
#[async_trait]
pub trait DonationsApi: Send + Sync {
    async fn list(&self) -> Result<Vec<Donation>, ApiError>;
    async fn create(&self, donation: &NewDonation) -> Result<Donation, ApiError>;
    async fn update(&self, id: i64, donation: &NewDonation) -> Result<Donation, ApiError>;
    async fn delete(&self, id: i64) -> Result<(), ApiError>;
}

#[async_trait]
impl DonationsApi for DonationProxy {
    async fn list(&self) -> Result<Vec<Donation>, ApiError> {
        let data = DonationProxy::list(self).await?;
        Ok(serde_json::from_value(data)?)
    }

    async fn create(&self, donation: &NewDonation) -> Result<Donation, ApiError> {
        let body = serde_json::to_value(donation)?;
        let data = DonationProxy::create(self, &body).await?;
        Ok(serde_json::from_value(data)?)
    }

    async fn update(&self, id: i64, donation: &NewDonation) -> Result<Donation, ApiError> {
        let body = serde_json::to_value(donation)?;
        let data = DonationProxy::update(self, &id.to_string(), &body).await?;
        Ok(serde_json::from_value(data)?)
    }

    async fn delete(&self, id: i64) -> Result<(), ApiError> {
        DonationProxy::delete(self, &id.to_string()).await?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
}

/// Talks to a running proxy over HTTP (`{base}/donations[/{id}]`).
#[derive(Clone, Debug)]
pub struct HttpDonationsApi {
    client: Client,
    base_url: Url,
}

impl HttpDonationsApi {
    pub fn new(base_url: Url) -> anyhow::Result<Self> {
        if base_url.cannot_be_a_base() {
            anyhow::bail!("proxy URL cannot carry a path: {}", base_url);
        }
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    fn url_for(&self, id: Option<i64>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("donations");
            if let Some(id) = id {
                segments.push(&id.to_string());
            }
        }
        url
    }
}

async fn checked(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await?;
    let message = serde_json::from_slice::<ErrorEnvelope>(&body)
        .map(|e| e.error)
        .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = checked(response).await?.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

#[async_trait]
impl DonationsApi for HttpDonationsApi {
    async fn list(&self) -> Result<Vec<Donation>, ApiError> {
        let response = self.client.get(self.url_for(None)).send().await?;
        decode(response).await
    }

    async fn create(&self, donation: &NewDonation) -> Result<Donation, ApiError> {
        let response = self.client.post(self.url_for(None)).json(donation).send().await?;
        decode(response).await
    }

    async fn update(&self, id: i64, donation: &NewDonation) -> Result<Donation, ApiError> {
        let response = self.client.put(self.url_for(Some(id))).json(donation).send().await?;
        decode(response).await
    }

    async fn delete(&self, id: i64) -> Result<(), ApiError> {
        let response = self.client.delete(self.url_for(Some(id))).send().await?;
        checked(response).await?;
        Ok(())
    }
}
