//! HTTP client for the parking backend.

use crate::error::{RestError, RestResult};
use crate::models::{ActiveEvent, DashboardLot, NewVehicle, Profile, RestSpot, Vehicle};
use crate::session::{Session, TokenResponse};
use lotwatch_core::{LotId, LotSummary, SpotState};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Client for the parking REST API.
pub struct ParkingApiClient {
    client: Client,
    /// Base URL without trailing slash (e.g. "http://127.0.0.1:8000").
    base_url: String,
    session: Arc<Session>,
}

impl ParkingApiClient {
    pub fn new(base_url: impl Into<String>, session: Arc<Session>) -> RestResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| RestError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer token, failing if no session is active.
    fn authorized(&self, request: RequestBuilder) -> RestResult<RequestBuilder> {
        let token = self.session.access_token().ok_or(RestError::Unauthenticated)?;
        Ok(request.bearer_auth(token.as_str()))
    }

    async fn send(request: RequestBuilder) -> RestResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| RestError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RestError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn json<T: DeserializeOwned>(request: RequestBuilder) -> RestResult<T> {
        Self::send(request)
            .await?
            .json()
            .await
            .map_err(|e| RestError::Decode(e.to_string()))
    }

    /// `GET /api/dashboard/`: every lot.
    pub async fn fetch_dashboard(&self) -> RestResult<Vec<LotSummary>> {
        let rows: Vec<DashboardLot> =
            Self::json(self.client.get(self.url("/api/dashboard/"))).await?;
        debug!(lots = rows.len(), "Dashboard fetched");
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// `GET /api/lots/for-my-permit/`: lots the logged-in user may park in.
    pub async fn fetch_lots_for_permit(&self) -> RestResult<Vec<LotSummary>> {
        let request = self.authorized(self.client.get(self.url("/api/lots/for-my-permit/")))?;
        let rows: Vec<DashboardLot> = Self::json(request).await?;
        debug!(lots = rows.len(), "Permit lots fetched");
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// `GET /api/spots/?parking_lot={id}`.
    pub async fn fetch_spots(&self, lot_id: LotId) -> RestResult<Vec<SpotState>> {
        let request = self
            .client
            .get(self.url("/api/spots/"))
            .query(&[("parking_lot", lot_id.value())]);
        let rows: Vec<RestSpot> = Self::json(request).await?;
        debug!(%lot_id, spots = rows.len(), "Spots fetched");
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// `GET /api/events/active/`.
    pub async fn fetch_active_events(&self) -> RestResult<Vec<ActiveEvent>> {
        Self::json(self.client.get(self.url("/api/events/active/"))).await
    }

    /// `GET /api/me/`.
    pub async fn fetch_profile(&self) -> RestResult<Profile> {
        let request = self.authorized(self.client.get(self.url("/api/me/")))?;
        Self::json(request).await
    }

    /// `POST /api/vehicles/`.
    pub async fn add_vehicle(&self, vehicle: &NewVehicle) -> RestResult<Vehicle> {
        let request = self.authorized(self.client.post(self.url("/api/vehicles/")))?;
        Self::json(request.json(vehicle)).await
    }

    /// `DELETE /api/vehicles/{id}/`.
    pub async fn delete_vehicle(&self, vehicle_id: i64) -> RestResult<()> {
        let path = format!("/api/vehicles/{vehicle_id}/");
        let request = self.authorized(self.client.delete(self.url(&path)))?;
        Self::send(request).await?;
        Ok(())
    }

    /// `POST /api/token/` and begin a session with the returned pair.
    pub async fn login(&self, username: &str, password: &str) -> RestResult<()> {
        let request = self
            .client
            .post(self.url("/api/token/"))
            .json(&LoginRequest { username, password });
        let tokens: TokenResponse = Self::json(request).await?;
        self.session.begin(tokens.into());
        info!(username, "Logged in");
        Ok(())
    }

    /// End the session. No request is made.
    pub fn logout(&self) {
        self.session.end();
        info!("Logged out");
    }
}
