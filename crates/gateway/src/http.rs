//! REST binding for the booking backend.
//!
//! Wraps the backend's appointment endpoints using [`reqwest`]. All
//! list responses are coerced single-object-or-array, and the list
//! call races against the caller's [`CancellationToken`] so a
//! superseded poll resolves as [`GatewayError::Cancelled`] instead of
//! delivering a stale result.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

use frostdesk_core::appointment::{Appointment, OneOrMany};
use frostdesk_core::technician::Technician;
use frostdesk_core::types::AppointmentId;

use crate::api::{BookingApi, GatewayError};

/// HTTP client for the booking backend.
pub struct HttpBookingApi {
    client: reqwest::Client,
    base_url: String,
    /// Optional per-call timeout. A timeout surfaces through the same
    /// cancellation path as manual supersession.
    timeout: Option<Duration>,
}

impl HttpBookingApi {
    /// Create a client for the backend at `base_url`, e.g.
    /// `http://host:4000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: trim_trailing_slash(base_url.into()),
            timeout: None,
        }
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    /// (connection pooling across components).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: trim_trailing_slash(base_url.into()),
            timeout: None,
        }
    }

    /// Apply a per-call timeout to every request issued by this client.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.timeout {
            Some(t) => builder.timeout(t),
            None => builder,
        }
    }

    /// Issue a request and map transport errors. A reqwest timeout is
    /// folded into [`GatewayError::Cancelled`].
    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, GatewayError> {
        match self.request(builder).send().await {
            Ok(response) => Ok(response),
            Err(e) if e.is_timeout() => Err(GatewayError::Cancelled),
            Err(e) => Err(GatewayError::Request(e)),
        }
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. On failure, pull
    /// the server's `message` field out of the error payload when
    /// present, else keep the raw body.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: extract_message(&body),
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), GatewayError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// Pull a human-readable message out of an error body.
///
/// The backend sends `{"message": "..."}` payloads on rejection; fall
/// back to the raw body when it does not.
fn extract_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorPayload {
        message: String,
    }

    match serde_json::from_str::<ErrorPayload>(body) {
        Ok(payload) if !payload.message.trim().is_empty() => payload.message,
        _ => body.to_string(),
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[async_trait]
impl BookingApi for HttpBookingApi {
    async fn list_appointments(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Appointment>, GatewayError> {
        let request = self.client.get(self.url("appointments"));

        tokio::select! {
            // Cancellation wins when both are ready.
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Appointment list fetch cancelled");
                Err(GatewayError::Cancelled)
            }
            result = self.send(request) => {
                let parsed: OneOrMany<Appointment> = Self::parse_response(result?).await?;
                Ok(parsed.into_vec())
            }
        }
    }

    async fn accept(
        &self,
        id: &AppointmentId,
        technicians: &[String],
    ) -> Result<(), GatewayError> {
        let body = serde_json::json!({ "technicians": technicians });
        let response = self
            .send(
                self.client
                    .post(self.url(&format!("appointments/{id}/accept")))
                    .json(&body),
            )
            .await?;
        Self::check_status(response).await
    }

    async fn reject(
        &self,
        id: &AppointmentId,
        reason: Option<&str>,
    ) -> Result<(), GatewayError> {
        let body = serde_json::json!({ "reason": reason });
        let response = self
            .send(
                self.client
                    .post(self.url(&format!("appointments/{id}/reject")))
                    .json(&body),
            )
            .await?;
        Self::check_status(response).await
    }

    async fn complete(&self, id: &AppointmentId) -> Result<(), GatewayError> {
        let response = self
            .send(
                self.client
                    .post(self.url(&format!("appointments/{id}/complete"))),
            )
            .await?;
        Self::check_status(response).await
    }

    async fn reschedule(
        &self,
        id: &AppointmentId,
        service_name: &str,
        new_date: NaiveDate,
    ) -> Result<(), GatewayError> {
        // Date-only on the wire: "YYYY-MM-DD".
        let body = serde_json::json!({
            "service": service_name,
            "date": new_date.format("%Y-%m-%d").to_string(),
        });
        let response = self
            .send(
                self.client
                    .post(self.url(&format!("appointments/{id}/reschedule")))
                    .json(&body),
            )
            .await?;
        Self::check_status(response).await
    }

    async fn return_to_pending(&self, id: &AppointmentId) -> Result<(), GatewayError> {
        let response = self
            .send(
                self.client
                    .post(self.url(&format!("appointments/{id}/return-to-pending"))),
            )
            .await?;
        Self::check_status(response).await
    }

    async fn list_technicians(&self) -> Result<Vec<Technician>, GatewayError> {
        let response = self.send(self.client.get(self.url("technicians"))).await?;
        let parsed: OneOrMany<Technician> = Self::parse_response(response).await?;
        Ok(parsed.into_vec())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn extract_message_prefers_payload_field() {
        let body = r#"{"message":"Appointment already accepted"}"#;
        assert_eq!(extract_message(body), "Appointment already accepted");
    }

    #[test]
    fn extract_message_falls_back_to_raw_body() {
        assert_eq!(extract_message("gateway timeout"), "gateway timeout");
        assert_eq!(extract_message(r#"{"message":"  "}"#), r#"{"message":"  "}"#);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = HttpBookingApi::new("http://host:4000/api/");
        assert_eq!(api.url("appointments"), "http://host:4000/api/appointments");
    }

    #[tokio::test]
    async fn pre_cancelled_token_short_circuits_the_list_call() {
        // Port 9 (discard) -- the request must never be issued anyway.
        let api = HttpBookingApi::new("http://127.0.0.1:9");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = api.list_appointments(&cancel).await;
        assert_matches!(result, Err(GatewayError::Cancelled));
    }
}
