//! REST client for the `/vehicle` resource.
//!
//! One request per call, no retries. Error responses are turned into
//! readable messages using the server's `{"error": ..., "missing": [...]}`
//! body when it sends one.

use crate::models::VehicleDraft;
use anyhow::{Context, Result};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Connection settings for the vehicle API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl From<&crate::config::ApiConfig> for ClientConfig {
    fn from(config: &crate::config::ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout_seconds: config.timeout_seconds,
        }
    }
}

/// Error body returned by the API on 4xx responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    missing: Vec<String>,
}

/// Async client for listing, reading, creating, updating and deleting vehicles.
pub struct VehicleClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl VehicleClient {
    /// Create a new client.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// URL of the vehicle collection.
    pub fn collection_url(&self) -> String {
        format!("{}/vehicle", self.config.base_url.trim_end_matches('/'))
    }

    /// URL of one vehicle. The VIN is percent-encoded as a single path segment.
    fn vehicle_url(&self, vin: &str) -> Result<Url> {
        let collection = self.collection_url();
        let mut url = Url::parse(&collection)
            .with_context(|| format!("Invalid vehicle API URL: {}", collection))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Vehicle API URL cannot take a path: {}", collection))?
            .push(vin);
        Ok(url)
    }

    /// Fetch the collection as raw JSON values, without validation.
    pub async fn fetch_raw(&self) -> Result<Vec<Value>> {
        let url = self.collection_url();
        info!("Fetching vehicles from {}", url);

        let response = self.send(self.http_client.get(&url)).await?;
        let response = expect_status(response, &[StatusCode::OK]).await?;

        let body: Value = response
            .json()
            .await
            .context("Failed to parse vehicle list")?;

        match body {
            Value::Array(items) => {
                debug!("Received {} vehicle records", items.len());
                Ok(items)
            }
            other => Err(anyhow::anyhow!(
                "Expected a JSON array from {}, got {}",
                url,
                short_kind(&other)
            )),
        }
    }

    /// Fetch the collection for display.
    ///
    /// Records are returned as sent, so one with an unusable field can still
    /// be listed and then fixed with `edit`. Aggregation validates separately.
    pub async fn list_vehicles(&self) -> Result<Vec<Value>> {
        self.fetch_raw().await
    }

    /// Fetch a single vehicle by VIN.
    pub async fn get_vehicle(&self, vin: &str) -> Result<Value> {
        let url = self.vehicle_url(vin)?;
        debug!("GET {}", url);

        let response = self.send(self.http_client.get(url)).await?;
        let response = expect_status(response, &[StatusCode::OK]).await?;
        let body: Value = response
            .json()
            .await
            .context("Failed to parse vehicle")?;

        expect_object(body, "vehicle")
    }

    /// Add a new vehicle. Returns the record as stored by the server.
    pub async fn create_vehicle(&self, draft: &VehicleDraft) -> Result<Value> {
        let url = self.collection_url();
        info!("Adding vehicle {}", draft.vin);

        let response = self.send(self.http_client.post(&url).json(draft)).await?;
        let response = expect_status(response, &[StatusCode::CREATED, StatusCode::OK]).await?;
        let body: Value = response
            .json()
            .await
            .context("Failed to parse created vehicle")?;

        expect_object(body, "created vehicle")
    }

    /// Replace an existing vehicle's fields.
    pub async fn update_vehicle(&self, vin: &str, draft: &VehicleDraft) -> Result<Value> {
        let url = self.vehicle_url(vin)?;
        info!("Updating vehicle {}", vin);

        let response = self.send(self.http_client.put(url).json(draft)).await?;
        let response = expect_status(response, &[StatusCode::OK]).await?;
        let body: Value = response
            .json()
            .await
            .context("Failed to parse updated vehicle")?;

        expect_object(body, "updated vehicle")
    }

    /// Remove a vehicle.
    pub async fn delete_vehicle(&self, vin: &str) -> Result<()> {
        let url = self.vehicle_url(vin)?;
        info!("Deleting vehicle {}", vin);

        let response = self.send(self.http_client.delete(url)).await?;
        expect_status(response, &[StatusCode::NO_CONTENT, StatusCode::OK]).await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                anyhow::anyhow!("Request timed out after {}s", self.config.timeout_seconds)
            } else if e.is_connect() {
                anyhow::anyhow!("Cannot connect to vehicle API at {}", self.config.base_url)
            } else {
                anyhow::anyhow!("Failed to send request: {}", e)
            }
        })
    }
}

/// Pass the response through if its status is one of `expected`.
async fn expect_status(response: Response, expected: &[StatusCode]) -> Result<Response> {
    let status = response.status();
    if expected.contains(&status) {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    Err(anyhow::anyhow!(describe_error(status, &text)))
}

fn expect_object(body: Value, what: &str) -> Result<Value> {
    match body {
        Value::Object(_) => Ok(body),
        other => Err(anyhow::anyhow!(
            "Expected a JSON object for the {}, got {}",
            what,
            short_kind(&other)
        )),
    }
}

fn describe_error(status: StatusCode, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let mut message = match parsed.error {
        Some(error) => format!("Vehicle API error {}: {}", status, error),
        None if body.trim().is_empty() => format!("Vehicle API error {}", status),
        None => format!("Vehicle API error {}: {}", status, body.trim()),
    };

    if !parsed.missing.is_empty() {
        message.push_str(&format!(" (missing: {})", parsed.missing.join(", ")));
    }

    message
}

fn short_kind(value: &Value) -> &'static str {
    match value {
        Value::Object(_) => "an object",
        Value::String(_) => "a string",
        Value::Number(_) => "a number",
        Value::Bool(_) => "a boolean",
        Value::Null => "null",
        Value::Array(_) => "an array",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn vehicle_json(vin: &str, manufacturer: &str, price: f64) -> Value {
        json!({
            "vin": vin,
            "manufacturer_name": manufacturer,
            "description": "Test vehicle",
            "horse_power": 200,
            "model_name": "Model",
            "model_year": 2020,
            "purchase_price": price,
            "fuel_type": "gas"
        })
    }

    fn make_draft(vin: &str) -> VehicleDraft {
        VehicleDraft {
            vin: vin.to_string(),
            manufacturer_name: "Ford".to_string(),
            description: "Test vehicle".to_string(),
            horse_power: 200.0,
            model_name: "Model".to_string(),
            model_year: 2020,
            purchase_price: 20000.0,
            fuel_type: "gas".to_string(),
        }
    }

    fn client_for(server: &MockServer) -> VehicleClient {
        VehicleClient::new(ClientConfig {
            base_url: server.uri(),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_collection_url_trims_slash() {
        let client = VehicleClient::new(ClientConfig {
            base_url: "http://localhost:5000/".to_string(),
            timeout_seconds: 5,
        })
        .unwrap();
        assert_eq!(client.collection_url(), "http://localhost:5000/vehicle");
    }

    #[test]
    fn test_vehicle_url_encodes_vin() {
        let client = VehicleClient::new(ClientConfig {
            base_url: "http://localhost:5000/".to_string(),
            timeout_seconds: 5,
        })
        .unwrap();

        let url = client.vehicle_url("VIN00000000000001").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/vehicle/VIN00000000000001");

        let url = client.vehicle_url("AB/12?x#y").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/vehicle/AB%2F12%3Fx%23y");
        assert_eq!(url.path_segments().unwrap().count(), 2);
    }

    #[test]
    fn test_describe_error_with_missing_fields() {
        let message = describe_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"error": "Missing fields", "missing": ["vin", "fuel_type"]}"#,
        );
        assert!(message.contains("422"));
        assert!(message.contains("Missing fields"));
        assert!(message.contains("(missing: vin, fuel_type)"));
    }

    #[test]
    fn test_describe_error_plain_body() {
        let message = describe_error(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(message.ends_with(": boom"));
    }

    #[tokio::test]
    async fn test_list_vehicles() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vehicle"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                vehicle_json("VIN00000000000001", "Ford", 20000.0),
                vehicle_json("VIN00000000000002", "Toyota", 25000.0),
            ])))
            .mount(&server)
            .await;

        let vehicles = client_for(&server).list_vehicles().await.unwrap();

        assert_eq!(vehicles.len(), 2);
        assert_eq!(vehicles[1]["manufacturer_name"], "Toyota");
    }

    #[tokio::test]
    async fn test_list_vehicles_keeps_malformed_rows() {
        let server = MockServer::start().await;
        let mut bad = vehicle_json("VIN00000000000002", "Ford", 20000.0);
        bad["horse_power"] = Value::Null;

        Mock::given(method("GET"))
            .and(path("/vehicle"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                vehicle_json("VIN00000000000001", "Toyota", 25000.0),
                bad,
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let vehicles = client.list_vehicles().await.unwrap();
        assert_eq!(vehicles.len(), 2);
        assert_eq!(vehicles[1]["vin"], "VIN00000000000002");

        // The same rows are still refused by the aggregation gate.
        let raw = client.fetch_raw().await.unwrap();
        let err = crate::analysis::parse_records(&raw).unwrap_err();
        assert!(matches!(
            err,
            crate::analysis::AggregationError::MalformedRecord {
                index: 1,
                field: "horse_power",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_get_vehicle_with_unusable_field() {
        let server = MockServer::start().await;
        let mut bad = vehicle_json("VIN00000000000007", "Ford", 20000.0);
        bad["purchase_price"] = json!("call us");

        Mock::given(method("GET"))
            .and(path("/vehicle/VIN00000000000007"))
            .respond_with(ResponseTemplate::new(200).set_body_json(bad))
            .mount(&server)
            .await;

        let vehicle = client_for(&server)
            .get_vehicle("VIN00000000000007")
            .await
            .unwrap();
        assert_eq!(vehicle["purchase_price"], "call us");
    }

    #[tokio::test]
    async fn test_fetch_raw_rejects_non_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vehicle"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"vin": "x"})))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_raw().await.unwrap_err();
        assert!(err.to_string().contains("Expected a JSON array"));
    }

    #[tokio::test]
    async fn test_get_vehicle_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vehicle/VIN00000000000009"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"error": "Vehicle not found"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get_vehicle("VIN00000000000009")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("Vehicle not found"));
    }

    #[tokio::test]
    async fn test_create_vehicle() {
        let server = MockServer::start().await;
        let draft = make_draft("VIN00000000000003");

        Mock::given(method("POST"))
            .and(path("/vehicle"))
            .and(body_json(&draft))
            .respond_with(ResponseTemplate::new(201).set_body_json(vehicle_json(
                "VIN00000000000003",
                "Ford",
                20000.0,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let created = client_for(&server).create_vehicle(&draft).await.unwrap();
        assert_eq!(created["vin"], "VIN00000000000003");
    }

    #[tokio::test]
    async fn test_create_vehicle_duplicate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vehicle"))
            .respond_with(ResponseTemplate::new(422).set_body_json(
                json!({"error": "Vehicle with this VIN already exists"}),
            ))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .create_vehicle(&make_draft("VIN00000000000003"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_update_vehicle() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/vehicle/VIN00000000000004"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vehicle_json(
                "VIN00000000000004",
                "Ford",
                18000.0,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let updated = client_for(&server)
            .update_vehicle("VIN00000000000004", &make_draft("VIN00000000000004"))
            .await
            .unwrap();
        assert_eq!(updated["purchase_price"], 18000.0);
    }

    #[tokio::test]
    async fn test_delete_vehicle() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/vehicle/VIN00000000000005"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .delete_vehicle("VIN00000000000005")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let client = VehicleClient::new(ClientConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_seconds: 2,
        })
        .unwrap();

        let err = client.fetch_raw().await.unwrap_err();
        assert!(err.to_string().contains("Cannot connect"));
    }
}
