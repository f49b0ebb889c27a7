//! HTTP client for the order server REST API

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{
    MenuItem, MenuItemCreate, MenuItemUpdate, OrderDetail, OrderSubmission, PaymentMethodInfo,
    StatusUpdate,
};
use shared::stats::{StatisticsReport, TimeWindow};

use crate::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::gateway::{CatalogGateway, OrderGateway, OrderQuery, window_params};

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout_duration())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send::<T, ()>(Method::GET, path, &[], None).await
    }

    /// GET with URL-encoded query parameters
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        self.send::<T, ()>(Method::GET, path, query, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(&self, path: &str, body: &B) -> ClientResult<T> {
        self.send(Method::POST, path, &[], Some(body)).await
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send::<T, ()>(Method::POST, path, &[], None).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + Sync>(&self, path: &str, body: &B) -> ClientResult<T> {
        self.send(Method::PUT, path, &[], Some(body)).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + Sync>(&self, path: &str, body: &B) -> ClientResult<T> {
        self.send(Method::PATCH, path, &[], Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send::<T, ()>(Method::DELETE, path, &[], None).await
    }

    fn request<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> RequestBuilder {
        let mut request = self.client.request(method, self.url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request
    }

    async fn send<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> ClientResult<T> {
        let request = self.request(method.clone(), path, query, body);
        let response = request.send().await.map_err(|e| {
            tracing::warn!(%method, path, "Request failed: {}", e);
            ClientError::Http(e)
        })?;
        Self::handle_response(response).await
    }

    /// Unwrap the `ApiResponse` envelope
    ///
    /// Error bodies become [`ClientError::Api`]; a non-JSON error body keeps
    /// the HTTP status in the message.
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        let text = response.text().await?;

        let envelope: ApiResponse<T> = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(ClientError::Api(AppError::with_message(
                    ErrorCode::Unknown,
                    format!("HTTP {}: {}", status, text),
                )));
            }
            Err(e) => return Err(ClientError::InvalidResponse(e.to_string())),
        };

        envelope
            .into_result()
            .map_err(ClientError::Api)?
            .ok_or_else(|| ClientError::InvalidResponse("Missing response data".to_string()))
    }
}

#[async_trait]
impl CatalogGateway for HttpClient {
    async fn list_menus(&self, available_only: bool) -> ClientResult<Vec<MenuItem>> {
        if available_only {
            self.get_with_query("/api/menus", &[("available", "true".to_string())])
                .await
        } else {
            self.get("/api/menus").await
        }
    }

    async fn create_menu(&self, data: &MenuItemCreate) -> ClientResult<MenuItem> {
        self.post("/api/menus", data).await
    }

    async fn update_menu(&self, id: i64, data: &MenuItemUpdate) -> ClientResult<MenuItem> {
        self.put(&format!("/api/menus/{id}"), data).await
    }

    async fn toggle_availability(&self, id: i64) -> ClientResult<MenuItem> {
        self.post_empty(&format!("/api/menus/{id}/availability")).await
    }

    async fn delete_menu(&self, id: i64) -> ClientResult<()> {
        self.delete::<bool>(&format!("/api/menus/{id}")).await?;
        Ok(())
    }

    async fn payment_methods(&self) -> ClientResult<Vec<PaymentMethodInfo>> {
        self.get("/api/payment-methods").await
    }
}

#[async_trait]
impl OrderGateway for HttpClient {
    async fn submit_order(&self, submission: &OrderSubmission) -> ClientResult<OrderDetail> {
        self.post("/api/orders", submission).await
    }

    async fn list_orders(&self, query: &OrderQuery) -> ClientResult<Vec<OrderDetail>> {
        self.get_with_query("/api/orders", &query.params()).await
    }

    async fn get_order(&self, id: i64) -> ClientResult<OrderDetail> {
        self.get(&format!("/api/orders/{id}")).await
    }

    async fn update_status(&self, id: i64, update: &StatusUpdate) -> ClientResult<OrderDetail> {
        self.patch(&format!("/api/orders/{id}/status"), update).await
    }

    async fn statistics(&self, window: &TimeWindow) -> ClientResult<StatisticsReport> {
        self.get_with_query("/api/statistics", &window_params(Some(window)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn client() -> HttpClient {
        HttpClient::new(&ClientConfig::new("http://127.0.0.1:9625/")).unwrap()
    }

    fn url_of(client: &HttpClient, path: &str, query: &[(&str, String)]) -> String {
        client
            .request::<()>(Method::GET, path, query, None)
            .build()
            .unwrap()
            .url()
            .to_string()
    }

    #[test]
    fn test_query_is_appended_and_encoded() {
        let client = client();
        assert_eq!(
            url_of(&client, "/api/orders", &[]),
            "http://127.0.0.1:9625/api/orders"
        );

        let custom = TimeWindow::Custom {
            start: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
        };
        assert_eq!(
            url_of(&client, "/api/statistics", &window_params(Some(&custom))),
            "http://127.0.0.1:9625/api/statistics?range=custom&start=2026-10-01&end=2026-10-16"
        );

        assert_eq!(
            url_of(&client, "/api/orders", &[("note", "a&b =c".to_string())]),
            "http://127.0.0.1:9625/api/orders?note=a%26b+%3Dc"
        );
    }
}
