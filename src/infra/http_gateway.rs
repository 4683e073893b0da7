use crate::domain::{ActionResult, ContainerGateway, ContainerRecord, GatewayError, LifecycleAction};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// Client for the dashboard API (`GET /api/containers`, `POST /api/{action}/{id}`)
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_action(
        &self,
        action: LifecycleAction,
        id: &str,
    ) -> Result<ActionResult, GatewayError> {
        let url = format!("{}/api/{}/{}", self.base_url, action.as_str(), id);
        debug!("POST {url}");

        let response = self.client.post(&url).send().await?;
        let response = ensure_success(response).await?;

        response
            .json::<ActionResult>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ContainerGateway for HttpGateway {
    async fn list(&self) -> Result<Vec<ContainerRecord>, GatewayError> {
        let url = format!("{}/api/containers", self.base_url);
        debug!("GET {url}");

        let response = self.client.get(&url).send().await?;
        let response = ensure_success(response).await?;

        response
            .json::<Vec<ContainerRecord>>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    async fn start(&self, id: &str) -> Result<ActionResult, GatewayError> {
        self.post_action(LifecycleAction::Start, id).await
    }

    async fn stop(&self, id: &str) -> Result<ActionResult, GatewayError> {
        self.post_action(LifecycleAction::Stop, id).await
    }

    async fn restart(&self, id: &str) -> Result<ActionResult, GatewayError> {
        self.post_action(LifecycleAction::Restart, id).await
    }

    async fn pause(&self, id: &str) -> Result<ActionResult, GatewayError> {
        self.post_action(LifecycleAction::Pause, id).await
    }

    async fn resume(&self, id: &str) -> Result<ActionResult, GatewayError> {
        self.post_action(LifecycleAction::Resume, id).await
    }
}

/// Turns any non-2xx response into `GatewayError::Api`, keeping the backend's message
pub(crate) async fn ensure_success(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Api {
        status: status.as_u16(),
        detail: extract_detail(&body),
    })
}

/// Pulls the message out of an error body.
///
/// Understands `{"detail": ..}` (dashboard API), `{"error": ..}` and the Docker
/// Engine's `{"message": ..}`. Bodies that are not JSON are used as-is.
pub fn extract_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return Some(body.to_string());
    };

    ["detail", "error", "message"]
        .iter()
        .filter_map(|key| value.get(key))
        .find_map(|v| v.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ContainerState;
    use mockito::Server;
    use serde_json::json;

    fn gateway(url: String) -> HttpGateway {
        HttpGateway::new(url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_extract_detail_variants() {
        assert_eq!(
            extract_detail(r#"{"detail":"No such container: x"}"#).as_deref(),
            Some("No such container: x")
        );
        assert_eq!(
            extract_detail(r#"{"error":"Failed to stop container"}"#).as_deref(),
            Some("Failed to stop container")
        );
        assert_eq!(
            extract_detail(r#"{"message":"container already paused"}"#).as_deref(),
            Some("container already paused")
        );
        assert_eq!(extract_detail("bad gateway").as_deref(), Some("bad gateway"));
        assert_eq!(extract_detail("   "), None);
        assert_eq!(extract_detail(r#"{"detail":[{"loc":["path"]}]}"#), None);
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let gw = gateway("http://localhost:8000/".into());
        assert_eq!(gw.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_list_decodes_records() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/containers")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    {"Id": "1", "Names": ["/web"], "Image": "nginx", "State": "running", "Status": "Up"},
                    {"Id": "2", "Names": ["/db"], "Image": "postgres", "State": "exited", "Status": "Exited (0)"}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let records = gateway(server.url()).list().await.unwrap();

        mock.assert_async().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].state, ContainerState::Exited);
    }

    #[tokio::test]
    async fn test_action_posts_to_action_path() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/resume/abc")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"status": "resumed", "container_id": "abc"}).to_string())
            .create_async()
            .await;

        let result = gateway(server.url()).resume("abc").await.unwrap();

        mock.assert_async().await;
        assert_eq!(result, ActionResult::new(LifecycleAction::Resume, "abc"));
    }

    #[tokio::test]
    async fn test_failure_carries_backend_detail() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/stop/abc")
            .with_status(404)
            .with_body(json!({"detail": "No such container: abc"}).to_string())
            .create_async()
            .await;

        let err = gateway(server.url()).stop("abc").await.unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert_eq!(err.detail(), Some("No such container: abc"));
    }

    #[tokio::test]
    async fn test_malformed_list_is_decode_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/containers")
            .with_status(200)
            .with_body("{\"not\": \"a list\"}")
            .create_async()
            .await;

        let err = gateway(server.url()).list().await.unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
    }
}
