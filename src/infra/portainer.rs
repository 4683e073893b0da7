use super::http_gateway::{ensure_success, extract_detail};
use crate::domain::{ActionResult, ContainerGateway, ContainerRecord, GatewayError, LifecycleAction};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Connection settings for a Portainer instance
#[derive(Clone)]
pub struct PortainerSettings {
    pub url: String,
    pub username: String,
    pub password: String,
    pub endpoint_id: String,
}

impl fmt::Debug for PortainerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortainerSettings")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("endpoint_id", &self.endpoint_id)
            .finish()
    }
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    #[serde(rename = "Username")]
    username: &'a str,
    #[serde(rename = "Password")]
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthResponse {
    jwt: String,
}

/// Talks to the Docker API of one Portainer endpoint
#[derive(Debug)]
pub struct PortainerGateway {
    client: Client,
    settings: PortainerSettings,
    token: RwLock<Option<String>>,
}

impl PortainerGateway {
    pub fn new(settings: PortainerSettings, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, settings))
    }

    pub fn with_client(client: Client, mut settings: PortainerSettings) -> Self {
        settings.url = settings.url.trim_end_matches('/').to_string();
        Self {
            client,
            settings,
            token: RwLock::new(None),
        }
    }

    async fn authenticate(&self) -> Result<String, GatewayError> {
        let url = format!("{}/api/auth", self.settings.url);
        debug!("Authenticating against {url}");

        let response = self
            .client
            .post(&url)
            .json(&AuthRequest {
                username: &self.settings.username,
                password: &self.settings.password,
            })
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            warn!("Portainer authentication failed with {}", response.status());
            return Err(GatewayError::Api {
                status: response.status().as_u16(),
                detail: Some("Authentication failed".to_string()),
            });
        }

        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        info!("Authenticated with Portainer as {}", self.settings.username);
        Ok(auth.jwt)
    }

    async fn token(&self) -> Result<String, GatewayError> {
        if let Some(token) = self.token.read().await.as_ref() {
            return Ok(token.clone());
        }

        let token = self.authenticate().await?;
        *self.token.write().await = Some(token.clone());
        Ok(token)
    }

    /// Sends an authenticated request, re-authenticating once if the token expired
    async fn send<F>(&self, build: F) -> Result<Response, GatewayError>
    where
        F: Fn(&str) -> RequestBuilder + Send + Sync,
    {
        let token = self.token().await?;
        let response = build(&token).send().await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!("Portainer token rejected, authenticating again");
        *self.token.write().await = None;
        let token = self.token().await?;
        Ok(build(&token).send().await?)
    }

    fn docker_url(&self, path: &str) -> String {
        format!(
            "{}/api/endpoints/{}/docker{}",
            self.settings.url, self.settings.endpoint_id, path
        )
    }

    async fn container_action(
        &self,
        action: LifecycleAction,
        id: &str,
    ) -> Result<ActionResult, GatewayError> {
        let url = self.docker_url(&format!("/containers/{id}/{}", action.docker_verb()));
        debug!("POST {url}");

        let response = self
            .send(|token| self.client.post(&url).bearer_auth(token))
            .await?;

        // the engine answers 204 only when the transition actually happened
        if response.status() == StatusCode::NO_CONTENT {
            info!("Container {id} {}", action.past_tense());
            return Ok(ActionResult::new(action, id));
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::Api {
            status,
            detail: extract_detail(&body),
        })
    }
}

#[async_trait]
impl ContainerGateway for PortainerGateway {
    async fn list(&self) -> Result<Vec<ContainerRecord>, GatewayError> {
        let url = self.docker_url("/containers/json");
        debug!("GET {url}");

        let response = self
            .send(|token| {
                self.client
                    .get(&url)
                    .query(&[("all", "1")])
                    .bearer_auth(token)
            })
            .await?;
        let response = ensure_success(response).await?;

        response
            .json::<Vec<ContainerRecord>>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    async fn start(&self, id: &str) -> Result<ActionResult, GatewayError> {
        self.container_action(LifecycleAction::Start, id).await
    }

    async fn stop(&self, id: &str) -> Result<ActionResult, GatewayError> {
        self.container_action(LifecycleAction::Stop, id).await
    }

    async fn restart(&self, id: &str) -> Result<ActionResult, GatewayError> {
        self.container_action(LifecycleAction::Restart, id).await
    }

    async fn pause(&self, id: &str) -> Result<ActionResult, GatewayError> {
        self.container_action(LifecycleAction::Pause, id).await
    }

    async fn resume(&self, id: &str) -> Result<ActionResult, GatewayError> {
        self.container_action(LifecycleAction::Resume, id).await
    }
}
