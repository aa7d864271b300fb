use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use super::{QnaService, Reply};
use crate::types::{
    CreateKbPayload, EndpointKeys, GenerateAnswerRequest, GenerateAnswerResponse, Operation,
};

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// reqwest client for the QnA Maker v4 authoring and runtime APIs
pub struct QnaMakerClient {
    http: reqwest::Client,
    authoring_base: String,
    /// Absent for clients that only manage knowledge bases
    runtime_base: Option<String>,
    authoring_key: String,
}

impl QnaMakerClient {
    /// Client for the hosted service, given the cognitive services
    /// resource name and the app name hosting the runtime
    pub fn new(service_name: &str, app_name: &str, authoring_key: impl Into<String>) -> Self {
        Self::with_base_urls(
            format!("https://{service_name}.cognitiveservices.azure.com"),
            format!("https://{app_name}.azurewebsites.net"),
            authoring_key,
        )
    }

    /// Client for the authoring API only; queries are refused
    pub fn authoring_only(service_name: &str, authoring_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            authoring_base: format!("https://{service_name}.cognitiveservices.azure.com"),
            runtime_base: None,
            authoring_key: authoring_key.into(),
        }
    }

    pub fn with_base_urls(
        authoring_base: impl Into<String>,
        runtime_base: impl Into<String>,
        authoring_key: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            authoring_base: authoring_base.into().trim_end_matches('/').to_string(),
            runtime_base: Some(runtime_base.into().trim_end_matches('/').to_string()),
            authoring_key: authoring_key.into(),
        }
    }

    fn authoring_url(&self, path: &str) -> String {
        format!("{}/qnamaker/v4.0/{path}", self.authoring_base)
    }

    fn runtime_url(&self, kb_id: &str) -> anyhow::Result<String> {
        let base = self
            .runtime_base
            .as_deref()
            .context("No runtime host configured for answer queries")?;
        Ok(format!("{base}/qnamaker/knowledgebases/{kb_id}/generateAnswer"))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> anyhow::Result<Reply<T>> {
    let status = response.status();
    if !status.is_success() {
        return Ok(Reply::failed(status));
    }
    let body = response
        .json::<T>()
        .await
        .with_context(|| format!("Could not decode service reply (HTTP status {status})"))?;
    Ok(Reply::ok(status, body))
}

#[async_trait]
impl QnaService for QnaMakerClient {
    async fn create_knowledge_base(
        &self,
        payload: &CreateKbPayload,
    ) -> anyhow::Result<Reply<Operation>> {
        let response = self
            .http
            .post(self.authoring_url("knowledgebases/create"))
            .header(SUBSCRIPTION_KEY_HEADER, &self.authoring_key)
            .json(payload)
            .send()
            .await?;
        decode(response).await
    }

    async fn get_operation_details(&self, operation_id: &str) -> anyhow::Result<Reply<Operation>> {
        let response = self
            .http
            .get(self.authoring_url(&format!("operations/{operation_id}")))
            .header(SUBSCRIPTION_KEY_HEADER, &self.authoring_key)
            .send()
            .await?;
        decode(response).await
    }

    async fn publish_knowledge_base(&self, kb_id: &str) -> anyhow::Result<StatusCode> {
        let response = self
            .http
            .post(self.authoring_url(&format!("knowledgebases/{kb_id}")))
            .header(SUBSCRIPTION_KEY_HEADER, &self.authoring_key)
            .header(reqwest::header::CONTENT_LENGTH, 0)
            .send()
            .await?;
        Ok(response.status())
    }

    async fn get_endpoint_keys(&self) -> anyhow::Result<Reply<EndpointKeys>> {
        let response = self
            .http
            .get(self.authoring_url("endpointkeys"))
            .header(SUBSCRIPTION_KEY_HEADER, &self.authoring_key)
            .send()
            .await?;
        decode(response).await
    }

    async fn generate_answer(
        &self,
        kb_id: &str,
        request: &GenerateAnswerRequest,
        endpoint_key: &str,
    ) -> anyhow::Result<GenerateAnswerResponse> {
        Ok(self
            .http
            .post(self.runtime_url(kb_id)?)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("EndpointKey {endpoint_key}"),
            )
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateAnswerResponse>()
            .await?)
    }

    async fn delete_knowledge_base(&self, kb_id: &str) -> anyhow::Result<StatusCode> {
        let response = self
            .http
            .delete(self.authoring_url(&format!("knowledgebases/{kb_id}")))
            .header(SUBSCRIPTION_KEY_HEADER, &self.authoring_key)
            .send()
            .await?;
        Ok(response.status())
    }
}
