mod qnamaker;
pub use qnamaker::QnaMakerClient;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::types::{
    CreateKbPayload, EndpointKeys, GenerateAnswerRequest, GenerateAnswerResponse, Operation,
};

/// An HTTP status plus the decoded body. The body is only decoded for
/// 2xx replies.
#[derive(Clone, Debug)]
pub struct Reply<T> {
    pub status: StatusCode,
    pub body: Option<T>,
}

impl<T> Reply<T> {
    pub fn ok(status: StatusCode, body: T) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    pub fn failed(status: StatusCode) -> Self {
        Self { status, body: None }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// The remote question-answering service. Authoring calls report the
/// status so callers can decide what a non-2xx reply means; transport
/// failures are errors.
#[async_trait]
pub trait QnaService: Send + Sync {
    async fn create_knowledge_base(&self, payload: &CreateKbPayload)
    -> anyhow::Result<Reply<Operation>>;

    async fn get_operation_details(&self, operation_id: &str) -> anyhow::Result<Reply<Operation>>;

    async fn publish_knowledge_base(&self, kb_id: &str) -> anyhow::Result<StatusCode>;

    async fn get_endpoint_keys(&self) -> anyhow::Result<Reply<EndpointKeys>>;

    /// Runtime query, authorized with the endpoint key rather than the
    /// authoring key
    async fn generate_answer(
        &self,
        kb_id: &str,
        request: &GenerateAnswerRequest,
        endpoint_key: &str,
    ) -> anyhow::Result<GenerateAnswerResponse>;

    async fn delete_knowledge_base(&self, kb_id: &str) -> anyhow::Result<StatusCode>;
}
