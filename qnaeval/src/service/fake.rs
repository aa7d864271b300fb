//! Scripted in-memory service for exercising the workflow without a network

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::{QnaService, Reply};
use crate::types::{
    AnswerCandidate, CreateKbPayload, EndpointKeys, GenerateAnswerRequest,
    GenerateAnswerResponse, Operation, OperationState,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Create,
    GetOperation(String),
    Publish(String),
    GetKeys,
    GenerateAnswer { question: String, endpoint_key: String },
    Delete(String),
}

pub struct FakeService {
    pub create: Reply<Operation>,
    pub operations: Mutex<VecDeque<Reply<Operation>>>,
    pub publish_status: StatusCode,
    pub keys: Reply<EndpointKeys>,
    pub answers: HashMap<String, Vec<AnswerCandidate>>,
    pub delete_status: StatusCode,
    pub calls: Mutex<Vec<Call>>,
    pub created: Mutex<Option<CreateKbPayload>>,
}

pub fn operation(state: &str, resource_location: Option<&str>) -> Reply<Operation> {
    Reply::ok(
        StatusCode::OK,
        Operation {
            operation_id: "op-1".into(),
            operation_state: OperationState::from(state.to_string()),
            resource_location: resource_location.map(str::to_string),
        },
    )
}

pub fn candidate(id: i64, score: f64, question: &str, answer: &str) -> AnswerCandidate {
    AnswerCandidate {
        id,
        score,
        questions: vec![question.to_string()],
        answer: answer.to_string(),
    }
}

impl Default for FakeService {
    /// A service on which every step succeeds immediately
    fn default() -> Self {
        Self {
            create: Reply::ok(
                StatusCode::ACCEPTED,
                Operation {
                    operation_id: "op-1".into(),
                    operation_state: OperationState::NotStarted,
                    resource_location: None,
                },
            ),
            operations: Mutex::new(VecDeque::from([operation(
                "Succeeded",
                Some("/knowledgebases/kb-123"),
            )])),
            publish_status: StatusCode::NO_CONTENT,
            keys: Reply::ok(
                StatusCode::OK,
                EndpointKeys {
                    primary_endpoint_key: Some("endpoint-key".into()),
                    secondary_endpoint_key: None,
                },
            ),
            answers: HashMap::new(),
            delete_status: StatusCode::NO_CONTENT,
            calls: Mutex::new(vec![]),
            created: Mutex::new(None),
        }
    }
}

impl FakeService {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl QnaService for FakeService {
    async fn create_knowledge_base(
        &self,
        payload: &CreateKbPayload,
    ) -> anyhow::Result<Reply<Operation>> {
        self.record(Call::Create);
        *self.created.lock().unwrap() = Some(CreateKbPayload {
            name: payload.name.clone(),
            qna_list: payload.qna_list.clone(),
            language: payload.language.clone(),
        });
        Ok(self.create.clone())
    }

    async fn get_operation_details(&self, operation_id: &str) -> anyhow::Result<Reply<Operation>> {
        self.record(Call::GetOperation(operation_id.to_string()));
        let mut operations = self.operations.lock().unwrap();
        // the last scripted state repeats forever
        if operations.len() > 1 {
            Ok(operations.pop_front().unwrap())
        } else {
            operations
                .front()
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no scripted operation state"))
        }
    }

    async fn publish_knowledge_base(&self, kb_id: &str) -> anyhow::Result<StatusCode> {
        self.record(Call::Publish(kb_id.to_string()));
        Ok(self.publish_status)
    }

    async fn get_endpoint_keys(&self) -> anyhow::Result<Reply<EndpointKeys>> {
        self.record(Call::GetKeys);
        Ok(self.keys.clone())
    }

    async fn generate_answer(
        &self,
        _kb_id: &str,
        request: &GenerateAnswerRequest,
        endpoint_key: &str,
    ) -> anyhow::Result<GenerateAnswerResponse> {
        self.record(Call::GenerateAnswer {
            question: request.question.clone(),
            endpoint_key: endpoint_key.to_string(),
        });
        Ok(GenerateAnswerResponse {
            answers: self
                .answers
                .get(&request.question)
                .cloned()
                .unwrap_or_default(),
        })
    }

    async fn delete_knowledge_base(&self, kb_id: &str) -> anyhow::Result<StatusCode> {
        self.record(Call::Delete(kb_id.to_string()));
        Ok(self.delete_status)
    }
}
