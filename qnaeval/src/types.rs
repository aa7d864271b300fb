use serde::{Deserialize, Serialize};

/// Opaque knowledge base identifier handed out by the service
pub type KbId = String;

/// One row of the source CSV (`id,questions,answer`), as read from disk.
/// The `questions` column holds every question joined with commas.
#[derive(Debug, Deserialize)]
pub struct SourceRow {
    pub id: i64,
    pub questions: String,
    pub answer: String,
}

/// A question/answer pair as registered in the knowledge base
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SourceRecord {
    pub id: i64,
    pub answer: String,
    pub questions: Vec<String>,
}

impl From<SourceRow> for SourceRecord {
    fn from(row: SourceRow) -> Self {
        Self {
            id: row.id,
            questions: row.questions.split(',').map(str::to_string).collect(),
            answer: row.answer,
        }
    }
}

/// A held-out query together with the id of the record it was taken from
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    pub expected_id: i64,
    pub test_query: String,
}

/// Body of the create-knowledge-base request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKbPayload {
    pub name: String,
    pub qna_list: Vec<SourceRecord>,
    pub language: String,
}

/// State of an asynchronous service operation
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum OperationState {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    Other(String),
}

impl OperationState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OperationState::NotStarted | OperationState::Running)
    }
}

impl From<String> for OperationState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "NotStarted" => OperationState::NotStarted,
            "Running" => OperationState::Running,
            "Succeeded" => OperationState::Succeeded,
            "Failed" => OperationState::Failed,
            _ => OperationState::Other(s),
        }
    }
}

impl ::std::fmt::Display for OperationState {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        match self {
            OperationState::NotStarted => write!(f, "NotStarted"),
            OperationState::Running => write!(f, "Running"),
            OperationState::Succeeded => write!(f, "Succeeded"),
            OperationState::Failed => write!(f, "Failed"),
            OperationState::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Operation details, as returned by both the create call and the
/// operation-status call
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub operation_id: String,
    pub operation_state: OperationState,
    #[serde(default)]
    pub resource_location: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointKeys {
    #[serde(default)]
    pub primary_endpoint_key: Option<String>,
    #[serde(default)]
    pub secondary_endpoint_key: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum RankerType {
    /// Rank purely on question similarity, ignoring the answer text
    #[default]
    QuestionOnly,
    Default,
}

/// Parameters of one runtime query
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAnswerRequest {
    pub question: String,
    pub top: u32,
    pub score_threshold: f64,
    /// Restrict the query to the test index of the knowledge base
    pub is_test: bool,
    pub ranker_type: RankerType,
}

/// One ranked answer returned for a query
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AnswerCandidate {
    pub id: i64,
    pub score: f64,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub answer: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GenerateAnswerResponse {
    #[serde(default)]
    pub answers: Vec<AnswerCandidate>,
}
