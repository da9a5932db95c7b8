use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle state of a feedback dataset.
///
/// Statuses this crate does not know are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DatasetStatus {
    Draft,
    /// Published.
    Ready,
    Other(String),
}

impl DatasetStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DatasetStatus::Draft => "draft",
            DatasetStatus::Ready => "ready",
            DatasetStatus::Other(s) => s,
        }
    }
}

impl From<String> for DatasetStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "draft" => DatasetStatus::Draft,
            "ready" => DatasetStatus::Ready,
            _ => DatasetStatus::Other(s),
        }
    }
}

impl From<DatasetStatus> for String {
    fn from(status: DatasetStatus) -> Self {
        match status {
            DatasetStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidelines: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DatasetStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inserted_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Keys not modelled above, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Dataset {
    pub fn is_published(&self) -> bool {
        self.status == Some(DatasetStatus::Ready)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub responses: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inserted_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of records as returned by `get_records`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordsPage {
    pub items: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// Field schema element; the service owns its shape.
pub type Field = Value;

/// Question schema element; the service owns its shape.
pub type Question = Value;

#[derive(Debug, Serialize)]
pub(crate) struct CreateDatasetRequest<'a> {
    pub(crate) name: &'a str,
    pub(crate) workspace_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) guidelines: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ItemsRequest<'a, T> {
    pub(crate) items: &'a [T],
}

#[derive(Debug, Deserialize)]
pub(crate) struct ItemsResponse<T> {
    pub(crate) items: Vec<T>,
}
