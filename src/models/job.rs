use serde::{Deserialize, Serialize};

/// Server-side reference to a long-running job, replaced on every poll.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobHandle {
    pub token: String,
    pub done: bool,
    pub result_ref: Option<String>,
}

impl JobHandle {
    pub fn pending(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            done: false,
            result_ref: None,
        }
    }

    pub fn finished(token: impl Into<String>, result_ref: Option<String>) -> Self {
        Self {
            token: token.into(),
            done: true,
            result_ref,
        }
    }
}
