use serde::{Deserialize, Serialize};

/// One-render status messages carried in the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListNameForm {
    #[serde(default)]
    pub list_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoForm {
    #[serde(default)]
    pub todo: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionForm {
    #[serde(default)]
    pub completed: String,
}

impl CompletionForm {
    /// Anything other than the literal `true` marks the todo incomplete.
    pub fn is_completed(&self) -> bool {
        self.completed.trim() == "true"
    }
}
