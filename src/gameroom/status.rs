use serde::Serialize;

/// Session lifecycle. Complete is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Waiting,
    InProgress,
    Complete,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Status::Waiting => write!(f, "waiting"),
            Status::InProgress => write!(f, "in_progress"),
            Status::Complete => write!(f, "complete"),
        }
    }
}
