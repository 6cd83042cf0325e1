use serde::{Deserialize, Serialize};

/// Moderation state of an application that an admin can review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewStatus {
    Approved,
    Pending,
    Rejected,
}

impl ReviewStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Approved" => Some(ReviewStatus::Approved),
            "Pending" => Some(ReviewStatus::Pending),
            "Rejected" => Some(ReviewStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Approved => "Approved",
            ReviewStatus::Pending => "Pending",
            ReviewStatus::Rejected => "Rejected",
        }
    }

    /// Button label for the action that moves a record into this state.
    pub fn action_label(&self) -> &'static str {
        match self {
            ReviewStatus::Approved => "Approve",
            ReviewStatus::Pending => "Mark pending",
            ReviewStatus::Rejected => "Reject",
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
