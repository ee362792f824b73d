use sqlx::FromRow;

/// Reference/lookup row for a handling status. Read-only from this
/// service's perspective.
#[derive(Debug, Clone, FromRow)]
pub struct Status {
    pub id: i32,
    pub code: String,
    pub label: String,
    pub sort_order: i32,
    pub active: bool,
}

impl Status {
    /// Whether a transition into this status resolves the report.
    pub fn is_terminal(&self) -> bool {
        self.code == crate::shared::constants::STATUS_CODE_RESOLVED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_code_is_terminal() {
        let status = Status {
            id: 3,
            code: "resolved".to_string(),
            label: "Resolved".to_string(),
            sort_order: 3,
            active: true,
        };
        assert!(status.is_terminal());

        let status = Status {
            id: 2,
            code: "in_progress".to_string(),
            label: "In progress".to_string(),
            sort_order: 2,
            active: true,
        };
        assert!(!status.is_terminal());
    }
}
