//! Issue and decision types produced and consumed by reconciliation.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// User-selected repair action for one issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Decision {
    /// Trust the book file's id.
    UseFile,
    /// Trust the workspace reference's id.
    UseWorkspace,
    /// Drop the dangling pointer.
    Reset,
    /// Rebuild dense sibling orders.
    Normalize,
    /// Leave the issue for a later pass.
    Defer,
}

impl Display for Decision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::UseFile => "useFile",
            Self::UseWorkspace => "useWorkspace",
            Self::Reset => "reset",
            Self::Normalize => "normalize",
            Self::Defer => "defer",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderIssueReason {
    NonFinite,
    Duplicate,
}

/// Issue payload, one variant per issue type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum IssueKind {
    BookIdMismatch {
        book_ref_id: String,
        book_file_id: String,
        workspace_index: usize,
        book_file_path: String,
    },
    MissingActiveSheet {
        book_id: String,
        active_sheet_id: String,
        available_sheet_ids: Vec<String>,
        workspace_index: usize,
    },
    MissingFolderReference {
        book_id: String,
        folder_id: String,
        workspace_index: usize,
    },
    InvalidOrder {
        book_id: String,
        folder_id: Option<String>,
        order: f64,
        reason: OrderIssueReason,
        workspace_index: usize,
    },
}

impl IssueKind {
    /// Kebab-case type tag, also the prefix of the issue id.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::BookIdMismatch { .. } => "book-id-mismatch",
            Self::MissingActiveSheet { .. } => "missing-active-sheet",
            Self::MissingFolderReference { .. } => "missing-folder-reference",
            Self::InvalidOrder { .. } => "invalid-order",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::BookIdMismatch { .. } => Severity::Error,
            _ => Severity::Warning,
        }
    }

    /// Decisions accepted for this issue type, recommended first.
    pub fn supported_decisions(&self) -> &'static [Decision] {
        match self {
            Self::BookIdMismatch { .. } => {
                &[Decision::UseFile, Decision::UseWorkspace, Decision::Defer]
            }
            Self::MissingActiveSheet { .. } | Self::MissingFolderReference { .. } => {
                &[Decision::Reset, Decision::Defer]
            }
            Self::InvalidOrder { .. } => &[Decision::Normalize, Decision::Defer],
        }
    }

    /// Index position of the reference this issue was raised against.
    pub fn workspace_index(&self) -> usize {
        match self {
            Self::BookIdMismatch {
                workspace_index, ..
            }
            | Self::MissingActiveSheet {
                workspace_index, ..
            }
            | Self::MissingFolderReference {
                workspace_index, ..
            }
            | Self::InvalidOrder {
                workspace_index, ..
            } => *workspace_index,
        }
    }

    fn id_parts(&self) -> Vec<&str> {
        match self {
            Self::BookIdMismatch {
                book_ref_id,
                book_file_id,
                ..
            } => vec![book_ref_id.as_str(), book_file_id.as_str()],
            Self::MissingActiveSheet {
                book_id,
                active_sheet_id,
                ..
            } => vec![book_id.as_str(), active_sheet_id.as_str()],
            Self::MissingFolderReference {
                book_id, folder_id, ..
            } => vec![book_id.as_str(), folder_id.as_str()],
            Self::InvalidOrder {
                book_id, folder_id, ..
            } => vec![book_id.as_str(), folder_id.as_deref().unwrap_or("root")],
        }
    }
}

/// One detected inconsistency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyIssue {
    /// Stable id: `{type}:{entity ids…}`.
    pub id: String,
    pub severity: Severity,
    pub message: String,
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl ConsistencyIssue {
    pub fn new(kind: IssueKind) -> Self {
        let mut id = kind.type_name().to_string();
        for part in kind.id_parts() {
            id.push(':');
            id.push_str(part);
        }
        Self {
            id,
            severity: kind.severity(),
            message: describe(&kind),
            kind,
        }
    }

    pub fn supported_decisions(&self) -> &'static [Decision] {
        self.kind.supported_decisions()
    }

    pub fn supports(&self, decision: Decision) -> bool {
        self.supported_decisions().contains(&decision)
    }

    /// The decision offered first to the user.
    pub fn recommended_decision(&self) -> Decision {
        self.supported_decisions()[0]
    }
}

fn describe(kind: &IssueKind) -> String {
    match kind {
        IssueKind::BookIdMismatch {
            book_ref_id,
            book_file_id,
            ..
        } => format!(
            "workspace references book `{book_ref_id}` but the book file declares `{book_file_id}`"
        ),
        IssueKind::MissingActiveSheet {
            book_id,
            active_sheet_id,
            ..
        } => format!("book `{book_id}` selects sheet `{active_sheet_id}` which does not exist"),
        IssueKind::MissingFolderReference {
            book_id, folder_id, ..
        } => format!("book `{book_id}` is filed under unknown folder `{folder_id}`"),
        IssueKind::InvalidOrder {
            book_id, reason, ..
        } => match reason {
            OrderIssueReason::NonFinite => format!("book `{book_id}` has a non-numeric order"),
            OrderIssueReason::Duplicate => {
                format!("book `{book_id}` shares its order with a sibling")
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{ConsistencyIssue, Decision, IssueKind, OrderIssueReason, Severity};
    use serde_json::json;

    #[test]
    fn issue_id_is_built_from_type_and_entity_ids() {
        let issue = ConsistencyIssue::new(IssueKind::InvalidOrder {
            book_id: "book-002".to_string(),
            folder_id: None,
            order: 0.0,
            reason: OrderIssueReason::Duplicate,
            workspace_index: 1,
        });
        assert_eq!(issue.id, "invalid-order:book-002:root");
        assert_eq!(issue.severity, Severity::Warning);
        assert_eq!(issue.recommended_decision(), Decision::Normalize);
        assert!(!issue.supports(Decision::UseFile));
    }

    #[test]
    fn issue_serializes_with_kebab_type_tag() {
        let issue = ConsistencyIssue::new(IssueKind::MissingFolderReference {
            book_id: "book-001".to_string(),
            folder_id: "folder-x".to_string(),
            workspace_index: 0,
        });
        let raw = serde_json::to_value(&issue).unwrap();
        assert_eq!(raw["type"], json!("missing-folder-reference"));
        assert_eq!(raw["folderId"], json!("folder-x"));
        assert_eq!(raw["severity"], json!("warning"));
        assert_eq!(serde_json::to_value(Decision::UseFile).unwrap(), json!("useFile"));
    }
}
