//! Drift detection between the workspace index and loaded book files.

use crate::model::snapshot::Snapshot;
use crate::reconcile::issue::{ConsistencyIssue, IssueKind, OrderIssueReason};
use log::info;
use std::collections::{HashMap, HashSet};

/// Scans every book reference and returns the issues found, in index order.
///
/// # Invariants
/// - Pure: no side effects besides one metadata-only log line.
/// - For an order collision the first reference holding the key is flagged
///   once, and every later reference holding it is flagged too.
pub fn detect(snapshot: &Snapshot) -> Vec<ConsistencyIssue> {
    let index = snapshot.index();
    let mut issues = Vec::new();
    let mut first_holder: HashMap<(Option<&str>, u64), usize> = HashMap::new();
    let mut flagged_holders: HashSet<usize> = HashSet::new();

    for (position, reference) in index.books.iter().enumerate() {
        if let Some(file) = snapshot
            .match_book_file(reference)
            .map(|matched| &snapshot.books[matched])
        {
            let document = &file.data;
            if document.book.id != reference.id {
                issues.push(ConsistencyIssue::new(IssueKind::BookIdMismatch {
                    book_ref_id: reference.id.clone(),
                    book_file_id: document.book.id.clone(),
                    workspace_index: position,
                    book_file_path: file.file_path.clone(),
                }));
            }

            if let Some(active_sheet_id) = &reference.active_sheet_id {
                if document.sheet(active_sheet_id).is_none() {
                    issues.push(ConsistencyIssue::new(IssueKind::MissingActiveSheet {
                        book_id: reference.id.clone(),
                        active_sheet_id: active_sheet_id.clone(),
                        available_sheet_ids: document.sheet_ids(),
                        workspace_index: position,
                    }));
                }
            }
        }

        if let Some(folder_id) = &reference.folder_id {
            if !index.has_folder(folder_id) {
                issues.push(ConsistencyIssue::new(IssueKind::MissingFolderReference {
                    book_id: reference.id.clone(),
                    folder_id: folder_id.clone(),
                    workspace_index: position,
                }));
            }
        }

        if !reference.order.is_finite() {
            issues.push(order_issue(snapshot, position, OrderIssueReason::NonFinite));
            continue;
        }

        let key = (reference.folder_id.as_deref(), order_key(reference.order));
        match first_holder.get(&key) {
            None => {
                first_holder.insert(key, position);
            }
            Some(&first) => {
                if flagged_holders.insert(first) {
                    issues.push(order_issue(snapshot, first, OrderIssueReason::Duplicate));
                }
                issues.push(order_issue(snapshot, position, OrderIssueReason::Duplicate));
            }
        }
    }

    info!(
        "event=reconcile_detect module=reconcile status=ok books={} issues={}",
        index.books.len(),
        issues.len()
    );
    issues
}

fn order_issue(snapshot: &Snapshot, position: usize, reason: OrderIssueReason) -> ConsistencyIssue {
    let reference = &snapshot.index().books[position];
    ConsistencyIssue::new(IssueKind::InvalidOrder {
        book_id: reference.id.clone(),
        folder_id: reference.folder_id.clone(),
        order: reference.order,
        reason,
        workspace_index: position,
    })
}

// `0.0` and `-0.0` compare equal, so they must share a key.
fn order_key(order: f64) -> u64 {
    if order == 0.0 {
        0.0f64.to_bits()
    } else {
        order.to_bits()
    }
}
