//! Decision application over a copy of the snapshot.
//!
//! # Invariants
//! - The argument snapshot is never mutated; untouched documents stay shared.
//! - Book ids renamed by earlier decisions are followed through the
//!   replacement chain before later decisions act; cycles stop the walk.
//! - A decision whose target no longer resolves is skipped and its issue is
//!   reported as unresolved.
//! - `normalize` runs once, after every other decision in the batch.

use crate::model::snapshot::Snapshot;
use crate::model::workspace::BookReference;
use crate::reconcile::issue::{ConsistencyIssue, Decision, IssueKind};
use crate::recent::replace_recent;
use log::info;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Decision rejected at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairError {
    /// The decision is not offered for this issue type.
    UnsupportedDecision { issue_id: String, decision: Decision },
}

impl Display for RepairError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedDecision { issue_id, decision } => {
                write!(f, "decision `{decision}` is not supported for issue {issue_id}")
            }
        }
    }
}

impl Error for RepairError {}

/// Result of one repair pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairOutcome {
    pub snapshot: Snapshot,
    /// Issues fixed by this pass, in input order.
    pub resolved_issue_ids: Vec<String>,
    /// Deferred, undecided, or unresolvable issues, in input order.
    pub unresolved_issue_ids: Vec<String>,
    /// Old book id -> new book id, for every `useFile` applied.
    pub book_id_replacements: BTreeMap<String, String>,
    /// Book id -> new active sheet (`None` when the book has no sheets).
    pub sheet_selection_updates: BTreeMap<String, Option<String>>,
}

/// Applies `decisions` (keyed by issue id) to a copy of `snapshot`.
///
/// `now` stamps `updatedAt` on every entry the pass touches.
///
/// # Errors
/// - `UnsupportedDecision` when a decision is outside the issue's supported
///   set; nothing is applied in that case.
pub fn repair(
    snapshot: &Snapshot,
    issues: &[ConsistencyIssue],
    decisions: &HashMap<String, Decision>,
    now: &str,
) -> Result<RepairOutcome, RepairError> {
    for issue in issues {
        if let Some(&decision) = decisions.get(&issue.id) {
            if !issue.supports(decision) {
                return Err(RepairError::UnsupportedDecision {
                    issue_id: issue.id.clone(),
                    decision,
                });
            }
        }
    }

    let mut pass = RepairPass {
        snapshot: snapshot.clone(),
        now,
        replacements: BTreeMap::new(),
        selection_updates: BTreeMap::new(),
        index_touched: false,
    };
    let mut resolved = HashSet::new();
    let mut pending_normalize = Vec::new();

    for issue in issues {
        let decision = match decisions.get(&issue.id) {
            Some(Decision::Defer) | None => continue,
            Some(&decision) => decision,
        };
        let applied = match (&issue.kind, decision) {
            (
                IssueKind::BookIdMismatch {
                    book_ref_id,
                    workspace_index,
                    book_file_path,
                    ..
                },
                Decision::UseFile,
            ) => pass.use_file(book_ref_id, *workspace_index, book_file_path),
            (
                IssueKind::BookIdMismatch {
                    book_ref_id,
                    workspace_index,
                    book_file_path,
                    ..
                },
                Decision::UseWorkspace,
            ) => pass.use_workspace(book_ref_id, *workspace_index, book_file_path),
            (
                IssueKind::MissingActiveSheet {
                    book_id,
                    workspace_index,
                    ..
                },
                Decision::Reset,
            ) => pass.reset_active_sheet(book_id, *workspace_index),
            (
                IssueKind::MissingFolderReference {
                    book_id,
                    workspace_index,
                    ..
                },
                Decision::Reset,
            ) => pass.reset_folder(book_id, *workspace_index),
            (IssueKind::InvalidOrder { .. }, Decision::Normalize) => {
                pending_normalize.push(issue.id.as_str());
                false
            }
            _ => false,
        };
        if applied {
            resolved.insert(issue.id.as_str());
        }
    }

    if !pending_normalize.is_empty() {
        pass.normalize_orders();
        resolved.extend(pending_normalize);
    }

    let (resolved_issue_ids, unresolved_issue_ids): (Vec<String>, Vec<String>) = {
        let mut done = Vec::new();
        let mut open = Vec::new();
        for issue in issues {
            if resolved.contains(issue.id.as_str()) {
                done.push(issue.id.clone());
            } else {
                open.push(issue.id.clone());
            }
        }
        (done, open)
    };

    let RepairPass {
        mut snapshot,
        replacements,
        selection_updates,
        index_touched,
        ..
    } = pass;
    if index_touched {
        snapshot.index_mut().workspace.updated_at = now.to_string();
    }

    info!(
        "event=reconcile_repair module=reconcile status=ok resolved={} unresolved={} \
         replacements={}",
        resolved_issue_ids.len(),
        unresolved_issue_ids.len(),
        replacements.len()
    );

    Ok(RepairOutcome {
        snapshot,
        resolved_issue_ids,
        unresolved_issue_ids,
        book_id_replacements: replacements,
        sheet_selection_updates: selection_updates,
    })
}

struct RepairPass<'a> {
    snapshot: Snapshot,
    now: &'a str,
    replacements: BTreeMap<String, String>,
    selection_updates: BTreeMap<String, Option<String>>,
    index_touched: bool,
}

impl RepairPass<'_> {
    /// Follows the replacement chain from `id` to the book's current id.
    fn current_id(&self, id: &str) -> String {
        let mut current = id.to_string();
        let mut visited = HashSet::new();
        while let Some(next) = self.replacements.get(&current) {
            if !visited.insert(current.clone()) {
                break;
            }
            current = next.clone();
        }
        current
    }

    /// Finds the reference, preferring the recorded index position.
    fn locate_reference(&self, book_id: &str, workspace_index: usize) -> Option<usize> {
        let books = &self.snapshot.index().books;
        match books.get(workspace_index) {
            Some(reference) if reference.id == book_id => Some(workspace_index),
            _ => self.snapshot.index().book_position(book_id),
        }
    }

    fn locate_file(&self, reference_position: usize, book_file_path: &str) -> Option<usize> {
        self.snapshot
            .books
            .iter()
            .position(|book| book.file_path == book_file_path)
            .or_else(|| {
                let reference = &self.snapshot.index().books[reference_position];
                self.snapshot.match_book_file(reference)
            })
    }

    fn touch_reference(&mut self, position: usize) -> &mut BookReference {
        self.index_touched = true;
        let now = self.now.to_string();
        let reference = &mut self.snapshot.index_mut().books[position];
        reference.updated_at = now;
        reference
    }

    fn use_file(
        &mut self,
        book_ref_id: &str,
        workspace_index: usize,
        book_file_path: &str,
    ) -> bool {
        let old_id = self.current_id(book_ref_id);
        let Some(position) = self.locate_reference(&old_id, workspace_index) else {
            return false;
        };
        let Some(file) = self.locate_file(position, book_file_path) else {
            return false;
        };
        let new_id = self.snapshot.books[file].data.book.id.clone();
        if new_id == old_id {
            return true;
        }

        self.touch_reference(position).id = new_id.clone();
        let settings = &mut self.snapshot.index_mut().workspace.settings;
        replace_recent(&mut settings.recent_book_ids, &old_id, &new_id);
        self.replacements.insert(old_id, new_id);
        true
    }

    fn use_workspace(
        &mut self,
        book_ref_id: &str,
        workspace_index: usize,
        book_file_path: &str,
    ) -> bool {
        let target_id = self.current_id(book_ref_id);
        let Some(position) = self.locate_reference(&target_id, workspace_index) else {
            return false;
        };
        let Some(file) = self.locate_file(position, book_file_path) else {
            return false;
        };
        let now = self.now.to_string();
        let Some(document) = self.snapshot.book_mut(file) else {
            return false;
        };
        if document.book.id != target_id {
            document.book.id = target_id;
            document.book.updated_at = now;
        }
        true
    }

    fn reset_active_sheet(&mut self, book_id: &str, workspace_index: usize) -> bool {
        let current_id = self.current_id(book_id);
        let Some(position) = self.locate_reference(&current_id, workspace_index) else {
            return false;
        };
        let reference = &self.snapshot.index().books[position];
        let Some(file) = self.snapshot.match_book_file(reference) else {
            return false;
        };
        let document = &self.snapshot.books[file].data;
        let still_valid = reference
            .active_sheet_id
            .as_deref()
            .map_or(true, |sheet_id| document.sheet(sheet_id).is_some());
        if still_valid {
            return true;
        }

        let replacement = document.sheets.first().map(|sheet| sheet.id.clone());
        self.touch_reference(position).active_sheet_id = replacement.clone();
        self.selection_updates.insert(current_id, replacement);
        true
    }

    fn reset_folder(&mut self, book_id: &str, workspace_index: usize) -> bool {
        let current_id = self.current_id(book_id);
        let Some(position) = self.locate_reference(&current_id, workspace_index) else {
            return false;
        };
        let index = self.snapshot.index();
        let dangling = index.books[position]
            .folder_id
            .as_deref()
            .is_some_and(|folder_id| !index.has_folder(folder_id));
        if dangling {
            self.touch_reference(position).folder_id = None;
        }
        true
    }

    /// Rewrites every sibling group's orders as `0..n`.
    ///
    /// Existing numeric order is kept, non-finite orders sort last, and ties
    /// fall back to ascending id.
    fn normalize_orders(&mut self) {
        let assignments = {
            let books = &self.snapshot.index().books;
            let mut groups: BTreeMap<Option<&str>, Vec<usize>> = BTreeMap::new();
            for (position, reference) in books.iter().enumerate() {
                groups
                    .entry(reference.folder_id.as_deref())
                    .or_default()
                    .push(position);
            }

            let mut assignments = Vec::new();
            for members in groups.values_mut() {
                members.sort_by(|&a, &b| compare_for_normalize(&books[a], &books[b]));
                for (rank, &position) in members.iter().enumerate() {
                    let rank = rank as f64;
                    if books[position].order != rank {
                        assignments.push((position, rank));
                    }
                }
            }
            assignments
        };

        for (position, rank) in assignments {
            self.touch_reference(position).order = rank;
        }
    }
}

fn compare_for_normalize(a: &BookReference, b: &BookReference) -> Ordering {
    let by_order = match (a.order.is_finite(), b.order.is_finite()) {
        (true, true) => a.order.partial_cmp(&b.order).unwrap_or(Ordering::Equal),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    };
    by_order.then_with(|| a.id.cmp(&b.id))
}
