//! Most-recently-used id lists kept in workspace settings.
//!
//! # Invariants
//! - Newest id first, no duplicates, at most `limit` entries.
//! - An absent list (`None`) stays absent when nothing is written to it.

/// Default cap for recent book/sheet lists.
pub const RECENT_LIMIT: usize = 20;

/// Moves `id` to the front of `list`, dropping duplicates and overflow.
pub fn touch_recent(list: &mut Option<Vec<String>>, id: &str, limit: usize) {
    let entries = list.get_or_insert_with(Vec::new);
    entries.retain(|entry| entry != id);
    entries.insert(0, id.to_string());
    entries.truncate(limit);
}

/// Removes every occurrence of the ids in `removed`.
pub fn remove_recent(list: &mut Option<Vec<String>>, removed: &[String]) {
    if let Some(entries) = list {
        entries.retain(|entry| !removed.contains(entry));
    }
}

/// Renames `old_id` to `new_id` in place, keeping the first position.
pub fn replace_recent(list: &mut Option<Vec<String>>, old_id: &str, new_id: &str) {
    let Some(entries) = list else {
        return;
    };
    if !entries.iter().any(|entry| entry == old_id) {
        return;
    }
    let mut seen = false;
    entries.retain_mut(|entry| {
        if entry.as_str() == old_id {
            *entry = new_id.to_string();
        }
        if entry.as_str() == new_id {
            if seen {
                return false;
            }
            seen = true;
        }
        true
    });
}

#[cfg(test)]
mod tests {
    use super::{remove_recent, replace_recent, touch_recent};

    fn ids(values: &[&str]) -> Option<Vec<String>> {
        Some(values.iter().map(|value| value.to_string()).collect())
    }

    #[test]
    fn touch_moves_to_front_and_caps() {
        let mut list = ids(&["a", "b", "c"]);
        touch_recent(&mut list, "c", 20);
        assert_eq!(list, ids(&["c", "a", "b"]));

        touch_recent(&mut list, "d", 2);
        assert_eq!(list, ids(&["d", "c"]));
    }

    #[test]
    fn touch_creates_missing_list() {
        let mut list = None;
        touch_recent(&mut list, "a", 20);
        assert_eq!(list, ids(&["a"]));
    }

    #[test]
    fn replace_keeps_position_and_dedupes() {
        let mut list = ids(&["x", "old", "new"]);
        replace_recent(&mut list, "old", "new");
        assert_eq!(list, ids(&["x", "new"]));

        let mut absent = None;
        replace_recent(&mut absent, "old", "new");
        assert_eq!(absent, None);
    }

    #[test]
    fn remove_drops_all_matches() {
        let mut list = ids(&["a", "b", "a"]);
        remove_recent(&mut list, &["a".to_string()]);
        assert_eq!(list, ids(&["b"]));
    }
}
