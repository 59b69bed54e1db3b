//! Child windows and lazy-load status.

use serde_json::Value;

use crate::source::FetchError;

/// What an expanded node can show below itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildrenStatus {
    /// No children and nothing to fetch.
    Leaf,
    /// Children are resident; `shown` of `total` are materialized.
    Resident { shown: usize, total: usize },
    /// Children will be requested on expansion.
    Unloaded,
    /// A request is in flight.
    Pending,
    /// The last request failed.
    Failed(FetchError),
}

impl ChildrenStatus {
    /// Returns `true` if the node has nothing below it.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf)
    }

    /// Number of children still hidden behind "load more".
    pub fn remaining(&self) -> usize {
        match self {
            Self::Resident { shown, total } => total - shown,
            _ => 0,
        }
    }
}

/// Starting cursor. Without a page size the window covers everything.
pub(crate) fn initial_cursor(page_size: Option<usize>) -> usize {
    page_size.unwrap_or(usize::MAX)
}

/// Number of children materialized for `cursor`.
pub(crate) fn shown(cursor: usize, total: usize) -> usize {
    cursor.min(total)
}

/// Cursor after one "load more". Never decreases and never moves past
/// `total`.
pub(crate) fn advance(cursor: usize, page_size: Option<usize>, total: usize) -> usize {
    match page_size {
        Some(step) => cursor.max(shown(cursor, total).saturating_add(step).min(total)),
        None => cursor,
    }
}

pub(crate) fn children_status(
    children: Option<&Vec<Value>>,
    lazy: bool,
    pending: bool,
    failed: Option<&FetchError>,
    cursor: usize,
) -> ChildrenStatus {
    match children {
        Some(children) if children.is_empty() => ChildrenStatus::Leaf,
        Some(children) => ChildrenStatus::Resident {
            shown: shown(cursor, children.len()),
            total: children.len(),
        },
        None if !lazy => ChildrenStatus::Leaf,
        None if pending => ChildrenStatus::Pending,
        None => match failed {
            Some(err) => ChildrenStatus::Failed(err.clone()),
            None => ChildrenStatus::Unloaded,
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_window_sequence_clamps() {
        let page = Some(20);
        let mut cursor = initial_cursor(page);
        assert_eq!(shown(cursor, 45), 20);
        cursor = advance(cursor, page, 45);
        assert_eq!(shown(cursor, 45), 40);
        cursor = advance(cursor, page, 45);
        assert_eq!(shown(cursor, 45), 45);
        assert_eq!(cursor, 45);
        cursor = advance(cursor, page, 45);
        assert_eq!(cursor, 45);
    }

    #[test]
    fn test_advance_never_decreases() {
        assert_eq!(advance(20, Some(20), 5), 20);
        assert_eq!(advance(usize::MAX, None, 10), usize::MAX);
    }

    #[test]
    fn test_unpaginated_shows_everything() {
        assert_eq!(shown(initial_cursor(None), 1000), 1000);
    }

    #[test]
    fn test_status_resolution() {
        let two = vec![json!({}), json!({})];
        let empty = Vec::new();
        assert_eq!(
            children_status(Some(&two), false, false, None, 1),
            ChildrenStatus::Resident { shown: 1, total: 2 }
        );
        assert!(children_status(Some(&empty), true, false, None, 20).is_leaf());
        assert!(children_status(None, false, false, None, 20).is_leaf());
        assert_eq!(
            children_status(None, true, false, None, 20),
            ChildrenStatus::Unloaded
        );
        assert_eq!(
            children_status(None, true, true, None, 20),
            ChildrenStatus::Pending
        );
        let err = FetchError::new("down");
        assert_eq!(
            children_status(None, true, false, Some(&err), 20),
            ChildrenStatus::Failed(err)
        );
    }

    #[test]
    fn test_remaining() {
        assert_eq!(ChildrenStatus::Resident { shown: 20, total: 45 }.remaining(), 25);
        assert_eq!(ChildrenStatus::Pending.remaining(), 0);
    }
}
