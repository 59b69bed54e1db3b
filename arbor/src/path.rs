//! Index-path addressing.
//!
//! An index path is a sequence of zero-based child indices starting at the
//! root. `[]` is the root, `[0]` its first child, `[0, 2]` the third child of
//! that, and so on.

use serde_json::Value;

use crate::error::TreeError;

/// Resolves `path` against `root`, descending through `children_field`.
///
/// Fails with [`TreeError::OutOfRange`] if an index is past the end of a
/// children array or a node on the way has no children array.
///
/// # Example
///
/// ```
/// use serde_json::json;
///
/// let tree = json!({"children": [{"label": "a", "children": [{"label": "b"}]}]});
/// let node = arbor::path::resolve(&tree, &[0, 0], "children").unwrap();
/// assert_eq!(node["label"], "b");
/// ```
pub fn resolve<'a>(
    root: &'a Value,
    path: &[usize],
    children_field: &str,
) -> Result<&'a Value, TreeError> {
    let mut current = root;
    for (step, &index) in path.iter().enumerate() {
        let children = current
            .get(children_field)
            .and_then(Value::as_array)
            .ok_or_else(|| TreeError::out_of_range(path, step, None))?;
        current = children
            .get(index)
            .ok_or_else(|| TreeError::out_of_range(path, step, Some(children.len())))?;
    }
    Ok(current)
}

/// Mutable variant of [`resolve`].
pub fn resolve_mut<'a>(
    root: &'a mut Value,
    path: &[usize],
    children_field: &str,
) -> Result<&'a mut Value, TreeError> {
    let mut current = root;
    for (step, &index) in path.iter().enumerate() {
        let children = current
            .get_mut(children_field)
            .and_then(Value::as_array_mut)
            .ok_or_else(|| TreeError::out_of_range(path, step, None))?;
        let len = children.len();
        current = children
            .get_mut(index)
            .ok_or_else(|| TreeError::out_of_range(path, step, Some(len)))?;
    }
    Ok(current)
}
