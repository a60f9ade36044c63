//! Minimal-move-set planning for multi-item drag-drop.
//!
//! Dragging a multi-selection may include both a folder and nodes inside
//! it; moving the folder already carries its subtree, so the redundant
//! descendants must be discarded before the store sees any move. The
//! surviving candidates form an antichain under the is-ancestor-of
//! relation.

use crate::error::{Result, TreeError};
use crate::store::{NodeId, PathStore};

/// Drop every candidate whose full path has another candidate's full path
/// as an ancestor prefix. Input order is preserved; duplicates collapse to
/// their first occurrence.
pub fn plan_moves<T>(store: &PathStore<T>, candidates: &[NodeId]) -> Vec<NodeId> {
    let mut seen = Vec::new();
    let paths: Vec<(NodeId, Vec<String>)> = candidates
        .iter()
        .filter(|id| {
            if seen.contains(*id) {
                false
            } else {
                seen.push(**id);
                true
            }
        })
        .filter_map(|id| store.full_path(*id).map(|p| (*id, segments(&p))))
        .collect();

    paths
        .iter()
        .filter(|(id, path)| {
            !paths
                .iter()
                .any(|(other, prefix)| other != id && is_prefix(prefix, path))
        })
        .map(|(id, _)| *id)
        .collect()
}

/// Plan and execute a (possibly multi-item) drop onto `dest`.
///
/// Every surviving candidate is validated against the destination first: a
/// folder dropped into itself or its own subtree fails the whole operation
/// with [`TreeError::Cycle`] before any move runs. Candidates already
/// sitting in `dest` are skipped as no-op moves. The rest are moved in
/// their original relative order so collision auto-uniquification stays
/// deterministic. Returns the number of moves issued.
pub fn execute_moves<T>(
    store: &mut PathStore<T>,
    candidates: &[NodeId],
    dest: NodeId,
) -> Result<usize> {
    if !store.is_folder(dest) {
        return Err(TreeError::NotFound);
    }
    let survivors = plan_moves(store, candidates);
    for id in &survivors {
        if *id == dest || store.is_ancestor_of(*id, dest) {
            return Err(TreeError::Cycle);
        }
    }
    let dest_path = store.full_path(dest).unwrap_or_default();
    let mut moved = 0;
    for id in survivors {
        let name = store.name(id).unwrap_or_default();
        let target_path = if dest_path.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", dest_path, name)
        };
        let current = store.full_path(id).unwrap_or_default();
        if PathStore::<T>::paths_equal(&current, &target_path) {
            continue;
        }
        store.move_node(id, dest)?;
        moved += 1;
    }
    Ok(moved)
}

fn segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

fn is_prefix(prefix: &[String], path: &[String]) -> bool {
    prefix.len() < path.len() && path[..prefix.len()] == *prefix
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn sample_store() -> PathStore<u32> {
        PathStore::from_items([
            ("A/x".to_string(), 1),
            ("A/B/y".to_string(), 2),
            ("C/z".to_string(), 3),
        ])
    }

    #[test]
    fn descendants_of_dragged_folder_are_discarded() {
        let mut store = sample_store();
        store.create_folder("Z").unwrap();
        let a = store.find("A").unwrap();
        let y = store.find("A/B/y").unwrap();
        let plan = plan_moves(&store, &[a, y]);
        assert_eq!(plan, vec![a]);
    }

    #[test]
    fn surviving_candidates_form_an_antichain() {
        let store = sample_store();
        let a = store.find("A").unwrap();
        let b = store.find("A/B").unwrap();
        let x = store.find("A/x").unwrap();
        let y = store.find("A/B/y").unwrap();
        let z = store.find("C/z").unwrap();
        let plan = plan_moves(&store, &[b, x, y, z, a]);
        for i in &plan {
            for j in &plan {
                assert!(i == j || !store.is_ancestor_of(*i, *j));
            }
        }
        // "A" being a candidate swallows B, x and y
        assert_eq!(plan, vec![z, a]);
    }

    #[test]
    fn plan_preserves_input_order_and_dedups() {
        let store = sample_store();
        let x = store.find("A/x").unwrap();
        let z = store.find("C/z").unwrap();
        assert_eq!(plan_moves(&store, &[z, x, z]), vec![z, x]);
    }

    #[test]
    fn multi_drop_issues_one_move_for_ancestor_only() {
        let mut store = sample_store();
        let dest = store.create_folder("Z").unwrap();
        let a = store.find("A").unwrap();
        let y = store.find("A/B/y").unwrap();

        let calls = Rc::new(RefCell::new(0usize));
        let sink = calls.clone();
        store.subscribe(move |change| {
            if change.kind == crate::store::ChangeKind::Moved {
                *sink.borrow_mut() += 1;
            }
        });

        let moved = execute_moves(&mut store, &[a, y], dest).unwrap();
        assert_eq!(moved, 1);
        assert_eq!(*calls.borrow(), 1);
        assert_eq!(store.full_path(a).unwrap(), "Z/A");
        // y travelled with its folder
        assert_eq!(store.full_path(y).unwrap(), "Z/A/B/y");
    }

    #[test]
    fn drop_into_own_descendant_fails_before_any_move() {
        let mut store = sample_store();
        let a = store.find("A").unwrap();
        let b = store.find("A/B").unwrap();
        let z = store.find("C/z").unwrap();
        let err = execute_moves(&mut store, &[z, a], b).unwrap_err();
        assert!(matches!(err, TreeError::Cycle));
        // Nothing executed, including the otherwise-valid z move
        assert_eq!(store.full_path(z).unwrap(), "C/z");
    }

    #[test]
    fn candidates_already_in_dest_are_skipped() {
        let mut store = sample_store();
        let a = store.find("A").unwrap();
        let x = store.find("A/x").unwrap();
        let moved = execute_moves(&mut store, &[x], a).unwrap();
        assert_eq!(moved, 0);
        assert_eq!(store.name(x), Some("x"));
    }

    #[test]
    fn stale_candidates_drop_out_of_the_plan() {
        let mut store = sample_store();
        let x = store.find("A/x").unwrap();
        let z = store.find("C/z").unwrap();
        store.delete(x).unwrap();
        assert_eq!(plan_moves(&store, &[x, z]), vec![z]);
    }
}
