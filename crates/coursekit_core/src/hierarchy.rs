//! Topic tree utilities: flatten, rebuild, navigate and patch.
//!
//! # Responsibility
//! - Produce the linear depth-first order used for prev/next navigation and
//!   progress.
//! - Rebuild a tree from flat persisted rows.
//! - Apply patches and reorders without mutating the input tree.
//!
//! # Invariants
//! - Flattening emits a parent before its children, siblings by `order`.
//! - Every mutating helper returns a new tree; inputs are left untouched.
//! - Level changes from reparenting are not cascaded to descendants.

use crate::model::topic::{Topic, TopicId, TopicPatch};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Completion summary over a flattened topic set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub completed: usize,
    pub total: usize,
    /// `completed / total * 100`, zero for an empty set.
    pub percent: f64,
}

/// Linear neighbours of one topic in flattened order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicNeighbors<'a> {
    pub previous: Option<&'a Topic>,
    pub next: Option<&'a Topic>,
}

/// Depth-first, parent-before-children flattening.
pub fn flatten(topics: &[Topic]) -> Vec<&Topic> {
    let mut flat = Vec::new();
    push_flattened(topics, &mut flat);
    flat
}

fn push_flattened<'a>(topics: &'a [Topic], flat: &mut Vec<&'a Topic>) {
    let mut siblings: Vec<&Topic> = topics.iter().collect();
    siblings.sort_by_key(|topic| topic.order);
    for topic in siblings {
        flat.push(topic);
        push_flattened(&topic.children, flat);
    }
}

/// Completion percentage over every topic in the tree.
pub fn progress(topics: &[Topic]) -> CourseProgress {
    let flat = flatten(topics);
    let total = flat.len();
    let completed = flat.iter().filter(|topic| topic.completed).count();
    let percent = if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    };
    CourseProgress {
        completed,
        total,
        percent,
    }
}

/// Previous/next topics around `id` in flattened order.
///
/// Returns `None` when `id` is not in the tree.
pub fn neighbors(topics: &[Topic], id: TopicId) -> Option<TopicNeighbors<'_>> {
    let flat = flatten(topics);
    let index = flat.iter().position(|topic| topic.id == id)?;
    Some(TopicNeighbors {
        previous: index.checked_sub(1).map(|prev| flat[prev]),
        next: flat.get(index + 1).copied(),
    })
}

/// Finds one topic anywhere in the tree.
pub fn find_topic(topics: &[Topic], id: TopicId) -> Option<&Topic> {
    topics.iter().find_map(|topic| {
        if topic.id == id {
            Some(topic)
        } else {
            find_topic(&topic.children, id)
        }
    })
}

/// Returns a new tree where the node `id` has `patch` merged in.
///
/// Unknown ids yield an unchanged copy.
pub fn update_topic_in_hierarchy(
    topics: &[Topic],
    id: TopicId,
    patch: &TopicPatch,
) -> Vec<Topic> {
    topics
        .iter()
        .map(|topic| {
            let mut updated = topic.clone();
            if topic.id == id {
                patch.apply_to(&mut updated);
            } else if topic.has_children() {
                updated.children = update_topic_in_hierarchy(&topic.children, id, patch);
            }
            updated
        })
        .collect()
}

/// Local half of a reparent: only the moved node's `level` is recomputed.
///
/// Descendant levels are intentionally left as stored.
pub fn apply_level_change(topics: &[Topic], id: TopicId, new_level: u32) -> Vec<Topic> {
    update_topic_in_hierarchy(topics, id, &TopicPatch::level(new_level))
}

/// Returns a new tree with the children of `parent_id` (roots when `None`)
/// reordered to follow `ordered_ids`.
///
/// Siblings missing from `ordered_ids` keep their relative order after the
/// listed ones. Orders are rewritten as `0..n`.
pub fn reorder_siblings(
    topics: &[Topic],
    parent_id: Option<TopicId>,
    ordered_ids: &[TopicId],
) -> Vec<Topic> {
    match parent_id {
        None => reorder_list(topics, ordered_ids),
        Some(parent_id) => topics
            .iter()
            .map(|topic| {
                let mut updated = topic.clone();
                if topic.id == parent_id {
                    updated.children = reorder_list(&topic.children, ordered_ids);
                } else if topic.has_children() {
                    updated.children =
                        reorder_siblings(&topic.children, Some(parent_id), ordered_ids);
                }
                updated
            })
            .collect(),
    }
}

fn reorder_list(siblings: &[Topic], ordered_ids: &[TopicId]) -> Vec<Topic> {
    let rank: HashMap<TopicId, usize> = ordered_ids
        .iter()
        .enumerate()
        .map(|(index, id)| (*id, index))
        .collect();

    let mut current: Vec<&Topic> = siblings.iter().collect();
    current.sort_by_key(|topic| topic.order);
    current.sort_by_key(|topic| rank.get(&topic.id).copied().unwrap_or(usize::MAX));

    current
        .into_iter()
        .enumerate()
        .map(|(index, topic)| {
            let mut updated = topic.clone();
            updated.order = index as i64;
            updated
        })
        .collect()
}

/// Returns a copy with every sibling list sorted by `order`.
pub fn sort_hierarchy(topics: &[Topic]) -> Vec<Topic> {
    let mut sorted: Vec<Topic> = topics
        .iter()
        .map(|topic| {
            let mut updated = topic.clone();
            updated.children = sort_hierarchy(&topic.children);
            updated
        })
        .collect();
    sorted.sort_by_key(|topic| topic.order);
    sorted
}

/// Rebuilds a tree from flat rows linked by `parent_id`.
///
/// Input `children` fields are ignored. Rows whose parent is absent are
/// promoted to roots. Stored levels are kept as-is.
pub fn build_tree(rows: Vec<Topic>) -> Vec<Topic> {
    let known: HashSet<TopicId> = rows.iter().map(|row| row.id).collect();
    let mut by_parent: HashMap<Option<TopicId>, Vec<Topic>> = HashMap::new();
    for mut row in rows {
        row.children.clear();
        let parent = row.parent_id.filter(|parent| known.contains(parent));
        by_parent.entry(parent).or_default().push(row);
    }

    let roots = by_parent.remove(&None).unwrap_or_default();
    let tree = attach_children(roots, &mut by_parent);
    sort_hierarchy(&tree)
}

fn attach_children(
    nodes: Vec<Topic>,
    by_parent: &mut HashMap<Option<TopicId>, Vec<Topic>>,
) -> Vec<Topic> {
    nodes
        .into_iter()
        .map(|mut node| {
            let children = by_parent.remove(&Some(node.id)).unwrap_or_default();
            node.children = attach_children(children, by_parent);
            node
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        apply_level_change, build_tree, find_topic, flatten, neighbors, progress, reorder_siblings,
        update_topic_in_hierarchy,
    };
    use crate::model::topic::{Topic, TopicPatch};

    fn sample() -> Vec<Topic> {
        let a = Topic::new("A", "").with_child(Topic::new("A1", ""));
        let root = Topic::new("R", "")
            .with_child(a)
            .with_child(Topic::new("B", ""));
        vec![root]
    }

    fn titles(flat: &[&Topic]) -> Vec<String> {
        flat.iter().map(|topic| topic.title.clone()).collect()
    }

    #[test]
    fn flatten_is_depth_first_parent_first() {
        let tree = sample();
        assert_eq!(titles(&flatten(&tree)), vec!["R", "A", "A1", "B"]);
    }

    #[test]
    fn progress_of_empty_tree_is_zero() {
        let summary = progress(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.percent, 0.0);
    }

    #[test]
    fn neighbors_cross_levels() {
        let tree = sample();
        let a1 = tree[0].children[0].children[0].id;
        let around = neighbors(&tree, a1).expect("A1 should be in the tree");
        assert_eq!(around.previous.map(|t| t.title.as_str()), Some("A"));
        assert_eq!(around.next.map(|t| t.title.as_str()), Some("B"));
    }

    #[test]
    fn reorder_rewrites_orders() {
        let tree = sample();
        let root = &tree[0];
        let b = root.children[1].id;
        let a = root.children[0].id;
        let reordered = reorder_siblings(&tree, Some(root.id), &[b, a]);
        assert_eq!(titles(&flatten(&reordered)), vec!["R", "B", "A", "A1"]);
        assert_eq!(reordered[0].children[0].order, 0);
        assert_eq!(tree[0].children[0].title, "A");
    }

    #[test]
    fn patch_returns_new_tree_and_leaves_input() {
        let tree = sample();
        let a1 = tree[0].children[0].children[0].id;
        let patched = update_topic_in_hierarchy(&tree, a1, &TopicPatch::completed(true));

        assert!(find_topic(&patched, a1).expect("A1 present").completed);
        assert!(!find_topic(&tree, a1).expect("A1 present").completed);
        assert_eq!(progress(&patched).completed, 1);
    }

    #[test]
    fn level_change_does_not_cascade() {
        let tree = sample();
        let a = tree[0].children[0].id;
        let a1 = tree[0].children[0].children[0].id;
        let moved = apply_level_change(&tree, a, 0);

        assert_eq!(find_topic(&moved, a).expect("A present").level, 0);
        assert_eq!(find_topic(&moved, a1).expect("A1 present").level, 2);
    }

    #[test]
    fn build_tree_links_rows_and_promotes_orphans() {
        let tree = sample();
        let mut rows: Vec<Topic> = flatten(&tree).into_iter().cloned().collect();
        let mut orphan = Topic::new("Orphan", "");
        orphan.parent_id = Some(uuid::Uuid::new_v4());
        orphan.order = 5;
        rows.push(orphan);
        rows.reverse();

        let rebuilt = build_tree(rows);
        assert_eq!(rebuilt.len(), 2);
        assert_eq!(titles(&flatten(&rebuilt)), vec!["R", "A", "A1", "B", "Orphan"]);
    }
}
