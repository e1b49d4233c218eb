use super::expansion::ExpansionSet;
use super::tree::TopicForest;
use crate::api::{Topic, TopicStatus};
use std::collections::HashSet;

/// Whether `topic` renders. A hidden node hides its whole subtree; that is the
/// walk's job, not this predicate's.
pub fn is_visible(topic: &Topic, show_completed: bool) -> bool {
    show_completed || topic.status != TopicStatus::Completed
}

/// One line of the rendered tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleRow {
    pub id: String,
    pub title: String,
    pub depth: usize,
    pub status: TopicStatus,
    pub has_children: bool,
    pub is_expanded: bool,
}

/// Flattens the forest into display order.
///
/// Pre-order, siblings ascending. A node's children are visited only when the
/// node is visible, has children and is expanded. Ids already emitted are
/// skipped so a malformed parent cycle cannot loop forever.
pub fn visible_rows(
    forest: &TopicForest<'_>,
    expansion: &ExpansionSet,
    show_completed: bool,
) -> Vec<VisibleRow> {
    let mut rows = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();

    // Reversed so the first root is popped first.
    let mut stack: Vec<(&Topic, usize)> = forest.roots().map(|t| (t, 0)).collect();
    stack.reverse();

    while let Some((topic, depth)) = stack.pop() {
        if !is_visible(topic, show_completed) {
            continue;
        }
        if !visited.insert(topic.id.as_str()) {
            tracing::warn!(
                topic_id = %topic.id,
                depth,
                "Topic reached twice while walking the tree; parent links form a cycle"
            );
            continue;
        }

        let has_children = forest.has_children(&topic.id);
        let is_expanded = expansion.is_expanded(&topic.id);
        rows.push(VisibleRow {
            id: topic.id.clone(),
            title: topic.title.clone(),
            depth,
            status: topic.status,
            has_children,
            is_expanded,
        });

        if has_children && is_expanded {
            let start = stack.len();
            stack.extend(forest.children(&topic.id).map(|c| (c, depth + 1)));
            stack[start..].reverse();
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn topic(id: &str, parent: Option<&str>, order: i64, status: TopicStatus) -> Topic {
        Topic {
            id: id.to_string(),
            title: id.to_string(),
            description: None,
            parent_id: parent.map(str::to_string),
            order_index: order,
            status,
        }
    }

    fn row_ids(rows: &[VisibleRow]) -> Vec<(&str, usize)> {
        rows.iter().map(|r| (r.id.as_str(), r.depth)).collect()
    }

    #[test]
    fn predicate_follows_flag() {
        let done = topic("d", None, 0, TopicStatus::Completed);
        let open = topic("o", None, 0, TopicStatus::Pending);
        assert!(!is_visible(&done, false));
        assert!(is_visible(&done, true));
        assert!(is_visible(&open, false));
        assert!(is_visible(&open, true));
    }

    #[test]
    fn collapsed_node_hides_children() {
        let topics = vec![
            topic("a", None, 0, TopicStatus::Pending),
            topic("b", Some("a"), 0, TopicStatus::Pending),
        ];
        let forest = TopicForest::build(&topics);
        let rows = visible_rows(&forest, &ExpansionSet::new(), false);
        assert_eq!(row_ids(&rows), vec![("a", 0)]);
        assert!(rows[0].has_children);
        assert!(!rows[0].is_expanded);
    }

    #[test]
    fn expanded_walk_is_preorder() {
        let topics = vec![
            topic("r1", None, 0, TopicStatus::Pending),
            topic("r2", None, 1, TopicStatus::Pending),
            topic("c12", Some("r1"), 1, TopicStatus::Pending),
            topic("c11", Some("r1"), 0, TopicStatus::Pending),
            topic("g", Some("c11"), 0, TopicStatus::Pending),
        ];
        let forest = TopicForest::build(&topics);
        let mut expansion = ExpansionSet::new();
        expansion.expand("r1");
        expansion.expand("c11");
        let rows = visible_rows(&forest, &expansion, false);
        assert_eq!(
            row_ids(&rows),
            vec![("r1", 0), ("c11", 1), ("g", 2), ("c12", 1), ("r2", 0)]
        );
    }

    #[test]
    fn hidden_parent_hides_pending_descendants() {
        let topics = vec![
            topic("p", None, 0, TopicStatus::Completed),
            topic("c", Some("p"), 0, TopicStatus::Pending),
        ];
        let forest = TopicForest::build(&topics);
        let mut expansion = ExpansionSet::new();
        expansion.expand("p");
        assert!(visible_rows(&forest, &expansion, false).is_empty());
        assert_eq!(
            row_ids(&visible_rows(&forest, &expansion, true)),
            vec![("p", 0), ("c", 1)]
        );
    }

    #[test]
    fn cycle_is_walked_once() {
        // r -> a -> b -> a
        let topics = vec![
            topic("r", None, 0, TopicStatus::Pending),
            topic("a", Some("r"), 0, TopicStatus::Pending),
            topic("b", Some("a"), 0, TopicStatus::Pending),
            topic("a", Some("b"), 0, TopicStatus::Pending),
        ];
        let forest = TopicForest::build(&topics);
        let mut expansion = ExpansionSet::new();
        for id in ["r", "a", "b"] {
            expansion.expand(id);
        }
        let rows = visible_rows(&forest, &expansion, true);
        assert_eq!(row_ids(&rows), vec![("r", 0), ("a", 1), ("b", 2)]);
    }

    #[test]
    fn filtering_leaves_expansion_untouched() {
        let topics = vec![topic("p", None, 0, TopicStatus::Completed)];
        let forest = TopicForest::build(&topics);
        let mut expansion = ExpansionSet::new();
        expansion.expand("p");
        let before = expansion.clone();
        let _ = visible_rows(&forest, &expansion, false);
        assert_eq!(expansion, before);
    }
}
