use crate::api::Topic;
use std::collections::HashMap;

/// A navigable forest derived from a flat, parent-referencing topic list.
///
/// Built in O(n) by indexing records under their `parent_id`. Sibling lists
/// are stably sorted by `order_index`, so ties keep fetch order. A record
/// whose parent is absent from the snapshot is indexed under that missing id
/// and is therefore unreachable from the roots.
///
/// Acyclicity is not checked here; [`super::visible_rows`] guards its walk.
#[derive(Debug)]
pub struct TopicForest<'a> {
    topics: &'a [Topic],
    roots: Vec<usize>,
    children: HashMap<&'a str, Vec<usize>>,
}

impl<'a> TopicForest<'a> {
    pub fn build(topics: &'a [Topic]) -> Self {
        let mut roots = Vec::new();
        let mut children: HashMap<&'a str, Vec<usize>> = HashMap::new();

        for (idx, topic) in topics.iter().enumerate() {
            match topic.parent_id.as_deref() {
                None => roots.push(idx),
                Some(parent) => children.entry(parent).or_default().push(idx),
            }
        }

        // sort_by_key is stable
        roots.sort_by_key(|&idx| topics[idx].order_index);
        for list in children.values_mut() {
            list.sort_by_key(|&idx| topics[idx].order_index);
        }

        Self {
            topics,
            roots,
            children,
        }
    }

    pub fn roots(&self) -> impl Iterator<Item = &'a Topic> + '_ {
        self.roots.iter().map(move |&idx| &self.topics[idx])
    }

    /// Ordered children of `id`; empty for leaves and unknown ids.
    pub fn children(&self, id: &str) -> impl Iterator<Item = &'a Topic> + '_ {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(move |&idx| &self.topics[idx])
    }

    pub fn has_children(&self, id: &str) -> bool {
        self.children.get(id).is_some_and(|c| !c.is_empty())
    }

    pub fn root_ids(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.roots().map(|t| t.id.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}
