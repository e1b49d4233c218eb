use crate::api::Topic;
use std::collections::HashMap;

/// The last-fetched flat topic list, replaced wholesale on every refresh.
#[derive(Debug, Default)]
pub struct TopicStore {
    topics: Vec<Topic>,
    by_id: HashMap<String, usize>,
}

impl TopicStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swaps in a fresh snapshot. Duplicate ids are not rejected; lookups
    /// resolve to the first occurrence.
    pub fn replace(&mut self, topics: Vec<Topic>) {
        let mut by_id = HashMap::with_capacity(topics.len());
        for (idx, topic) in topics.iter().enumerate() {
            if by_id.contains_key(&topic.id) {
                tracing::warn!(topic_id = %topic.id, "Duplicate topic id in snapshot");
                continue;
            }
            by_id.insert(topic.id.clone(), idx);
        }
        self.topics = topics;
        self.by_id = by_id;
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn get(&self, id: &str) -> Option<&Topic> {
        self.by_id.get(id).and_then(|&idx| self.topics.get(idx))
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TopicStatus;

    fn topic(id: &str, title: &str) -> Topic {
        Topic {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            parent_id: None,
            order_index: 0,
            status: TopicStatus::Pending,
        }
    }

    #[test]
    fn replace_swaps_whole_snapshot() {
        let mut store = TopicStore::new();
        store.replace(vec![topic("a", "A"), topic("b", "B")]);
        assert_eq!(store.len(), 2);

        store.replace(vec![topic("c", "C")]);
        assert_eq!(store.len(), 1);
        assert!(store.get("a").is_none());
        assert_eq!(store.get("c").map(|t| t.title.as_str()), Some("C"));
    }

    #[test]
    fn duplicate_ids_resolve_to_first() {
        let mut store = TopicStore::new();
        store.replace(vec![topic("a", "first"), topic("a", "second")]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a").map(|t| t.title.as_str()), Some("first"));
    }

    #[test]
    fn replace_with_empty_clears_index() {
        let mut store = TopicStore::new();
        store.replace(vec![topic("a", "A")]);
        store.replace(Vec::new());
        assert!(store.is_empty());
        assert!(store.get("a").is_none());
    }
}
