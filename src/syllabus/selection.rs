use crate::api::Topic;

/// Outcome of re-resolving the selection against a fresh snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Nothing was selected.
    Unselected,
    /// The selected id still exists; the displayed record was replaced.
    Refreshed,
    /// The selected id vanished; the selection was cleared.
    Lost,
}

/// The topic shown in the detail pane, if any.
///
/// Holds a copy of the record so the pane keeps rendering the same data until
/// the next refresh resolves it.
#[derive(Debug, Default, Clone)]
pub struct Selection {
    current: Option<Topic>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects `topic`. Returns true if the selected id changed.
    pub fn select(&mut self, topic: Topic) -> bool {
        let changed = self.id() != Some(topic.id.as_str());
        self.current = Some(topic);
        changed
    }

    /// Looks the selected id up in `fresh` and swaps in the new record, or
    /// clears the selection when it is gone.
    pub fn resolve_after_refresh(&mut self, fresh: &[Topic]) -> Resolution {
        let Some(current) = self.current.as_mut() else {
            return Resolution::Unselected;
        };

        match fresh.iter().find(|t| t.id == current.id) {
            Some(topic) => {
                *current = topic.clone();
                Resolution::Refreshed
            }
            None => {
                tracing::debug!(topic_id = %current.id, "Selected topic no longer exists");
                self.current = None;
                Resolution::Lost
            }
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn id(&self) -> Option<&str> {
        self.current.as_ref().map(|t| t.id.as_str())
    }

    pub fn topic(&self) -> Option<&Topic> {
        self.current.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TopicStatus;

    fn topic(id: &str, status: TopicStatus) -> Topic {
        Topic {
            id: id.to_string(),
            title: format!("Topic {id}"),
            description: None,
            parent_id: None,
            order_index: 0,
            status,
        }
    }

    #[test]
    fn refresh_replaces_record() {
        let mut selection = Selection::new();
        selection.select(topic("x", TopicStatus::Pending));
        let fresh = vec![topic("x", TopicStatus::Completed)];
        assert_eq!(selection.resolve_after_refresh(&fresh), Resolution::Refreshed);
        assert_eq!(selection.topic().map(|t| t.status), Some(TopicStatus::Completed));
    }

    #[test]
    fn missing_id_clears_selection() {
        let mut selection = Selection::new();
        selection.select(topic("x", TopicStatus::Pending));
        assert_eq!(
            selection.resolve_after_refresh(&[topic("y", TopicStatus::Pending)]),
            Resolution::Lost
        );
        assert!(!selection.is_open());
        assert_eq!(selection.id(), None);
    }

    #[test]
    fn nothing_selected_is_unselected() {
        let mut selection = Selection::new();
        assert_eq!(
            selection.resolve_after_refresh(&[topic("x", TopicStatus::Pending)]),
            Resolution::Unselected
        );
    }

    #[test]
    fn select_reports_id_change() {
        let mut selection = Selection::new();
        assert!(selection.select(topic("x", TopicStatus::Pending)));
        assert!(!selection.select(topic("x", TopicStatus::Completed)));
        assert!(selection.select(topic("y", TopicStatus::Pending)));
        selection.clear();
        assert!(!selection.is_open());
    }
}
