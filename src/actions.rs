//! The AMP interactive-action attribute is a small grammar, not a
//! string to concatenate: `on="event:action1,action2;event2:action3"`.
//! This module round-trips it through a typed event → ordered-actions
//! map with duplicate suppression, and does the same order-preserving
//! dedup for multi-valued `class` attributes.

/// Ordered `event → actions` map parsed from an `on` attribute.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AmpActions {
    events: Vec<(String, Vec<String>)>,
}

impl AmpActions {
    pub fn parse(value: &str) -> AmpActions {
        let mut actions = AmpActions::default();
        for entry in value.split(';') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (event, action_list) = match entry.split_once(':') {
                Some(pair) => pair,
                None => continue,
            };
            let event = event.trim();
            if event.is_empty() {
                continue;
            }
            for action in action_list.split(',') {
                let action = action.trim();
                if !action.is_empty() {
                    actions.add(event, action);
                }
            }
        }
        actions
    }

    /// Appends `action` under `event`, suppressing duplicates while
    /// keeping first-seen order.
    pub fn add(&mut self, event: &str, action: &str) {
        if let Some((_, existing)) = self.events.iter_mut().find(|(name, _)| name == event) {
            if !existing.iter().any(|candidate| candidate == action) {
                existing.push(action.to_string());
            }
        } else {
            self.events
                .push((event.to_string(), vec![action.to_string()]));
        }
    }

    pub fn merge(&mut self, other: &AmpActions) {
        for (event, action_list) in &other.events {
            for action in action_list {
                self.add(event, action);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn serialize(&self) -> String {
        self.events
            .iter()
            .map(|(event, action_list)| format!("{}:{}", event, action_list.join(",")))
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Merges one action into an existing `on` attribute value.
pub fn merge_action(existing: Option<&str>, event: &str, action: &str) -> String {
    let mut actions = existing.map(AmpActions::parse).unwrap_or_default();
    actions.add(event, action);
    actions.serialize()
}

/// Appends class names, suppressing duplicates and normalizing
/// whitespace while keeping first-seen order.
pub fn merge_class(existing: Option<&str>, additions: &[&str]) -> String {
    let mut names: Vec<&str> = Vec::new();
    for name in existing
        .unwrap_or_default()
        .split_whitespace()
        .chain(additions.iter().copied())
    {
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names.join(" ")
}
