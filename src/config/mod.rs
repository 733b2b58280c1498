pub mod amp;

use std::collections::{HashMap, HashSet};

use html5ever::LocalName;
use regex::Regex;

/// What values an allowed attribute may carry.
pub enum AttrRule {
    Any,
    OneOf(&'static [&'static str]),
    Matches(Regex),
}

impl AttrRule {
    pub fn permits(&self, value: &str) -> bool {
        match self {
            AttrRule::Any => true,
            AttrRule::OneOf(values) => values.contains(&value),
            AttrRule::Matches(pattern) => pattern.is_match(value),
        }
    }
}

/// Per-tag validation rules.
pub struct TagSpec {
    pub allowed_attributes: HashMap<LocalName, AttrRule>,
    pub required_attributes: HashSet<LocalName>,
    /// `None` means any parent; `Some` restricts to the listed tags.
    pub allowed_parents: Option<HashSet<LocalName>>,
}

impl TagSpec {
    /// A tag with no attribute rules of its own; globals still apply.
    pub fn generic() -> TagSpec {
        TagSpec {
            allowed_attributes: HashMap::new(),
            required_attributes: HashSet::new(),
            allowed_parents: None,
        }
    }
}

/// The declarative table the allowlist validator consumes: permitted
/// tags, their attribute rules, and the attribute names (and name
/// prefixes) legal on every tag.
pub struct AllowlistSpec {
    pub tags: HashMap<LocalName, TagSpec>,
    pub global_attributes: HashSet<LocalName>,
    pub global_prefixes: Vec<&'static str>,
}

impl AllowlistSpec {
    pub fn allows_tag(&self, tag: &LocalName) -> bool {
        self.tags.contains_key(tag)
    }

    pub fn tag_spec(&self, tag: &LocalName) -> Option<&TagSpec> {
        self.tags.get(tag)
    }

    pub fn is_global_attribute(&self, attr_name: &str) -> bool {
        self.global_attributes
            .contains(&LocalName::from(attr_name))
            || self
                .global_prefixes
                .iter()
                .any(|prefix| attr_name.starts_with(prefix))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn attr_rules_permit() {
        assert!(AttrRule::Any.permits("anything"));
        assert!(AttrRule::OneOf(&["0", "1"]).permits("1"));
        assert!(!AttrRule::OneOf(&["0", "1"]).permits("2"));
        let rule = AttrRule::Matches(Regex::new(r"^https://").unwrap());
        assert!(rule.permits("https://x/v"));
        assert!(!rule.permits("http://x/v"));
    }

    #[test]
    fn global_prefixes_match() {
        let spec = AllowlistSpec {
            tags: HashMap::new(),
            global_attributes: hashset! { LocalName::from("class") },
            global_prefixes: vec!["data-"],
        };
        assert!(spec.is_global_attribute("class"));
        assert!(spec.is_global_attribute("data-anything"));
        assert!(!spec.is_global_attribute("onclick"));
    }
}
