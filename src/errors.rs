use std::cell::RefCell;
use std::io;
use std::str::Utf8Error;

use log::debug;
use thiserror::Error;

use crate::arena_dom::{AttributeSnapshot, Ref};
use crate::ConversionPolicy;

/// The only hard failures: an unreadable input or a payload that is
/// not HTML text at all. Everything else surfaces as a
/// [`ValidationError`].
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
    #[error("input payload is not HTML text: {0}")]
    NotHtml(#[from] Utf8Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DisallowedTag,
    DisallowedAttribute,
    RequiredAttrMissing,
    InvalidAttrValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeType {
    Element,
    Attribute,
}

/// One offending node or attribute, as shown to the policy callback.
#[derive(Clone, Debug)]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub node_name: String,
    pub parent_name: Option<String>,
    pub attributes: AttributeSnapshot,
    pub node_type: NodeType,
}

impl ValidationError {
    pub fn for_element(node: Ref, kind: ErrorKind) -> ValidationError {
        ValidationError {
            kind,
            node_name: node.tag_name().unwrap_or_default(),
            parent_name: node.parent.get().and_then(|parent| parent.tag_name()),
            attributes: node.attribute_snapshot(),
            node_type: NodeType::Element,
        }
    }

    pub fn for_attribute(element: Ref, attr_name: &str, kind: ErrorKind) -> ValidationError {
        let mut attributes = AttributeSnapshot::new();
        if let Some(value) = element.get_attribute(attr_name) {
            attributes.insert(attr_name.to_string(), value);
        }
        ValidationError {
            kind,
            node_name: attr_name.to_string(),
            parent_name: element.tag_name(),
            attributes,
            node_type: NodeType::Attribute,
        }
    }

    /// Dedup identity: kind, node name, parent name and the sorted
    /// attribute snapshot. `node_type` is carried but not part of the
    /// identity.
    pub fn same_violation(&self, other: &ValidationError) -> bool {
        self.kind == other.kind
            && self.node_name == other.node_name
            && self.parent_name == other.parent_name
            && self.attributes == other.attributes
    }
}

/// A validation error plus its final verdict.
#[derive(Clone, Debug)]
pub struct ReportedError {
    pub error: ValidationError,
    pub sanitized: bool,
}

/// Per-call accumulation buffer. Owns deduplication, the policy
/// callback, and the one-shot force-sanitize override; a fresh sink is
/// created for every top-level transformation.
pub struct ErrorSink<'a> {
    policy: &'a ConversionPolicy,
    force: Option<bool>,
    recorded: RefCell<Vec<ReportedError>>,
}

impl<'a> ErrorSink<'a> {
    pub fn new(policy: &'a ConversionPolicy, force: Option<bool>) -> ErrorSink<'a> {
        ErrorSink {
            policy,
            force,
            recorded: RefCell::new(Vec::new()),
        }
    }

    /// Resolves one candidate error to a sanitized/kept verdict. A
    /// repeat of an already-recorded violation reuses the prior
    /// verdict without consulting the callback again.
    pub fn report(&self, error: ValidationError) -> bool {
        if let Some(prior) = self
            .recorded
            .borrow()
            .iter()
            .find(|reported| reported.error.same_violation(&error))
        {
            return prior.sanitized;
        }

        let sanitized = match self.force {
            Some(forced) => forced,
            None => match &self.policy.validation_error_callback {
                Some(callback) => callback(&error),
                // No registered policy: sanitize.
                None => true,
            },
        };
        debug!(
            "validation error {:?} on {} (sanitized: {})",
            error.kind, error.node_name, sanitized
        );
        self.recorded
            .borrow_mut()
            .push(ReportedError { error, sanitized });
        sanitized
    }

    /// Removes `node` from its parent if the policy sanctions it.
    /// Dev-mode-exempt nodes are left untouched with no error at all;
    /// that exemption is configuration, not a violation.
    pub fn remove_invalid_child<'arena>(
        &self,
        node: Ref<'arena>,
        root: Ref<'arena>,
        kind: ErrorKind,
    ) -> bool {
        if node.dev_mode_exempt(root) {
            return false;
        }
        let sanitized = self.report(ValidationError::for_element(node, kind));
        if sanitized {
            node.detach();
        }
        sanitized
    }

    /// Strips one attribute if the policy sanctions it; same dev-mode
    /// escape hatch as element removal.
    pub fn remove_invalid_attribute<'arena>(
        &self,
        element: Ref<'arena>,
        root: Ref<'arena>,
        attr_name: &str,
        kind: ErrorKind,
    ) -> bool {
        if element.dev_mode_exempt(root) {
            return false;
        }
        let sanitized = self.report(ValidationError::for_attribute(element, attr_name, kind));
        if sanitized {
            element.remove_attribute(attr_name);
        }
        sanitized
    }

    pub fn into_reported(self) -> Vec<ReportedError> {
        self.recorded.into_inner()
    }
}
