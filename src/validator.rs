use std::collections::HashMap;

use log::debug;

use crate::arena_dom::Ref;
use crate::config::AllowlistSpec;
use crate::errors::{ErrorKind, ErrorSink};

/// Terminal cleanup pass: walks the transformed tree post-order
/// against the allowlist, removing (or reporting) whatever no
/// converter is allowed to emit. Returns the census of AMP custom
/// elements left in the tree, which the caller uses to pick companion
/// scripts.
pub fn validate<'arena>(
    root: Ref<'arena>,
    spec: &AllowlistSpec,
    errors: &ErrorSink,
) -> HashMap<String, bool> {
    for child in root.children() {
        walk(child, root, spec, errors);
    }
    let mut present = HashMap::new();
    census(root, &mut present);
    present
}

fn walk<'arena>(node: Ref<'arena>, root: Ref<'arena>, spec: &AllowlistSpec, errors: &ErrorSink) {
    // Fallback carriers are exempt wholesale; their contents exist for
    // non-JS rendering and answer to HTML, not the AMP allowlist.
    if node.has_tag("noscript") {
        return;
    }
    for child in node.children() {
        walk(child, root, spec, errors);
    }
    if node.is_element() {
        validate_element(node, root, spec, errors);
    }
}

fn validate_element<'arena>(
    node: Ref<'arena>,
    root: Ref<'arena>,
    spec: &AllowlistSpec,
    errors: &ErrorSink,
) {
    let name = match node.element_name() {
        Some(name) => name.local.clone(),
        None => return,
    };

    let tag_spec = match spec.tag_spec(&name) {
        Some(tag_spec) => tag_spec,
        None => {
            debug!("disallowed tag <{}>", name);
            errors.remove_invalid_child(node, root, ErrorKind::DisallowedTag);
            return;
        }
    };

    if let Some(allowed_parents) = &tag_spec.allowed_parents {
        let parent_ok = node
            .parent
            .get()
            .and_then(|parent| parent.element_name())
            .map(|parent_name| allowed_parents.contains(&parent_name.local))
            .unwrap_or(false);
        if !parent_ok {
            errors.remove_invalid_child(node, root, ErrorKind::DisallowedTag);
            return;
        }
    }

    for required in &tag_spec.required_attributes {
        let missing = node
            .get_attribute(required)
            .map(|value| value.trim().is_empty())
            .unwrap_or(true);
        if missing {
            // The element cannot validly exist without it; never
            // half-fix by synthesizing a value.
            errors.remove_invalid_child(node, root, ErrorKind::RequiredAttrMissing);
            return;
        }
    }

    for (attr_name, value) in node.ordered_attributes() {
        if let Some(rule) = tag_spec
            .allowed_attributes
            .get(&html5ever::LocalName::from(attr_name.as_str()))
        {
            if !rule.permits(&value) {
                errors.remove_invalid_attribute(node, root, &attr_name, ErrorKind::InvalidAttrValue);
            }
            continue;
        }
        if spec.is_global_attribute(&attr_name) {
            continue;
        }
        errors.remove_invalid_attribute(node, root, &attr_name, ErrorKind::DisallowedAttribute);
    }
}

fn census(node: Ref, present: &mut HashMap<String, bool>) {
    if let Some(tag) = node.tag_name() {
        if tag.starts_with("amp-") {
            present.insert(tag, true);
        }
    }
    let mut child = node.first_child.get();
    while let Some(c) = child {
        census(c, present);
        child = c.next_sibling.get();
    }
}
