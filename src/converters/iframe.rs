use log::debug;

use crate::arena_dom::{create_element, create_element_with_attrs, create_text, deep_clone, Ref};
use crate::errors::ErrorKind;
use crate::layout::{resolve_layout, LayoutHints};

use super::{
    apply_resolved, collect_elements, copy_allowed_attributes, normalize_src, Pass,
};

/// Applied when the source iframe declares no sandbox of its own.
const DEFAULT_SANDBOX: &str = "allow-scripts allow-same-origin";
/// An alias-origin rewrite changes the effective origin, so the
/// same-origin grant is withheld.
const DEFAULT_SANDBOX_ALIASED: &str = "allow-scripts";

const DEFAULT_OVERFLOW_TEXT: &str = "Show all";
const PLACEHOLDER_CLASS: &str = "amp-wp-iframe-placeholder";

const COPIED_ATTRS: [&str; 13] = [
    "class",
    "id",
    "title",
    "name",
    "width",
    "height",
    "style",
    "frameborder",
    "allowfullscreen",
    "allowtransparency",
    "referrerpolicy",
    "sandbox",
    "tabindex",
];
const COPIED_PREFIXES: [&str; 2] = ["aria-", "data-"];

pub fn convert<'arena>(pass: &Pass<'arena, '_>) {
    for iframe in collect_elements(pass.root, "iframe") {
        if iframe.dev_mode_exempt(pass.root) {
            continue;
        }
        let raw_src = iframe.get_attribute("src").unwrap_or_default();
        if raw_src.trim().is_empty() {
            pass.errors
                .remove_invalid_child(iframe, pass.root, ErrorKind::RequiredAttrMissing);
            continue;
        }
        match normalize_src(&raw_src, pass.policy) {
            Some(normalized) => {
                convert_one(pass, iframe, &normalized.url, normalized.alias_rewritten)
            }
            None => {
                if pass.policy.require_https_src {
                    debug!("dropping iframe with unresolvable source {:?}", raw_src);
                    pass.errors.remove_invalid_child(
                        iframe,
                        pass.root,
                        ErrorKind::InvalidAttrValue,
                    );
                } else {
                    convert_one(pass, iframe, &raw_src, false);
                }
            }
        }
    }
}

fn convert_one<'arena>(
    pass: &Pass<'arena, '_>,
    iframe: Ref<'arena>,
    src: &str,
    alias_rewritten: bool,
) {
    let mirror = if pass.policy.add_noscript_fallback {
        Some(deep_clone(pass.arena, iframe))
    } else {
        None
    };

    let amp = create_element(pass.arena, "amp-iframe");
    amp.set_attribute("src", src);
    copy_allowed_attributes(iframe, amp, &COPIED_ATTRS, &COPIED_PREFIXES, &[]);

    if let Some(frameborder) = amp.get_attribute("frameborder") {
        let normalized = match frameborder.to_ascii_lowercase().as_str() {
            "no" | "false" => Some("0"),
            "yes" | "true" => Some("1"),
            _ => None,
        };
        if let Some(normalized) = normalized {
            amp.set_attribute("frameborder", normalized);
        }
    }

    let hints = LayoutHints {
        content_max_width: pass.policy.content_max_width,
        ..Default::default()
    };
    let resolved = resolve_layout(&amp.attribute_snapshot(), &hints);
    apply_resolved(amp, &resolved);

    // Explicit sandbox values are never overwritten.
    if !amp.has_attribute("sandbox") {
        amp.set_attribute(
            "sandbox",
            if alias_rewritten {
                DEFAULT_SANDBOX_ALIASED
            } else {
                DEFAULT_SANDBOX
            },
        );
    }

    let resizable =
        iframe.has_attribute("resizable") || iframe.has_attribute("data-amp-resizable");
    if resizable && !amp.has_attribute("resizable") {
        amp.set_attribute("resizable", "");
    }

    // Custom placeholder/overflow/fallback children travel along;
    // other iframe content has no meaning on the AMP side.
    for child in iframe.children() {
        if child.is_element()
            && (child.has_attribute("placeholder")
                || child.has_attribute("overflow")
                || child.has_attribute("fallback"))
        {
            amp.append(child);
        }
    }

    if (pass.policy.add_placeholder || resizable) && !has_attr_child(amp, "placeholder") {
        amp.append(create_element_with_attrs(
            pass.arena,
            "span",
            &[("placeholder", ""), ("class", PLACEHOLDER_CLASS)],
        ));
    }
    if resizable && !has_attr_child(amp, "overflow") {
        let label = iframe
            .get_attribute("data-amp-overflow-text")
            .unwrap_or_else(|| DEFAULT_OVERFLOW_TEXT.to_string());
        let button = create_element_with_attrs(pass.arena, "button", &[("overflow", "")]);
        button.append(create_text(pass.arena, &label));
        amp.append(button);
    }

    iframe.insert_before(amp);
    iframe.detach();
    if let Some(mirror) = mirror {
        let noscript = create_element(pass.arena, "noscript");
        noscript.append(mirror);
        amp.append(noscript);
    }
}

fn has_attr_child(node: Ref, attr_name: &str) -> bool {
    node.children()
        .iter()
        .any(|child| child.is_element() && child.has_attribute(attr_name))
}
