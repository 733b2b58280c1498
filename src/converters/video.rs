use crate::arena_dom::{create_element, create_text, deep_clone, Ref};
use crate::layout::{resolve_layout, LayoutHints};

use super::{
    apply_resolved, collect_elements, copy_allowed_attributes, normalize_src, Pass,
};

const COPIED_ATTRS: [&str; 13] = [
    "src",
    "poster",
    "width",
    "height",
    "style",
    "class",
    "id",
    "title",
    "autoplay",
    "controls",
    "loop",
    "muted",
    "playsinline",
];
const COPIED_PREFIXES: [&str; 2] = ["aria-", "data-"];

/// The string `"false"` on a boolean attribute means absent on the AMP
/// element; the no-script mirror keeps it verbatim.
const BOOLEAN_ATTRS: [&str; 5] = ["autoplay", "controls", "loop", "muted", "playsinline"];

pub fn convert<'arena>(pass: &Pass<'arena, '_>) {
    for video in collect_elements(pass.root, "video") {
        if video.dev_mode_exempt(pass.root) {
            continue;
        }
        convert_one(pass, video);
    }
}

fn convert_one<'arena>(pass: &Pass<'arena, '_>, video: Ref<'arena>) {
    let mirror = if pass.policy.add_noscript_fallback {
        Some(deep_clone(pass.arena, video))
    } else {
        None
    };

    let amp = create_element(pass.arena, "amp-video");
    copy_allowed_attributes(video, amp, &COPIED_ATTRS, &COPIED_PREFIXES, &[]);
    for name in BOOLEAN_ATTRS.iter() {
        if let Some(value) = amp.get_attribute(name) {
            if value.eq_ignore_ascii_case("false") {
                amp.remove_attribute(name);
            }
        }
    }

    // Sources always move to https; the first resolvable one backs the
    // anchor fallback.
    let mut fallback_url: Option<String> = None;
    if let Some(raw_src) = amp.get_attribute("src") {
        if let Some(normalized) = normalize_src(&raw_src, pass.policy) {
            amp.set_attribute("src", &normalized.url);
            fallback_url = Some(normalized.url);
        }
    }
    for child in video.children() {
        if child.has_tag("source") {
            let source = deep_clone(pass.arena, child);
            if let Some(raw_src) = source.get_attribute("src") {
                if let Some(normalized) = normalize_src(&raw_src, pass.policy) {
                    source.set_attribute("src", &normalized.url);
                    if fallback_url.is_none() {
                        fallback_url = Some(normalized.url);
                    }
                }
            }
            amp.append(source);
        } else if child.has_tag("track") {
            amp.append(deep_clone(pass.arena, child));
        }
    }

    let hints = LayoutHints {
        content_max_width: pass.policy.content_max_width,
        ..Default::default()
    };
    let resolved = resolve_layout(&amp.attribute_snapshot(), &hints);
    apply_resolved(amp, &resolved);

    if let Some(url) = fallback_url {
        let anchor = create_element(pass.arena, "a");
        anchor.set_attribute("href", &url);
        anchor.set_attribute("fallback", "");
        anchor.append(create_text(pass.arena, &url));
        amp.append(anchor);
    }

    video.insert_before(amp);
    video.detach();
    if let Some(mirror) = mirror {
        let noscript = create_element(pass.arena, "noscript");
        noscript.append(mirror);
        amp.append(noscript);
    }
}
