use std::collections::HashSet;

use log::debug;

use crate::actions::{merge_action, merge_class};
use crate::arena_dom::{create_element, Ref};
use crate::collaborators::PixelDimensions;
use crate::errors::ErrorKind;
use crate::layout::{resolve_layout, Dimension, Layout, LayoutHints, FALLBACK_HEIGHT};

use super::{
    append_noscript_mirror, apply_resolved, collect_elements, copy_allowed_attributes, Pass,
};

/// Obsolete on the AMP element; the runtime manages loading itself.
pub const DROPPED_ATTRS: [&str; 4] = ["decoding", "loading", "importance", "intrinsicsize"];

const COPIED_ATTRS: [&str; 13] = [
    "src", "alt", "title", "srcset", "sizes", "id", "class", "style", "width", "height", "role",
    "tabindex", "on",
];
const COPIED_PREFIXES: [&str; 2] = ["aria-", "data-"];

/// Sentinel width when the dimension probe comes up empty; the height
/// sentinel reuses the fixed-height fallback.
const FALLBACK_WIDTH: u32 = 600;

const UNKNOWN_SIZE_CLASS: &str = "amp-wp-unknown-size";
const UNKNOWN_WIDTH_CLASS: &str = "amp-wp-unknown-width";
const UNKNOWN_HEIGHT_CLASS: &str = "amp-wp-unknown-height";
const ENFORCED_SIZES_CLASS: &str = "amp-wp-enforced-sizes";

/// `<img>` → `amp-img`, or `amp-anim` for gifs. Images missing a
/// dimension are probed in one batch before any rewriting.
pub fn convert<'arena>(pass: &Pass<'arena, '_>) {
    let mut pending = Vec::new();
    let mut unknown = HashSet::new();

    for img in collect_elements(pass.root, "img") {
        if img.dev_mode_exempt(pass.root) {
            continue;
        }
        let src = img.get_attribute("src").unwrap_or_default();
        if src.trim().is_empty() {
            pass.errors
                .remove_invalid_child(img, pass.root, ErrorKind::RequiredAttrMissing);
            continue;
        }
        let width = Dimension::parse(&img.get_attribute("width").unwrap_or_default());
        let height = Dimension::parse(&img.get_attribute("height").unwrap_or_default());
        if width.is_empty() || height.is_empty() {
            unknown.insert(src.clone());
        }
        pending.push((img, src, width, height));
    }

    let probed = match pass.dimensions {
        Some(lookup) if !unknown.is_empty() => lookup.lookup(&unknown),
        _ => Default::default(),
    };

    for (img, src, width, height) in pending {
        let probe = probed.get(&src).copied().flatten();
        convert_one(pass, img, &src, width, height, probe);
    }
}

fn convert_one<'arena>(
    pass: &Pass<'arena, '_>,
    img: Ref<'arena>,
    src: &str,
    mut width: Dimension,
    mut height: Dimension,
    probe: Option<PixelDimensions>,
) {
    let tag = if is_gif_url(src) { "amp-anim" } else { "amp-img" };
    let amp = create_element(pass.arena, tag);
    copy_allowed_attributes(img, amp, &COPIED_ATTRS, &COPIED_PREFIXES, &DROPPED_ATTRS);

    let mut extra_classes: Vec<&str> = Vec::new();
    if width.is_empty() || height.is_empty() {
        if let Some(dims) = probe {
            if width.is_empty() {
                width = Dimension::Px(f64::from(dims.width));
            }
            if height.is_empty() {
                height = Dimension::Px(f64::from(dims.height));
            }
        } else {
            debug!("no dimensions for {}, using sentinel size", src);
            extra_classes.push(UNKNOWN_SIZE_CLASS);
            if width.is_empty() {
                extra_classes.push(UNKNOWN_WIDTH_CLASS);
                width = Dimension::Px(f64::from(FALLBACK_WIDTH));
            }
            if height.is_empty() {
                extra_classes.push(UNKNOWN_HEIGHT_CLASS);
                height = Dimension::Px(f64::from(FALLBACK_HEIGHT));
            }
        }
    }

    let mut snapshot = amp.attribute_snapshot();
    match width.to_attr_value() {
        Some(value) => snapshot.insert("width".to_string(), value),
        None => snapshot.remove("width"),
    };
    match height.to_attr_value() {
        Some(value) => snapshot.insert("height".to_string(), value),
        None => snapshot.remove("height"),
    };
    let hints = LayoutHints {
        explicit_layout: None,
        noloading: img.has_attribute("data-amp-noloading"),
        content_max_width: pass.policy.content_max_width,
    };
    let resolved = resolve_layout(&snapshot, &hints);
    apply_resolved(amp, &resolved);

    if !resolved.contains_key("layout") {
        let layout = if pass.policy.align_wide_support && has_wide_alignment(amp) {
            Layout::Responsive
        } else {
            Layout::Intrinsic
        };
        amp.set_attribute("layout", layout.as_str());
    }

    extra_classes.push(ENFORCED_SIZES_CLASS);
    let class_value = merge_class(amp.get_attribute("class").as_deref(), &extra_classes);
    amp.set_attribute("class", &class_value);

    if img.has_attribute("data-amp-lightbox") {
        let on_value = merge_action(
            amp.get_attribute("on").as_deref(),
            "tap",
            "amp-image-lightbox",
        );
        amp.set_attribute("on", &on_value);
        if !amp.has_attribute("role") {
            amp.set_attribute("role", "button");
        }
        if !amp.has_attribute("tabindex") {
            amp.set_attribute("tabindex", "0");
        }
    }

    img.insert_before(amp);
    img.detach();
    if pass.policy.add_noscript_fallback {
        append_noscript_mirror(pass.arena, amp, img, &DROPPED_ATTRS);
    }
}

fn is_gif_url(src: &str) -> bool {
    let path = src
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or_default();
    path.to_ascii_lowercase().ends_with(".gif")
}

fn has_wide_alignment(node: Ref) -> bool {
    match node.get_attribute("class") {
        Some(class) => class
            .split_whitespace()
            .any(|name| name == "alignwide" || name == "alignfull"),
        None => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::collections::HashMap;

    use crate::arena_dom::{fragment_root, parse_html_fragment, serialize_fragment};
    use crate::collaborators::DimensionLookup;
    use crate::errors::ErrorSink;
    use crate::ConversionPolicy;

    struct FixedDims(HashMap<String, Option<PixelDimensions>>);

    impl DimensionLookup for FixedDims {
        fn lookup(&self, urls: &HashSet<String>) -> HashMap<String, Option<PixelDimensions>> {
            urls.iter()
                .map(|url| (url.clone(), self.0.get(url).copied().flatten()))
                .collect()
        }
    }

    fn run_with(
        input: &str,
        policy: &ConversionPolicy,
        dimensions: Option<&dyn DimensionLookup>,
    ) -> (String, usize) {
        let arena = typed_arena::Arena::new();
        let root = fragment_root(parse_html_fragment(&arena, input.as_bytes()));
        let sink = ErrorSink::new(policy, None);
        let pass = Pass {
            arena: &arena,
            root,
            policy,
            errors: &sink,
            dimensions,
            embeds: None,
        };
        convert(&pass);
        let mut output = vec![];
        serialize_fragment(root, &mut output).unwrap();
        (
            String::from_utf8(output).unwrap(),
            sink.into_reported().len(),
        )
    }

    fn run(input: &str, policy: &ConversionPolicy) -> (String, usize) {
        run_with(input, policy, None)
    }

    #[test]
    fn sized_image_gets_intrinsic_layout_and_fallback() {
        let policy = ConversionPolicy {
            add_noscript_fallback: true,
            ..Default::default()
        };
        let (html, errors) = run(
            "<img src=\"https://x/300x300\" width=\"300\" height=\"300\">",
            &policy,
        );
        assert_eq!(
            html,
            "<amp-img src=\"https://x/300x300\" width=\"300\" height=\"300\" \
             layout=\"intrinsic\" class=\"amp-wp-enforced-sizes\">\
             <noscript><img src=\"https://x/300x300\" width=\"300\" height=\"300\"></noscript>\
             </amp-img>"
        );
        assert_eq!(errors, 0);
    }

    #[test]
    fn gif_becomes_amp_anim() {
        let (html, _) = run(
            "<img src=\"https://x/a.GIF?v=1\" width=\"10\" height=\"10\">",
            &ConversionPolicy::default(),
        );
        assert!(html.starts_with("<amp-anim "));
    }

    #[test]
    fn missing_src_is_removed_with_one_error() {
        let (html, errors) = run(
            "<img width=\"300\" height=\"300\">",
            &ConversionPolicy::default(),
        );
        assert_eq!(html, "");
        assert_eq!(errors, 1);
    }

    #[test]
    fn probe_supplies_missing_dimensions() {
        let mut known = HashMap::new();
        known.insert(
            "https://x/a.png".to_string(),
            Some(PixelDimensions {
                width: 640,
                height: 480,
            }),
        );
        let lookup = FixedDims(known);
        let (html, _) = run_with(
            "<img src=\"https://x/a.png\">",
            &ConversionPolicy::default(),
            Some(&lookup),
        );
        assert!(html.contains("width=\"640\""));
        assert!(html.contains("height=\"480\""));
        assert!(html.contains("layout=\"intrinsic\""));
        assert!(!html.contains("amp-wp-unknown"));
    }

    #[test]
    fn failed_probe_falls_back_to_sentinel_size() {
        let lookup = FixedDims(HashMap::new());
        let (html, _) = run_with(
            "<img src=\"https://x/a.png\">",
            &ConversionPolicy::default(),
            Some(&lookup),
        );
        assert!(html.contains("width=\"600\""));
        assert!(html.contains("height=\"400\""));
        assert!(html.contains(
            "class=\"amp-wp-unknown-size amp-wp-unknown-width amp-wp-unknown-height \
             amp-wp-enforced-sizes\""
        ));
    }

    #[test]
    fn obsolete_attributes_are_dropped_everywhere() {
        let policy = ConversionPolicy {
            add_noscript_fallback: true,
            ..Default::default()
        };
        let (html, _) = run(
            "<img src=\"https://x/a.png\" width=\"1\" height=\"1\" loading=\"lazy\" \
             decoding=\"async\" alt=\"hi\">",
            &policy,
        );
        assert!(!html.contains("loading"));
        assert!(!html.contains("decoding"));
        assert!(html.contains("alt=\"hi\""));
    }

    #[test]
    fn lightbox_flag_merges_tap_action() {
        let (html, _) = run(
            "<img src=\"https://x/a.png\" width=\"1\" height=\"1\" data-amp-lightbox=\"\" \
             on=\"change:x.y\">",
            &ConversionPolicy::default(),
        );
        assert!(html.contains("on=\"change:x.y;tap:amp-image-lightbox\""));
        assert!(html.contains("role=\"button\""));
        assert!(html.contains("tabindex=\"0\""));
    }

    #[test]
    fn percent_width_resolves_against_content_max_width() {
        let policy = ConversionPolicy {
            content_max_width: Some(800),
            ..Default::default()
        };
        let (html, _) = run(
            "<img src=\"https://x/a.png\" width=\"50%\" height=\"100\">",
            &policy,
        );
        assert!(html.contains("width=\"400\""));
    }

    #[test]
    fn wide_alignment_selects_responsive_layout() {
        let policy = ConversionPolicy {
            align_wide_support: true,
            ..Default::default()
        };
        let (html, _) = run(
            "<img src=\"https://x/a.png\" width=\"100\" height=\"50\" class=\"alignwide\">",
            &policy,
        );
        assert!(html.contains("layout=\"responsive\""));
        assert!(html.contains("class=\"alignwide amp-wp-enforced-sizes\""));
    }

    #[test]
    fn dev_mode_image_is_untouched() {
        let (html, errors) = run(
            "<img data-ampdevmode=\"\" width=\"300\" height=\"300\">",
            &ConversionPolicy::default(),
        );
        assert_eq!(
            html,
            "<img data-ampdevmode=\"\" width=\"300\" height=\"300\">"
        );
        assert_eq!(errors, 0);
    }
}
