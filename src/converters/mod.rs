pub mod embed;
pub mod iframe;
pub mod image;
pub mod video;

use log::warn;
use url::Url;

use crate::arena_dom::{create_element, deep_clone, Arena, AttributeSnapshot, Ref};
use crate::collaborators::{DimensionLookup, EmbedFetcher};
use crate::errors::ErrorSink;
use crate::ConversionPolicy;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbedKind {
    Facebook,
    Twitter,
}

/// The converter families are a fixed set; dispatch is a closed match,
/// not open subclassing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConverterKind {
    Image,
    Iframe,
    Video,
    Embed(EmbedKind),
}

impl ConverterKind {
    pub fn run<'arena>(self, pass: &Pass<'arena, '_>) {
        match self {
            ConverterKind::Image => image::convert(pass),
            ConverterKind::Iframe => iframe::convert(pass),
            ConverterKind::Video => video::convert(pass),
            ConverterKind::Embed(kind) => embed::convert(pass, kind),
        }
    }
}

/// Shared state for one converter invocation over one tree.
pub struct Pass<'arena, 'e> {
    pub arena: Arena<'arena>,
    pub root: Ref<'arena>,
    pub policy: &'e ConversionPolicy,
    pub errors: &'e ErrorSink<'e>,
    pub dimensions: Option<&'e dyn DimensionLookup>,
    pub embeds: Option<&'e dyn EmbedFetcher>,
}

/// Collects elements named `tag`, skipping `<noscript>` subtrees
/// (fallback carriers stay untouched) and template payloads (which
/// live off-tree). Collect-then-rewrite keeps mutation away from the
/// walk.
pub fn collect_elements<'arena>(root: Ref<'arena>, tag: &str) -> Vec<Ref<'arena>> {
    let mut out = Vec::new();
    collect_into(root, tag, &mut out);
    out
}

fn collect_into<'arena>(node: Ref<'arena>, tag: &str, out: &mut Vec<Ref<'arena>>) {
    if node.has_tag("noscript") {
        return;
    }
    if node.has_tag(tag) {
        out.push(node);
    }
    let mut child = node.first_child.get();
    while let Some(c) = child {
        collect_into(c, tag, out);
        child = c.next_sibling.get();
    }
}

pub fn is_amp_element(node: Ref) -> bool {
    match node.tag_name() {
        Some(tag) => tag.starts_with("amp-"),
        None => false,
    }
}

pub struct NormalizedSrc {
    pub url: String,
    pub alias_rewritten: bool,
}

/// Resolves a source URL to https. Protocol-relative and root-relative
/// references resolve against `current_origin`; `http` is rewritten to
/// `https`; with `alias_origin` configured, the absolute URL's origin
/// component is replaced and the path/query kept intact. `None` means
/// the source cannot be brought to https.
pub fn normalize_src(raw: &str, policy: &ConversionPolicy) -> Option<NormalizedSrc> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let absolute = if let Some(rest) = raw.strip_prefix("//") {
        format!("https://{}", rest)
    } else if raw.starts_with('/') {
        let origin = policy.current_origin.as_ref()?;
        format!("{}{}", origin.trim_end_matches('/'), raw)
    } else {
        raw.to_string()
    };

    let mut parsed = Url::parse(&absolute).ok()?;
    match parsed.scheme() {
        "https" => {}
        "http" => {
            // Only the scheme changes; http and https are
            // interchangeable for set_scheme.
            parsed.set_scheme("https").ok()?;
        }
        _ => return None,
    }

    if let Some(alias) = &policy.alias_origin {
        match Url::parse(alias) {
            Ok(alias_url) => {
                let mut rewritten = alias_url.origin().ascii_serialization();
                rewritten.push_str(parsed.path());
                if let Some(query) = parsed.query() {
                    rewritten.push('?');
                    rewritten.push_str(query);
                }
                if let Some(fragment) = parsed.fragment() {
                    rewritten.push('#');
                    rewritten.push_str(fragment);
                }
                return Some(NormalizedSrc {
                    url: rewritten,
                    alias_rewritten: true,
                });
            }
            Err(error) => {
                warn!("alias_origin {:?} is not a valid URL: {}", alias, error);
            }
        }
    }

    Some(NormalizedSrc {
        url: parsed.to_string(),
        alias_rewritten: false,
    })
}

/// Copies attributes from `source` onto `target` in source order,
/// keeping names from `allowed` or matching an allowed prefix and
/// never copying names from `dropped`.
pub fn copy_allowed_attributes<'arena>(
    source: Ref<'arena>,
    target: Ref<'arena>,
    allowed: &[&str],
    prefixes: &[&str],
    dropped: &[&str],
) {
    for (name, value) in source.ordered_attributes() {
        if dropped.contains(&name.as_str()) {
            continue;
        }
        let keep = allowed.contains(&name.as_str())
            || prefixes.iter().any(|prefix| name.starts_with(prefix));
        if keep {
            target.set_attribute(&name, &value);
        }
    }
}

/// The attribute keys the layout resolver owns.
const SIZING_ATTRS: [&str; 5] = ["width", "height", "style", "layout", "noloading"];

/// Applies a resolved snapshot to an element: sizing keys present in
/// the snapshot are written (in place when they already exist), absent
/// sizing keys are removed. Other attributes are untouched.
pub fn apply_resolved<'arena>(element: Ref<'arena>, resolved: &AttributeSnapshot) {
    for key in SIZING_ATTRS.iter() {
        if !resolved.contains_key(*key) {
            element.remove_attribute(key);
        }
    }
    // BTreeMap order keeps appended keys deterministic.
    for (key, value) in resolved {
        if SIZING_ATTRS.contains(&key.as_str()) {
            element.set_attribute(key, value);
        }
    }
}

/// Nests `<noscript>` holding an unmodified mirror of `original`
/// (minus `dropped` attributes) inside `amp_element`.
pub fn append_noscript_mirror<'arena>(
    arena: Arena<'arena>,
    amp_element: Ref<'arena>,
    original: Ref<'arena>,
    dropped: &[&str],
) {
    let noscript = create_element(arena, "noscript");
    let mirror = deep_clone(arena, original);
    for name in dropped {
        mirror.remove_attribute(name);
    }
    noscript.append(mirror);
    amp_element.append(noscript);
}
