//! The shipped allowlist: the AMP output vocabulary of the converter
//! family plus generic flow/phrasing HTML. The validator is
//! table-driven; callers may substitute their own [`AllowlistSpec`].

use std::collections::{HashMap, HashSet};

use html5ever::LocalName;
use regex::Regex;

use super::{AllowlistSpec, AttrRule, TagSpec};

const LAYOUTS: &[&str] = &[
    "responsive",
    "fixed-height",
    "fill",
    "fixed",
    "intrinsic",
    "flex-item",
    "nodisplay",
];

lazy_static! {
    pub static ref AMP_ALLOWLIST: AllowlistSpec = AllowlistSpec {
        tags: build_tags(),
        global_attributes: hashset! {
            local_name!("class"),
            local_name!("id"),
            local_name!("style"),
            local_name!("title"),
            local_name!("dir"),
            local_name!("lang"),
            local_name!("hidden"),
            local_name!("role"),
            local_name!("tabindex"),
            LocalName::from("on"),
            LocalName::from("placeholder"),
            LocalName::from("overflow"),
            LocalName::from("fallback"),
            LocalName::from("noloading"),
        },
        global_prefixes: vec!["data-", "aria-"],
    };
}

fn sizing_attributes() -> HashMap<LocalName, AttrRule> {
    hashmap! {
        local_name!("width") => AttrRule::Any,
        local_name!("height") => AttrRule::Any,
        LocalName::from("layout") => AttrRule::OneOf(LAYOUTS),
    }
}

fn build_tags() -> HashMap<LocalName, TagSpec> {
    let mut tags = HashMap::new();

    for name in &["amp-img", "amp-anim"] {
        let mut allowed = sizing_attributes();
        allowed.extend(hashmap! {
            local_name!("src") => AttrRule::Any,
            local_name!("srcset") => AttrRule::Any,
            local_name!("sizes") => AttrRule::Any,
            local_name!("alt") => AttrRule::Any,
            LocalName::from("lightbox") => AttrRule::Any,
        });
        tags.insert(
            LocalName::from(*name),
            TagSpec {
                allowed_attributes: allowed,
                required_attributes: hashset! { local_name!("src") },
                allowed_parents: None,
            },
        );
    }

    let mut iframe_allowed = sizing_attributes();
    iframe_allowed.extend(hashmap! {
        local_name!("src") => AttrRule::Matches(Regex::new(r"^(https:)?//").unwrap()),
        local_name!("sandbox") => AttrRule::Any,
        local_name!("frameborder") => AttrRule::OneOf(&["0", "1"]),
        local_name!("allowfullscreen") => AttrRule::Any,
        LocalName::from("allowtransparency") => AttrRule::Any,
        LocalName::from("referrerpolicy") => AttrRule::Any,
        LocalName::from("resizable") => AttrRule::Any,
        local_name!("name") => AttrRule::Any,
    });
    tags.insert(
        LocalName::from("amp-iframe"),
        TagSpec {
            allowed_attributes: iframe_allowed,
            required_attributes: hashset! { local_name!("src") },
            allowed_parents: None,
        },
    );

    let mut video_allowed = sizing_attributes();
    video_allowed.extend(hashmap! {
        local_name!("src") => AttrRule::Matches(Regex::new(r"^(https:)?//").unwrap()),
        local_name!("poster") => AttrRule::Any,
        local_name!("autoplay") => AttrRule::Any,
        local_name!("controls") => AttrRule::Any,
        local_name!("loop") => AttrRule::Any,
        local_name!("muted") => AttrRule::Any,
        LocalName::from("playsinline") => AttrRule::Any,
    });
    tags.insert(
        LocalName::from("amp-video"),
        TagSpec {
            // A source list may stand in for src, so nothing is
            // strictly required here.
            allowed_attributes: video_allowed,
            required_attributes: HashSet::new(),
            allowed_parents: None,
        },
    );

    let mut facebook_allowed = sizing_attributes();
    facebook_allowed.extend(hashmap! {
        LocalName::from("data-embed-as") => AttrRule::OneOf(&["video", "post", "page"]),
    });
    tags.insert(
        LocalName::from("amp-facebook"),
        TagSpec {
            allowed_attributes: facebook_allowed,
            required_attributes: hashset! { LocalName::from("data-href") },
            allowed_parents: None,
        },
    );

    tags.insert(
        LocalName::from("amp-twitter"),
        TagSpec {
            allowed_attributes: sizing_attributes(),
            required_attributes: HashSet::new(),
            allowed_parents: None,
        },
    );

    tags.insert(
        local_name!("source"),
        TagSpec {
            allowed_attributes: hashmap! {
                local_name!("src") => AttrRule::Matches(Regex::new(r"^(https:)?//").unwrap()),
                local_name!("type") => AttrRule::Any,
            },
            required_attributes: hashset! { local_name!("src") },
            allowed_parents: Some(hashset! { LocalName::from("amp-video") }),
        },
    );
    tags.insert(
        local_name!("track"),
        TagSpec {
            allowed_attributes: hashmap! {
                local_name!("src") => AttrRule::Any,
                local_name!("kind") => AttrRule::Any,
                local_name!("srclang") => AttrRule::Any,
                local_name!("label") => AttrRule::Any,
                local_name!("default") => AttrRule::Any,
            },
            required_attributes: hashset! { local_name!("src") },
            allowed_parents: Some(hashset! { LocalName::from("amp-video") }),
        },
    );

    tags.insert(
        local_name!("a"),
        TagSpec {
            allowed_attributes: hashmap! {
                local_name!("href") => AttrRule::Any,
                local_name!("rel") => AttrRule::Any,
                local_name!("target") => AttrRule::Any,
                local_name!("name") => AttrRule::Any,
                local_name!("download") => AttrRule::Any,
            },
            required_attributes: HashSet::new(),
            allowed_parents: None,
        },
    );
    tags.insert(
        local_name!("time"),
        TagSpec {
            allowed_attributes: hashmap! {
                local_name!("datetime") => AttrRule::Any,
            },
            required_attributes: HashSet::new(),
            allowed_parents: None,
        },
    );
    tags.insert(
        local_name!("blockquote"),
        TagSpec {
            allowed_attributes: hashmap! {
                local_name!("cite") => AttrRule::Any,
            },
            required_attributes: HashSet::new(),
            allowed_parents: None,
        },
    );
    for name in &["td", "th"] {
        tags.insert(
            LocalName::from(*name),
            TagSpec {
                allowed_attributes: hashmap! {
                    local_name!("colspan") => AttrRule::Any,
                    local_name!("rowspan") => AttrRule::Any,
                },
                required_attributes: HashSet::new(),
                allowed_parents: None,
            },
        );
    }

    // Generic flow/phrasing content passes through with global
    // attributes only.
    for name in &[
        "p", "div", "span", "br", "hr", "ul", "ol", "li", "dl", "dt", "dd", "h1", "h2", "h3",
        "h4", "h5", "h6", "em", "strong", "b", "i", "u", "s", "small", "mark", "abbr", "cite",
        "code", "pre", "kbd", "samp", "sub", "sup", "q", "ins", "del", "figure", "figcaption",
        "table", "thead", "tbody", "tfoot", "tr", "caption", "section", "article", "aside",
        "header", "footer", "nav", "main", "address", "details", "summary", "button",
        "noscript",
    ] {
        tags.insert(LocalName::from(*name), TagSpec::generic());
    }

    tags
}
