use log::debug;
use regex::Regex;

use crate::arena_dom::{create_element, create_text, NodeData, Ref};
use crate::collaborators::EmbedMetadata;

use super::{collect_elements, is_amp_element, EmbedKind, Pass};

const FACEBOOK_WIDTH: &str = "600";
const FACEBOOK_HEIGHT: &str = "400";
const TWITTER_WIDTH: &str = "600";
const TWITTER_HEIGHT: &str = "480";

const FACEBOOK_LOADER_HOST: &str = "connect.facebook.net";
const TWITTER_LOADER_HOST: &str = "platform.twitter.com";

lazy_static! {
    static ref FACEBOOK_VIDEO_URL: Regex = Regex::new(
        r"^https?://(?:www\.|m\.)?facebook\.com/(?:[^/?#]+/videos/|video\.php)"
    )
    .unwrap();
    static ref FACEBOOK_POST_URL: Regex = Regex::new(
        r"^https?://(?:www\.|m\.)?facebook\.com/(?:[^/?#]+/(?:posts|activity)/|permalink\.php|story\.php|notes/|photo\.php|[^/?#]+/photos/)"
    )
    .unwrap();
    static ref TWITTER_STATUS_URL: Regex = Regex::new(
        r"^https?://(?:www\.)?twitter\.com/(?:#!/)?\w+/status(?:es)?/(\d+)"
    )
    .unwrap();
    static ref TWITTER_LIST_URL: Regex = Regex::new(
        r"^https?://(?:www\.)?twitter\.com/(\w+)/lists/([a-zA-Z0-9_-]+)/?$"
    )
    .unwrap();
    static ref TWITTER_PROFILE_URL: Regex =
        Regex::new(r"^https?://(?:www\.)?twitter\.com/(\w+)/?$").unwrap();
}

/// Screen names these words can never be; they are site navigation.
const TWITTER_RESERVED_PATHS: [&str; 7] =
    ["home", "search", "explore", "hashtag", "i", "intent", "share"];

/// Phase (a) rewrites raw third-party embed markup in place and strips
/// the now-redundant loader scripts; phase (b) converts standalone
/// links using fetched embed metadata.
pub fn convert<'arena>(pass: &Pass<'arena, '_>, kind: EmbedKind) {
    match kind {
        EmbedKind::Facebook => convert_raw_facebook(pass),
        EmbedKind::Twitter => convert_raw_twitter(pass),
    }
    remove_loader_scripts(pass, kind);
    autolink(pass, kind);
}

fn convert_raw_facebook<'arena>(pass: &Pass<'arena, '_>) {
    for div in collect_elements(pass.root, "div") {
        if div.dev_mode_exempt(pass.root) {
            continue;
        }
        let embed_as = match div.get_attribute("class") {
            Some(class) => match facebook_embed_kind(&class) {
                Some(embed_as) => embed_as,
                None => continue,
            },
            None => continue,
        };
        let href = match div.get_attribute("data-href") {
            Some(href) if !href.trim().is_empty() => href,
            _ => continue,
        };

        let amp = create_element(pass.arena, "amp-facebook");
        amp.set_attribute("width", FACEBOOK_WIDTH);
        amp.set_attribute("height", FACEBOOK_HEIGHT);
        amp.set_attribute("data-href", &href);
        amp.set_attribute("data-embed-as", embed_as);
        amp.set_attribute("layout", "responsive");
        div.insert_before(amp);
        div.detach();
    }
}

fn facebook_embed_kind(class: &str) -> Option<&'static str> {
    for name in class.split_whitespace() {
        match name {
            "fb-video" => return Some("video"),
            "fb-post" => return Some("post"),
            "fb-page" => return Some("page"),
            _ => {}
        }
    }
    None
}

fn convert_raw_twitter<'arena>(pass: &Pass<'arena, '_>) {
    for blockquote in collect_elements(pass.root, "blockquote") {
        if blockquote.dev_mode_exempt(pass.root) {
            continue;
        }
        let is_tweet = blockquote
            .get_attribute("class")
            .map(|class| class.split_whitespace().any(|name| name == "twitter-tweet"))
            .unwrap_or(false);
        if !is_tweet {
            continue;
        }
        // The permalink is conventionally the last link in the quote.
        let tweet_id = collect_elements(blockquote, "a")
            .iter()
            .rev()
            .find_map(|anchor| {
                anchor
                    .get_attribute("href")
                    .and_then(|href| tweet_id_from_url(&href))
            });
        let tweet_id = match tweet_id {
            Some(id) => id,
            None => continue,
        };

        let amp = create_element(pass.arena, "amp-twitter");
        amp.set_attribute("width", TWITTER_WIDTH);
        amp.set_attribute("height", TWITTER_HEIGHT);
        amp.set_attribute("layout", "responsive");
        amp.set_attribute("data-tweetid", &tweet_id);
        blockquote.insert_before(amp);
        // The original quote rides along as the placeholder shown
        // before the widget loads.
        blockquote.set_attribute("placeholder", "");
        amp.append(blockquote);
    }
}

fn tweet_id_from_url(url: &str) -> Option<String> {
    TWITTER_STATUS_URL
        .captures(url.trim())
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}

fn remove_loader_scripts<'arena>(pass: &Pass<'arena, '_>, kind: EmbedKind) {
    let loader_host = match kind {
        EmbedKind::Facebook => FACEBOOK_LOADER_HOST,
        EmbedKind::Twitter => TWITTER_LOADER_HOST,
    };
    for script in collect_elements(pass.root, "script") {
        if script.dev_mode_exempt(pass.root) {
            continue;
        }
        let src = script.get_attribute("src").unwrap_or_default();
        if !src.contains(loader_host) {
            continue;
        }
        let parent = script.parent.get();
        script.detach();
        if let Some(parent) = parent {
            remove_if_empty_paragraph(parent);
        }
    }
    if kind == EmbedKind::Facebook {
        for div in collect_elements(pass.root, "div") {
            if div.get_attribute("id").as_deref() == Some("fb-root")
                && !div.dev_mode_exempt(pass.root)
            {
                div.detach();
            }
        }
    }
}

fn remove_if_empty_paragraph(node: Ref) {
    if !node.has_tag("p") {
        return;
    }
    let has_content = node.children().iter().any(|child| match &child.data {
        NodeData::Element { .. } => true,
        NodeData::Text { contents } => !contents.borrow().trim().is_empty(),
        _ => false,
    });
    if !has_content {
        node.detach();
    }
}

struct EmbedTarget {
    tag: &'static str,
    width: &'static str,
    height: &'static str,
    attrs: Vec<(String, String)>,
}

fn classify_url(url: &str, kind: EmbedKind) -> Option<EmbedTarget> {
    let url = url.trim();
    match kind {
        EmbedKind::Facebook => {
            let embed_as = if FACEBOOK_VIDEO_URL.is_match(url) {
                "video"
            } else if FACEBOOK_POST_URL.is_match(url) {
                "post"
            } else {
                return None;
            };
            Some(EmbedTarget {
                tag: "amp-facebook",
                width: FACEBOOK_WIDTH,
                height: FACEBOOK_HEIGHT,
                attrs: vec![
                    ("data-href".to_string(), url.to_string()),
                    ("data-embed-as".to_string(), embed_as.to_string()),
                ],
            })
        }
        EmbedKind::Twitter => {
            if let Some(id) = tweet_id_from_url(url) {
                return Some(EmbedTarget {
                    tag: "amp-twitter",
                    width: TWITTER_WIDTH,
                    height: TWITTER_HEIGHT,
                    attrs: vec![("data-tweetid".to_string(), id)],
                });
            }
            if let Some(captures) = TWITTER_LIST_URL.captures(url) {
                return Some(EmbedTarget {
                    tag: "amp-twitter",
                    width: TWITTER_WIDTH,
                    height: TWITTER_HEIGHT,
                    attrs: vec![
                        ("data-timeline-source-type".to_string(), "list".to_string()),
                        (
                            "data-timeline-owner-screen-name".to_string(),
                            captures[1].to_string(),
                        ),
                        ("data-timeline-slug".to_string(), captures[2].to_string()),
                    ],
                });
            }
            let captures = TWITTER_PROFILE_URL.captures(url)?;
            let screen_name = captures[1].to_string();
            if TWITTER_RESERVED_PATHS.contains(&screen_name.as_str()) {
                return None;
            }
            Some(EmbedTarget {
                tag: "amp-twitter",
                width: TWITTER_WIDTH,
                height: TWITTER_HEIGHT,
                attrs: vec![
                    (
                        "data-timeline-source-type".to_string(),
                        "profile".to_string(),
                    ),
                    ("data-timeline-screen-name".to_string(), screen_name),
                ],
            })
        }
    }
}

/// Phase (b): a pasted bare link (anchor whose text is its href, or a
/// bare-URL text node) becomes the custom element, with a placeholder
/// built from the fetched metadata. No fetcher or a failed fetch
/// leaves the link as it was.
fn autolink<'arena>(pass: &Pass<'arena, '_>, kind: EmbedKind) {
    let fetcher = match pass.embeds {
        Some(fetcher) => fetcher,
        None => return,
    };

    for anchor in collect_elements(pass.root, "a") {
        if anchor.dev_mode_exempt(pass.root) || inside_amp_element(anchor) {
            continue;
        }
        let href = match anchor.get_attribute("href") {
            Some(href) => href,
            None => continue,
        };
        if anchor.text_content().trim() != href.trim() {
            continue;
        }
        if let Some(target) = classify_url(&href, kind) {
            match fetcher.fetch(href.trim(), kind) {
                Some(metadata) => {
                    let amp = build_embed(pass, &target, href.trim(), &metadata);
                    anchor.insert_before(amp);
                    anchor.detach();
                }
                None => debug!("embed fetch failed for {:?}, leaving link", href),
            }
        }
    }

    for text in collect_bare_text_nodes(pass.root) {
        let content = text.text_content();
        let url = content.trim();
        if let Some(target) = classify_url(url, kind) {
            match fetcher.fetch(url, kind) {
                Some(metadata) => {
                    let amp = build_embed(pass, &target, url, &metadata);
                    text.insert_before(amp);
                    text.detach();
                }
                None => debug!("embed fetch failed for {:?}, leaving text", url),
            }
        }
    }
}

fn build_embed<'arena>(
    pass: &Pass<'arena, '_>,
    target: &EmbedTarget,
    url: &str,
    metadata: &EmbedMetadata,
) -> Ref<'arena> {
    let amp = create_element(pass.arena, target.tag);
    amp.set_attribute("width", target.width);
    amp.set_attribute("height", target.height);
    for (name, value) in &target.attrs {
        amp.set_attribute(name, value);
    }
    amp.set_attribute("layout", "responsive");
    if pass.policy.add_placeholder {
        let placeholder = create_element(pass.arena, "a");
        placeholder.set_attribute("href", url);
        placeholder.set_attribute("placeholder", "");
        let label = metadata.title.as_deref().unwrap_or(url);
        placeholder.append(create_text(pass.arena, label));
        amp.append(placeholder);
    }
    amp
}

fn inside_amp_element(node: Ref) -> bool {
    let mut current = node.parent.get();
    while let Some(parent) = current {
        if is_amp_element(parent) {
            return true;
        }
        current = parent.parent.get();
    }
    false
}

/// Text nodes that could be a pasted URL on its own line: direct
/// children of container elements, outside noscript and AMP subtrees.
fn collect_bare_text_nodes<'arena>(root: Ref<'arena>) -> Vec<Ref<'arena>> {
    let mut out = Vec::new();
    collect_text_into(root, &mut out);
    out
}

fn collect_text_into<'arena>(node: Ref<'arena>, out: &mut Vec<Ref<'arena>>) {
    if node.has_tag("noscript") || is_amp_element(node) {
        return;
    }
    let mut child = node.first_child.get();
    while let Some(c) = child {
        if let NodeData::Text { .. } = c.data {
            out.push(c);
        } else {
            collect_text_into(c, out);
        }
        child = c.next_sibling.get();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::arena_dom::{fragment_root, parse_html_fragment, serialize_fragment};
    use crate::collaborators::EmbedFetcher;
    use crate::errors::ErrorSink;
    use crate::ConversionPolicy;

    struct StubFetcher {
        metadata: Option<EmbedMetadata>,
    }

    impl EmbedFetcher for StubFetcher {
        fn fetch(&self, _url: &str, _kind: EmbedKind) -> Option<EmbedMetadata> {
            self.metadata.clone()
        }
    }

    fn run_with(
        input: &str,
        kind: EmbedKind,
        policy: &ConversionPolicy,
        fetcher: Option<&dyn EmbedFetcher>,
    ) -> String {
        let arena = typed_arena::Arena::new();
        let root = fragment_root(parse_html_fragment(&arena, input.as_bytes()));
        let sink = ErrorSink::new(policy, None);
        let pass = Pass {
            arena: &arena,
            root,
            policy,
            errors: &sink,
            dimensions: None,
            embeds: fetcher,
        };
        convert(&pass, kind);
        let mut output = vec![];
        serialize_fragment(root, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    fn run(input: &str, kind: EmbedKind) -> String {
        run_with(input, kind, &ConversionPolicy::default(), None)
    }

    #[test]
    fn fb_video_div_becomes_amp_facebook() {
        let html = run(
            "<div class=\"fb-video\" data-href=\"https://facebook.com/z/videos/1/\"></div>",
            EmbedKind::Facebook,
        );
        assert_eq!(
            html,
            "<amp-facebook width=\"600\" height=\"400\" \
             data-href=\"https://facebook.com/z/videos/1/\" data-embed-as=\"video\" \
             layout=\"responsive\"></amp-facebook>"
        );
    }

    #[test]
    fn fb_loader_and_root_div_are_removed() {
        let html = run(
            "<div id=\"fb-root\"></div>\
             <p><script async src=\"https://connect.facebook.net/en_US/sdk.js\"></script></p>\
             <div class=\"fb-post\" data-href=\"https://facebook.com/z/posts/2\"></div>",
            EmbedKind::Facebook,
        );
        assert!(!html.contains("fb-root"));
        assert!(!html.contains("script"));
        // The wrapping paragraph emptied out and went with it.
        assert!(!html.contains("<p>"));
        assert!(html.contains("data-embed-as=\"post\""));
    }

    #[test]
    fn tweet_blockquote_becomes_placeholder_inside_amp_twitter() {
        let html = run(
            "<blockquote class=\"twitter-tweet\"><p>hi</p>\
             <a href=\"https://twitter.com/a/status/123\">March 1</a></blockquote>\
             <script async src=\"https://platform.twitter.com/widgets.js\"></script>",
            EmbedKind::Twitter,
        );
        assert!(html.starts_with(
            "<amp-twitter width=\"600\" height=\"480\" layout=\"responsive\" \
             data-tweetid=\"123\">"
        ));
        assert!(html.contains("<blockquote class=\"twitter-tweet\" placeholder=\"\">"));
        assert!(!html.contains("widgets.js"));
    }

    #[test]
    fn blockquote_without_status_link_is_left_alone() {
        let input = "<blockquote class=\"twitter-tweet\"><p>hi</p></blockquote>";
        assert_eq!(run(input, EmbedKind::Twitter), input);
    }

    #[test]
    fn autolink_needs_a_fetcher() {
        let input = "<p><a href=\"https://twitter.com/a/status/9\">https://twitter.com/a/status/9</a></p>";
        assert_eq!(run(input, EmbedKind::Twitter), input);
    }

    #[test]
    fn autolink_converts_bare_status_link() {
        let fetcher = StubFetcher {
            metadata: Some(EmbedMetadata {
                title: Some("A tweet".into()),
                ..Default::default()
            }),
        };
        let policy = ConversionPolicy {
            add_placeholder: true,
            ..Default::default()
        };
        let html = run_with(
            "<p><a href=\"https://twitter.com/a/status/9\">https://twitter.com/a/status/9</a></p>",
            EmbedKind::Twitter,
            &policy,
            Some(&fetcher),
        );
        assert!(html.contains("data-tweetid=\"9\""));
        assert!(html.contains(
            "<a href=\"https://twitter.com/a/status/9\" placeholder=\"\">A tweet</a>"
        ));
        assert!(!html.contains("</a></p>"));
    }

    #[test]
    fn captioned_links_are_navigation_not_embeds() {
        let fetcher = StubFetcher {
            metadata: Some(EmbedMetadata::default()),
        };
        let input = "<p><a href=\"https://twitter.com/a/status/9\">read this</a></p>";
        let html = run_with(
            input,
            EmbedKind::Twitter,
            &ConversionPolicy::default(),
            Some(&fetcher),
        );
        assert_eq!(html, input);
    }

    #[test]
    fn failed_fetch_leaves_the_link() {
        let fetcher = StubFetcher { metadata: None };
        let input = "<p><a href=\"https://twitter.com/a/status/9\">https://twitter.com/a/status/9</a></p>";
        let html = run_with(
            input,
            EmbedKind::Twitter,
            &ConversionPolicy::default(),
            Some(&fetcher),
        );
        assert_eq!(html, input);
    }

    #[test]
    fn bare_text_url_converts() {
        let fetcher = StubFetcher {
            metadata: Some(EmbedMetadata::default()),
        };
        let html = run_with(
            "<p>https://facebook.com/z/posts/2</p>",
            EmbedKind::Facebook,
            &ConversionPolicy::default(),
            Some(&fetcher),
        );
        assert!(html.contains("<amp-facebook"));
        assert!(html.contains("data-embed-as=\"post\""));
    }

    #[test]
    fn profile_and_list_urls_become_timelines() {
        let fetcher = StubFetcher {
            metadata: Some(EmbedMetadata::default()),
        };
        let html = run_with(
            "<p>https://twitter.com/rustlang</p>",
            EmbedKind::Twitter,
            &ConversionPolicy::default(),
            Some(&fetcher),
        );
        assert!(html.contains("data-timeline-source-type=\"profile\""));
        assert!(html.contains("data-timeline-screen-name=\"rustlang\""));

        let html = run_with(
            "<p>https://twitter.com/rustlang/lists/crates</p>",
            EmbedKind::Twitter,
            &ConversionPolicy::default(),
            Some(&fetcher),
        );
        assert!(html.contains("data-timeline-source-type=\"list\""));
        assert!(html.contains("data-timeline-owner-screen-name=\"rustlang\""));
        assert!(html.contains("data-timeline-slug=\"crates\""));
    }

    #[test]
    fn reserved_twitter_paths_are_ignored() {
        let fetcher = StubFetcher {
            metadata: Some(EmbedMetadata::default()),
        };
        let input = "<p>https://twitter.com/search</p>";
        let html = run_with(
            input,
            EmbedKind::Twitter,
            &ConversionPolicy::default(),
            Some(&fetcher),
        );
        assert_eq!(html, input);
    }

    #[test]
    fn dev_mode_embed_markup_is_untouched() {
        let input = "<div data-ampdevmode=\"\" class=\"fb-video\" \
                     data-href=\"https://facebook.com/z/videos/1/\"></div>";
        assert_eq!(run(input, EmbedKind::Facebook), input);
    }
}
