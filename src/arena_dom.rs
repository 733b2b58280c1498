// The node/link representation and TreeSink wiring in this file are
// adapted from the html5ever project's arena example.
// https://github.com/servo/html5ever/blob/45b2fca5c6/html5ever/examples/arena.rs
//
// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of that distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::ptr;

use html5ever::interface::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::serialize::TraversalScope::{ChildrenOnly, IncludeNode};
use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{parse_fragment, Attribute, ExpandedName, LocalName, ParseOpts, QualName};

/// Attribute marking a node (and the fragment root) as exempt from
/// sanitization.
pub const DEV_MODE_ATTR: &str = "data-ampdevmode";

pub type Arena<'arena> = &'arena typed_arena::Arena<Node<'arena>>;

pub type Ref<'arena> = &'arena Node<'arena>;

pub type Link<'arena> = Cell<Option<Ref<'arena>>>;

/// Name → raw value view of an element's attributes. Key absence and
/// an empty string value are distinct states.
pub type AttributeSnapshot = BTreeMap<String, String>;

pub struct Sink<'arena> {
    pub arena: Arena<'arena>,
    pub document: Ref<'arena>,
    pub quirks_mode: QuirksMode,
}

pub struct Node<'arena> {
    pub parent: Link<'arena>,
    pub next_sibling: Link<'arena>,
    pub previous_sibling: Link<'arena>,
    pub first_child: Link<'arena>,
    pub last_child: Link<'arena>,
    pub data: NodeData<'arena>,
}

pub enum NodeData<'arena> {
    Document,
    Doctype {
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    },
    Text {
        contents: RefCell<StrTendril>,
    },
    Comment {
        contents: StrTendril,
    },
    Element {
        name: QualName,
        attrs: RefCell<Vec<Attribute>>,
        template_contents: Option<Ref<'arena>>,
        mathml_annotation_xml_integration_point: bool,
    },
    ProcessingInstruction {
        target: StrTendril,
        contents: StrTendril,
    },
}

pub fn create_element<'arena>(arena: Arena<'arena>, name: &str) -> Ref<'arena> {
    arena.alloc(Node::new(NodeData::Element {
        name: QualName::new(None, ns!(html), LocalName::from(name)),
        attrs: RefCell::new(vec![]),
        template_contents: None,
        mathml_annotation_xml_integration_point: false,
    }))
}

pub fn create_element_with_attrs<'arena>(
    arena: Arena<'arena>,
    name: &str,
    attrs: &[(&str, &str)],
) -> Ref<'arena> {
    let element = create_element(arena, name);
    for (attr_name, value) in attrs {
        element.set_attribute(attr_name, value);
    }
    element
}

pub fn create_text<'arena>(arena: Arena<'arena>, contents: &str) -> Ref<'arena> {
    arena.alloc(Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from(contents)),
    }))
}

/// Recursively copies a subtree into the arena. Used for no-script
/// mirrors of converted elements. Document and doctype nodes never
/// occur inside a fragment subtree.
pub fn deep_clone<'arena>(arena: Arena<'arena>, node: Ref<'arena>) -> Ref<'arena> {
    let clone = match &node.data {
        NodeData::Element {
            name,
            attrs,
            mathml_annotation_xml_integration_point,
            ..
        } => arena.alloc(Node::new(NodeData::Element {
            name: name.clone(),
            attrs: RefCell::new(attrs.borrow().clone()),
            template_contents: None,
            mathml_annotation_xml_integration_point: *mathml_annotation_xml_integration_point,
        })),
        NodeData::Text { contents } => arena.alloc(Node::new(NodeData::Text {
            contents: RefCell::new(contents.borrow().clone()),
        })),
        NodeData::Comment { contents } => arena.alloc(Node::new(NodeData::Comment {
            contents: contents.clone(),
        })),
        NodeData::ProcessingInstruction { target, contents } => {
            arena.alloc(Node::new(NodeData::ProcessingInstruction {
                target: target.clone(),
                contents: contents.clone(),
            }))
        }
        NodeData::Document | NodeData::Doctype { .. } => arena.alloc(Node::new(NodeData::Document)),
    };
    let mut child = node.first_child.get();
    while let Some(c) = child {
        clone.append(deep_clone(arena, c));
        child = c.next_sibling.get();
    }
    clone
}

/// Parses `input` as an HTML fragment in a `body` context. Scripting is
/// disabled so `<noscript>` contents parse as real elements rather than
/// raw text; converters rely on that to recognize existing fallbacks.
pub fn parse_html_fragment<'arena>(arena: Arena<'arena>, input: &[u8]) -> Ref<'arena> {
    let sink = Sink {
        arena,
        document: arena.alloc(Node::new(NodeData::Document)),
        quirks_mode: QuirksMode::NoQuirks,
    };
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            scripting_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    parse_fragment(
        sink,
        opts,
        QualName::new(None, ns!(html), local_name!("body")),
        vec![],
    )
    .from_utf8()
    .one(input)
}

/// The element that holds the parsed fragment's nodes (the `html`
/// wrapper html5ever puts around fragment output).
pub fn fragment_root<'arena>(document: Ref<'arena>) -> Ref<'arena> {
    let mut child = document.first_child.get();
    while let Some(c) = child {
        if c.is_element() {
            return c;
        }
        child = c.next_sibling.get();
    }
    document
}

/// Serializes only the children of `root`, producing fragment output
/// without the `html` wrapper.
pub fn serialize_fragment<'arena>(
    root: Ref<'arena>,
    output: &mut impl io::Write,
) -> io::Result<()> {
    serialize(
        output,
        root,
        SerializeOpts {
            traversal_scope: ChildrenOnly(None),
            ..Default::default()
        },
    )
}

impl<'arena> Node<'arena> {
    pub fn new(data: NodeData<'arena>) -> Self {
        Node {
            parent: Cell::new(None),
            previous_sibling: Cell::new(None),
            next_sibling: Cell::new(None),
            first_child: Cell::new(None),
            last_child: Cell::new(None),
            data,
        }
    }

    pub fn detach(&self) {
        let parent = self.parent.take();
        let previous_sibling = self.previous_sibling.take();
        let next_sibling = self.next_sibling.take();

        if let Some(next_sibling) = next_sibling {
            next_sibling.previous_sibling.set(previous_sibling);
        } else if let Some(parent) = parent {
            parent.last_child.set(previous_sibling);
        }

        if let Some(previous_sibling) = previous_sibling {
            previous_sibling.next_sibling.set(next_sibling);
        } else if let Some(parent) = parent {
            parent.first_child.set(next_sibling);
        }
    }

    pub fn append(&'arena self, new_child: &'arena Self) {
        new_child.detach();
        new_child.parent.set(Some(self));
        if let Some(last_child) = self.last_child.take() {
            new_child.previous_sibling.set(Some(last_child));
            debug_assert!(last_child.next_sibling.get().is_none());
            last_child.next_sibling.set(Some(new_child));
        } else {
            debug_assert!(self.first_child.get().is_none());
            self.first_child.set(Some(new_child));
        }
        self.last_child.set(Some(new_child));
    }

    pub fn insert_before(&'arena self, new_sibling: &'arena Self) {
        new_sibling.detach();
        new_sibling.parent.set(self.parent.get());
        new_sibling.next_sibling.set(Some(self));
        if let Some(previous_sibling) = self.previous_sibling.take() {
            new_sibling.previous_sibling.set(Some(previous_sibling));
            debug_assert!(ptr::eq::<Node>(
                previous_sibling.next_sibling.get().unwrap(),
                self
            ));
            previous_sibling.next_sibling.set(Some(new_sibling));
        } else if let Some(parent) = self.parent.get() {
            debug_assert!(ptr::eq::<Node>(parent.first_child.get().unwrap(), self));
            parent.first_child.set(Some(new_sibling));
        }
        self.previous_sibling.set(Some(new_sibling));
    }

    pub fn insert_after(&'arena self, new_sibling: &'arena Self) {
        new_sibling.detach();
        new_sibling.parent.set(self.parent.get());
        new_sibling.previous_sibling.set(Some(self));
        if let Some(next_sibling) = self.next_sibling.take() {
            new_sibling.next_sibling.set(Some(next_sibling));
            debug_assert!(ptr::eq::<Node>(
                next_sibling.previous_sibling.get().unwrap(),
                self
            ));
            next_sibling.previous_sibling.set(Some(new_sibling));
        } else if let Some(parent) = self.parent.get() {
            debug_assert!(ptr::eq::<Node>(parent.last_child.get().unwrap(), self));
            parent.last_child.set(Some(new_sibling));
        }
        self.next_sibling.set(Some(new_sibling));
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element { .. })
    }

    pub fn element_name(&self) -> Option<&QualName> {
        match &self.data {
            NodeData::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn tag_name(&self) -> Option<String> {
        self.element_name().map(|name| name.local.to_string())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        match self.element_name() {
            Some(name) => &*name.local == tag,
            None => false,
        }
    }

    pub fn get_attribute(&self, attr_name: &str) -> Option<String> {
        match &self.data {
            NodeData::Element { attrs, .. } => attrs
                .borrow()
                .iter()
                .find(|at| &*at.name.local == attr_name)
                .map(|at| at.value.to_string()),
            _ => None,
        }
    }

    pub fn has_attribute(&self, attr_name: &str) -> bool {
        self.get_attribute(attr_name).is_some()
    }

    /// Sets `attr_name`, replacing the value in place when the
    /// attribute already exists (serialization order is insertion
    /// order).
    pub fn set_attribute(&self, attr_name: &str, value: &str) {
        if let NodeData::Element { attrs, .. } = &self.data {
            let mut attrs = attrs.borrow_mut();
            if let Some(existing) = attrs.iter_mut().find(|at| &*at.name.local == attr_name) {
                existing.value = StrTendril::from(value);
            } else {
                attrs.push(Attribute {
                    name: QualName::new(None, ns!(), LocalName::from(attr_name)),
                    value: StrTendril::from(value),
                });
            }
        }
    }

    pub fn remove_attribute(&self, attr_name: &str) -> bool {
        if let NodeData::Element { attrs, .. } = &self.data {
            let mut attrs = attrs.borrow_mut();
            let before = attrs.len();
            attrs.retain(|at| &*at.name.local != attr_name);
            return attrs.len() != before;
        }
        false
    }

    /// Attributes in insertion (serialization) order.
    pub fn ordered_attributes(&self) -> Vec<(String, String)> {
        match &self.data {
            NodeData::Element { attrs, .. } => attrs
                .borrow()
                .iter()
                .map(|at| (at.name.local.to_string(), at.value.to_string()))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn attribute_snapshot(&self) -> AttributeSnapshot {
        let mut snapshot = BTreeMap::new();
        if let NodeData::Element { attrs, .. } = &self.data {
            for at in attrs.borrow().iter() {
                snapshot.insert(at.name.local.to_string(), at.value.to_string());
            }
        }
        snapshot
    }

    pub fn children(&self) -> Vec<Ref<'arena>> {
        let mut out = Vec::new();
        let mut child = self.first_child.get();
        while let Some(c) = child {
            out.push(c);
            child = c.next_sibling.get();
        }
        out
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let NodeData::Text { contents } = &self.data {
            out.push_str(&contents.borrow());
        }
        let mut child = self.first_child.get();
        while let Some(c) = child {
            c.collect_text(out);
            child = c.next_sibling.get();
        }
    }

    pub fn has_ancestor(&self, tag: &str) -> bool {
        let mut current = self.parent.get();
        while let Some(node) = current {
            if node.has_tag(tag) {
                return true;
            }
            current = node.parent.get();
        }
        false
    }

    /// True when the whole pipeline must leave this node untouched:
    /// the node carries the dev-mode marker and the fragment opted in
    /// at the top level.
    pub fn dev_mode_exempt(&self, root: Ref<'arena>) -> bool {
        self.has_attribute(DEV_MODE_ATTR) && root_in_dev_mode(root)
    }
}

/// The fragment opts into dev mode when its root, or any of its
/// top-level elements, carries the marker. Fragment parsing cannot put
/// attributes on the wrapper itself, so top-level carriers stand in
/// for the document root.
pub fn root_in_dev_mode<'arena>(root: Ref<'arena>) -> bool {
    if root.has_attribute(DEV_MODE_ATTR) {
        return true;
    }
    root.children()
        .iter()
        .any(|child| child.has_attribute(DEV_MODE_ATTR))
}

impl<'arena> fmt::Display for Node<'arena> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            NodeData::Document => write!(f, "Document"),
            NodeData::Doctype { name, .. } => write!(f, "Doctype: {}", name),
            NodeData::Text { contents } => write!(
                f,
                "Text: {}...",
                contents.borrow().chars().take(10).collect::<String>()
            ),
            NodeData::ProcessingInstruction { target, .. } => {
                write!(f, "ProcessingInstruction: {}", target)
            }
            NodeData::Comment { contents } => write!(
                f,
                "Comment: {}...",
                contents.chars().take(10).collect::<String>()
            ),
            NodeData::Element { name, .. } => write!(f, "Element: {}", &name.local),
        }
    }
}

impl<'arena> Sink<'arena> {
    fn new_node(&self, data: NodeData<'arena>) -> Ref<'arena> {
        self.arena.alloc(Node::new(data))
    }

    fn append_common<P, A>(&self, child: NodeOrText<Ref<'arena>>, previous: P, append: A)
    where
        P: FnOnce() -> Option<Ref<'arena>>,
        A: FnOnce(Ref<'arena>),
    {
        let new_node = match child {
            NodeOrText::AppendText(text) => {
                // Append to an existing Text node if we have one.
                if let Some(&Node {
                    data: NodeData::Text { ref contents },
                    ..
                }) = previous()
                {
                    contents.borrow_mut().push_tendril(&text);
                    return;
                }
                self.new_node(NodeData::Text {
                    contents: RefCell::new(text),
                })
            }
            NodeOrText::AppendNode(node) => node,
        };

        append(new_node)
    }
}

impl<'arena> TreeSink for Sink<'arena> {
    type Handle = Ref<'arena>;
    type Output = Ref<'arena>;

    fn finish(self) -> Ref<'arena> {
        self.document
    }

    fn parse_error(&mut self, _: Cow<'static, str>) {}

    fn get_document(&mut self) -> Ref<'arena> {
        self.document
    }

    fn set_quirks_mode(&mut self, mode: QuirksMode) {
        self.quirks_mode = mode;
    }

    fn same_node(&self, x: &Ref<'arena>, y: &Ref<'arena>) -> bool {
        ptr::eq::<Node>(*x, *y)
    }

    fn elem_name<'a>(&'a self, target: &'a Ref<'arena>) -> ExpandedName<'a> {
        match target.data {
            NodeData::Element { ref name, .. } => name.expanded(),
            _ => panic!("not an element!"),
        }
    }

    fn get_template_contents(&mut self, target: &Ref<'arena>) -> Ref<'arena> {
        if let NodeData::Element {
            template_contents: Some(ref contents),
            ..
        } = target.data
        {
            contents
        } else {
            panic!("not a template element!")
        }
    }

    fn is_mathml_annotation_xml_integration_point(&self, target: &Ref<'arena>) -> bool {
        if let NodeData::Element {
            mathml_annotation_xml_integration_point,
            ..
        } = target.data
        {
            mathml_annotation_xml_integration_point
        } else {
            panic!("not an element!")
        }
    }

    fn create_element(
        &mut self,
        name: QualName,
        attrs: Vec<Attribute>,
        flags: ElementFlags,
    ) -> Ref<'arena> {
        self.new_node(NodeData::Element {
            name,
            attrs: RefCell::new(attrs),
            template_contents: if flags.template {
                Some(self.new_node(NodeData::Document))
            } else {
                None
            },
            mathml_annotation_xml_integration_point: flags.mathml_annotation_xml_integration_point,
        })
    }

    fn create_comment(&mut self, text: StrTendril) -> Ref<'arena> {
        self.new_node(NodeData::Comment { contents: text })
    }

    fn create_pi(&mut self, target: StrTendril, data: StrTendril) -> Ref<'arena> {
        self.new_node(NodeData::ProcessingInstruction {
            target,
            contents: data,
        })
    }

    fn append(&mut self, parent: &Ref<'arena>, child: NodeOrText<Ref<'arena>>) {
        self.append_common(
            child,
            || parent.last_child.get(),
            |new_node| parent.append(new_node),
        )
    }

    fn append_before_sibling(&mut self, sibling: &Ref<'arena>, child: NodeOrText<Ref<'arena>>) {
        self.append_common(
            child,
            || sibling.previous_sibling.get(),
            |new_node| sibling.insert_before(new_node),
        )
    }

    fn append_based_on_parent_node(
        &mut self,
        element: &Ref<'arena>,
        prev_element: &Ref<'arena>,
        child: NodeOrText<Ref<'arena>>,
    ) {
        if element.parent.get().is_some() {
            self.append_before_sibling(element, child)
        } else {
            self.append(prev_element, child)
        }
    }

    fn append_doctype_to_document(
        &mut self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        self.document.append(self.new_node(NodeData::Doctype {
            name,
            public_id,
            system_id,
        }))
    }

    fn add_attrs_if_missing(&mut self, target: &Ref<'arena>, attrs: Vec<Attribute>) {
        let mut existing = if let NodeData::Element { ref attrs, .. } = target.data {
            attrs.borrow_mut()
        } else {
            panic!("not an element")
        };

        let existing_names = existing
            .iter()
            .map(|at| at.name.clone())
            .collect::<std::collections::HashSet<_>>();
        existing.extend(
            attrs
                .into_iter()
                .filter(|at| !existing_names.contains(&at.name)),
        );
    }

    fn remove_from_parent(&mut self, target: &Ref<'arena>) {
        target.detach()
    }

    fn reparent_children(&mut self, node: &Ref<'arena>, new_parent: &Ref<'arena>) {
        let mut next_child = node.first_child.get();
        while let Some(child) = next_child {
            debug_assert!(ptr::eq::<Node>(child.parent.get().unwrap(), *node));
            next_child = child.next_sibling.get();
            new_parent.append(child)
        }
    }
}

impl<'arena> Node<'arena> {
    fn serialize_children<S>(&self, serializer: &mut S) -> io::Result<()>
    where
        S: Serializer,
    {
        let mut child = self.first_child.get();
        while let Some(c) = child {
            c.serialize_node(serializer)?;
            child = c.next_sibling.get();
        }
        Ok(())
    }

    fn serialize_node<S>(&self, serializer: &mut S) -> io::Result<()>
    where
        S: Serializer,
    {
        match &self.data {
            NodeData::Element {
                name,
                attrs,
                template_contents,
                ..
            } => {
                {
                    let attrs = attrs.borrow();
                    serializer.start_elem(
                        name.clone(),
                        attrs.iter().map(|at| (&at.name, &at.value[..])),
                    )?;
                }
                // Template payloads live on the contents document, not
                // the element itself.
                if let Some(contents) = template_contents {
                    contents.serialize_children(serializer)?;
                } else {
                    self.serialize_children(serializer)?;
                }
                serializer.end_elem(name.clone())
            }
            NodeData::Document => self.serialize_children(serializer),
            NodeData::Doctype { name, .. } => serializer.write_doctype(name),
            NodeData::Text { contents } => serializer.write_text(&contents.borrow()),
            NodeData::Comment { contents } => serializer.write_comment(contents),
            NodeData::ProcessingInstruction { target, contents } => {
                serializer.write_processing_instruction(target, contents)
            }
        }
    }
}

impl<'arena> Serialize for Node<'arena> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        match traversal_scope {
            IncludeNode => self.serialize_node(serializer),
            ChildrenOnly(_) => self.serialize_children(serializer),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse<'arena>(arena: Arena<'arena>, input: &str) -> Ref<'arena> {
        fragment_root(parse_html_fragment(arena, input.as_bytes()))
    }

    fn to_html(root: Ref) -> String {
        let mut output = vec![];
        serialize_fragment(root, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn fragment_round_trip() {
        let arena = typed_arena::Arena::new();
        let root = parse(&arena, "<p>hello <b>world</b></p>");
        assert_eq!(to_html(root), "<p>hello <b>world</b></p>");
    }

    #[test]
    fn void_elements_serialize_without_end_tags() {
        let arena = typed_arena::Arena::new();
        let root = parse(&arena, "<img src=\"https://x/a.png\"><br>");
        assert_eq!(to_html(root), "<img src=\"https://x/a.png\"><br>");
    }

    #[test]
    fn noscript_contents_parse_as_elements() {
        let arena = typed_arena::Arena::new();
        let root = parse(&arena, "<noscript><img src=\"https://x/a.png\"></noscript>");
        let noscript = root.children()[0];
        assert!(noscript.has_tag("noscript"));
        assert!(noscript.children()[0].has_tag("img"));
    }

    #[test]
    fn attribute_helpers() {
        let arena = typed_arena::Arena::new();
        let root = parse(&arena, "<img src=\"a\" width=\"\">");
        let img = root.children()[0];
        assert_eq!(img.get_attribute("src").unwrap(), "a");
        // Empty and absent are distinct.
        assert_eq!(img.get_attribute("width").unwrap(), "");
        assert!(img.get_attribute("height").is_none());

        img.set_attribute("width", "10");
        assert_eq!(img.get_attribute("width").unwrap(), "10");
        assert!(img.remove_attribute("width"));
        assert!(!img.has_attribute("width"));
    }

    #[test]
    fn set_attribute_preserves_insertion_order() {
        let arena = typed_arena::Arena::new();
        let root = parse(&arena, "<img src=\"a\" width=\"1\" height=\"2\">");
        let img = root.children()[0];
        img.set_attribute("width", "3");
        img.set_attribute("layout", "fixed");
        assert_eq!(
            to_html(root),
            "<img src=\"a\" width=\"3\" height=\"2\" layout=\"fixed\">"
        );
    }

    #[test]
    fn created_elements_mix_with_parsed_ones() {
        let arena = typed_arena::Arena::new();
        let root = parse(&arena, "<div></div>");
        let div = root.children()[0];
        let replacement =
            create_element_with_attrs(&arena, "amp-img", &[("src", "https://x/a.png")]);
        replacement.append(create_text(&arena, "t"));
        div.insert_before(replacement);
        div.detach();
        assert_eq!(to_html(root), "<amp-img src=\"https://x/a.png\">t</amp-img>");
    }

    #[test]
    fn deep_clone_copies_attributes_and_children() {
        let arena = typed_arena::Arena::new();
        let root = parse(
            &arena,
            "<video src=\"v\"><source src=\"a\"><track src=\"t\"></video>",
        );
        let video = root.children()[0];
        let clone = deep_clone(&arena, video);
        root.append(clone);
        video.detach();
        assert_eq!(
            to_html(root),
            "<video src=\"v\"><source src=\"a\"><track src=\"t\"></video>"
        );
    }

    #[test]
    fn dev_mode_needs_both_markers() {
        let arena = typed_arena::Arena::new();
        let root = parse(
            &arena,
            "<div data-ampdevmode=\"\"><img data-ampdevmode=\"\" src=\"a\"><img src=\"b\"></div>",
        );
        let div = root.children()[0];
        let marked = div.children()[0];
        let unmarked = div.children()[1];
        assert!(root_in_dev_mode(root));
        assert!(marked.dev_mode_exempt(root));
        assert!(!unmarked.dev_mode_exempt(root));
    }

    #[test]
    fn dev_mode_off_without_top_level_marker() {
        let arena = typed_arena::Arena::new();
        let root = parse(&arena, "<div><img data-ampdevmode=\"\" src=\"a\"></div>");
        let img = root.children()[0].children()[0];
        assert!(!root_in_dev_mode(root));
        assert!(!img.dev_mode_exempt(root));
    }

    #[test]
    fn text_content_concatenates_descendants() {
        let arena = typed_arena::Arena::new();
        let root = parse(&arena, "<p>a<b>b</b>c</p>");
        assert_eq!(root.children()[0].text_content(), "abc");
    }
}
