// Owned, mutable HTML document for running the controller outside a browser.
// html5ever parses into an RcDom which is copied into an index-based arena.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::escape::{escape_attr, escape_text};
use crate::page::Page;
use crate::selector::Selector;

pub type NodeId = usize;

const DOCUMENT: NodeId = 0;

#[derive(Clone, Debug)]
enum Kind {
    Document,
    Doctype(String),
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Clone, Debug)]
struct Node {
    kind: Kind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Clone, Debug)]
pub struct StaticPage {
    nodes: Vec<Node>,
}

fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta"
            | "source" | "track" | "wbr"
    )
}

fn is_raw_text(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "noscript" | "template")
}

impl StaticPage {
    pub fn parse(html: &str) -> Self {
        let dom = parse_document(RcDom::default(), Default::default()).one(html);
        let mut page = Self {
            nodes: vec![Node {
                kind: Kind::Document,
                parent: None,
                children: Vec::new(),
            }],
        };
        for child in dom.document.children.borrow().iter() {
            page.import(child, DOCUMENT);
        }
        page
    }

    fn import(&mut self, handle: &Handle, parent: NodeId) {
        let kind = match &handle.data {
            NodeData::Doctype { name, .. } => Kind::Doctype(name.to_string()),
            NodeData::Text { contents } => Kind::Text(contents.borrow().to_string()),
            NodeData::Comment { contents } => Kind::Comment(contents.to_string()),
            NodeData::Element { name, attrs, .. } => Kind::Element {
                tag: name.local.to_string(),
                attrs: attrs
                    .borrow()
                    .iter()
                    .map(|a| (a.name.local.to_string(), a.value.to_string()))
                    .collect(),
            },
            _ => return,
        };
        let id = self.push(kind);
        self.attach(parent, id);
        for child in handle.children.borrow().iter() {
            self.import(child, id);
        }
    }

    fn push(&mut self, kind: Kind) -> NodeId {
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(old) = self.nodes[child].parent.take() {
            self.nodes[old].children.retain(|c| *c != child);
        }
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            Kind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.parent
    }

    /// True when `ancestor` is `id` or lies on its parent chain.
    fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            if node == ancestor {
                return true;
            }
            cursor = self.nodes[node].parent;
        }
        false
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Kind::Text(text) = &self.nodes[node].kind {
                out.push_str(text);
            }
        }
        out
    }

    /// Descendants of `id` in document order, excluding `id` itself.
    fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next].children.iter().rev().copied());
        }
        out
    }

    fn element_matches(&self, id: NodeId, selector: &Selector) -> bool {
        match &self.nodes[id].kind {
            Kind::Element { tag, attrs } => selector.matches_element(tag, |name| {
                attrs
                    .iter()
                    .find(|(k, _)| k == name)
                    .map(|(_, v)| v.clone())
            }),
            _ => false,
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in &self.nodes[DOCUMENT].children {
            self.serialize(*child, false, &mut out);
        }
        out
    }

    fn serialize(&self, id: NodeId, raw: bool, out: &mut String) {
        match &self.nodes[id].kind {
            Kind::Document => {}
            Kind::Doctype(name) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(name);
                out.push('>');
            }
            Kind::Text(text) if raw => out.push_str(text),
            Kind::Text(text) => out.push_str(&escape_text(text)),
            Kind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            Kind::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
                out.push('>');
                if is_void(tag) {
                    return;
                }
                let raw = is_raw_text(tag);
                for child in &self.nodes[id].children {
                    self.serialize(*child, raw, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

impl Page for StaticPage {
    type Node = NodeId;

    fn root(&self) -> Option<NodeId> {
        self.nodes[DOCUMENT]
            .children
            .iter()
            .copied()
            .find(|id| self.tag(*id).is_some())
    }

    fn body(&self) -> Option<NodeId> {
        self.descendants(DOCUMENT)
            .into_iter()
            .find(|id| self.tag(*id) == Some("body"))
    }

    fn select_first(&self, scope: Option<&NodeId>, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope.copied().unwrap_or(DOCUMENT))
            .into_iter()
            .find(|id| self.element_matches(*id, selector))
    }

    fn select_all(&self, scope: Option<&NodeId>, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope.copied().unwrap_or(DOCUMENT))
            .into_iter()
            .filter(|id| self.element_matches(*id, selector))
            .collect()
    }

    fn matches(&self, node: &NodeId, selector: &Selector) -> bool {
        self.element_matches(*node, selector)
    }

    fn attr(&self, node: &NodeId, name: &str) -> Option<String> {
        match &self.nodes.get(*node)?.kind {
            Kind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    fn set_attr(&mut self, node: &NodeId, name: &str, value: &str) {
        if let Some(Node {
            kind: Kind::Element { attrs, .. },
            ..
        }) = self.nodes.get_mut(*node)
        {
            match attrs.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value.to_string(),
                None => attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    fn remove_attr(&mut self, node: &NodeId, name: &str) {
        if let Some(Node {
            kind: Kind::Element { attrs, .. },
            ..
        }) = self.nodes.get_mut(*node)
        {
            attrs.retain(|(k, _)| k != name);
        }
    }

    fn set_text(&mut self, node: &NodeId, text: &str) {
        if self.tag(*node).is_none() {
            return;
        }
        for child in std::mem::take(&mut self.nodes[*node].children) {
            self.nodes[child].parent = None;
        }
        if !text.is_empty() {
            let id = self.push(Kind::Text(text.to_string()));
            self.attach(*node, id);
        }
    }

    fn create_element(&mut self, tag: &str) -> Option<NodeId> {
        Some(self.push(Kind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }))
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        let in_range = *parent < self.nodes.len() && *child < self.nodes.len();
        // a node cannot be moved under itself or its own subtree
        if in_range && !self.is_inclusive_ancestor(*child, *parent) {
            self.attach(*parent, *child);
        }
    }
}
