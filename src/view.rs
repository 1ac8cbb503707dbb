//! View Tree
//!
//! Host-neutral description of rendered output. Fragments and imperative page
//! modules build [`Node`] trees; render roots and DOM elements draw them.

use std::fmt;
use std::rc::Rc;

/// Event delivered to a [`Callback`]
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A click on a button or link
    Click,
    /// A change on a checkbox input, carrying its new checked state
    Change { checked: bool },
}

impl Event {
    /// The kind of listener this event is dispatched to
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Click => EventKind::Click,
            Event::Change { .. } => EventKind::Change,
        }
    }
}

/// Listener kinds understood by every host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Change,
}

impl EventKind {
    /// DOM event name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::Change => "change",
        }
    }
}

/// Event handler attached to a node
pub type Callback = Rc<dyn Fn(&Event)>;

/// A node in the view tree
#[derive(Clone)]
pub enum Node {
    Element(ElementNode),
    Text(String),
}

/// An element node with attributes, listeners and children
#[derive(Clone)]
pub struct ElementNode {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub listeners: Vec<(EventKind, Callback)>,
    pub children: Vec<Node>,
}

impl Node {
    /// Create an element node
    pub fn el(tag: &str) -> Self {
        Node::Element(ElementNode {
            tag: tag.to_string(),
            attributes: Vec::new(),
            listeners: Vec::new(),
            children: Vec::new(),
        })
    }

    /// Create a text node
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    /// Set an attribute (replaces an existing value)
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        if let Node::Element(el) = &mut self {
            let value = value.into();
            match el.attributes.iter_mut().find(|(n, _)| n == name) {
                Some(slot) => slot.1 = value,
                None => el.attributes.push((name.to_string(), value)),
            }
        }
        self
    }

    /// Set the `class` attribute
    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    /// Set the `id` attribute
    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    /// Set a boolean attribute when `on` is true
    pub fn flag(self, name: &str, on: bool) -> Self {
        if on {
            self.attr(name, "")
        } else {
            self
        }
    }

    /// Attach a listener
    pub fn on(mut self, kind: EventKind, callback: Callback) -> Self {
        if let Node::Element(el) = &mut self {
            el.listeners.push((kind, callback));
        }
        self
    }

    /// Append a child
    pub fn child(mut self, child: Node) -> Self {
        if let Node::Element(el) = &mut self {
            el.children.push(child);
        }
        self
    }

    /// Append a child when present
    pub fn maybe_child(self, child: Option<Node>) -> Self {
        match child {
            Some(child) => self.child(child),
            None => self,
        }
    }

    /// Append several children
    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        if let Node::Element(el) = &mut self {
            el.children.extend(children);
        }
        self
    }

    /// Append a text child
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.child(Node::text(text))
    }

    /// Tag name for element nodes
    pub fn tag(&self) -> Option<&str> {
        match self {
            Node::Element(el) => Some(&el.tag),
            Node::Text(_) => None,
        }
    }

    /// Attribute value for element nodes
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        match self {
            Node::Element(el) => el
                .attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            Node::Text(_) => None,
        }
    }

    /// Concatenated text content
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                for child in &el.children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Serialize to HTML with text and attribute values escaped
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(&escape_html(text)),
            Node::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attributes {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&escape_attr(value));
                        out.push('"');
                    }
                }
                out.push('>');
                if is_void(&el.tag) {
                    return;
                }
                for child in &el.children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

fn is_void(tag: &str) -> bool {
    matches!(tag, "input" | "br" | "hr" | "img" | "meta" | "link")
}

/// Escape `&`, `<` and `>` in text content
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attr(s: &str) -> String {
    escape_html(s).replace('"', "&quot;")
}
