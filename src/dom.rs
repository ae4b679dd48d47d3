//! Narrow query layer over a parsed portal page.
//!
//! Extractors only see [`Page`], [`Node`] and [`Query`]; the HTML parser
//! behind them stays an implementation detail of this module.

use scraper::{ElementRef, Html};

pub struct Page {
    document: Html,
}

impl Page {
    pub fn parse(markup: &str) -> Self {
        Self {
            document: Html::parse_document(markup),
        }
    }

    pub fn root(&self) -> Node<'_> {
        Node(self.document.root_element())
    }

    pub fn find_first(&self, query: &Query<'_>) -> Option<Node<'_>> {
        self.find_all(query).next()
    }

    pub fn find_all<'p, 'q>(&'p self, query: &'q Query<'q>) -> impl Iterator<Item = Node<'p>> + 'q
    where
        'p: 'q,
    {
        self.root().walk().filter(move |node| query.matches(node))
    }
}

/// An element in a parsed page.
#[derive(Clone, Copy)]
pub struct Node<'a>(ElementRef<'a>);

impl<'a> Node<'a> {
    pub fn tag(&self) -> &'a str {
        self.0.value().name()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.0.value().attr(name)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.0.value().classes().any(|c| c == class)
    }

    /// Element children only; text and comment nodes are skipped.
    pub fn children(&self) -> Vec<Node<'a>> {
        self.0.children().filter_map(ElementRef::wrap).map(Node).collect()
    }

    pub fn child(&self, index: usize) -> Option<Node<'a>> {
        self.0
            .children()
            .filter_map(ElementRef::wrap)
            .nth(index)
            .map(Node)
    }

    /// Concatenated text of the element and all its descendants.
    pub fn text(&self) -> String {
        self.0.text().collect()
    }

    /// First matching descendant, excluding the element itself.
    pub fn find_first(&self, query: &Query<'_>) -> Option<Node<'a>> {
        self.walk().skip(1).find(|node| query.matches(node))
    }

    fn walk(&self) -> impl Iterator<Item = Node<'a>> {
        self.0.descendants().filter_map(ElementRef::wrap).map(Node)
    }
}

/// Element filter by tag, class and exact attribute values.
#[derive(Debug, Default, Clone)]
pub struct Query<'q> {
    tag: Option<&'q str>,
    class: Option<&'q str>,
    attrs: Vec<(&'q str, &'q str)>,
}

impl<'q> Query<'q> {
    pub fn tag(tag: &'q str) -> Self {
        Self {
            tag: Some(tag),
            ..Self::default()
        }
    }

    pub fn class(class: &'q str) -> Self {
        Self {
            class: Some(class),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class: &'q str) -> Self {
        self.class = Some(class);
        self
    }

    pub fn with_attr(mut self, name: &'q str, value: &'q str) -> Self {
        self.attrs.push((name, value));
        self
    }

    pub fn matches(&self, node: &Node<'_>) -> bool {
        if let Some(tag) = self.tag {
            if !node.tag().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(class) = self.class {
            if !node.has_class(class) {
                return false;
            }
        }
        self.attrs
            .iter()
            .all(|(name, value)| node.attr(name) == Some(*value))
    }
}
