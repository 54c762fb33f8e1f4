//! Declaration tree handed over by schema providers.
//!
//! A provider (markup parser, hand-built test fixture, ...) produces nested
//! [`ElementDecl`]s whose attributes are still raw strings.
//! [`SchemaTree::from_declaration`](super::SchemaTree::from_declaration)
//! interprets them.

/// One declared element with its raw attribute strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementDecl {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<ElementDecl>,
}

impl ElementDecl {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// `pcml` root element.
    pub fn document() -> Self {
        Self::new("pcml")
    }

    pub fn program(name: &str, path: &str) -> Self {
        Self::new("program").attr("name", name).attr("path", path)
    }

    pub fn structure(name: &str) -> Self {
        let decl = Self::new("struct");
        if name.is_empty() {
            decl
        } else {
            decl.attr("name", name)
        }
    }

    pub fn data(name: &str, data_type: &str) -> Self {
        Self::new("data").attr("name", name).attr("type", data_type)
    }

    /// Builder-style attribute setter.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Builder-style child appender.
    pub fn child(mut self, child: ElementDecl) -> Self {
        self.children.push(child);
        self
    }

    /// Last value declared for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}
