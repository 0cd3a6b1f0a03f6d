//! Minimal XML read/write helpers shared by the solver-facing file formats.
//!
//! Writing is hand-rolled string building (this crate pulls in no XML writer
//! — `roxmltree` is read-only by design), mirroring the indentation-by-depth
//! style of the reference implementation's pretty-printed documents closely
//! enough for the solver to parse it back, without attempting to be a
//! general-purpose serializer.

use std::fmt::Write as _;

/// A tiny recursive XML element builder.
#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Element>,
    text: Option<String>,
}

impl Element {
    /// Start a new element with the given tag name.
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Attach an attribute.
    pub fn attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attrs.push((key.into(), value.to_string()));
        self
    }

    /// Attach a child element.
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Attach several child elements.
    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    /// Set the element's text content (mutually exclusive with children in
    /// well-formed documents, though this builder does not enforce it).
    pub fn text(mut self, text: impl ToString) -> Self {
        self.text = Some(text.to_string());
        self
    }

    /// Render the element (and its descendants) as an indented XML string.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write(&mut out, 0);
        out
    }

    fn write(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let _ = write!(out, "{indent}<{}", self.name);
        for (k, v) in &self.attrs {
            let _ = write!(out, " {k}=\"{}\"", escape(v));
        }
        if self.children.is_empty() && self.text.is_none() {
            out.push_str("/>\n");
            return;
        }
        out.push('>');
        if let Some(text) = &self.text {
            out.push_str(&escape(text));
        } else {
            out.push('\n');
            for child in &self.children {
                child.write(out, depth + 1);
            }
            out.push_str(&indent);
        }
        let _ = write!(out, "</{}>\n", self.name);
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Parse a document and return its root node, wrapped so callers can use the
/// small helper accessors below without repeating `roxmltree` boilerplate.
pub fn parse(xml: &str) -> Result<roxmltree::Document<'_>, roxmltree::Error> {
    roxmltree::Document::parse(xml)
}

/// Find the first child element with the given tag name.
pub fn child<'a, 'i>(
    node: roxmltree::Node<'a, 'i>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'i>> {
    node.children().find(|n| n.is_element() && n.has_tag_name(name))
}

/// All direct children with the given tag name.
pub fn children<'a, 'i>(
    node: roxmltree::Node<'a, 'i>,
    name: &'a str,
) -> impl Iterator<Item = roxmltree::Node<'a, 'i>> {
    node.children()
        .filter(move |n| n.is_element() && n.has_tag_name(name))
}

/// Parse an attribute as `i64`, defaulting to an error message naming the
/// attribute if it is missing or malformed.
pub fn attr_i64(node: roxmltree::Node, name: &str) -> Result<i64, String> {
    node.attribute(name)
        .ok_or_else(|| format!("missing attribute `{name}`"))?
        .parse()
        .map_err(|_| format!("attribute `{name}` is not an integer"))
}

/// Parse an element's text content as `i64`.
pub fn text_i64(node: roxmltree::Node) -> Result<i64, String> {
    node.text()
        .ok_or_else(|| "missing text content".to_string())?
        .trim()
        .parse()
        .map_err(|_| "text content is not an integer".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_elements() {
        let doc = Element::new("Root").child(
            Element::new("Child").attr("id", 3).child(Element::new("Leaf").text(42)),
        );
        let xml = doc.render();
        assert!(xml.contains("<Root>"));
        assert!(xml.contains("id=\"3\""));
        assert!(xml.contains("<Leaf>42</Leaf>"));
    }

    #[test]
    fn round_trips_text_value() {
        let xml = Element::new("Timing")
            .child(Element::new("ExecutionTime").text(1234))
            .render();
        let doc = parse(&xml).unwrap();
        let timing = doc.root_element();
        let exec = child(timing, "ExecutionTime").unwrap();
        assert_eq!(text_i64(exec).unwrap(), 1234);
    }
}
