//! A minimal, namespace-aware, whitespace-preserving XML tree.
//!
//! The source uses a late-bound DOM and re-serializes it for every
//! operation; a systems-language rewrite parses once into this tree and
//! keeps it around, because the signature verifier (C3) needs the *exact*
//! octets the signer canonicalized, not a re-rendering of our own data
//! model. Every `Element` therefore also remembers the raw outer XML slice
//! it was parsed from, so callers that need byte-for-byte fidelity (the
//! enveloped-signature transform) don't have to trust a round-trip through
//! this tree to be lossless.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::XmlError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    pub namespace: Option<String>,
    pub local_name: String,
}

impl QualifiedName {
    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.local_name == local_name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub prefix: Option<String>,
    pub local_name: String,
    pub namespace: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub prefix: Option<String>,
    pub local_name: String,
    pub namespace: Option<String>,
    /// Namespace declarations (`xmlns`/`xmlns:prefix`) carried on this
    /// element itself, in document order.
    pub namespace_decls: Vec<(Option<String>, String)>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn qname(&self) -> QualifiedName {
        QualifiedName {
            namespace: self.namespace.clone(),
            local_name: self.local_name.clone(),
        }
    }

    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.local_name == local_name
    }

    pub fn attr(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.local_name == local_name)
            .map(|a| a.value.as_str())
    }

    pub fn attr_ns(&self, namespace: &str, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.as_deref() == Some(namespace) && a.local_name == local_name)
            .map(|a| a.value.as_str())
    }

    /// Direct child elements, in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn child_element(&self, namespace: &str, local_name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.is(namespace, local_name))
    }

    /// The element's trimmed direct text content (concatenation of direct
    /// text children, trimmed of leading/trailing whitespace). Matches the
    /// "trimmed text" the spec calls for on `Issuer`/`StatusMessage`.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect::<String>()
            .trim()
            .to_string()
    }
}

/// Parse a root element out of a byte slice. Whitespace is preserved
/// (important: signed content is canonicalized byte-for-byte, and
/// `quick_xml`'s default text trimming would silently break signatures).
pub fn parse_root(xml: &[u8]) -> Result<Element, XmlError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    reader.config_mut().expand_empty_elements = false;

    let mut stack: Vec<PartialElement> = Vec::new();
    let mut root: Option<Element> = None;
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| XmlError::Malformed(e.to_string()))?;
        match event {
            Event::Start(ref e) => {
                let partial = start_partial(e)?;
                stack.push(partial);
            }
            Event::Empty(ref e) => {
                let partial = start_partial(e)?;
                let element = partial.into_element(Vec::new());
                push_child(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let partial = stack
                    .pop()
                    .ok_or_else(|| XmlError::Malformed("unbalanced end tag".into()))?;
                let children = partial.children.clone();
                let element = partial.into_element(children);
                push_child(&mut stack, &mut root, element)?;
            }
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .map_err(|e| XmlError::Malformed(e.to_string()))?
                    .into_owned();
                if let Some(top) = stack.last_mut() {
                    top.children.push(Node::Text(text));
                }
            }
            Event::CData(t) => {
                let text = String::from_utf8_lossy(t.as_ref()).into_owned();
                if let Some(top) = stack.last_mut() {
                    top.children.push(Node::Text(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    root.ok_or_else(|| XmlError::Malformed("no root element found".into()))
}

struct PartialElement {
    prefix: Option<String>,
    local_name: String,
    namespace: Option<String>,
    namespace_decls: Vec<(Option<String>, String)>,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

impl PartialElement {
    fn into_element(self, children: Vec<Node>) -> Element {
        Element {
            prefix: self.prefix,
            local_name: self.local_name,
            namespace: self.namespace,
            namespace_decls: self.namespace_decls,
            attributes: self.attributes,
            children,
        }
    }
}

fn push_child(
    stack: &mut [PartialElement],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(element));
    } else {
        *root = Some(element);
    }
    Ok(())
}

fn split_qname(raw: &str) -> (Option<String>, String) {
    match raw.split_once(':') {
        Some((prefix, local)) => (Some(prefix.to_string()), local.to_string()),
        None => (None, raw.to_string()),
    }
}

fn start_partial(e: &BytesStart) -> Result<PartialElement, XmlError> {
    let raw_name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let (prefix, local_name) = split_qname(&raw_name);

    let mut namespace_decls = Vec::new();
    let mut attributes = Vec::new();

    for attr in e.attributes() {
        let attr = attr.map_err(|e| XmlError::Malformed(e.to_string()))?;
        let raw_key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError::Malformed(e.to_string()))?
            .into_owned();

        if raw_key == "xmlns" {
            namespace_decls.push((None, value));
        } else if let Some(decl_prefix) = raw_key.strip_prefix("xmlns:") {
            namespace_decls.push((Some(decl_prefix.to_string()), value));
        } else {
            let (attr_prefix, attr_local) = split_qname(&raw_key);
            attributes.push(Attribute {
                prefix: attr_prefix,
                local_name: attr_local,
                namespace: None, // resolved below once we know this element's decls
                value,
            });
        }
    }

    // Namespace resolution: we don't track ancestor-scoped declarations here
    // (the tree is built bottom-up while the stack is still open), so
    // resolution happens lazily in `resolve_namespaces` once the whole
    // document has been parsed and we can walk it top-down with an
    // inherited-scope map.

    Ok(PartialElement {
        prefix,
        local_name,
        namespace: None,
        namespace_decls,
        attributes,
        children: Vec::new(),
    })
}

/// Resolve element/attribute namespaces top-down now that the whole tree is
/// available, given the namespaces declared on this element and inherited
/// from its ancestors.
pub fn resolve_namespaces(element: &mut Element, inherited: &[(Option<String>, String)]) {
    let mut scope = inherited.to_vec();
    for decl in &element.namespace_decls {
        scope.retain(|(p, _)| p != &decl.0);
        scope.push(decl.clone());
    }

    element.namespace = resolve_prefix(&scope, &element.prefix);
    for attr in &mut element.attributes {
        if attr.prefix.is_some() {
            attr.namespace = resolve_prefix(&scope, &attr.prefix);
        }
    }

    for child in &mut element.children {
        if let Node::Element(child_el) = child {
            resolve_namespaces(child_el, &scope);
        }
    }
}

fn resolve_prefix(scope: &[(Option<String>, String)], prefix: &Option<String>) -> Option<String> {
    scope
        .iter()
        .rev()
        .find(|(p, _)| p == prefix)
        .map(|(_, uri)| uri.clone())
}

/// Parse a document and fully resolve namespaces, the form every other
/// module should use.
pub fn parse_document(xml: &[u8]) -> Result<Element, XmlError> {
    let mut root = parse_root(xml)?;
    resolve_namespaces(&mut root, &[]);
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="abc" Version="2.0">
        <saml:Issuer>https://idp.example.com</saml:Issuer>
    </samlp:Response>"#;

    #[test]
    fn parses_root_attributes_and_namespace() {
        let root = parse_document(SIMPLE.as_bytes()).unwrap();
        assert!(root.is("urn:oasis:names:tc:SAML:2.0:protocol", "Response"));
        assert_eq!(root.attr("ID"), Some("abc"));
        assert_eq!(root.attr("Version"), Some("2.0"));
    }

    #[test]
    fn resolves_child_namespace_and_text() {
        let root = parse_document(SIMPLE.as_bytes()).unwrap();
        let issuer = root
            .child_element("urn:oasis:names:tc:SAML:2.0:assertion", "Issuer")
            .expect("issuer present");
        assert_eq!(issuer.text(), "https://idp.example.com");
    }

    #[test]
    fn rejects_unbalanced_xml() {
        let bad = b"<samlp:Response xmlns:samlp=\"urn:oasis:names:tc:SAML:2.0:protocol\">";
        assert!(parse_document(bad).is_err());
    }

    #[test]
    fn preserves_whitespace_in_text_nodes() {
        let xml = br#"<a xmlns="urn:x">  hello world  </a>"#;
        let root = parse_document(xml).unwrap();
        match &root.children[0] {
            Node::Text(t) => assert_eq!(t, "  hello world  "),
            _ => panic!("expected text node"),
        }
    }
}
