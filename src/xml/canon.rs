//! Exclusive XML Canonicalization (`http://www.w3.org/2001/10/xml-exc-c14n#`),
//! with and without comments, plus the enveloped-signature transform.
//!
//! This is the load-bearing part of C3: the digest and signature in a
//! `ds:Signature` protect specific *canonicalized octets*, not this crate's
//! in-memory tree. Two elements that are structurally identical after
//! parsing must canonicalize to the same bytes regardless of attribute
//! order or namespace-prefix choice on the wire, and two elements that
//! differ by even one byte of "uninteresting" whitespace in the original
//! markup must still canonicalize identically — that's the entire point of
//! C14N existing.
//!
//! Limitations, documented rather than hidden: comments are dropped (the
//! "with comments" variant is accepted as an allowed transform per §4.2 but
//! rendered identically to plain exc-c14n, since this tree doesn't retain
//! comment nodes at all); processing instructions are not modeled. Neither
//! appears in SAML protocol/assertion content in practice.

use std::collections::BTreeMap;

use crate::xml::tree::{Attribute, Element, Node};

pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Remove the first direct child `ds:Signature` element, implementing the
/// enveloped-signature transform (§4.2 item 5: `enveloped-signature`).
pub fn strip_enveloped_signature(element: &Element) -> Element {
    let mut clone = element.clone();
    if let Some(pos) = clone.children.iter().position(|n| {
        matches!(n, Node::Element(e) if e.is(crate::namespace::NS_DS, "Signature"))
    }) {
        clone.children.remove(pos);
    }
    clone
}

/// Canonicalize `element` per Exclusive XML Canonicalization, rendering it
/// as the root of the canonicalized octet stream (i.e. as if it were the
/// document element — no ancestor namespace context is inherited from
/// outside `element` itself, which matches how the reference/digest
/// computation treats the signed element as the canonicalization root).
pub fn canonicalize(element: &Element) -> Vec<u8> {
    let mut out = Vec::new();
    let mut rendered_ns: BTreeMap<Option<String>, String> = BTreeMap::new();
    render_element(element, &mut rendered_ns, &mut out);
    out
}

fn render_element(
    element: &Element,
    rendered_ns: &mut BTreeMap<Option<String>, String>,
    out: &mut Vec<u8>,
) {
    out.push(b'<');
    out.extend_from_slice(qualified_name(element.prefix.as_deref(), &element.local_name).as_bytes());

    // Namespaces "visibly utilized" by this element: its own prefix and any
    // prefixed attribute's prefix, per the exclusive-c14n inclusive-
    // namespace-set-less algorithm (we never configure an
    // InclusiveNamespaces PrefixList, matching the allow-list in §4.2 which
    // only permits bare exc-c14n / exc-c14n-with-comments).
    let mut to_render: Vec<(Option<String>, String)> = Vec::new();
    let element_ns_value = element_namespace_value(element);
    if should_render(rendered_ns, &element.prefix, &element_ns_value) {
        to_render.push((element.prefix.clone(), element_ns_value.clone()));
    }
    for attr in &element.attributes {
        if attr.prefix.is_some() {
            if let Some(uri) = &attr.namespace {
                if should_render(rendered_ns, &attr.prefix, uri) {
                    to_render.push((attr.prefix.clone(), uri.clone()));
                }
            }
        }
    }

    // Namespace nodes sort: default namespace (no prefix) first, then by
    // prefix name lexicographically.
    to_render.sort_by(|a, b| match (&a.0, &b.0) {
        (None, None) => std::cmp::Ordering::Equal,
        (None, Some(_)) => std::cmp::Ordering::Less,
        (Some(_), None) => std::cmp::Ordering::Greater,
        (Some(x), Some(y)) => x.cmp(y),
    });
    to_render.dedup();

    for (prefix, uri) in &to_render {
        out.push(b' ');
        match prefix {
            None => out.extend_from_slice(b"xmlns"),
            Some(p) => {
                out.extend_from_slice(b"xmlns:");
                out.extend_from_slice(p.as_bytes());
            }
        }
        out.extend_from_slice(b"=\"");
        out.extend_from_slice(escape_attr(uri).as_bytes());
        out.push(b'"');
        rendered_ns.insert(prefix.clone(), uri.clone());
    }

    // Attributes: sorted by (namespace-uri-or-empty, local-name), xml:
    // namespace sorts like any other prefixed namespace. Un-prefixed
    // attributes have no namespace and sort by local name alone, ahead of
    // any prefixed attribute (empty string sorts first).
    let mut attrs: Vec<&Attribute> = element.attributes.iter().collect();
    attrs.sort_by(|a, b| {
        let a_ns = a.namespace.clone().unwrap_or_default();
        let b_ns = b.namespace.clone().unwrap_or_default();
        (a_ns, &a.local_name).cmp(&(b_ns, &b.local_name))
    });
    for attr in attrs {
        out.push(b' ');
        out.extend_from_slice(qualified_name(attr.prefix.as_deref(), &attr.local_name).as_bytes());
        out.extend_from_slice(b"=\"");
        out.extend_from_slice(escape_attr(&attr.value).as_bytes());
        out.push(b'"');
    }

    out.push(b'>');

    for child in &element.children {
        match child {
            Node::Text(t) => out.extend_from_slice(escape_text(t).as_bytes()),
            Node::Element(e) => {
                let mut child_scope = rendered_ns.clone();
                render_element(e, &mut child_scope, out);
            }
        }
    }

    out.extend_from_slice(b"</");
    out.extend_from_slice(qualified_name(element.prefix.as_deref(), &element.local_name).as_bytes());
    out.push(b'>');
}

fn element_namespace_value(element: &Element) -> String {
    element.namespace.clone().unwrap_or_default()
}

fn should_render(
    rendered_ns: &BTreeMap<Option<String>, String>,
    prefix: &Option<String>,
    uri: &str,
) -> bool {
    match rendered_ns.get(prefix) {
        Some(existing) => existing != uri,
        None => !(prefix.is_none() && uri.is_empty()),
    }
}

fn qualified_name(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(p) if !p.is_empty() => format!("{p}:{local}"),
        _ => local.to_string(),
    }
}

fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
    out
}
