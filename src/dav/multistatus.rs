//! `DAV:multistatus` parsing.
//!
//! The document is first read into a small namespace-resolved element tree,
//! then each `response` is reduced to its href and the properties of its 2xx
//! propstats. Property values become JSON: leaf text is a string, an empty
//! element is `null`, and nested elements become an object keyed by local name
//! (repeated children collapse into an array).

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use serde_json::Value;

use crate::error::AppError;

pub const DAV_NS: &str = "DAV:";
pub const OC_NS: &str = "http://owncloud.org/ns";
pub const NC_NS: &str = "http://nextcloud.org/ns";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropName {
    pub namespace: String,
    pub local: String,
}

impl PropName {
    pub fn new(namespace: &str, local: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            local: local.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DavProp {
    pub name: PropName,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DavEntry {
    pub href: String,
    pub props: Vec<DavProp>,
}

impl DavEntry {
    pub fn prop(&self, namespace: &str, local: &str) -> Option<&Value> {
        self.props
            .iter()
            .find(|p| p.name.namespace == namespace && p.name.local == local)
            .map(|p| &p.value)
    }
}

#[derive(Debug)]
struct Node {
    namespace: String,
    local: String,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn new(namespace: String, local: String) -> Self {
        Self {
            namespace,
            local,
            text: String::new(),
            children: Vec::new(),
        }
    }

    fn is(&self, namespace: &str, local: &str) -> bool {
        self.namespace == namespace && self.local == local
    }

    fn child(&self, namespace: &str, local: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.is(namespace, local))
    }
}

pub fn parse_multistatus(xml: &str) -> Result<Vec<DavEntry>, AppError> {
    if xml.trim().is_empty() {
        return Err(AppError::Parse("empty multistatus body".to_string()));
    }
    let root = parse_tree(xml)?;
    if !root.is(DAV_NS, "multistatus") {
        return Err(AppError::Parse(format!(
            "expected DAV:multistatus root, found {{{}}}{}",
            root.namespace, root.local
        )));
    }
    root.children
        .iter()
        .filter(|c| c.is(DAV_NS, "response"))
        .map(entry_from_node)
        .collect()
}

fn entry_from_node(node: &Node) -> Result<DavEntry, AppError> {
    let href = node
        .child(DAV_NS, "href")
        .map(|h| h.text.trim().to_string())
        .filter(|h| !h.is_empty())
        .ok_or_else(|| AppError::Parse("response without href".to_string()))?;

    let mut props = Vec::new();
    for propstat in node.children.iter().filter(|c| c.is(DAV_NS, "propstat")) {
        if let Some(status) = propstat.child(DAV_NS, "status") {
            let code = status_code(&status.text).ok_or_else(|| {
                AppError::Parse(format!("unreadable propstat status: {}", status.text.trim()))
            })?;
            if !(200..300).contains(&code) {
                continue;
            }
        }
        if let Some(prop) = propstat.child(DAV_NS, "prop") {
            props.extend(prop.children.iter().map(|p| DavProp {
                name: PropName {
                    namespace: p.namespace.clone(),
                    local: p.local.clone(),
                },
                value: node_value(p),
            }));
        }
    }

    Ok(DavEntry { href, props })
}

/// `HTTP/1.1 200 OK` -> 200
fn status_code(line: &str) -> Option<u16> {
    line.split_whitespace().nth(1)?.parse().ok()
}

fn node_value(node: &Node) -> Value {
    if node.children.is_empty() {
        let text = node.text.trim();
        return if text.is_empty() {
            Value::Null
        } else {
            Value::String(text.to_string())
        };
    }

    let mut grouped: Vec<(String, Vec<Value>)> = Vec::new();
    for child in &node.children {
        let value = node_value(child);
        match grouped.iter_mut().find(|(name, _)| *name == child.local) {
            Some((_, values)) => values.push(value),
            None => grouped.push((child.local.clone(), vec![value])),
        }
    }

    let map = grouped
        .into_iter()
        .map(|(name, mut values)| {
            let value = if values.len() == 1 {
                values.remove(0)
            } else {
                Value::Array(values)
            };
            (name, value)
        })
        .collect();
    Value::Object(map)
}

fn parse_err(err: impl std::fmt::Display) -> AppError {
    AppError::Parse(err.to_string())
}

fn resolve(result: ResolveResult<'_>) -> Result<String, AppError> {
    match result {
        ResolveResult::Bound(ns) => Ok(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        ResolveResult::Unbound => Ok(String::new()),
        ResolveResult::Unknown(prefix) => Err(AppError::Parse(format!(
            "unknown namespace prefix {}",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) -> Result<(), AppError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_some() => {
            return Err(AppError::Parse(
                "document has more than one root element".to_string(),
            ))
        }
        None => *root = Some(node),
    }
    Ok(())
}

fn parse_tree(xml: &str) -> Result<Node, AppError> {
    let mut reader = NsReader::from_str(xml);
    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        let (ns, event) = reader.read_resolved_event().map_err(parse_err)?;
        match event {
            Event::Start(start) => {
                let node = Node::new(resolve(ns)?, local_name(&start));
                stack.push(node);
            }
            Event::Empty(start) => {
                let node = Node::new(resolve(ns)?, local_name(&start));
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| AppError::Parse("unbalanced end tag".to_string()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text.unescape().map_err(parse_err)?);
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(AppError::Parse("unexpected end of document".to_string()));
    }
    root.ok_or_else(|| AppError::Parse("document has no root element".to_string()))
}
