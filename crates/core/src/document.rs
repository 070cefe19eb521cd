// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rich text documents as stored by the remote tracker.
//!
//! A document is a tree of typed nodes. Only `text` leaves carry text; every
//! other node either has children or contributes nothing when flattened.
//! Unknown attributes (`attrs`, `marks`, `version`) are kept verbatim so a
//! document round-trips through the replica unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One node of a rich text document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocNode {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<DocNode>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DocNode {
    /// Creates a node with children.
    pub fn branch(node_type: impl Into<String>, content: Vec<DocNode>) -> Self {
        DocNode { node_type: node_type.into(), text: None, content: Some(content), extra: Map::new() }
    }

    /// Creates a text leaf.
    pub fn text(text: impl Into<String>) -> Self {
        DocNode { node_type: "text".into(), text: Some(text.into()), content: None, extra: Map::new() }
    }

    /// Wraps plain text into a single-paragraph document.
    pub fn from_text(text: &str) -> Self {
        let mut doc = DocNode::branch("doc", vec![DocNode::branch("paragraph", vec![DocNode::text(text)])]);
        doc.extra.insert("version".into(), Value::from(1));
        doc
    }

    /// Flattens the tree to plain text.
    ///
    /// A text node yields its text, a node with children yields the
    /// space-joined non-empty flattenings of its children, any other leaf
    /// yields nothing.
    pub fn plain_text(&self) -> String {
        if self.node_type == "text" {
            return self.text.clone().unwrap_or_default();
        }
        match &self.content {
            Some(children) => children
                .iter()
                .map(DocNode::plain_text)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
            None => String::new(),
        }
    }

    /// Returns true for a document root: type `doc` with a child list.
    pub fn is_document(&self) -> bool {
        self.node_type == "doc" && self.content.is_some()
    }
}

/// Text that is either plain or a rich document.
///
/// Descriptions and comment bodies arrive in either form; search and
/// display only need the flattened text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RichText {
    Plain(String),
    Document(DocNode),
}

impl RichText {
    /// Returns the plain text of the value, flattening documents.
    pub fn plain_text(&self) -> String {
        match self {
            RichText::Plain(text) => text.clone(),
            RichText::Document(doc) => doc.plain_text(),
        }
    }

    /// Converts to the document form, wrapping plain text.
    pub fn into_document(self) -> DocNode {
        match self {
            RichText::Plain(text) => DocNode::from_text(&text),
            RichText::Document(doc) => doc,
        }
    }
}

impl From<&str> for RichText {
    fn from(text: &str) -> Self {
        RichText::Plain(text.to_string())
    }
}

impl From<String> for RichText {
    fn from(text: String) -> Self {
        RichText::Plain(text)
    }
}

/// Returns true if a raw JSON value has the shape of a document root.
pub fn is_document(value: &Value) -> bool {
    value.get("type").and_then(Value::as_str) == Some("doc")
        && value.get("content").map(Value::is_array).unwrap_or(false)
}

/// Flattens a raw JSON value that may or may not be a document.
///
/// Non-objects and malformed nodes flatten to the empty string.
pub fn plain_text_of(value: &Value) -> String {
    match serde_json::from_value::<DocNode>(value.clone()) {
        Ok(node) => node.plain_text(),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
