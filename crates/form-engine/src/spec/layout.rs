use std::slice;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Layout tree node. The engine only reads it to find referenced fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayoutNode {
    Field {
        field: String,
    },
    Section {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default)]
        children: Vec<LayoutNode>,
    },
    Group {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default)]
        children: Vec<LayoutNode>,
    },
    Row {
        #[serde(default)]
        children: Vec<LayoutNode>,
    },
    Column {
        #[serde(default)]
        children: Vec<LayoutNode>,
    },
}

impl LayoutNode {
    pub fn field(id: impl Into<String>) -> Self {
        LayoutNode::Field { field: id.into() }
    }

    pub fn children(&self) -> &[LayoutNode] {
        match self {
            LayoutNode::Field { .. } => &[],
            LayoutNode::Section { children, .. }
            | LayoutNode::Group { children, .. }
            | LayoutNode::Row { children }
            | LayoutNode::Column { children } => children,
        }
    }
}

/// Depth-first, parent-before-children walk over a layout forest yielding
/// the identifier of every field node.
///
/// Nothing is visited until the iterator is advanced; call
/// [`field_ids`] again (or clone the iterator) to restart.
#[derive(Debug, Clone)]
pub struct FieldIds<'a> {
    stack: Vec<slice::Iter<'a, LayoutNode>>,
}

impl<'a> Iterator for FieldIds<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            let Some(node) = top.next() else {
                self.stack.pop();
                continue;
            };
            match node {
                LayoutNode::Field { field } => return Some(field.as_str()),
                container => self.stack.push(container.children().iter()),
            }
        }
    }
}

pub fn field_ids(layout: &[LayoutNode]) -> FieldIds<'_> {
    FieldIds {
        stack: vec![layout.iter()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_is_depth_first_in_document_order() {
        let layout = vec![
            LayoutNode::Section {
                title: Some("Account".into()),
                children: vec![
                    LayoutNode::Row {
                        children: vec![LayoutNode::field("first"), LayoutNode::field("last")],
                    },
                    LayoutNode::field("email"),
                ],
            },
            LayoutNode::field("notes"),
        ];
        let ids: Vec<_> = field_ids(&layout).collect();
        assert_eq!(ids, ["first", "last", "email", "notes"]);
    }

    #[test]
    fn walk_restarts_from_a_fresh_call() {
        let layout = vec![LayoutNode::Column {
            children: vec![LayoutNode::field("a"), LayoutNode::field("b")],
        }];
        let mut walk = field_ids(&layout);
        assert_eq!(walk.next(), Some("a"));
        let replay = walk.clone();
        assert_eq!(walk.collect::<Vec<_>>(), ["b"]);
        assert_eq!(replay.collect::<Vec<_>>(), ["b"]);
        assert_eq!(field_ids(&layout).count(), 2);
    }
}
