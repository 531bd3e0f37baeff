//! Reduction of a [`GenericDom`] to a [`NormalizedTree`].

use crate::generic::{normalize_attribute_value, GenericDom, GenericElement};
use crate::tree::{NodeId, NormalizedTree, ROOT};
use std::collections::HashSet;

/// Dedup key of an element plus the attributes that qualified for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeKey {
    pub key: String,
    pub attributes: Vec<(String, String)>,
}

/// Compute the sibling dedup key of `element`.
///
/// An attribute qualifies unless it is `css_mark`, its name contains `href`,
/// or its (whitespace-normalized) value is empty, mentions `javascript` or
/// starts with `url(`.
///
/// ```
/// use lookalike_dom::{compute_node_key, GenericElement};
///
/// let el = GenericElement::new("a")
///     .attr("href", "/next")
///     .attr("class", "btn  primary")
///     .attr("onclick", "javascript:void(0)")
///     .attr("id", "go");
/// let key = compute_node_key(&el);
/// assert_eq!(key.key, "a->class=btn primary|id=go");
/// assert_eq!(key.attributes.len(), 2);
///
/// assert_eq!(compute_node_key(&GenericElement::new("br")).key, "br");
/// ```
pub fn compute_node_key(element: &GenericElement) -> NodeKey {
    let mut attributes = Vec::new();
    for (name, value) in &element.attributes {
        if name == "css_mark" || name.contains("href") {
            continue;
        }
        let value = normalize_attribute_value(name, value);
        if value.is_empty() || value.contains("javascript") || value.starts_with("url(") {
            continue;
        }
        attributes.push((name.clone(), value));
    }

    let mut key = element.tag.clone();
    if !attributes.is_empty() {
        key.push_str("->");
        let fragments: Vec<String> = attributes.iter().map(|(k, v)| format!("{k}={v}")).collect();
        key.push_str(&fragments.join("|"));
    }
    NodeKey { key, attributes }
}

/// Builds [`NormalizedTree`]s. Owns the sequence counter, which restarts
/// at zero for every build.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    next_index: usize,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preorder walk of `dom`. Each element is offered to its normalized
    /// parent; a rejected element is skipped together with its subtree.
    pub fn build(&mut self, dom: &GenericDom) -> NormalizedTree {
        self.next_index = 0;
        let mut tree = NormalizedTree::new();
        // Keys of accepted children, indexed like the arena.
        let mut sibling_keys: Vec<HashSet<String>> = vec![HashSet::new()];

        let mut stack: Vec<(&GenericElement, NodeId)> = vec![(&dom.root, ROOT)];
        while let Some((element, parent)) = stack.pop() {
            let NodeKey { key, attributes } = compute_node_key(element);
            if !sibling_keys[parent].insert(key) {
                continue;
            }
            let id = tree.push_child(
                parent,
                element.tag.clone(),
                attributes,
                element.css_mark,
                self.next_index,
            );
            self.next_index += 1;
            sibling_keys.push(HashSet::new());
            debug_assert_eq!(sibling_keys.len(), id + 1);

            for child in element.children.iter().rev() {
                stack.push((child, id));
            }
        }

        tracing::debug!(nodes = tree.node_count(), "dom.tree.built");
        tree
    }
}
