//! Deduplicated, attribute-annotated page tree.
//!
//! Nodes live in an arena owned by [`NormalizedTree`]; children are arena
//! indices. Node `0` is the synthetic root, which never shows up in any
//! list-of-nodes view and never renders any markup of its own.

use lookalike_common::{LookalikeError, Result};

pub type NodeId = usize;

/// Arena index of the synthetic root.
pub const ROOT: NodeId = 0;

/// Tag name of the synthetic root; cannot collide with a parsed tag.
pub const ROOT_TAG: &str = "#root";

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub tag_name: String,
    /// Retained attributes in document order.
    pub attributes: Vec<(String, String)>,
    pub css_mark: bool,
    /// Dense per-build index; `None` for the root.
    pub sequence_index: Option<usize>,
    pub depth: usize,
    /// Longest path to a descendant leaf (leaf = 1). Zero until
    /// [`NormalizedTree::preorder_list`] has run.
    pub height: usize,
    pub children: Vec<NodeId>,
}

/// Per-node encoding slot used by [`NormalizedTree::aggregate_embedding`]:
/// the vector and whether it stands for the node's whole subtree.
pub type EncodedNode = Option<(Vec<f32>, bool)>;

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTree {
    nodes: Vec<TreeNode>,
}

impl Default for NormalizedTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NormalizedTree {
    /// A tree holding only the synthetic root.
    pub fn new() -> Self {
        Self {
            nodes: vec![TreeNode {
                tag_name: ROOT_TAG.to_string(),
                attributes: Vec::new(),
                css_mark: false,
                sequence_index: None,
                depth: 0,
                height: 0,
                children: Vec::new(),
            }],
        }
    }

    pub(crate) fn push_child(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attributes: Vec<(String, String)>,
        css_mark: bool,
        sequence_index: usize,
    ) -> NodeId {
        let id = self.nodes.len();
        let depth = self.nodes[parent].depth + 1;
        self.nodes.push(TreeNode {
            tag_name,
            attributes,
            css_mark,
            sequence_index: Some(sequence_index),
            depth,
            height: 0,
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id]
    }

    /// Number of nodes excluding the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }

    /// Every non-root node in preorder. Also stores each node's `height`.
    pub fn preorder_list(&mut self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id].children.iter().rev());
        }
        // Children follow their parent in preorder, so the reverse visits them first.
        for &id in order.iter().rev() {
            let height = self.nodes[id]
                .children
                .iter()
                .map(|&c| self.nodes[c].height)
                .max()
                .unwrap_or(0)
                + 1;
            self.nodes[id].height = height;
        }
        order.retain(|&id| id != ROOT);
        order
    }

    /// `<tag a=v b=w>` with `excluded` attributes left out; empty for the root.
    pub fn open_tag_text(&self, id: NodeId, excluded: &[String]) -> String {
        if id == ROOT {
            return String::new();
        }
        let node = &self.nodes[id];
        let mut text = format!("<{}", node.tag_name);
        for (name, value) in &node.attributes {
            if excluded.iter().any(|e| e == name) {
                continue;
            }
            text.push(' ');
            text.push_str(name);
            text.push('=');
            text.push_str(value);
        }
        text.push('>');
        text
    }

    /// Serialize the subtree at `id` as newline-joined markup.
    ///
    /// A node exactly at `max_depth` renders as an empty element carrying all
    /// of its attributes, `excluded` ones included; deeper nodes render
    /// nothing. The root contributes only its children.
    pub fn render_markup(&self, id: NodeId, excluded: &[String], max_depth: usize) -> String {
        let node = &self.nodes[id];
        if node.depth > max_depth {
            return String::new();
        }
        if id != ROOT && node.depth == max_depth {
            return format!("{}</{}>", self.open_tag_text(id, &[]), node.tag_name);
        }
        let open = self.open_tag_text(id, excluded);

        let mut parts = Vec::with_capacity(node.children.len() + 2);
        if id != ROOT {
            parts.push(open);
        }
        for &child in &node.children {
            let code = self.render_markup(child, excluded, max_depth);
            if !code.is_empty() {
                parts.push(code);
            }
        }
        if id != ROOT {
            parts.push(format!("</{}>", node.tag_name));
        }
        parts.join("\n")
    }

    fn encoded<'a>(&self, id: NodeId, lookup: &'a [EncodedNode]) -> Option<&'a (Vec<f32>, bool)> {
        self.nodes[id]
            .sequence_index
            .and_then(|i| lookup.get(i))
            .and_then(Option::as_ref)
    }

    /// Combine per-node encodings bottom-up into one vector for the whole tree.
    ///
    /// `lookup` is indexed by `sequence_index`. A child encoded as a whole
    /// subtree contributes its vector directly; any other child contributes
    /// its own aggregate. Children are averaged, and a node with its own
    /// vector averages that with the children mean.
    pub fn aggregate_embedding(&self, lookup: &[EncodedNode]) -> Result<Vec<f32>> {
        self.aggregate_node(ROOT, lookup)
    }

    fn aggregate_node(&self, id: NodeId, lookup: &[EncodedNode]) -> Result<Vec<f32>> {
        let node = &self.nodes[id];
        let base = self.encoded(id, lookup).map(|(v, _)| v);

        let mut children = Vec::with_capacity(node.children.len());
        for &child in &node.children {
            match self.encoded(child, lookup) {
                Some((vector, true)) => children.push(vector.clone()),
                _ => children.push(self.aggregate_node(child, lookup)?),
            }
        }

        let Some(children_mean) = mean(&children)? else {
            return base.cloned().ok_or_else(|| {
                LookalikeError::Invariant(format!(
                    "node {id} <{}> has neither an encoding nor children",
                    node.tag_name
                ))
            });
        };
        match base {
            Some(base) => Ok(mean(&[base.clone(), children_mean])?.unwrap_or_default()),
            None => Ok(children_mean),
        }
    }
}

/// Elementwise arithmetic mean; `None` for no vectors.
fn mean(vectors: &[Vec<f32>]) -> Result<Option<Vec<f32>>> {
    let Some(first) = vectors.first() else {
        return Ok(None);
    };
    let dim = first.len();
    let mut acc = vec![0.0f32; dim];
    for v in vectors {
        if v.len() != dim {
            return Err(LookalikeError::Invariant(format!(
                "embedding dimensions differ: {} vs {}",
                dim,
                v.len()
            )));
        }
        for (a, x) in acc.iter_mut().zip(v) {
            *a += x;
        }
    }
    let n = vectors.len() as f32;
    acc.iter_mut().for_each(|a| *a /= n);
    Ok(Some(acc))
}
