//! Owned, read-only copy of a tree-sitter parse tree.
//!
//! A [`SyntaxTree`] owns its source text and a flat arena of nodes. Walking is
//! done through [`Node`], a `Copy` view that borrows the tree, so any number of
//! independent walks can run over the same tree (it is `Send + Sync`).

use std::fmt;

/// Node kind used for token runs the grammar could not make sense of, and for
/// tokens it had to invent to close a construct.
pub const ERROR_KIND: &str = "ERROR";

pub type NodeId = usize;

#[derive(Debug, Clone)]
struct NodeData {
    kind: &'static str,
    named: bool,
    field: Option<&'static str>,
    start_byte: usize,
    end_byte: usize,
    start_row: usize,
    end_row: usize,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
pub struct SyntaxTree {
    source: String,
    nodes: Vec<NodeData>,
}

impl SyntaxTree {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> Node<'_> {
        Node { tree: self, id: 0 }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn has_error(&self) -> bool {
        self.nodes.iter().any(|n| n.kind == ERROR_KIND)
    }
}

/// Read-only view of one node.
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> Node<'t> {
    fn data(&self) -> &'t NodeData {
        &self.tree.nodes[self.id]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &'static str {
        self.data().kind
    }

    pub fn is_kind(&self, kinds: &[&str]) -> bool {
        kinds.contains(&self.kind())
    }

    /// Named nodes are grammar rules and identifiers; keywords and punctuation are not.
    pub fn is_named(&self) -> bool {
        self.data().named
    }

    /// Field name this node fills in its parent, if the grammar names one.
    pub fn field_name(&self) -> Option<&'static str> {
        self.data().field
    }

    pub fn is_error(&self) -> bool {
        self.kind() == ERROR_KIND
    }

    pub fn has_error(&self) -> bool {
        self.descendants().any(|n| n.is_error())
    }

    pub fn text(&self) -> &'t str {
        let data = self.data();
        &self.tree.source[data.start_byte..data.end_byte]
    }

    pub fn start_byte(&self) -> usize {
        self.data().start_byte
    }

    pub fn end_byte(&self) -> usize {
        self.data().end_byte
    }

    /// Zero-based row of the first byte.
    pub fn start_row(&self) -> usize {
        self.data().start_row
    }

    pub fn end_row(&self) -> usize {
        self.data().end_row
    }

    pub fn parent(&self) -> Option<Node<'t>> {
        self.data().parent.map(|id| Node { tree: self.tree, id })
    }

    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    pub fn children(&self) -> Children<'t> {
        Children {
            tree: self.tree,
            ids: self.data().children.iter(),
        }
    }

    pub fn named_children(&self) -> impl Iterator<Item = Node<'t>> + 't {
        self.children().filter(|c| c.is_named())
    }

    /// Find first child node by kind
    pub fn child_by_kind(&self, kind: &str) -> Option<Node<'t>> {
        self.children().find(|c| c.kind() == kind)
    }

    /// Find first child whose kind is any of `kinds`
    pub fn child_by_kinds(&self, kinds: &[&str]) -> Option<Node<'t>> {
        self.children().find(|c| c.is_kind(kinds))
    }

    pub fn child_by_field(&self, field: &str) -> Option<Node<'t>> {
        self.children().find(|c| c.field_name() == Some(field))
    }

    pub fn children_by_kind<'k>(&self, kind: &'k str) -> impl Iterator<Item = Node<'t>> + 'k
    where
        't: 'k,
    {
        self.children().filter(move |c| c.kind() == kind)
    }

    /// Pre-order walk over this node and everything below it.
    pub fn descendants(&self) -> Descendants<'t> {
        Descendants {
            tree: self.tree,
            stack: vec![self.id],
        }
    }

    /// Recursively find all nodes of a specific kind, including this one
    pub fn find_all(&self, kind: &str) -> Vec<Node<'t>> {
        self.descendants().filter(|n| n.kind() == kind).collect()
    }

    pub fn find_first(&self, kinds: &[&str]) -> Option<Node<'t>> {
        self.descendants().skip(1).find(|n| n.is_kind(kinds))
    }

    /// Source text of this node with every descendant whose kind is in
    /// `excluded` cut out.
    pub fn text_excluding(&self, excluded: &[&str]) -> String {
        let mut out = String::new();
        let mut cursor = self.start_byte();
        for node in self.descendants().skip(1) {
            if !node.is_kind(excluded) || node.start_byte() < cursor {
                continue;
            }
            out.push_str(&self.tree.source[cursor..node.start_byte()]);
            cursor = node.end_byte();
        }
        if cursor < self.end_byte() {
            out.push_str(&self.tree.source[cursor..self.end_byte()]);
        }
        out
    }

    /// Leaf tokens below this node, in source order.
    pub fn leaves(&self) -> impl Iterator<Item = Node<'t>> + 't {
        self.descendants().filter(|n| n.child_count() == 0)
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}..{} (row {})",
            self.kind(),
            self.start_byte(),
            self.end_byte(),
            self.start_row()
        )
    }
}

pub struct Children<'t> {
    tree: &'t SyntaxTree,
    ids: std::slice::Iter<'t, NodeId>,
}

impl<'t> Iterator for Children<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        self.ids.next().map(|&id| Node { tree: self.tree, id })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.ids.next_back().map(|&id| Node { tree: self.tree, id })
    }
}

impl ExactSizeIterator for Children<'_> {}

pub struct Descendants<'t> {
    tree: &'t SyntaxTree,
    stack: Vec<NodeId>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.nodes[id].children.iter().rev().copied());
        Some(Node { tree: self.tree, id })
    }
}

/// Incremental builder fed in pre-order by the tree-sitter adapter.
pub struct TreeBuilder {
    source: String,
    line_starts: Vec<usize>,
    nodes: Vec<NodeData>,
    stack: Vec<NodeId>,
}

impl TreeBuilder {
    pub fn new(source: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source: source.to_string(),
            line_starts,
            nodes: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn row_of(&self, byte: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= byte).saturating_sub(1)
    }

    fn push(
        &mut self,
        kind: &'static str,
        named: bool,
        field: Option<&'static str>,
        start: usize,
        end: usize,
    ) -> NodeId {
        let id = self.nodes.len();
        let parent = self.stack.last().copied();
        self.nodes.push(NodeData {
            kind,
            named,
            field,
            start_byte: start,
            end_byte: end,
            start_row: self.row_of(start),
            end_row: self.row_of(end.saturating_sub(1).max(start)),
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }
        id
    }

    /// Open an interior node; children added until [`finish_node`](Self::finish_node) go below it.
    pub fn start_node(
        &mut self,
        kind: &'static str,
        named: bool,
        field: Option<&'static str>,
        start: usize,
        end: usize,
    ) {
        let id = self.push(kind, named, field, start, end);
        self.stack.push(id);
    }

    pub fn leaf(
        &mut self,
        kind: &'static str,
        named: bool,
        field: Option<&'static str>,
        start: usize,
        end: usize,
    ) {
        self.push(kind, named, field, start, end);
    }

    pub fn finish_node(&mut self) {
        self.stack.pop();
    }

    pub fn finish(mut self) -> SyntaxTree {
        self.stack.clear();
        if self.nodes.is_empty() {
            let end = self.source.len();
            self.push("source_file", true, None, 0, end);
        }
        SyntaxTree {
            source: self.source,
            nodes: self.nodes,
        }
    }
}
