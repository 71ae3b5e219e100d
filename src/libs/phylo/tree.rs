use super::error::TreeError;
use super::node::{Node, NodeId};

/// A rooted tree over named vertices, stored as a flat arena.
///
/// This is the boundary representation used by the Newick codec; the
/// parsimony engine converts it into a directed graph with vertex payloads
/// (see `libs::parsimony`).
#[derive(Debug, Default, Clone)]
pub struct Tree {
    /// Arena storage for all nodes
    nodes: Vec<Node>,

    /// Optional root ID (a tree might be empty or in construction)
    root: Option<NodeId>,
}

impl Tree {
    /// Create a new empty tree
    ///
    /// # Example
    /// ```
    /// use cnp::libs::phylo::tree::Tree;
    /// let tree = Tree::new();
    /// assert!(tree.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new node to the tree. Returns the new node's ID.
    /// The node is initially detached (no parent).
    pub fn add_node(&mut self) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(id));
        id
    }

    /// Get a reference to a node by ID.
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get a mutable reference to a node by ID.
    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Set a node as the root of the tree.
    pub fn set_root(&mut self, id: NodeId) {
        if self.get_node(id).is_some() {
            self.root = Some(id);
        }
    }

    pub fn get_root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Link a detached node under a parent.
    /// Updates both parent's `children` list and child's `parent` field.
    pub fn add_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<(), TreeError> {
        if parent_id == child_id {
            return Err(TreeError::LogicError(
                "cannot add node as child of itself".to_string(),
            ));
        }
        if self.get_node(parent_id).is_none() {
            return Err(TreeError::LogicError(format!(
                "parent node {} not found",
                parent_id
            )));
        }
        match self.get_node(child_id) {
            None => {
                return Err(TreeError::LogicError(format!(
                    "child node {} not found",
                    child_id
                )));
            }
            Some(child) => {
                if let Some(old_parent) = child.parent {
                    return Err(TreeError::LogicError(format!(
                        "node {} already has parent {}",
                        child_id, old_parent
                    )));
                }
            }
        }

        self.nodes[child_id].parent = Some(parent_id);
        self.nodes[parent_id].children.push(child_id);

        Ok(())
    }

    /// Node IDs in preorder (root before children), starting from `start`.
    pub fn preorder(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];

        while let Some(id) = stack.pop() {
            if let Some(node) = self.get_node(id) {
                result.push(id);
                // Push children in reverse order so they are processed in order
                for &child in node.children.iter().rev() {
                    stack.push(child);
                }
            }
        }

        result
    }

    /// IDs of all leaves, in arena order.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.is_leaf())
            .map(|n| n.id)
            .collect()
    }

    /// Whether every internal vertex has exactly two children.
    ///
    /// # Example
    /// ```
    /// use cnp::libs::phylo::tree::Tree;
    /// let tree = Tree::from_newick("((A,B),C);").unwrap();
    /// assert!(tree.is_binary());
    /// let tree = Tree::from_newick("(A,B,C);").unwrap();
    /// assert!(!tree.is_binary());
    /// ```
    pub fn is_binary(&self) -> bool {
        self.nodes
            .iter()
            .all(|n| n.children.is_empty() || n.children.len() == 2)
    }

    /// Read a single Newick tree from a file ("stdin" for standard input).
    pub fn from_file(infile: &str) -> anyhow::Result<Tree> {
        let newick = crate::libs::io::read_to_string(infile)?;
        Ok(Tree::from_newick(&newick)?)
    }
}
