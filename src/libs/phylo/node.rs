/// NodeId is an index into the Tree's node vector.
/// It is lightweight (Copy) and safe (no pointers).
pub type NodeId = usize;

#[derive(Debug, Clone)]
pub struct Node {
    /// Unique identifier for the node (index in the arena)
    pub id: NodeId,

    /// Parent node ID (None for root)
    pub parent: Option<NodeId>,

    /// List of child node IDs
    pub children: Vec<NodeId>,

    /// Node label (e.g., "sample_3"). Internal vertices may be unnamed.
    pub name: Option<String>,
}

impl Node {
    /// Create a new detached node with a specific ID
    ///
    /// # Example
    /// ```
    /// use cnp::libs::phylo::node::Node;
    /// let node = Node::new(1);
    /// assert_eq!(node.id, 1);
    /// assert!(node.children.is_empty());
    /// assert!(node.name.is_none());
    /// ```
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            name: None,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Check if the node is a leaf (no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
