use super::node::NodeId;
use super::tree::Tree;

/// Serialize the tree to its canonical Newick form: `(child1,child2)name;`.
///
/// Leaves print as their name; branch lengths are never emitted. Output of
/// this function re-parses to an identical tree.
///
/// # Example
/// ```
/// use cnp::libs::phylo::tree::Tree;
/// use cnp::libs::phylo::writer;
/// let tree = Tree::from_newick("( (A ,B) X , C )R;").unwrap();
/// assert_eq!(writer::write_newick(&tree), "((A,B)X,C)R;");
/// ```
pub fn write_newick(tree: &Tree) -> String {
    if let Some(root) = tree.get_root() {
        let mut s = to_newick_recursive(tree, root);
        s.push(';');
        s
    } else {
        ";".to_string()
    }
}

fn to_newick_recursive(tree: &Tree, node_id: NodeId) -> String {
    let node = tree.get_node(node_id).unwrap();

    let label = match &node.name {
        Some(name) => quote_label(name),
        None => String::new(),
    };

    if node.children.is_empty() {
        label
    } else {
        let children_strs: Vec<String> = node
            .children
            .iter()
            .map(|&child| to_newick_recursive(tree, child))
            .collect();

        format!("({}){}", children_strs.join(","), label)
    }
}

fn quote_label(label: &str) -> String {
    let needs_quote = label.chars().any(|c| "(),:; \t\n".contains(c));
    if needs_quote {
        format!("'{}'", label)
    } else {
        label.to_string()
    }
}

impl Tree {
    pub fn to_newick(&self) -> String {
        write_newick(self)
    }
}
