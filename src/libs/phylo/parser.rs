use super::error::TreeError;
use super::node::NodeId;
use super::tree::Tree;
use nom::{
    branch::alt,
    bytes::complete::{is_not, take_while},
    character::complete::{char, digit1, multispace0},
    combinator::{all_consuming, cut, eof, map, opt, recognize},
    error::{context, ContextError, ErrorKind, ParseError},
    multi::separated_list1,
    sequence::{delimited, preceded},
    IResult, Offset, Parser,
};

// ================================================================================================
// Error Handling Structures
// ================================================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum DetailedErrorKind {
    Context(&'static str),
    Nom(ErrorKind),
}

/// A custom error type for nom that accumulates context and error kinds.
/// This allows for more informative error messages when parsing fails.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailedError<'a> {
    pub errors: Vec<(&'a str, DetailedErrorKind)>,
}

impl<'a> ParseError<&'a str> for DetailedError<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        DetailedError {
            errors: vec![(input, DetailedErrorKind::Nom(kind))],
        }
    }

    fn append(input: &'a str, kind: ErrorKind, mut other: Self) -> Self {
        other.errors.push((input, DetailedErrorKind::Nom(kind)));
        other
    }
}

impl<'a> ContextError<&'a str> for DetailedError<'a> {
    fn add_context(input: &'a str, ctx: &'static str, mut other: Self) -> Self {
        other.errors.push((input, DetailedErrorKind::Context(ctx)));
        other
    }
}

// ================================================================================================
// Intermediate Structure
// ================================================================================================

/// `ParsedNode` is a temporary recursive structure used during parsing.
///
/// Parsing a recursive format is easier into a recursive data type; the
/// final `Tree` uses a flat arena, so this structure is converted via
/// `to_tree` once parsing succeeds.
#[derive(Debug)]
struct ParsedNode {
    name: Option<String>,
    children: Vec<ParsedNode>,
}

impl ParsedNode {
    fn new() -> Self {
        Self {
            name: None,
            children: Vec::new(),
        }
    }

    /// Converts this recursive `ParsedNode` into nodes in the provided `Tree` arena.
    /// Returns the `NodeId` of the created node in the arena.
    fn to_tree(self, tree: &mut Tree) -> NodeId {
        let id = tree.add_node();
        for child in self.children {
            let child_id = child.to_tree(tree);
            // The unwrap here is safe because `id` was just created and exists in the tree.
            tree.add_child(id, child_id).unwrap();
        }
        if let Some(node) = tree.get_node_mut(id) {
            node.name = self.name;
        }
        id
    }
}

// ================================================================================================
// Parsers
// ================================================================================================

// Whitespace eater: wraps another parser and ignores surrounding whitespace.
fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

// Label: a maximal run of non-separator characters, or a quoted string.
// Unquoted labels stop at the reserved characters "():;,".
fn parse_label(input: &str) -> IResult<&str, String, DetailedError<'_>> {
    let unquoted = map(
        take_while(|c: char| !"():;,".contains(c)),
        |s: &str| s.trim().to_string(),
    );

    // 'O''Brien' -> O'Brien
    let single_quoted = delimited(
        char('\''),
        map(is_not("'"), |s: &str| s.replace("''", "'")),
        char('\''),
    );

    let double_quoted = delimited(
        char('"'),
        map(is_not("\""), |s: &str| s.replace("\"\"", "\"")),
        char('"'),
    );

    context("label", alt((single_quoted, double_quoted, unquoted))).parse(input)
}

// Branch length: recognized so that annotated inputs parse, but the value
// is not carried on the tree. Parsimony assigns its own branch magnitudes.
fn parse_length(input: &str) -> IResult<&str, (), DetailedError<'_>> {
    context(
        "length",
        preceded(
            ws(char(':')),
            // `cut` prevents backtracking once a ':' has been consumed,
            // so ":abc" reports "expected float" instead of trying other branches.
            cut(map(
                recognize((
                    opt(char('-')),
                    digit1,
                    opt((char('.'), digit1)),
                    opt((
                        alt((char('e'), char('E'))),
                        opt(alt((char('+'), char('-')))),
                        digit1,
                    )),
                )),
                |_| (),
            )),
        ),
    )
    .parse(input)
}

// Recursive parser for a node and its children: (child1,child2,...)label:length
fn parse_subtree(input: &str) -> IResult<&str, ParsedNode, DetailedError<'_>> {
    let (input, children) = context(
        "children",
        opt(delimited(
            ws(char('(')),
            separated_list1(ws(char(',')), parse_subtree),
            ws(char(')')),
        )),
    )
    .parse(input)?;

    let (input, label) = opt(parse_label).parse(input)?;
    let (input, _) = opt(parse_length).parse(input)?;

    let mut node = ParsedNode::new();
    if let Some(c) = children {
        node.children = c;
    }
    if let Some(l) = label {
        if !l.is_empty() {
            node.name = Some(l);
        }
    }

    Ok((input, node))
}

// ================================================================================================
// Entry Point
// ================================================================================================

/// Parses a single Newick tree string.
///
/// The trailing semicolon is optional, but the whole input must be consumed;
/// unbalanced parentheses or a truncated stream surface as a `ParseError`.
pub fn parse_newick(input: &str) -> Result<Tree, TreeError> {
    let terminator = alt((map(ws(char(';')), |_| ()), map(eof, |_| ())));
    let mut parser = all_consuming((ws(parse_subtree), terminator));

    match parser.parse(input) {
        Ok((_, (root_node, _))) => {
            let mut tree = Tree::new();
            let root_id = root_node.to_tree(&mut tree);
            tree.set_root(root_id);
            Ok(tree)
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(make_tree_error(input, e)),
        Err(nom::Err::Incomplete(_)) => Err(TreeError::ParseError {
            message: "Incomplete input".to_string(),
            line: 0,
            column: 0,
            snippet: "".to_string(),
        }),
    }
}

// Helper to convert nom errors into friendly TreeError
fn make_tree_error(input: &str, e: DetailedError) -> TreeError {
    let (remaining, _) = e.errors.first().unwrap();
    let offset = input.offset(remaining);

    // Calculate line/col
    let prefix = &input[..offset];
    let line = prefix.chars().filter(|&c| c == '\n').count() + 1;
    let last_newline = prefix.rfind('\n').map(|p| p + 1).unwrap_or(0);
    let column = offset - last_newline + 1;

    let mut msg = String::new();
    for (_, kind) in e.errors.iter().rev() {
        match kind {
            DetailedErrorKind::Context(ctx) => {
                msg.push_str(&format!("while parsing {}:\n", ctx));
            }
            DetailedErrorKind::Nom(k) => {
                msg.push_str(&format!("  error: {:?}\n", k));
            }
        }
    }

    TreeError::ParseError {
        message: msg,
        line,
        column,
        snippet: remaining.chars().take(50).collect(),
    }
}

impl Tree {
    /// Parse a Newick string into a Tree.
    ///
    /// # Example
    /// ```
    /// use cnp::libs::phylo::tree::Tree;
    ///
    /// let tree = Tree::from_newick("((A,B)X,C)R;").unwrap();
    /// assert_eq!(tree.len(), 5);
    ///
    /// let result = Tree::from_newick("((A,B)X,C");
    /// assert!(result.is_err());
    /// ```
    pub fn from_newick(input: &str) -> Result<Self, TreeError> {
        parse_newick(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_simple() {
        let tree = Tree::from_newick("((A,B)X,C)R;").unwrap();
        assert_eq!(tree.len(), 5);

        let root = tree.get_node(tree.get_root().unwrap()).unwrap();
        assert_eq!(root.name.as_deref(), Some("R"));
        assert_eq!(root.children.len(), 2);

        let x = tree.get_node(root.children[0]).unwrap();
        assert_eq!(x.name.as_deref(), Some("X"));
        let x_children: Vec<_> = x
            .children
            .iter()
            .map(|&c| tree.get_node(c).unwrap().name.as_deref().unwrap())
            .collect();
        assert_eq!(x_children, vec!["A", "B"]);

        let c = tree.get_node(root.children[1]).unwrap();
        assert_eq!(c.name.as_deref(), Some("C"));
        assert!(c.is_leaf());
    }

    #[test]
    fn test_parser_optional_semicolon() {
        let tree = Tree::from_newick("(A,B)R").unwrap();
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_parser_lengths_skipped() {
        let tree = Tree::from_newick("(A:0.1,B:0.2e-1)Root:100;").unwrap();

        let root = tree.get_node(tree.get_root().unwrap()).unwrap();
        assert_eq!(root.name.as_deref(), Some("Root"));

        let child1 = tree.get_node(root.children[0]).unwrap();
        assert_eq!(child1.name.as_deref(), Some("A"));
    }

    #[test]
    fn test_parser_whitespace() {
        let tree = Tree::from_newick("  (  A : 0.1 ,  B  )  ;  ").unwrap();
        assert_eq!(tree.len(), 3);

        let input = "
        (
            A : 0.1,
            B : 0.2
        ) Root ;
        ";
        let tree = Tree::from_newick(input).unwrap();
        let root = tree.get_node(tree.get_root().unwrap()).unwrap();
        assert_eq!(root.name.as_deref(), Some("Root"));
    }

    #[test]
    fn test_parser_quoted() {
        let tree = Tree::from_newick("('Homo sapiens',\"Mus musculus\")r;").unwrap();
        let root = tree.get_node(tree.get_root().unwrap()).unwrap();

        let c1 = tree.get_node(root.children[0]).unwrap();
        assert_eq!(c1.name.as_deref(), Some("Homo sapiens"));

        let c2 = tree.get_node(root.children[1]).unwrap();
        assert_eq!(c2.name.as_deref(), Some("Mus musculus"));
    }

    #[test]
    fn test_parser_error() {
        // Unbalanced parentheses
        let res = Tree::from_newick("((A,B)X,C");
        match res {
            Err(TreeError::ParseError { line, .. }) => {
                assert_eq!(line, 1);
            }
            _ => panic!("Expected ParseError, got {:?}", res),
        }

        // Truncated length
        let res = Tree::from_newick("(A,B:)C;");
        match res {
            Err(TreeError::ParseError { message, .. }) => {
                assert!(message.contains("length"));
            }
            _ => panic!("Expected ParseError, got {:?}", res),
        }

        // Garbage after the tree
        assert!(Tree::from_newick("(A,B); trailing").is_err());
    }
}
