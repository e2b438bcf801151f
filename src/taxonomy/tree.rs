//! Category tree parsed from a tracker's category picker
//!
//! The tree is stored as an arena: nodes live in one vector and refer to
//! their children by index. Top-level nodes are the picker's option groups
//! and carry no code.

use scraper::{ElementRef, Html, Selector};

/// Index of a node in a [`CategoryTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// One category (or group) of the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryNode {
    /// Numeric forum code; `None` for groups
    pub code: Option<String>,
    pub name: String,
    pub children: Vec<NodeId>,
}

/// Arena-backed category tree
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    nodes: Vec<CategoryNode>,
    groups: Vec<NodeId>,
}

impl CategoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a top-level group
    pub fn add_group(&mut self, name: &str) -> NodeId {
        let id = self.push(None, name);
        self.groups.push(id);
        id
    }

    /// Adds a category below `parent`
    pub fn add_child(&mut self, parent: NodeId, code: &str, name: &str) -> NodeId {
        let id = self.push(Some(code.to_string()), name);
        self.nodes[parent.0].children.push(id);
        id
    }

    fn push(&mut self, code: Option<String>, name: &str) -> NodeId {
        self.nodes.push(CategoryNode {
            code,
            name: name.to_string(),
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> &CategoryNode {
        &self.nodes[id.0]
    }

    /// Top-level groups in page order
    pub fn groups(&self) -> &[NodeId] {
        &self.groups
    }

    /// Finds a direct child of `parent` by code
    pub fn find_child(&self, parent: NodeId, code: &str) -> Option<NodeId> {
        self.node(parent)
            .children
            .iter()
            .copied()
            .find(|&child| self.node(child).code.as_deref() == Some(code))
    }

    /// Total number of nodes, groups included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Parses the category `<select>` of a search page
    ///
    /// Each `<optgroup>` becomes a group. An `<option>` with an `id` and a
    /// `value` becomes a category; a `fp-<code>` class names its parent among
    /// the categories already seen in the same group. An option whose parent
    /// is unknown is attached directly to the group.
    pub fn parse(html: &str) -> Self {
        let mut tree = Self::new();
        let (Ok(group_selector), Ok(option_selector)) =
            (Selector::parse("optgroup"), Selector::parse("option"))
        else {
            return tree;
        };

        let document = Html::parse_document(html);
        for group in document.select(&group_selector) {
            let Some(label) = group.value().attr("label") else {
                continue;
            };
            let group_id = tree.add_group(&clean_text(label));

            for option in group.select(&option_selector) {
                tree.add_option(group_id, option);
            }
        }

        tree
    }

    fn add_option(&mut self, group_id: NodeId, option: ElementRef<'_>) {
        let element = option.value();
        let (Some(_), Some(code)) = (element.attr("id"), element.attr("value")) else {
            return;
        };
        let name = clean_text(&option.text().collect::<String>());

        let parent = match element.attr("class").and_then(parent_code) {
            None => group_id,
            Some(parent_code) => match self.find_child(group_id, parent_code) {
                Some(parent) => parent,
                None => {
                    tracing::info!(
                        "Unknown parent {} for category {} ({}), attaching to group",
                        parent_code,
                        code,
                        name
                    );
                    group_id
                }
            },
        };

        self.add_child(parent, code, &name);
    }

    /// Renders the tree as an indented outline
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for &group in &self.groups {
            self.outline_node(group, 0, &mut out);
        }
        out
    }

    fn outline_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = self.node(id);
        out.push_str(&"  ".repeat(depth));
        match &node.code {
            Some(code) => out.push_str(&format!("{} {}\n", code, node.name)),
            None => out.push_str(&format!("{}\n", node.name)),
        }
        for &child in &node.children {
            self.outline_node(child, depth + 1, out);
        }
    }
}

/// Replaces non-breaking spaces with plain ones
fn clean_text(text: &str) -> String {
    text.replace('\u{a0}', " ")
}

/// Extracts the parent code from a class list such as `fp-7`
fn parent_code(classes: &str) -> Option<&str> {
    classes
        .split_whitespace()
        .filter_map(|class| class.strip_prefix("fp-"))
        .find(|code| !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit()))
}
