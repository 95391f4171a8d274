use crate::classifiers::hoeffding_tree::nodes::NodeRef;

/// Where sorting an instance down the tree ended.
///
/// `node` is `None` when the branch taken has no child yet; `parent_branch`
/// is `None` when the parent could not route the instance (missing value).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoundNode {
    node: Option<NodeRef>,
    parent: Option<NodeRef>,
    parent_branch: Option<usize>,
}

impl FoundNode {
    pub fn new(
        node: Option<NodeRef>,
        parent: Option<NodeRef>,
        parent_branch: Option<usize>,
    ) -> Self {
        Self {
            node,
            parent,
            parent_branch,
        }
    }

    pub fn get_node(&self) -> Option<NodeRef> {
        self.node
    }

    pub fn get_parent(&self) -> Option<NodeRef> {
        self.parent
    }

    pub fn get_parent_branch(&self) -> Option<usize> {
        self.parent_branch
    }
}
