//! Node arena and structural splice layer.
//!
//! Every node of one editor instance lives in a [`Tree`]: an owning arena
//! indexed by [`NodeId`]. Sibling/parent relationships are stored as ids, so
//! splicing a run of nodes in or out is O(1) pointer surgery without any
//! manual lifetime management. Ids are assigned monotonically and never
//! reused within a tree; disposing an id twice is a no-op.
//!
//! The only sanctioned way to attach or detach nodes is through
//! [`Fragment::adopt`] and [`Fragment::disown`]. Going through these two
//! operations exclusively is what guarantees the tree stays well-formed:
//! both assert that the supplied boundary neighbors match the live state
//! before mutating anything.

use crate::node::NodeKind;

/// Stable identity of a node within one [`Tree`].
///
/// Ids are monotonically assigned and never reused, so a stale id reliably
/// names a disposed slot instead of aliasing a newer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Raw arena index of this id.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Horizontal direction, used to index sibling links, block ends and all
/// direction-generic editing verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward the left sibling / left end.
    Left,
    /// Toward the right sibling / right end.
    Right,
}

/// Shorthand for [`Direction::Left`].
pub const L: Direction = Direction::Left;
/// Shorthand for [`Direction::Right`].
pub const R: Direction = Direction::Right;

impl Direction {
    /// The opposite direction.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Pair of leftmost/rightmost children of a container node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ends {
    /// Leftmost child, if any.
    pub left: Option<NodeId>,
    /// Rightmost child, if any.
    pub right: Option<NodeId>,
}

impl Ends {
    /// The end in the given direction.
    pub fn end(&self, dir: Direction) -> Option<NodeId> {
        match dir {
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    /// Set the end in the given direction.
    pub fn set_end(&mut self, dir: Direction, id: Option<NodeId>) {
        match dir {
            Direction::Left => self.left = id,
            Direction::Right => self.right = id,
        }
    }
}

/// A single node of the formula tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// What kind of node this is, including ids of any dedicated child
    /// blocks (numerator, radicand, ...).
    pub kind: NodeKind,
    /// Canonical LaTeX token for this node (`"\\frac"`, `"x"`, `"\\pi "`).
    pub ctrl_seq: String,
    /// Parent container, `None` while detached or for the root block.
    pub parent: Option<NodeId>,
    /// Left sibling.
    pub left: Option<NodeId>,
    /// Right sibling.
    pub right: Option<NodeId>,
    /// Leftmost/rightmost children.
    pub ends: Ends,
}

impl Node {
    /// Sibling in the given direction.
    pub fn neighbor(&self, dir: Direction) -> Option<NodeId> {
        match dir {
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    /// Whether this node has no children.
    pub fn is_empty(&self) -> bool {
        self.ends.left.is_none() && self.ends.right.is_none()
    }
}

/// Structural invariant guard.
///
/// A failing `pray` means a core bug (the StructuralInvariantViolation class
/// of errors): it aborts the current operation instead of silently
/// continuing with a malformed tree. These are never expected to fire in
/// correct operation and are exercised heavily by the test suites.
#[track_caller]
pub(crate) fn pray(cond: bool, msg: &str) {
    assert!(cond, "structural invariant violated: {}", msg);
}

/// Arena owning every node of one editor instance.
///
/// This is the per-document identity registry: append-on-construct,
/// remove-on-dispose. There is deliberately no process-global state, so
/// concurrent editor instances are isolated by construction.
#[derive(Debug, Default)]
pub struct Tree {
    slots: Vec<Option<Node>>,
}

impl Tree {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Allocate a fresh, detached node.
    pub fn alloc(&mut self, kind: NodeKind, ctrl_seq: impl Into<String>) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Some(Node {
            kind,
            ctrl_seq: ctrl_seq.into(),
            parent: None,
            left: None,
            right: None,
            ends: Ends::default(),
        }));
        id
    }

    /// Whether the id still names a live node.
    pub fn is_live(&self, id: NodeId) -> bool {
        self.slots
            .get(id.index())
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Number of live nodes (test/diagnostic helper).
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Borrow a live node.
    #[track_caller]
    pub fn get(&self, id: NodeId) -> &Node {
        match self.slots.get(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("structural invariant violated: access to disposed node {}", id),
        }
    }

    /// Mutably borrow a live node.
    #[track_caller]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        match self.slots.get_mut(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("structural invariant violated: access to disposed node {}", id),
        }
    }

    /// Remove the node's registry entry. Idempotent: disposing an already
    /// disposed id is a no-op, which makes re-entrant disposal during
    /// post-order teardown harmless.
    pub fn dispose(&mut self, id: NodeId) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            *slot = None;
        }
    }

    /// Parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent
    }

    /// Sibling of a node in the given direction.
    pub fn neighbor(&self, id: NodeId, dir: Direction) -> Option<NodeId> {
        self.get(id).neighbor(dir)
    }

    /// Child end of a container in the given direction.
    pub fn end(&self, id: NodeId, dir: Direction) -> Option<NodeId> {
        self.get(id).ends.end(dir)
    }

    /// Whether the node has no children.
    pub fn is_empty_node(&self, id: NodeId) -> bool {
        self.get(id).is_empty()
    }

    /// Ids of the node's children, left to right.
    pub fn child_ids(&self, parent: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.get(parent).ends.left;
        while let Some(id) = cur {
            out.push(id);
            cur = self.get(id).right;
        }
        out
    }

    /// Ancestors of a node, starting with the node itself and ending at the
    /// root (the original's `bubble` walk).
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = vec![id];
        let mut cur = self.get(id).parent;
        while let Some(p) = cur {
            out.push(p);
            cur = self.get(p).parent;
        }
        out
    }

    /// Ids of the whole subtree in post order (children before parents), the
    /// disposal order used by [`Fragment::remove`].
    pub fn post_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.post_order_into(id, &mut out);
        out
    }

    fn post_order_into(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for child in self.child_ids(id) {
            self.post_order_into(child, out);
        }
        out.push(id);
    }

    /// Detach a single node and dispose its whole subtree.
    pub fn remove(&mut self, id: NodeId) {
        Fragment::single(id).remove(self);
    }

    /// Walk the subtree under `root` and assert every structural invariant:
    /// `ends` brackets exactly the sibling chain, every child points back at
    /// its parent, and boundary children carry no outward sibling links.
    pub fn assert_well_formed_subtree(&self, root: NodeId) {
        let node = self.get(root);
        match (node.ends.left, node.ends.right) {
            (None, None) => {}
            (Some(first), Some(last)) => {
                pray(self.get(first).left.is_none(), "leftmost child has a left sibling");
                pray(self.get(last).right.is_none(), "rightmost child has a right sibling");
                let mut cur = first;
                loop {
                    let child = self.get(cur);
                    pray(child.parent == Some(root), "child does not point back at parent");
                    if let Some(next) = child.right {
                        pray(
                            self.get(next).left == Some(cur),
                            "sibling links are not mutual",
                        );
                        cur = next;
                    } else {
                        pray(cur == last, "sibling chain does not end at parent's right end");
                        break;
                    }
                }
            }
            _ => pray(false, "ends must be both set or both empty"),
        }
        for child in self.child_ids(root) {
            self.assert_well_formed_subtree(child);
        }
    }
}

/// A contiguous run of siblings sharing one parent, inclusive on both ends.
///
/// Fragments own nothing: they are a transient view used to move or detach
/// subtrees. An empty fragment short-circuits every operation as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    left: Option<NodeId>,
    right: Option<NodeId>,
}

impl Fragment {
    /// A fragment spanning `left..=right`. Both or neither must be present.
    #[track_caller]
    pub fn new(left: Option<NodeId>, right: Option<NodeId>) -> Self {
        pray(
            left.is_some() == right.is_some(),
            "fragment ends must be both set or both empty",
        );
        Self { left, right }
    }

    /// The empty fragment.
    pub fn empty() -> Self {
        Self { left: None, right: None }
    }

    /// A fragment holding exactly one node.
    pub fn single(id: NodeId) -> Self {
        Self { left: Some(id), right: Some(id) }
    }

    /// Leftmost member.
    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    /// Rightmost member.
    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    /// End of the run in the given direction.
    pub fn end(&self, dir: Direction) -> Option<NodeId> {
        match dir {
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    /// Whether the fragment spans nothing.
    pub fn is_empty(&self) -> bool {
        self.left.is_none()
    }

    /// Top-level member ids, left to right.
    pub fn node_ids(&self, tree: &Tree) -> Vec<NodeId> {
        let mut out = Vec::new();
        let (Some(left), Some(right)) = (self.left, self.right) else {
            return out;
        };
        let mut cur = left;
        loop {
            out.push(cur);
            if cur == right {
                break;
            }
            match tree.get(cur).right {
                Some(next) => cur = next,
                None => {
                    pray(false, "fragment right end is not reachable from its left end");
                    break;
                }
            }
        }
        out
    }

    /// Splice the run into `parent`'s child chain, immediately right of
    /// `leftward` (or at the left end if absent) and left of `rightward` (or
    /// at the right end if absent).
    ///
    /// Asserts that the supplied neighbors match the parent's live state
    /// before touching anything.
    pub fn adopt(
        &self,
        tree: &mut Tree,
        parent: NodeId,
        leftward: Option<NodeId>,
        rightward: Option<NodeId>,
    ) {
        let (Some(first), Some(last)) = (self.left, self.right) else {
            return;
        };

        // The splice point must describe the parent's current state.
        match leftward {
            Some(lw) => {
                pray(
                    tree.get(lw).parent == Some(parent),
                    "adopt: leftward neighbor has a different parent",
                );
                pray(
                    tree.get(lw).right == rightward,
                    "adopt: leftward neighbor is not adjacent to rightward neighbor",
                );
            }
            None => pray(
                tree.get(parent).ends.left == rightward,
                "adopt: rightward neighbor is not at the parent's left end",
            ),
        }
        if let Some(rw) = rightward {
            pray(
                tree.get(rw).parent == Some(parent),
                "adopt: rightward neighbor has a different parent",
            );
            pray(
                tree.get(rw).left == leftward,
                "adopt: rightward neighbor is not adjacent to leftward neighbor",
            );
        } else {
            pray(
                tree.get(parent).ends.right == leftward,
                "adopt: leftward neighbor is not at the parent's right end",
            );
        }

        for id in self.node_ids(tree) {
            pray(
                tree.get(id).parent.is_none(),
                "adopt: fragment member is still attached",
            );
            tree.get_mut(id).parent = Some(parent);
        }

        match leftward {
            Some(lw) => tree.get_mut(lw).right = Some(first),
            None => tree.get_mut(parent).ends.left = Some(first),
        }
        tree.get_mut(first).left = leftward;
        match rightward {
            Some(rw) => tree.get_mut(rw).left = Some(last),
            None => tree.get_mut(parent).ends.right = Some(last),
        }
        tree.get_mut(last).right = rightward;
    }

    /// Remove the run from its parent's chain: the exact inverse of
    /// [`Fragment::adopt`]. Sibling links *inside* the run are left intact,
    /// so the detached fragment stays internally well-formed and can be
    /// re-adopted elsewhere.
    pub fn disown(&self, tree: &mut Tree) {
        let (Some(first), Some(last)) = (self.left, self.right) else {
            return;
        };

        let parent = tree.get(first).parent;
        pray(parent.is_some(), "disown: fragment is already detached");
        pray(
            tree.get(last).parent == parent,
            "disown: fragment ends have different parents",
        );
        let parent = parent.unwrap();

        let prev = tree.get(first).left;
        let next = tree.get(last).right;

        match prev {
            Some(p) => {
                pray(
                    tree.get(p).right == Some(first),
                    "disown: boundary sibling links are not mutual",
                );
                tree.get_mut(p).right = next;
            }
            None => {
                pray(
                    tree.get(parent).ends.left == Some(first),
                    "disown: fragment left end is not at the parent's left end",
                );
                tree.get_mut(parent).ends.left = next;
            }
        }
        match next {
            Some(n) => {
                pray(
                    tree.get(n).left == Some(last),
                    "disown: boundary sibling links are not mutual",
                );
                tree.get_mut(n).left = prev;
            }
            None => {
                pray(
                    tree.get(parent).ends.right == Some(last),
                    "disown: fragment right end is not at the parent's right end",
                );
                tree.get_mut(parent).ends.right = prev;
            }
        }

        for id in self.node_ids(tree) {
            tree.get_mut(id).parent = None;
        }
        tree.get_mut(first).left = None;
        tree.get_mut(last).right = None;
    }

    /// Disown the run and dispose every member subtree in post order. Used
    /// when content is permanently discarded.
    pub fn remove(self, tree: &mut Tree) {
        if self.is_empty() {
            return;
        }
        if tree.get(self.left.unwrap()).parent.is_some() {
            self.disown(tree);
        }
        for id in self.node_ids(tree) {
            for descendant in tree.post_order(id) {
                tree.dispose(descendant);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    fn symbol(tree: &mut Tree, ch: char) -> NodeId {
        tree.alloc(
            NodeKind::Symbol { text: ch.to_string() },
            ch.to_string(),
        )
    }

    fn chain(tree: &Tree, parent: NodeId) -> String {
        tree.child_ids(parent)
            .iter()
            .map(|&id| tree.get(id).ctrl_seq.clone())
            .collect()
    }

    #[test]
    fn adopt_builds_a_sibling_chain() {
        let mut tree = Tree::new();
        let block = tree.alloc(NodeKind::Block, "");
        let a = symbol(&mut tree, 'a');
        let b = symbol(&mut tree, 'b');
        let c = symbol(&mut tree, 'c');

        Fragment::single(a).adopt(&mut tree, block, None, None);
        Fragment::single(c).adopt(&mut tree, block, Some(a), None);
        Fragment::single(b).adopt(&mut tree, block, Some(a), Some(c));

        assert_eq!(chain(&tree, block), "abc");
        tree.assert_well_formed_subtree(block);
    }

    #[test]
    fn disown_is_the_inverse_of_adopt() {
        let mut tree = Tree::new();
        let block = tree.alloc(NodeKind::Block, "");
        let ids: Vec<_> = "abcde".chars().map(|ch| symbol(&mut tree, ch)).collect();
        let mut prev = None;
        for &id in &ids {
            Fragment::single(id).adopt(&mut tree, block, prev, None);
            prev = Some(id);
        }

        // Detach "bcd", check the remaining chain, then put it back.
        let frag = Fragment::new(Some(ids[1]), Some(ids[3]));
        frag.disown(&mut tree);
        assert_eq!(chain(&tree, block), "ae");
        tree.assert_well_formed_subtree(block);

        // The detached run keeps its internal links.
        assert_eq!(frag.node_ids(&tree).len(), 3);
        assert!(tree.get(ids[1]).parent.is_none());
        assert_eq!(tree.get(ids[1]).right, Some(ids[2]));

        frag.adopt(&mut tree, block, Some(ids[0]), Some(ids[4]));
        assert_eq!(chain(&tree, block), "abcde");
        tree.assert_well_formed_subtree(block);
    }

    #[test]
    fn empty_fragment_operations_are_noops() {
        let mut tree = Tree::new();
        let block = tree.alloc(NodeKind::Block, "");
        let frag = Fragment::empty();
        frag.adopt(&mut tree, block, None, None);
        frag.disown(&mut tree);
        frag.remove(&mut tree);
        assert!(tree.is_empty_node(block));
    }

    #[test]
    fn remove_disposes_post_order() {
        let mut tree = Tree::new();
        let block = tree.alloc(NodeKind::Block, "");
        let inner = tree.alloc(NodeKind::Block, "");
        let leaf = symbol(&mut tree, 'x');
        Fragment::single(leaf).adopt(&mut tree, inner, None, None);
        Fragment::single(inner).adopt(&mut tree, block, None, None);

        tree.remove(inner);
        assert!(!tree.is_live(inner));
        assert!(!tree.is_live(leaf));
        assert!(tree.is_live(block));
        assert!(tree.is_empty_node(block));
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut tree = Tree::new();
        let a = symbol(&mut tree, 'a');
        tree.dispose(a);
        assert!(!tree.is_live(a));
        tree.dispose(a);
        assert!(!tree.is_live(a));
    }

    #[test]
    #[should_panic(expected = "structural invariant violated")]
    fn adopt_rejects_stale_neighbors() {
        let mut tree = Tree::new();
        let block = tree.alloc(NodeKind::Block, "");
        let a = symbol(&mut tree, 'a');
        let b = symbol(&mut tree, 'b');
        let c = symbol(&mut tree, 'c');
        Fragment::single(a).adopt(&mut tree, block, None, None);
        Fragment::single(b).adopt(&mut tree, block, Some(a), None);
        // a and b are adjacent, but claiming (None, b) misdescribes the chain.
        Fragment::single(c).adopt(&mut tree, block, None, Some(b));
    }

    #[test]
    fn ids_are_never_reused() {
        let mut tree = Tree::new();
        let a = symbol(&mut tree, 'a');
        tree.dispose(a);
        let b = symbol(&mut tree, 'b');
        assert_ne!(a, b);
    }
}
