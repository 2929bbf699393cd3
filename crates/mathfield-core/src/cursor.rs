//! Cursor, point and selection.
//!
//! A [`Point`] is a position strictly between two siblings inside one
//! container; the [`Cursor`] is the live point plus the active selection and
//! the anticursor (the fixed end of an in-progress shift-selection). All
//! repositioning operations are O(1); none of them mutate the tree.

use crate::node::NodeKind;
use crate::tree::{pray, Direction, Fragment, NodeId, Tree};

/// A position between two siblings inside `parent`. Either neighbor may be
/// absent at a block end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    /// The container the point is inside of.
    pub parent: NodeId,
    /// Left neighbor, if any.
    pub left: Option<NodeId>,
    /// Right neighbor, if any.
    pub right: Option<NodeId>,
}

impl Point {
    /// The neighbor in the given direction.
    pub fn neighbor(&self, dir: Direction) -> Option<NodeId> {
        match dir {
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }
}

/// Assert that a point is consistent with the live tree: both neighbors
/// belong to `parent`, are mutual siblings, and bracket the position
/// correctly. The well-formedness check every public operation must
/// re-establish before returning.
#[track_caller]
pub fn pray_well_formed_point(tree: &Tree, point: &Point) {
    match point.left {
        Some(left) => {
            pray(
                tree.get(left).parent == Some(point.parent),
                "point's left neighbor is not a child of its parent",
            );
            pray(
                tree.get(left).right == point.right,
                "point's neighbors are not adjacent",
            );
        }
        None => pray(
            tree.end(point.parent, Direction::Left) == point.right,
            "point's right neighbor is not at the parent's left end",
        ),
    }
    match point.right {
        Some(right) => {
            pray(
                tree.get(right).parent == Some(point.parent),
                "point's right neighbor is not a child of its parent",
            );
            pray(
                tree.get(right).left == point.left,
                "point's neighbors are not adjacent",
            );
        }
        None => pray(
            tree.end(point.parent, Direction::Right) == point.left,
            "point's left neighbor is not at the parent's right end",
        ),
    }
}

/// A highlighted, non-empty run of siblings, eligible for replace-on-type
/// or explicit deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Leftmost selected node.
    pub left: NodeId,
    /// Rightmost selected node.
    pub right: NodeId,
}

impl Selection {
    /// The selection as a fragment.
    pub fn fragment(&self) -> Fragment {
        Fragment::new(Some(self.left), Some(self.right))
    }

    /// The selected end in the given direction.
    pub fn end(&self, dir: Direction) -> NodeId {
        match dir {
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }
}

/// The edit position: a live [`Point`] plus selection state.
#[derive(Debug, Clone)]
pub struct Cursor {
    /// Containing node.
    pub parent: NodeId,
    /// Left neighbor, if any.
    pub left: Option<NodeId>,
    /// Right neighbor, if any.
    pub right: Option<NodeId>,
    /// The active selection, if any.
    pub selection: Option<Selection>,
    /// Fixed end of an in-progress shift-selection.
    pub anticursor: Option<Point>,
}

impl Cursor {
    /// A cursor at the left end of `block`, with no selection.
    pub fn new(tree: &Tree, block: NodeId) -> Self {
        Self {
            parent: block,
            left: None,
            right: tree.end(block, Direction::Left),
            selection: None,
            anticursor: None,
        }
    }

    /// The cursor position as a plain point.
    pub fn point(&self) -> Point {
        Point { parent: self.parent, left: self.left, right: self.right }
    }

    /// The neighbor in the given direction.
    pub fn neighbor(&self, dir: Direction) -> Option<NodeId> {
        match dir {
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    /// Overwrite the neighbor in the given direction.
    pub fn set_neighbor(&mut self, dir: Direction, id: Option<NodeId>) {
        match dir {
            Direction::Left => self.left = id,
            Direction::Right => self.right = id,
        }
    }

    /// Reposition immediately left of `node`.
    pub fn ins_left_of(&mut self, tree: &Tree, node: NodeId) {
        let n = tree.get(node);
        pray(n.parent.is_some(), "cannot position the cursor next to a detached node");
        self.parent = n.parent.unwrap();
        self.left = n.left;
        self.right = Some(node);
    }

    /// Reposition immediately right of `node`.
    pub fn ins_right_of(&mut self, tree: &Tree, node: NodeId) {
        let n = tree.get(node);
        pray(n.parent.is_some(), "cannot position the cursor next to a detached node");
        self.parent = n.parent.unwrap();
        self.left = Some(node);
        self.right = n.right;
    }

    /// Reposition on the `dir` side of `node`.
    pub fn ins_dir_of(&mut self, tree: &Tree, dir: Direction, node: NodeId) {
        match dir {
            Direction::Left => self.ins_left_of(tree, node),
            Direction::Right => self.ins_right_of(tree, node),
        }
    }

    /// Reposition at the left end of `block`.
    pub fn ins_at_left_end(&mut self, tree: &Tree, block: NodeId) {
        self.parent = block;
        self.left = None;
        self.right = tree.end(block, Direction::Left);
    }

    /// Reposition at the right end of `block`.
    pub fn ins_at_right_end(&mut self, tree: &Tree, block: NodeId) {
        self.parent = block;
        self.left = tree.end(block, Direction::Right);
        self.right = None;
    }

    /// Reposition at the `dir` end of `block`.
    pub fn ins_at_dir_end(&mut self, tree: &Tree, dir: Direction, block: NodeId) {
        match dir {
            Direction::Left => self.ins_at_left_end(tree, block),
            Direction::Right => self.ins_at_right_end(tree, block),
        }
    }

    /// Number of containers between the cursor and the root, the root block
    /// itself counting as depth 1.
    pub fn depth(&self, tree: &Tree) -> usize {
        tree.ancestors(self.parent)
            .iter()
            .filter(|&&id| tree.get(id).kind.is_container())
            .count()
    }

    /// Whether inserting here would exceed the configured nesting cap.
    pub fn is_too_deep(&self, tree: &Tree, max_depth: Option<usize>) -> bool {
        match max_depth {
            Some(max) => self.depth(tree) > max,
            None => false,
        }
    }

    /// Discard the selection without touching the tree. The selected nodes
    /// merely lose their highlight.
    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.anticursor = None;
    }

    /// Pin the anticursor at the current position, beginning a selection.
    pub fn start_selection(&mut self) {
        self.anticursor = Some(self.point());
    }

    /// Recompute the selection spanned between the anticursor and the
    /// current position, lifting both to their deepest common ancestor
    /// block. Returns `false` (and clears the selection) when the two
    /// positions coincide.
    pub fn select_from_anticursor(&mut self, tree: &Tree) -> bool {
        let Some(anti) = self.anticursor else {
            self.selection = None;
            return false;
        };
        let here = self.point();
        if here == anti {
            self.selection = None;
            return false;
        }

        let common = deepest_common_container(tree, here.parent, anti.parent);

        // Lift each endpoint to either a boundary point inside `common` or
        // the child of `common` its subtree hangs from.
        let here_lift = lift(tree, &here, common);
        let anti_lift = lift(tree, &anti, common);

        let (left_end, right_end) = match order(tree, common, &here_lift, &anti_lift) {
            Some(ordered) => ordered,
            None => {
                // Same position once lifted; nothing to highlight.
                self.selection = None;
                return false;
            }
        };
        self.selection = Some(Selection { left: left_end, right: right_end });
        true
    }
}

/// Deepest container that contains both blocks (possibly one of them).
fn deepest_common_container(tree: &Tree, a: NodeId, b: NodeId) -> NodeId {
    let ancestors_a = tree.ancestors(a);
    let ancestors_b = tree.ancestors(b);
    for &id in &ancestors_a {
        if tree.get(id).kind.is_container() && ancestors_b.contains(&id) {
            return id;
        }
    }
    pray(false, "points do not share an ancestor container");
    unreachable!()
}

/// An endpoint lifted into `common`: either the point itself (when its
/// parent already is `common`) or the child of `common` its subtree hangs
/// from, which then gets selected whole.
enum Lifted {
    Boundary(Point),
    Child(NodeId),
}

fn lift(tree: &Tree, point: &Point, common: NodeId) -> Lifted {
    if point.parent == common {
        return Lifted::Boundary(*point);
    }
    let mut cur = point.parent;
    loop {
        let parent = tree.get(cur).parent;
        pray(parent.is_some(), "endpoint is not inside the common container");
        if parent == Some(common) {
            return Lifted::Child(cur);
        }
        cur = parent.unwrap();
    }
}

/// Order the two lifted endpoints left-to-right inside `common` and return
/// the selection's end nodes, or `None` if the span is empty.
fn order(
    tree: &Tree,
    common: NodeId,
    a: &Lifted,
    b: &Lifted,
) -> Option<(NodeId, NodeId)> {
    // Walk the child chain once; record where each endpoint sits.
    let children = tree.child_ids(common);
    let position_of = |lifted: &Lifted| -> usize {
        // A boundary point between children i-1 and i has position i; a
        // child node at index i has position i (its left edge).
        match lifted {
            Lifted::Boundary(p) => match p.right {
                Some(right) => children.iter().position(|&c| c == right).unwrap_or_else(|| {
                    pray(false, "selection endpoint is not in the common container");
                    unreachable!()
                }),
                None => children.len(),
            },
            Lifted::Child(id) => children.iter().position(|c| c == id).unwrap_or_else(|| {
                pray(false, "selection endpoint is not in the common container");
                unreachable!()
            }),
        }
    };

    let pos_a = position_of(a);
    let pos_b = position_of(b);
    let (first, last, first_pos, last_pos) = if pos_a <= pos_b {
        (a, b, pos_a, pos_b)
    } else {
        (b, a, pos_b, pos_a)
    };

    // The left end of the span: a boundary contributes its right neighbor,
    // a lifted child contributes itself.
    let left = match first {
        Lifted::Boundary(_) => {
            if first_pos >= children.len() {
                return None;
            }
            children[first_pos]
        }
        Lifted::Child(id) => *id,
    };
    let right = match last {
        Lifted::Boundary(_) => {
            if last_pos == 0 {
                return None;
            }
            children[last_pos - 1]
        }
        Lifted::Child(id) => *id,
    };

    let left_idx = children.iter().position(|&c| c == left)?;
    let right_idx = children.iter().position(|&c| c == right)?;
    if left_idx > right_idx {
        return None;
    }
    Some((left, right))
}

/// Up/down entry target of a node adjacent to the cursor, if it has one.
pub(crate) fn vertical_target(tree: &Tree, node: NodeId, up: bool) -> Option<NodeId> {
    match &tree.get(node).kind {
        NodeKind::Fraction { numerator, denominator } => {
            Some(if up { *numerator } else { *denominator })
        }
        NodeKind::SupSub { sub, sup } | NodeKind::LargeOperator { sub, sup } => {
            if up { *sup } else { *sub }
        }
        _ => None,
    }
}
