//! Node kinds and their structural constructors.
//!
//! Behavior that the original implementation attached to individual
//! instances at runtime (the backslash input box replacing its own
//! `write`/`focus` handlers, the `$`-span overriding `write`) is expressed
//! here as dedicated variants instead: every policy the editor dispatches on
//! is derivable from [`NodeKind`] plus the node's position.

use crate::tree::{Direction, Fragment, NodeId, Tree};

/// Which slot of a sup/sub pair a block occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    /// Subscript (the left block, serialized with `_`).
    Sub,
    /// Superscript (the right block, serialized with `^`).
    Sup,
}

/// The kind of a tree node.
///
/// Leaves (`Symbol`, `Letter`, `Digit`, `TextChar`) never have children.
/// Commands own dedicated child blocks whose ids are recorded in the
/// variant; the blocks are also ordinary children of the command node, so
/// the sibling chain and `ends` invariants apply to them unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A child container: the root block, a numerator, an exponent, ...
    Block,
    /// A vanilla symbol leaf; `text` is its plaintext rendering.
    Symbol {
        /// Plaintext rendering of the symbol.
        text: String,
    },
    /// A single letter a-z/A-Z.
    Letter {
        /// The letter itself.
        ch: char,
        /// Whether the letter is currently part of a recognized operator
        /// name (`\ker`, `\sin`, ...), as marked by the rescan pass.
        operator_part: bool,
    },
    /// A single digit 0-9.
    Digit {
        /// The digit itself.
        ch: char,
    },
    /// A literal character inside a text block.
    TextChar {
        /// The character itself.
        ch: char,
    },
    /// `\frac{...}{...}`.
    Fraction {
        /// Numerator block.
        numerator: NodeId,
        /// Denominator block.
        denominator: NodeId,
    },
    /// `_{...}` / `^{...}` attached to whatever sits left of it. At least
    /// one of the two blocks is present.
    SupSub {
        /// Subscript block.
        sub: Option<NodeId>,
        /// Superscript block.
        sup: Option<NodeId>,
    },
    /// `\sqrt{...}` or `\sqrt[...]{...}`.
    Radical {
        /// Optional index block (the `3` of a cube root).
        index: Option<NodeId>,
        /// Radicand block.
        radicand: NodeId,
    },
    /// A large operator (`\sum`, `\prod`, `\int`, ...) that owns its limit
    /// blocks itself. Owning the limits is what gives these operators their
    /// distinctive teardown policy: deleting out of an empty limit unwraps
    /// the operator and leaves the limit content behind, unbound.
    LargeOperator {
        /// Lower limit block.
        sub: Option<NodeId>,
        /// Upper limit block.
        sup: Option<NodeId>,
    },
    /// `\text{...}`; holds `TextChar` leaves directly and the cursor can
    /// live inside it. An empty text block serializes to nothing and is
    /// deleted when the cursor steps out of it.
    TextBlock,
    /// A `$...$` math span inside a text-mode root.
    MathSpan {
        /// The math block between the dollar signs.
        body: NodeId,
    },
    /// The backslash input box: collects a pending command name and renders
    /// it into a real command (or degrades to a `\text{...}` block) when a
    /// non-letter arrives.
    CommandInput {
        /// Block accumulating the pending name.
        body: NodeId,
        /// Fragment the input box replaced, held detached until the command
        /// renders and can take it over.
        replaced: Option<(NodeId, NodeId)>,
    },
}

impl NodeKind {
    /// Whether the cursor may be positioned directly inside this node.
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Block | NodeKind::TextBlock)
    }

    /// Whether this is a childless leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            NodeKind::Symbol { .. }
                | NodeKind::Letter { .. }
                | NodeKind::Digit { .. }
                | NodeKind::TextChar { .. }
        )
    }
}

impl Tree {
    /// Allocate a plain child block.
    pub fn new_block(&mut self) -> NodeId {
        self.alloc(NodeKind::Block, "")
    }

    /// Allocate a vanilla symbol leaf.
    pub fn new_symbol(&mut self, ctrl_seq: &str, text: &str) -> NodeId {
        self.alloc(NodeKind::Symbol { text: text.to_string() }, ctrl_seq)
    }

    /// Allocate a letter leaf.
    pub fn new_letter(&mut self, ch: char) -> NodeId {
        self.alloc(NodeKind::Letter { ch, operator_part: false }, ch.to_string())
    }

    /// Allocate a digit leaf.
    pub fn new_digit(&mut self, ch: char) -> NodeId {
        self.alloc(NodeKind::Digit { ch }, ch.to_string())
    }

    /// Allocate a text character leaf.
    pub fn new_text_char(&mut self, ch: char) -> NodeId {
        self.alloc(NodeKind::TextChar { ch }, ch.to_string())
    }

    /// Allocate a fraction with two empty blocks.
    pub fn new_fraction(&mut self) -> NodeId {
        let numerator = self.new_block();
        let denominator = self.new_block();
        let frac = self.alloc(NodeKind::Fraction { numerator, denominator }, "\\frac");
        Fragment::single(numerator).adopt(self, frac, None, None);
        Fragment::single(denominator).adopt(self, frac, Some(numerator), None);
        frac
    }

    /// Allocate a radical; `with_index` adds the `[...]` index block.
    pub fn new_radical(&mut self, with_index: bool) -> NodeId {
        let radicand = self.new_block();
        let index = with_index.then(|| self.new_block());
        let radical = self.alloc(NodeKind::Radical { index, radicand }, "\\sqrt");
        if let Some(index) = index {
            Fragment::single(index).adopt(self, radical, None, None);
            Fragment::single(radicand).adopt(self, radical, Some(index), None);
        } else {
            Fragment::single(radicand).adopt(self, radical, None, None);
        }
        radical
    }

    /// Allocate a sup/sub pair with a single empty block in `slot`.
    pub fn new_sup_sub(&mut self, slot: Script) -> NodeId {
        let block = self.new_block();
        let kind = match slot {
            Script::Sub => NodeKind::SupSub { sub: Some(block), sup: None },
            Script::Sup => NodeKind::SupSub { sub: None, sup: Some(block) },
        };
        let ctrl_seq = match slot {
            Script::Sub => "_",
            Script::Sup => "^",
        };
        let supsub = self.alloc(kind, ctrl_seq);
        Fragment::single(block).adopt(self, supsub, None, None);
        supsub
    }

    /// Allocate a large operator with no limit blocks yet; `ctrl_seq` is
    /// the full token (`"\\sum "`).
    pub fn new_large_operator(&mut self, ctrl_seq: &str) -> NodeId {
        self.alloc(NodeKind::LargeOperator { sub: None, sup: None }, ctrl_seq)
    }

    /// Allocate an empty text block.
    pub fn new_text_block(&mut self) -> NodeId {
        self.alloc(NodeKind::TextBlock, "\\text")
    }

    /// Allocate a `$...$` span with an empty math block.
    pub fn new_math_span(&mut self) -> NodeId {
        let body = self.new_block();
        let span = self.alloc(NodeKind::MathSpan { body }, "$");
        Fragment::single(body).adopt(self, span, None, None);
        span
    }

    /// Allocate a backslash input box with an empty name block.
    pub fn new_command_input(&mut self) -> NodeId {
        let body = self.new_block();
        let input = self.alloc(NodeKind::CommandInput { body, replaced: None }, "\\");
        Fragment::single(body).adopt(self, input, None, None);
        input
    }

    /// Add the missing `slot` block to an existing sup/sub pair (or large
    /// operator) and return it. Blocks stay ordered sub-then-sup.
    pub fn add_script_block(&mut self, node: NodeId, slot: Script) -> NodeId {
        let block = self.new_block();
        let (sub, sup) = match &self.get(node).kind {
            NodeKind::SupSub { sub, sup } => (*sub, *sup),
            NodeKind::LargeOperator { sub, sup } => (*sub, *sup),
            _ => {
                crate::tree::pray(false, "add_script_block on a non-script node");
                unreachable!()
            }
        };
        match slot {
            Script::Sub => {
                crate::tree::pray(sub.is_none(), "sub block already present");
                Fragment::single(block).adopt(self, node, None, sup);
            }
            Script::Sup => {
                crate::tree::pray(sup.is_none(), "sup block already present");
                Fragment::single(block).adopt(self, node, sub, None);
            }
        }
        let kind = &mut self.get_mut(node).kind;
        match kind {
            NodeKind::SupSub { sub, sup } | NodeKind::LargeOperator { sub, sup } => match slot {
                Script::Sub => *sub = Some(block),
                Script::Sup => *sup = Some(block),
            },
            _ => unreachable!(),
        }
        block
    }

    /// The `slot` block of a sup/sub pair or large operator, if present.
    pub fn script_block(&self, node: NodeId, slot: Script) -> Option<NodeId> {
        match &self.get(node).kind {
            NodeKind::SupSub { sub, sup } | NodeKind::LargeOperator { sub, sup } => match slot {
                Script::Sub => *sub,
                Script::Sup => *sup,
            },
            _ => None,
        }
    }

    /// Whether every child block of the node is empty (an all-empty command
    /// is deleted outright when deleted into).
    pub fn all_blocks_empty(&self, node: NodeId) -> bool {
        self.child_ids(node)
            .iter()
            .all(|&block| self.is_empty_node(block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_blocks_are_ordered_children() {
        let mut tree = Tree::new();
        let frac = tree.new_fraction();
        let NodeKind::Fraction { numerator, denominator } = tree.get(frac).kind else {
            panic!("expected a fraction");
        };
        assert_eq!(tree.child_ids(frac), vec![numerator, denominator]);
        tree.assert_well_formed_subtree(frac);
    }

    #[test]
    fn script_block_added_in_sub_then_sup_order() {
        let mut tree = Tree::new();
        let supsub = tree.new_sup_sub(Script::Sup);
        let sup = tree.script_block(supsub, Script::Sup).unwrap();
        let sub = tree.add_script_block(supsub, Script::Sub);
        assert_eq!(tree.child_ids(supsub), vec![sub, sup]);
        tree.assert_well_formed_subtree(supsub);
    }

    #[test]
    fn all_blocks_empty_reflects_content() {
        let mut tree = Tree::new();
        let frac = tree.new_fraction();
        assert!(tree.all_blocks_empty(frac));
        let NodeKind::Fraction { numerator, .. } = tree.get(frac).kind else {
            panic!();
        };
        let x = tree.new_letter('x');
        Fragment::single(x).adopt(&mut tree, numerator, None, None);
        assert!(!tree.all_blocks_empty(frac));
    }
}
