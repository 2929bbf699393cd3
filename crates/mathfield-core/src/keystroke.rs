//! Keystroke dispatch.
//!
//! Keys arrive as logical combination strings ("Shift-Left",
//! "Ctrl-Shift-End") from whatever event layer embeds the field. Dispatch is
//! ordered and first-match-wins: the escape tier (Tab, Esc, the backslash
//! box commit, optional Space-as-Tab) runs before the default tier, and an
//! unrecognized key reports itself unhandled so the embedder can let it
//! through.
//!
//! The direction-generic editing verbs live here too: `move`/`delete`/
//! `select` towards and out of nodes, with the per-kind policies (entering
//! command blocks, removing all-empty commands outright, the unwrap
//! behaviors of fractions, radicals, sup/sub pairs and large operators).

use tracing::debug;

use crate::controller::{Controller, FieldMode, StateChangeType};
use crate::cursor::vertical_target;
use crate::node::{NodeKind, Script};
use crate::tree::{pray, Direction, Fragment, NodeId, L, R};

/// A parsed logical key combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    /// Ctrl held.
    pub ctrl: bool,
    /// Shift held.
    pub shift: bool,
    /// Alt held.
    pub alt: bool,
    /// Meta (command) held.
    pub meta: bool,
    /// The key name itself ("Left", "Backspace", "A", ...).
    pub name: String,
}

impl Key {
    /// Parse a combination string. Modifier prefixes may appear in any
    /// order; the last dash-separated part is the key name.
    pub fn parse(combo: &str) -> Self {
        let mut key = Self {
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
            name: String::new(),
        };
        for part in combo.split('-') {
            match part {
                "Ctrl" => key.ctrl = true,
                "Shift" => key.shift = true,
                "Alt" => key.alt = true,
                "Meta" => key.meta = true,
                name => key.name = name.to_string(),
            }
        }
        key
    }
}

/// What a keystroke did, in `preventDefault` terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeystrokeOutcome {
    /// Whether the field consumed the key.
    pub handled: bool,
    /// Whether the embedder should scroll the cursor into view.
    pub scroll_into_view: bool,
}

impl KeystrokeOutcome {
    /// Consumed, cursor should be brought into view.
    pub fn handled() -> Self {
        Self { handled: true, scroll_into_view: true }
    }

    /// Consumed without a scroll request.
    pub fn handled_no_scroll() -> Self {
        Self { handled: true, scroll_into_view: false }
    }

    /// Not consumed; the embedder keeps the event.
    pub fn not_handled() -> Self {
        Self { handled: false, scroll_into_view: false }
    }
}

impl Controller {
    /// Dispatch one logical keystroke.
    pub fn keystroke(&mut self, combo: &str) -> KeystrokeOutcome {
        let key = Key::parse(combo);
        debug!(%combo, "keystroke");
        if let Some(outcome) = self.escape_tier(&key) {
            return outcome;
        }
        self.main_tier(&key)
    }

    fn escape_tier(&mut self, key: &Key) -> Option<KeystrokeOutcome> {
        if key.ctrl || key.meta || key.alt {
            return None;
        }
        // A pending backslash command commits on Tab, Shift-Tab, Enter and
        // Space without writing the key.
        if matches!(
            (key.shift, key.name.as_str()),
            (_, "Tab") | (false, "Enter" | "Spacebar" | "Space")
        ) {
            if let Some(grandparent) = self.tree.parent(self.cursor.parent) {
                if matches!(self.tree.get(grandparent).kind, NodeKind::CommandInput { .. }) {
                    self.render_command_input(grandparent);
                    self.notify(StateChangeType::ContentModified);
                    return Some(KeystrokeOutcome::handled_no_scroll());
                }
            }
        }
        match (key.shift, key.name.as_str()) {
            (false, "Tab" | "Esc" | "Escape") => Some(self.escape_dir(R)),
            (true, "Tab") => Some(self.escape_dir(L)),
            (false, "Spacebar" | "Space") => {
                if self.mode == FieldMode::Text && self.cursor.parent == self.root {
                    return Some(KeystrokeOutcome::not_handled());
                }
                let in_text = matches!(
                    self.tree.get(self.cursor.parent).kind,
                    NodeKind::TextBlock
                );
                if self.options.space_behaves_like_tab
                    && self.cursor.parent != self.root
                    && !in_text
                {
                    Some(self.escape_dir(R))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn escape_dir(&mut self, dir: Direction) -> KeystrokeOutcome {
        if self.cursor.parent == self.root {
            return KeystrokeOutcome::not_handled();
        }
        self.cursor.clear_selection();
        self.move_out_of(dir);
        self.notify(StateChangeType::CursorMoved);
        KeystrokeOutcome::handled_no_scroll()
    }

    fn main_tier(&mut self, key: &Key) -> KeystrokeOutcome {
        if key.alt {
            return KeystrokeOutcome::not_handled();
        }
        let ctrl = key.ctrl || key.meta;
        match (ctrl, key.shift, key.name.as_str()) {
            (false, false, "Left") => {
                self.move_dir(L);
                KeystrokeOutcome::handled()
            }
            (false, false, "Right") => {
                self.move_dir(R);
                KeystrokeOutcome::handled()
            }
            (false, true, "Left") => {
                self.select_dir(L);
                KeystrokeOutcome::handled()
            }
            (false, true, "Right") => {
                self.select_dir(R);
                KeystrokeOutcome::handled()
            }
            (false, false, "Up") => {
                self.move_up_down(true);
                KeystrokeOutcome::handled()
            }
            (false, false, "Down") => {
                self.move_up_down(false);
                KeystrokeOutcome::handled()
            }
            (false, true, "Up") => {
                self.select_vertical(L);
                KeystrokeOutcome::handled()
            }
            (false, true, "Down") => {
                self.select_vertical(R);
                KeystrokeOutcome::handled()
            }
            (false, false, "Home") => {
                self.move_to_block_edge(L, false);
                KeystrokeOutcome::handled()
            }
            (true, false, "Home") => {
                self.move_to_block_edge(L, true);
                KeystrokeOutcome::handled()
            }
            (false, true, "Home") => {
                self.select_to_block_edge(L, false);
                KeystrokeOutcome::handled()
            }
            (true, true, "Home") => {
                self.select_to_block_edge(L, true);
                KeystrokeOutcome::handled()
            }
            (false, false, "End") => {
                self.move_to_block_edge(R, false);
                KeystrokeOutcome::handled()
            }
            (true, false, "End") => {
                self.move_to_block_edge(R, true);
                KeystrokeOutcome::handled()
            }
            (false, true, "End") => {
                self.select_to_block_edge(R, false);
                KeystrokeOutcome::handled()
            }
            (true, true, "End") => {
                self.select_to_block_edge(R, true);
                KeystrokeOutcome::handled()
            }
            (false, _, "Backspace") => {
                self.delete_dir(L);
                KeystrokeOutcome::handled()
            }
            (true, _, "Backspace") => {
                self.ctrl_delete_dir(L);
                KeystrokeOutcome::handled()
            }
            (false, _, "Del" | "Delete") => {
                self.delete_dir(R);
                KeystrokeOutcome::handled()
            }
            (true, _, "Del" | "Delete") => {
                self.ctrl_delete_dir(R);
                KeystrokeOutcome::handled()
            }
            (true, false, "A") => {
                self.select_all();
                KeystrokeOutcome::handled()
            }
            _ => KeystrokeOutcome::not_handled(),
        }
    }

    /// Move one step: hop a leaf, enter a command's facing block, or step
    /// out at a block edge. A selection collapses to its `dir` side.
    pub(crate) fn move_dir(&mut self, dir: Direction) {
        if let Some(selection) = self.cursor.selection {
            let end = selection.end(dir);
            self.cursor.ins_dir_of(&self.tree, dir, end);
            self.cursor.clear_selection();
            self.notify(StateChangeType::CursorMoved);
            return;
        }
        self.cursor.clear_selection();
        match self.cursor.neighbor(dir) {
            Some(node) => self.move_towards(dir, node),
            None => self.move_out_of(dir),
        }
        self.notify(StateChangeType::CursorMoved);
    }

    fn move_towards(&mut self, dir: Direction, node: NodeId) {
        match &self.tree.get(node).kind {
            kind if kind.is_leaf() => self.cursor.ins_dir_of(&self.tree, dir, node),
            NodeKind::TextBlock => {
                self.cursor.ins_at_dir_end(&self.tree, dir.opposite(), node)
            }
            NodeKind::CommandInput { body, .. } => {
                let body = *body;
                self.cursor.ins_at_dir_end(&self.tree, dir.opposite(), body);
            }
            _ => match self.tree.end(node, dir.opposite()) {
                Some(block) => self.cursor.ins_at_dir_end(&self.tree, dir.opposite(), block),
                None => self.cursor.ins_dir_of(&self.tree, dir, node),
            },
        }
    }

    /// Step out of the current block: into the next sibling block of the
    /// same command, or beside the command itself. At the root this is a
    /// no-op. Empty text blocks do not survive the exit.
    pub(crate) fn move_out_of(&mut self, dir: Direction) {
        let block = self.cursor.parent;
        if block == self.root {
            return;
        }
        if matches!(self.tree.get(block).kind, NodeKind::TextBlock) {
            self.leave_text_block(dir);
            return;
        }
        let Some(command) = self.tree.parent(block) else {
            return;
        };
        match self.tree.neighbor(block, dir) {
            Some(sibling) => self.cursor.ins_at_dir_end(&self.tree, dir.opposite(), sibling),
            None => self.cursor.ins_dir_of(&self.tree, dir, command),
        }
    }

    fn move_up_down(&mut self, up: bool) {
        self.cursor.clear_selection();
        if let Some(right) = self.cursor.right {
            if let Some(target) = vertical_target(&self.tree, right, up) {
                self.cursor.ins_at_left_end(&self.tree, target);
                self.notify(StateChangeType::CursorMoved);
                return;
            }
        }
        if let Some(left) = self.cursor.left {
            if let Some(target) = vertical_target(&self.tree, left, up) {
                self.cursor.ins_at_right_end(&self.tree, target);
                self.notify(StateChangeType::CursorMoved);
                return;
            }
        }
        // Bubble: climb until some enclosing command has a block in the
        // requested vertical direction.
        let mut block = self.cursor.parent;
        while let Some(command) = self.tree.parent(block) {
            let target = match &self.tree.get(command).kind {
                NodeKind::Fraction { numerator, denominator } => {
                    if up && block == *denominator {
                        Some(*numerator)
                    } else if !up && block == *numerator {
                        Some(*denominator)
                    } else {
                        None
                    }
                }
                NodeKind::SupSub { sub, sup } | NodeKind::LargeOperator { sub, sup } => {
                    if up && Some(block) == *sub {
                        *sup
                    } else if !up && Some(block) == *sup {
                        *sub
                    } else {
                        None
                    }
                }
                _ => None,
            };
            if let Some(target) = target {
                self.cursor.ins_at_right_end(&self.tree, target);
                self.notify(StateChangeType::CursorMoved);
                return;
            }
            block = match self.tree.parent(command) {
                Some(next) => next,
                None => break,
            };
        }
        self.notify(StateChangeType::CursorMoved);
    }

    fn move_to_block_edge(&mut self, dir: Direction, to_root: bool) {
        self.cursor.clear_selection();
        let target = if to_root { self.root } else { self.cursor.parent };
        self.cursor.ins_at_dir_end(&self.tree, dir, target);
        self.notify(StateChangeType::CursorMoved);
    }

    /// Delete one step. A selection is consumed first; otherwise the
    /// adjacent node decides: leaves and all-empty commands vanish, other
    /// commands are entered for piecewise deletion.
    pub(crate) fn delete_dir(&mut self, dir: Direction) {
        if self.delete_selection() {
            self.rescan_cursor_block();
            self.notify(StateChangeType::ContentModified);
            return;
        }
        match self.cursor.neighbor(dir) {
            Some(node) => self.delete_towards(dir, node),
            None => self.delete_out_of(dir),
        }
        self.rescan_cursor_block();
        self.notify(StateChangeType::ContentModified);
    }

    fn delete_towards(&mut self, dir: Direction, node: NodeId) {
        // With automatic subscripts on, deleting against a pair peels the
        // subscript from outside instead of entering it.
        if self.options.auto_subscript_numerals {
            if let NodeKind::SupSub { sub: Some(sub), .. } = self.tree.get(node).kind {
                self.peel_subscript(dir, node, sub);
                return;
            }
        }
        if self.tree.get(node).kind.is_leaf() || self.tree.all_blocks_empty(node) {
            // A pending backslash box deleted wholesale takes whatever it
            // replaced with it.
            if let NodeKind::CommandInput { replaced: Some((first, last)), .. } =
                self.tree.get(node).kind
            {
                Fragment::new(Some(first), Some(last)).remove(&mut self.tree);
            }
            let beyond = self.tree.neighbor(node, dir);
            let spoken = crate::latex::node_text(&self.tree, node);
            self.tree.remove(node);
            self.cursor.set_neighbor(dir, beyond);
            self.speak(&format!("deleted {}", spoken));
            return;
        }
        match &self.tree.get(node).kind {
            NodeKind::TextBlock => {
                self.cursor.ins_at_dir_end(&self.tree, dir.opposite(), node)
            }
            NodeKind::CommandInput { body, .. } => {
                let body = *body;
                self.cursor.ins_at_dir_end(&self.tree, dir.opposite(), body);
            }
            _ => {
                let block = self.tree.end(node, dir.opposite());
                pray(block.is_some(), "non-empty command has no blocks");
                self.cursor
                    .ins_at_dir_end(&self.tree, dir.opposite(), block.unwrap());
            }
        }
    }

    /// Peel the facing piece off a pair's subscript from outside. A leaf
    /// vanishes with the cursor staying put; a trailing command is deleted
    /// into recursively, the cursor moving inside the subscript. When the
    /// subscript empties it unpeels immediately, the cursor landing beside
    /// the pair (or at the seam once the whole pair is gone).
    fn peel_subscript(&mut self, dir: Direction, supsub: NodeId, sub: NodeId) {
        if let Some(target) = self.tree.end(sub, dir.opposite()) {
            if self.tree.get(target).kind.is_leaf() {
                self.tree.remove(target);
            } else {
                self.cursor.ins_at_dir_end(&self.tree, dir.opposite(), sub);
                self.delete_towards(dir, target);
            }
        }
        if self.tree.is_live(sub) && self.tree.is_empty_node(sub) {
            let had_sup = self.tree.script_block(supsub, Script::Sup).is_some();
            self.delete_out_of_sup_sub(supsub, sub);
            if had_sup {
                self.cursor.ins_dir_of(&self.tree, dir.opposite(), supsub);
            }
        }
    }

    /// Delete out of a block's edge: the enclosing command's teardown
    /// policy applies.
    fn delete_out_of(&mut self, dir: Direction) {
        let block = self.cursor.parent;
        if block == self.root {
            return;
        }
        if matches!(self.tree.get(block).kind, NodeKind::TextBlock) {
            if self.tree.is_empty_node(block) {
                let parent = self.tree.parent(block);
                pray(parent.is_some(), "text block has no parent");
                let left = self.tree.get(block).left;
                let right = self.tree.get(block).right;
                self.tree.remove(block);
                self.cursor.parent = parent.unwrap();
                self.cursor.left = left;
                self.cursor.right = right;
            } else {
                self.cursor.ins_dir_of(&self.tree, dir, block);
            }
            return;
        }
        let Some(command) = self.tree.parent(block) else {
            return;
        };
        match self.tree.get(command).kind {
            NodeKind::SupSub { .. } => self.delete_out_of_sup_sub(command, block),
            NodeKind::CommandInput { replaced, .. } => {
                self.unwrap_gramp(command, dir);
                // Tearing down an uncommitted backslash box brings back the
                // fragment it replaced, cursor on its left.
                if let Some((first, last)) = replaced {
                    let frag = Fragment::new(Some(first), Some(last));
                    frag.adopt(
                        &mut self.tree,
                        self.cursor.parent,
                        self.cursor.left,
                        self.cursor.right,
                    );
                    self.cursor.right = Some(first);
                }
            }
            NodeKind::Fraction { .. }
            | NodeKind::Radical { .. }
            | NodeKind::LargeOperator { .. }
            | NodeKind::MathSpan { .. } => self.unwrap_gramp(command, dir),
            _ => {}
        }
    }

    /// Splice every block's content into the grandparent in block order and
    /// remove the command; the cursor lands at the seam of the block it was
    /// in. Fractions and radicals unwrap this way, and so do large
    /// operators: deleting into an empty limit destroys the operator but
    /// its limit content survives, unbound.
    fn unwrap_gramp(&mut self, command: NodeId, dir: Direction) {
        let outer = self.tree.parent(command);
        pray(outer.is_some(), "command to unwrap has no parent");
        let outer = outer.unwrap();
        let cursor_block = self.cursor.parent;
        let mut insert_left = self.tree.get(command).left;
        let mut marker: Option<Option<NodeId>> = None;
        for block in self.tree.child_ids(command) {
            if block == cursor_block && dir == L {
                marker = Some(insert_left);
            }
            let frag = Fragment::new(self.tree.end(block, L), self.tree.end(block, R));
            if let Some(last) = frag.right() {
                frag.disown(&mut self.tree);
                frag.adopt(&mut self.tree, outer, insert_left, Some(command));
                insert_left = Some(last);
            }
            if block == cursor_block && dir == R {
                marker = Some(insert_left);
            }
        }
        self.tree.remove(command);
        self.cursor.parent = outer;
        match marker {
            Some(Some(seam)) => {
                self.cursor.left = Some(seam);
                self.cursor.right = self.tree.neighbor(seam, R);
            }
            _ => self.cursor.ins_at_left_end(&self.tree, outer),
        }
    }

    /// Deleting out of one block of a sup/sub pair removes only that block;
    /// its content survives beside the pair, and the pair itself goes once
    /// the last block is gone.
    fn delete_out_of_sup_sub(&mut self, supsub: NodeId, block: NodeId) {
        let frag = Fragment::new(self.tree.end(block, L), self.tree.end(block, R));
        if !frag.is_empty() {
            frag.disown(&mut self.tree);
        }
        let slot = if self.tree.script_block(supsub, Script::Sub) == Some(block) {
            Script::Sub
        } else {
            Script::Sup
        };
        self.tree.remove(block);
        if let NodeKind::SupSub { sub, sup } = &mut self.tree.get_mut(supsub).kind {
            match slot {
                Script::Sub => *sub = None,
                Script::Sup => *sup = None,
            }
        }
        let outer = self.tree.parent(supsub);
        pray(outer.is_some(), "sup/sub pair has no parent");
        let outer = outer.unwrap();
        if self.tree.child_ids(supsub).is_empty() {
            let left = self.tree.get(supsub).left;
            let right_after = self.tree.neighbor(supsub, R);
            frag.adopt(&mut self.tree, outer, left, Some(supsub));
            self.tree.remove(supsub);
            self.cursor.parent = outer;
            self.cursor.left = left;
            self.cursor.right = frag.left().or(right_after);
        } else {
            let right = self.tree.neighbor(supsub, R);
            frag.adopt(&mut self.tree, outer, Some(supsub), right);
            self.cursor.ins_right_of(&self.tree, supsub);
        }
    }

    /// Ctrl-Backspace/Del: take out the whole adjacent command, or the
    /// whole adjacent letter/digit run.
    fn ctrl_delete_dir(&mut self, dir: Direction) {
        if self.delete_selection() {
            self.rescan_cursor_block();
            self.notify(StateChangeType::ContentModified);
            return;
        }
        match self.cursor.neighbor(dir) {
            None => self.delete_out_of(dir),
            Some(node) => {
                let mut far = node;
                if word_piece(&self.tree.get(node).kind) {
                    while let Some(next) = self.tree.neighbor(far, dir) {
                        if !word_piece(&self.tree.get(next).kind) {
                            break;
                        }
                        far = next;
                    }
                }
                let beyond = self.tree.neighbor(far, dir);
                let frag = match dir {
                    L => Fragment::new(Some(far), Some(node)),
                    R => Fragment::new(Some(node), Some(far)),
                };
                frag.remove(&mut self.tree);
                self.cursor.set_neighbor(dir, beyond);
            }
        }
        self.rescan_cursor_block();
        self.notify(StateChangeType::ContentModified);
    }

    /// Extend the selection one step; whole nodes are hopped, never
    /// entered.
    pub(crate) fn select_dir(&mut self, dir: Direction) {
        if self.cursor.anticursor.is_none() {
            self.cursor.start_selection();
        }
        self.select_step(dir);
        self.cursor.select_from_anticursor(&self.tree);
        self.notify(StateChangeType::SelectionChanged);
    }

    fn select_step(&mut self, dir: Direction) {
        match self.cursor.neighbor(dir) {
            Some(node) => self.cursor.ins_dir_of(&self.tree, dir, node),
            None => {
                let block = self.cursor.parent;
                if block == self.root {
                    return;
                }
                if matches!(self.tree.get(block).kind, NodeKind::TextBlock) {
                    self.cursor.ins_dir_of(&self.tree, dir, block);
                } else if let Some(command) = self.tree.parent(block) {
                    self.cursor.ins_dir_of(&self.tree, dir, command);
                }
            }
        }
    }

    /// Shift-Up/Down: extend to the block edge when there is content on
    /// that side, else one step out.
    fn select_vertical(&mut self, dir: Direction) {
        if self.cursor.anticursor.is_none() {
            self.cursor.start_selection();
        }
        if self.cursor.neighbor(dir).is_some() {
            while let Some(node) = self.cursor.neighbor(dir) {
                self.cursor.ins_dir_of(&self.tree, dir, node);
            }
        } else {
            self.select_step(dir);
        }
        self.cursor.select_from_anticursor(&self.tree);
        self.notify(StateChangeType::SelectionChanged);
    }

    fn select_to_block_edge(&mut self, dir: Direction, to_root: bool) {
        if self.cursor.anticursor.is_none() {
            self.cursor.start_selection();
        }
        let target = if to_root { self.root } else { self.cursor.parent };
        self.cursor.ins_at_dir_end(&self.tree, dir, target);
        self.cursor.select_from_anticursor(&self.tree);
        self.notify(StateChangeType::SelectionChanged);
    }

    /// Select the entire field.
    pub fn select_all(&mut self) {
        self.cursor.clear_selection();
        self.cursor.ins_at_right_end(&self.tree, self.root);
        self.cursor.start_selection();
        self.cursor.ins_at_left_end(&self.tree, self.root);
        self.cursor.select_from_anticursor(&self.tree);
        self.notify(StateChangeType::SelectionChanged);
    }
}

fn word_piece(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::Letter { .. } | NodeKind::Digit { .. })
}
