//! Typed-character semantics.
//!
//! Everything a single typed character does to the tree lives here: leaf
//! insertion, `^`/`_` script handling, automatic subscripts, the backslash
//! input box, text-block splitting, and the operator-name rescan that keeps
//! letter runs like `ker` tokenized as `\ker`.

use tracing::debug;

use crate::controller::{Controller, FieldMode};
use crate::latex::block_text;
use crate::node::{NodeKind, Script};
use crate::registry::{CharCommand, Registry, WordCommand};
use crate::tree::{pray, Direction, Fragment, NodeId, Tree, L, R};

impl Controller {
    /// Write one typed character at the cursor. Dispatches on the cursor's
    /// container: text block, text root, backslash input box, math block.
    pub(crate) fn write_char(&mut self, ch: char) {
        if matches!(self.tree.get(self.cursor.parent).kind, NodeKind::TextBlock) {
            self.write_in_text_block(ch);
            return;
        }
        if self.mode == FieldMode::Text && self.cursor.parent == self.root {
            self.write_in_text_root(ch);
            return;
        }
        if let Some(grandparent) = self.tree.parent(self.cursor.parent) {
            if matches!(self.tree.get(grandparent).kind, NodeKind::CommandInput { .. }) {
                self.write_in_command_input(grandparent, ch);
                return;
            }
            if ch == '$' && matches!(self.tree.get(grandparent).kind, NodeKind::MathSpan { .. })
            {
                self.write_dollar_in_span(grandparent);
                return;
            }
        }
        self.write_math(ch);
    }

    /// A multi-char grapheme cluster enters the tree as one symbol (or as
    /// literal characters in text contexts).
    pub(crate) fn write_grapheme(&mut self, grapheme: &str) {
        if self.cursor_in_text_context() {
            for ch in grapheme.chars() {
                self.insert_text_char_literal(ch);
            }
            return;
        }
        self.delete_selection();
        let sym = self.tree.new_symbol(grapheme, grapheme);
        self.insert_node_at_cursor(sym);
    }

    fn write_math(&mut self, ch: char) {
        // Space has no meaning in math mode.
        if ch == ' ' {
            return;
        }
        if self.cursor.is_too_deep(&self.tree, self.options.max_depth) {
            debug!(%ch, "ignoring write beyond the depth cap");
            return;
        }
        // With automatic subscripts on and the cursor in a subscript, `_`
        // is ignored and command characters hop the cursor out beside the
        // pair first, so `x2^3` scripts the base rather than the subscript.
        if self.options.auto_subscript_numerals && self.cursor_in_subscript() {
            match self.registry.char_cmd(ch) {
                Some(CharCommand::Subscript) => return,
                Some(CharCommand::CommandInput | CharCommand::Superscript) => {
                    let supsub = self.tree.parent(self.cursor.parent);
                    pray(supsub.is_some(), "subscript block has no parent");
                    self.cursor.clear_selection();
                    self.cursor.ins_right_of(&self.tree, supsub.unwrap());
                }
                _ => {}
            }
        } else {
            self.break_out_of_sup_sub_if_configured(ch);
        }
        match self.registry.char_cmd(ch) {
            Some(CharCommand::CommandInput) => {
                let replaced = self.take_selection();
                self.open_command_input(replaced);
            }
            Some(CharCommand::Subscript) => {
                self.delete_selection();
                self.write_script(Script::Sub);
            }
            Some(CharCommand::Superscript) => {
                self.delete_selection();
                self.write_script(Script::Sup);
            }
            Some(CharCommand::EscapedSymbol { ctrl_seq, text }) => {
                self.delete_selection();
                let sym = self.tree.new_symbol(ctrl_seq, text);
                self.insert_node_at_cursor(sym);
            }
            None => {
                self.delete_selection();
                if ch.is_ascii_digit() {
                    self.write_digit(ch);
                } else if ch.is_ascii_alphabetic() {
                    let letter = self.tree.new_letter(ch);
                    self.insert_node_at_cursor(letter);
                } else {
                    let token = ch.to_string();
                    let sym = self.tree.new_symbol(&token, &token);
                    self.insert_node_at_cursor(sym);
                }
                self.rescan_cursor_block();
            }
        }
    }

    /// With a breakout character at the right edge of a sup/sub block, hop
    /// out before writing.
    fn break_out_of_sup_sub_if_configured(&mut self, ch: char) {
        if !self.options.breaks_out_of_sup_sub(ch) || self.cursor.selection.is_some() {
            return;
        }
        if self.cursor.left.is_none() || self.cursor.right.is_some() {
            return;
        }
        let Some(grandparent) = self.tree.parent(self.cursor.parent) else {
            return;
        };
        if matches!(
            self.tree.get(grandparent).kind,
            NodeKind::SupSub { .. } | NodeKind::LargeOperator { .. }
        ) {
            self.cursor.ins_right_of(&self.tree, grandparent);
        }
    }

    fn cursor_in_subscript(&self) -> bool {
        let Some(grandparent) = self.tree.parent(self.cursor.parent) else {
            return false;
        };
        self.tree.script_block(grandparent, Script::Sub) == Some(self.cursor.parent)
    }

    /// `^`/`_`: merge into an existing pair left of the cursor, else open a
    /// fresh one; cursor ends up inside the script block.
    fn write_script(&mut self, slot: Script) {
        if let Some(left) = self.cursor.left {
            if matches!(
                self.tree.get(left).kind,
                NodeKind::SupSub { .. } | NodeKind::LargeOperator { .. }
            ) {
                let block = match self.tree.script_block(left, slot) {
                    Some(existing) => existing,
                    None => self.tree.add_script_block(left, slot),
                };
                self.cursor.ins_at_right_end(&self.tree, block);
                return;
            }
        }
        let supsub = self.tree.new_sup_sub(slot);
        self.insert_node_at_cursor(supsub);
        let block = match self.tree.script_block(supsub, slot) {
            Some(block) => block,
            None => unreachable!(),
        };
        self.cursor.ins_at_left_end(&self.tree, block);
    }

    fn write_digit(&mut self, ch: char) {
        if self.options.auto_subscript_numerals && !self.cursor_in_subscript() {
            if let Some(site) = self.auto_subscript_site() {
                let block = match site {
                    Some(supsub) => match self.tree.script_block(supsub, Script::Sub) {
                        Some(existing) => existing,
                        None => self.tree.add_script_block(supsub, Script::Sub),
                    },
                    None => {
                        let supsub = self.tree.new_sup_sub(Script::Sub);
                        self.insert_node_at_cursor(supsub);
                        match self.tree.script_block(supsub, Script::Sub) {
                            Some(block) => block,
                            None => unreachable!(),
                        }
                    }
                };
                self.cursor.ins_at_right_end(&self.tree, block);
                let digit = self.tree.new_digit(ch);
                self.insert_node_at_cursor(digit);
                return;
            }
        }
        let digit = self.tree.new_digit(ch);
        self.insert_node_at_cursor(digit);
    }

    /// Where an automatic subscript would go: `Some(None)` opens a new pair
    /// after a variable letter, `Some(Some(supsub))` merges into the pair
    /// hanging off one, `None` means no automatic subscript here.
    fn auto_subscript_site(&self) -> Option<Option<NodeId>> {
        let left = self.cursor.left?;
        match &self.tree.get(left).kind {
            NodeKind::Letter { operator_part: false, .. } => Some(None),
            NodeKind::SupSub { .. } => {
                let before = self.tree.get(left).left?;
                matches!(
                    self.tree.get(before).kind,
                    NodeKind::Letter { operator_part: false, .. }
                )
                .then_some(Some(left))
            }
            _ => None,
        }
    }

    fn open_command_input(&mut self, replaced: Option<Fragment>) {
        let input = self.tree.new_command_input();
        if let Some(frag) = replaced {
            if let (Some(first), Some(last)) = (frag.left(), frag.right()) {
                if let NodeKind::CommandInput { replaced: slot, .. } =
                    &mut self.tree.get_mut(input).kind
                {
                    *slot = Some((first, last));
                }
            }
        }
        self.insert_node_at_cursor(input);
        let NodeKind::CommandInput { body, .. } = self.tree.get(input).kind else {
            unreachable!();
        };
        self.cursor.ins_at_right_end(&self.tree, body);
    }

    fn write_in_command_input(&mut self, input: NodeId, ch: char) {
        if ch.is_ascii_alphabetic() {
            let token = ch.to_string();
            let sym = self.tree.new_symbol(&token, &token);
            self.insert_node_at_cursor(sym);
            return;
        }
        let was_empty = {
            let NodeKind::CommandInput { body, .. } = self.tree.get(input).kind else {
                unreachable!();
            };
            self.tree.is_empty_node(body)
        };
        self.render_command_input(input);
        // A second backslash on an empty box just reopens it; anything else
        // gets written after the commit.
        if !(ch == '\\' && was_empty) {
            self.write_char(ch);
        }
    }

    /// Commit the backslash input box: resolve the accumulated name through
    /// the registry, build the command in its place, and hand over any
    /// replaced fragment. Unknown names degrade to a `\text{...}` block.
    pub(crate) fn render_command_input(&mut self, input: NodeId) {
        let NodeKind::CommandInput { body, replaced } = self.tree.get(input).kind else {
            pray(false, "render_command_input on a non-input node");
            unreachable!();
        };
        let mut name = block_text(&self.tree, body);
        if name.is_empty() {
            name.push(' ');
        }

        let parent = self.tree.parent(input);
        pray(parent.is_some(), "backslash input box is detached");
        let parent = parent.unwrap();
        let left = self.tree.get(input).left;
        let right = self.tree.get(input).right;
        self.tree.remove(input);
        self.cursor.parent = parent;
        self.cursor.left = left;
        self.cursor.right = right;
        self.cursor.clear_selection();

        let replaced = replaced.map(|(first, last)| Fragment::new(Some(first), Some(last)));
        match self.registry.word_cmd(&name) {
            Some(WordCommand::Fraction) => {
                let frac = self.tree.new_fraction();
                self.insert_node_at_cursor(frac);
                let NodeKind::Fraction { numerator, denominator } = self.tree.get(frac).kind
                else {
                    unreachable!();
                };
                match replaced {
                    Some(frag) => {
                        frag.adopt(&mut self.tree, numerator, None, None);
                        self.cursor.ins_at_right_end(&self.tree, denominator);
                    }
                    None => self.cursor.ins_at_right_end(&self.tree, numerator),
                }
            }
            Some(WordCommand::Radical) => {
                let radical = self.tree.new_radical(false);
                self.insert_node_at_cursor(radical);
                let NodeKind::Radical { radicand, .. } = self.tree.get(radical).kind else {
                    unreachable!();
                };
                if let Some(frag) = replaced {
                    frag.adopt(&mut self.tree, radicand, None, None);
                }
                self.cursor.ins_at_right_end(&self.tree, radicand);
            }
            Some(WordCommand::Text) => {
                if let Some(frag) = replaced {
                    frag.remove(&mut self.tree);
                }
                let text_block = self.tree.new_text_block();
                self.insert_node_at_cursor(text_block);
                self.cursor.ins_at_right_end(&self.tree, text_block);
            }
            Some(WordCommand::LargeOperator(token)) => {
                if let Some(frag) = replaced {
                    frag.remove(&mut self.tree);
                }
                let op = self.tree.new_large_operator(token);
                self.insert_node_at_cursor(op);
                let sub = self.tree.add_script_block(op, Script::Sub);
                self.tree.add_script_block(op, Script::Sup);
                self.cursor.ins_at_right_end(&self.tree, sub);
            }
            Some(WordCommand::Symbol { ctrl_seq, text }) => {
                if let Some(frag) = replaced {
                    frag.remove(&mut self.tree);
                }
                let sym = self.tree.new_symbol(ctrl_seq, text);
                self.insert_node_at_cursor(sym);
            }
            Some(WordCommand::OperatorName(op_name)) => {
                if let Some(frag) = replaced {
                    frag.remove(&mut self.tree);
                }
                for ch in op_name.chars() {
                    let letter = self.tree.new_letter(ch);
                    self.insert_node_at_cursor(letter);
                }
            }
            None => {
                if let Some(frag) = replaced {
                    frag.remove(&mut self.tree);
                }
                let text_block = self.tree.new_text_block();
                self.insert_node_at_cursor(text_block);
                let mut last = None;
                for ch in name.chars() {
                    let leaf = self.tree.new_text_char(ch);
                    Fragment::single(leaf).adopt(&mut self.tree, text_block, last, None);
                    last = Some(leaf);
                }
            }
        }
        self.rescan_cursor_block();
    }

    fn write_in_text_block(&mut self, ch: char) {
        self.delete_selection();
        if ch != '$' {
            self.insert_text_char_literal(ch);
            return;
        }
        let block = self.cursor.parent;
        if self.cursor.left.is_none() {
            self.leave_text_block(L);
        } else if self.cursor.right.is_none() {
            self.leave_text_block(R);
        } else {
            // Split into two adjacent text blocks; the cursor lands between
            // them, back in math.
            let left_frag = Fragment::new(self.tree.end(block, L), self.cursor.left);
            let parent = self.tree.parent(block);
            pray(parent.is_some(), "text block has no parent");
            let parent = parent.unwrap();
            let new_left = self.tree.new_text_block();
            left_frag.disown(&mut self.tree);
            let before = self.tree.get(block).left;
            Fragment::single(new_left).adopt(&mut self.tree, parent, before, Some(block));
            left_frag.adopt(&mut self.tree, new_left, None, None);
            self.cursor.ins_left_of(&self.tree, block);
        }
    }

    /// Step out of the current text block; an empty text block does not
    /// survive the exit.
    pub(crate) fn leave_text_block(&mut self, dir: Direction) {
        let block = self.cursor.parent;
        self.cursor.ins_dir_of(&self.tree, dir, block);
        if self.tree.is_empty_node(block) {
            let left = self.tree.get(block).left;
            let right = self.tree.get(block).right;
            self.tree.remove(block);
            self.cursor.left = left;
            self.cursor.right = right;
        }
    }

    fn write_in_text_root(&mut self, ch: char) {
        self.delete_selection();
        if ch == '$' {
            let span = self.tree.new_math_span();
            self.insert_node_at_cursor(span);
            let NodeKind::MathSpan { body } = self.tree.get(span).kind else {
                unreachable!();
            };
            self.cursor.ins_at_left_end(&self.tree, body);
        } else {
            self.insert_text_char_literal(ch);
        }
    }

    /// `$` inside a `$...$` span: an empty span collapses to a literal
    /// dollar, at either edge the cursor exits, in the middle it writes the
    /// escaped symbol.
    fn write_dollar_in_span(&mut self, span: NodeId) {
        let body = self.cursor.parent;
        if self.tree.is_empty_node(body) {
            let parent = self.tree.parent(span);
            pray(parent.is_some(), "math span has no parent");
            let parent = parent.unwrap();
            let left = self.tree.get(span).left;
            let right = self.tree.get(span).right;
            self.tree.remove(span);
            self.cursor.parent = parent;
            self.cursor.left = left;
            self.cursor.right = right;
            let sym = self.tree.new_symbol("\\$", "$");
            self.insert_node_at_cursor(sym);
        } else if self.cursor.right.is_none() {
            self.cursor.ins_right_of(&self.tree, span);
        } else if self.cursor.left.is_none() {
            self.cursor.ins_left_of(&self.tree, span);
        } else {
            self.write_math('$');
        }
    }
}

/// Re-mark operator-name letter runs in a math block.
///
/// Every letter is first reset to a plain variable, then maximal letter runs
/// are re-tokenized greedily, longest name first. A recognized run carries
/// its LaTeX across its letters: the first letter's token starts with the
/// backslash, the last one ends with the separating space (`\k`, `e`,
/// `r `), so plain left-to-right serialization reproduces `\ker `.
pub(crate) fn rescan_operator_names(tree: &mut Tree, registry: &Registry, block: NodeId) {
    let children = tree.child_ids(block);
    let mut letters: Vec<Option<char>> = Vec::with_capacity(children.len());
    for &id in &children {
        let ch = match &tree.get(id).kind {
            NodeKind::Letter { ch, .. } => Some(*ch),
            _ => None,
        };
        if let Some(ch) = ch {
            let node = tree.get_mut(id);
            node.kind = NodeKind::Letter { ch, operator_part: false };
            node.ctrl_seq = ch.to_string();
        }
        letters.push(ch);
    }

    let mut i = 0;
    while i < children.len() {
        if letters[i].is_none() {
            i += 1;
            continue;
        }
        let run_start = i;
        let mut run = String::new();
        while i < children.len() {
            match letters[i] {
                Some(ch) => {
                    run.push(ch);
                    i += 1;
                }
                None => break,
            }
        }
        mark_run(tree, registry, &children[run_start..i], &run);
    }
}

fn mark_run(tree: &mut Tree, registry: &Registry, ids: &[NodeId], run: &str) {
    let chars: Vec<char> = run.chars().collect();
    let mut j = 0;
    while j < chars.len() {
        let longest = registry.max_operator_name_len().min(chars.len() - j);
        let mut matched = 0;
        for len in (2..=longest).rev() {
            let candidate: String = chars[j..j + len].iter().collect();
            if registry.is_operator_name(&candidate) {
                matched = len;
                break;
            }
        }
        if matched == 0 {
            j += 1;
            continue;
        }
        for (k, &id) in ids[j..j + matched].iter().enumerate() {
            let ch = chars[j + k];
            let ctrl_seq = if k == 0 {
                format!("\\{}", ch)
            } else if k == matched - 1 {
                format!("{} ", ch)
            } else {
                ch.to_string()
            };
            let node = tree.get_mut(id);
            node.kind = NodeKind::Letter { ch, operator_part: true };
            node.ctrl_seq = ctrl_seq;
        }
        j += matched;
    }
}
