//! Controller: the public editing surface.
//!
//! A [`Controller`] owns one formula document end to end: the node arena,
//! the root block, the cursor, the options, and the command registry. Every
//! public entry point runs synchronously to completion and leaves the tree
//! well-formed; embedders talk to it through LaTeX strings, typed text,
//! logical keystroke names, and the subscribe/state-change channel.
//!
//! # Examples
//!
//! ```
//! use mathfield_core::Controller;
//!
//! let mut field = Controller::new();
//! field.typed_text("x");
//! field.typed_text("2");
//! field.keystroke("Left");
//! assert_eq!(field.get_latex(), "x2");
//! ```

use tracing::{debug, warn};
use unicode_segmentation::UnicodeSegmentation;

use crate::cursor::{pray_well_formed_point, Cursor};
use crate::latex::{
    block_latex, block_text, node_latex, normalize_command_spaces, parse_math_into,
    parse_text_into,
};
use crate::node::NodeKind;
use crate::options::Options;
use crate::registry::Registry;
use crate::tree::{Fragment, NodeId, Tree, R};
use crate::write::rescan_operator_names;

/// Which grammar the root block speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMode {
    /// The root is a math block.
    Math,
    /// The root holds literal text with `$...$` math islands.
    Text,
}

/// State change type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChangeType {
    /// Tree content edited in place.
    ContentModified,
    /// Whole content replaced (`set_latex`).
    ContentReplaced,
    /// Cursor moved without an edit.
    CursorMoved,
    /// Selection changed.
    SelectionChanged,
}

/// State change record handed to subscribers.
#[derive(Debug, Clone)]
pub struct StateChange {
    /// Change type.
    pub change_type: StateChangeType,
    /// Old version number.
    pub old_version: u64,
    /// New version number.
    pub new_version: u64,
}

/// State change callback function type.
pub type StateChangeCallback = Box<dyn FnMut(&StateChange) + Send>;

/// Speech announcement sink for accessibility integrations.
pub type SpeechSink = Box<dyn FnMut(&str) + Send>;

/// One headless formula editor instance.
pub struct Controller {
    pub(crate) tree: Tree,
    pub(crate) root: NodeId,
    pub(crate) cursor: Cursor,
    pub(crate) options: Options,
    pub(crate) registry: Registry,
    pub(crate) mode: FieldMode,
    version: u64,
    callbacks: Vec<StateChangeCallback>,
    speech_sink: Option<SpeechSink>,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("mode", &self.mode)
            .field("version", &self.version)
            .field("latex", &self.get_latex())
            .finish_non_exhaustive()
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    /// A fresh math-mode field with default options.
    pub fn new() -> Self {
        Self::with_mode(FieldMode::Math)
    }

    /// A fresh text-mode field (literal text with `$...$` math islands).
    pub fn new_text_field() -> Self {
        Self::with_mode(FieldMode::Text)
    }

    fn with_mode(mode: FieldMode) -> Self {
        let mut tree = Tree::new();
        let root = tree.new_block();
        let cursor = Cursor::new(&tree, root);
        Self {
            tree,
            root,
            cursor,
            options: Options::default(),
            registry: Registry::default(),
            mode,
            version: 0,
            callbacks: Vec::new(),
            speech_sink: None,
        }
    }

    /// A math-mode field with the given options.
    pub fn with_options(options: Options) -> Self {
        let mut controller = Self::new();
        controller.options = options;
        controller
    }

    /// The field's options.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Mutable access to the field's options.
    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    /// The field's mode.
    pub fn mode(&self) -> FieldMode {
        self.mode
    }

    /// Current version number; bumped by every notified change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The cursor (read-only; tests inspect it).
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// The node arena (read-only; tests inspect it).
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The root block id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Register a state change callback.
    pub fn subscribe(&mut self, callback: impl FnMut(&StateChange) + Send + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    /// Install the speech sink; structural edits announce human-readable
    /// strings through it, fire-and-forget.
    pub fn set_speech_sink(&mut self, sink: impl FnMut(&str) + Send + 'static) {
        self.speech_sink = Some(Box::new(sink));
    }

    pub(crate) fn speak(&mut self, message: &str) {
        if let Some(sink) = &mut self.speech_sink {
            sink(message);
        }
    }

    pub(crate) fn notify(&mut self, change_type: StateChangeType) {
        let old_version = self.version;
        self.version += 1;
        let change = StateChange {
            change_type,
            old_version,
            new_version: self.version,
        };
        for callback in &mut self.callbacks {
            callback(&change);
        }
    }

    /// Replace the whole content from math-mode LaTeX. A parse failure
    /// renders nothing (empty field) rather than erroring.
    pub fn set_latex(&mut self, src: &str) {
        self.clear_root();
        if let Err(err) = parse_math_into(&mut self.tree, &self.registry, self.root, src) {
            warn!(%err, "discarding unparseable latex");
            self.clear_root();
        }
        rescan_operator_names(&mut self.tree, &self.registry, self.root);
        self.cursor.ins_at_right_end(&self.tree, self.root);
        self.cursor.clear_selection();
        self.notify(StateChangeType::ContentReplaced);
        let spoken = self.text();
        self.speak(&spoken);
    }

    /// Replace the whole content from text-mode LaTeX (only meaningful for
    /// text fields). An unterminated `$` span closes implicitly; any other
    /// parse failure renders nothing.
    pub fn set_latex_text(&mut self, src: &str) {
        self.clear_root();
        if let Err(err) = parse_text_into(&mut self.tree, &self.registry, self.root, src) {
            warn!(%err, "discarding unparseable text-mode latex");
            self.clear_root();
        }
        self.cursor.ins_at_right_end(&self.tree, self.root);
        self.cursor.clear_selection();
        self.notify(StateChangeType::ContentReplaced);
    }

    fn clear_root(&mut self) {
        let frag = Fragment::new(
            self.tree.end(self.root, crate::tree::L),
            self.tree.end(self.root, R),
        );
        frag.remove(&mut self.tree);
        self.cursor = Cursor::new(&self.tree, self.root);
    }

    /// Normalized LaTeX export of the whole field.
    pub fn get_latex(&self) -> String {
        normalize_command_spaces(&block_latex(&self.tree, self.root))
    }

    /// Normalized LaTeX export of one node (tests and renderers).
    pub fn node_latex(&self, id: NodeId) -> String {
        normalize_command_spaces(&node_latex(&self.tree, id))
    }

    /// Parse math-mode LaTeX and splice it at the cursor. A parse failure
    /// leaves the field untouched.
    pub fn write_latex_at_cursor(&mut self, src: &str) {
        let staging = self.tree.new_block();
        if let Err(err) = parse_math_into(&mut self.tree, &self.registry, staging, src) {
            warn!(%err, "ignoring unparseable latex write");
            self.tree.remove(staging);
            return;
        }
        let frag = Fragment::new(
            self.tree.end(staging, crate::tree::L),
            self.tree.end(staging, R),
        );
        if let Some(last) = frag.right() {
            frag.disown(&mut self.tree);
            self.delete_selection();
            frag.adopt(
                &mut self.tree,
                self.cursor.parent,
                self.cursor.left,
                self.cursor.right,
            );
            self.cursor.left = Some(last);
        }
        self.tree.remove(staging);
        self.rescan_cursor_block();
        self.notify(StateChangeType::ContentModified);
    }

    /// Feed typed text through the write path, one grapheme cluster at a
    /// time. Combining sequences enter the tree as one symbol.
    pub fn typed_text(&mut self, text: &str) {
        for grapheme in text.graphemes(true) {
            let mut chars = grapheme.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => self.write_char(ch),
                (Some(_), Some(_)) => self.write_grapheme(grapheme),
                (None, _) => {}
            }
        }
        self.notify(StateChangeType::ContentModified);
        self.speak(text);
    }

    /// Paste text: the same write path, except that inside text blocks every
    /// character (including `$`, `\` and `{`) inserts literally.
    pub fn paste(&mut self, text: &str) {
        for grapheme in text.graphemes(true) {
            if self.cursor_in_text_context() {
                for ch in grapheme.chars() {
                    self.insert_text_char_literal(ch);
                }
            } else {
                let mut chars = grapheme.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => self.write_char(ch),
                    (Some(_), Some(_)) => self.write_grapheme(grapheme),
                    (None, _) => {}
                }
            }
        }
        self.notify(StateChangeType::ContentModified);
    }

    pub(crate) fn cursor_in_text_context(&self) -> bool {
        matches!(self.tree.get(self.cursor.parent).kind, NodeKind::TextBlock)
            || (self.mode == FieldMode::Text && self.cursor.parent == self.root)
    }

    pub(crate) fn insert_text_char_literal(&mut self, ch: char) {
        let leaf = self.tree.new_text_char(ch);
        self.insert_node_at_cursor(leaf);
    }

    pub(crate) fn insert_node_at_cursor(&mut self, node: NodeId) {
        Fragment::single(node).adopt(
            &mut self.tree,
            self.cursor.parent,
            self.cursor.left,
            self.cursor.right,
        );
        self.cursor.left = Some(node);
    }

    /// Remove the selected fragment, if any, collapsing the cursor at its
    /// place. Returns whether anything was removed.
    pub(crate) fn delete_selection(&mut self) -> bool {
        match self.take_selection() {
            Some(frag) => {
                frag.remove(&mut self.tree);
                true
            }
            None => false,
        }
    }

    /// Detach the selected fragment and collapse the cursor at its place,
    /// handing the content to the caller.
    pub(crate) fn take_selection(&mut self) -> Option<Fragment> {
        let selection = self.cursor.selection.take()?;
        self.cursor.anticursor = None;
        let parent = self.tree.parent(selection.left);
        let left = self.tree.get(selection.left).left;
        let right = self.tree.get(selection.right).right;
        let frag = selection.fragment();
        frag.disown(&mut self.tree);
        if let Some(parent) = parent {
            self.cursor.parent = parent;
        }
        self.cursor.left = left;
        self.cursor.right = right;
        Some(frag)
    }

    pub(crate) fn rescan_cursor_block(&mut self) {
        if matches!(self.tree.get(self.cursor.parent).kind, NodeKind::Block) {
            rescan_operator_names(&mut self.tree, &self.registry, self.cursor.parent);
        }
    }

    /// Lossy plaintext rendering of the whole field.
    pub fn text(&self) -> String {
        block_text(&self.tree, self.root)
    }

    /// One-directional HTML rendering of the whole field. Nodes carry
    /// `mathquill-command-id` and blocks `mathquill-block-id` attributes so
    /// a renderer can map markup back to addressable handles; the core never
    /// parses this markup back.
    pub fn html(&self) -> String {
        debug!(version = self.version, "rendering html");
        block_html(&self.tree, self.root)
    }

    /// Walk the whole tree and cursor and assert every structural
    /// invariant. Debug hook; tests call it after every step.
    pub fn assert_well_formed(&self) {
        self.tree.assert_well_formed_subtree(self.root);
        pray_well_formed_point(&self.tree, &self.cursor.point());
        if let Some(selection) = &self.cursor.selection {
            assert!(self.tree.is_live(selection.left));
            assert!(self.tree.is_live(selection.right));
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            ch => out.push(ch),
        }
    }
    out
}

fn block_html(tree: &Tree, block: NodeId) -> String {
    let inner: String = tree
        .child_ids(block)
        .iter()
        .map(|&id| node_html(tree, id))
        .collect();
    format!(
        "<span mathquill-block-id=\"{}\">{}</span>",
        block.index(),
        inner
    )
}

fn node_html(tree: &Tree, id: NodeId) -> String {
    let node = tree.get(id);
    let cmd = |inner: String| {
        format!(
            "<span mathquill-command-id=\"{}\">{}</span>",
            id.index(),
            inner
        )
    };
    match &node.kind {
        NodeKind::Block => block_html(tree, id),
        NodeKind::Symbol { text } => cmd(escape_html(text)),
        NodeKind::Letter { ch, operator_part } => {
            let class = if *operator_part { "mq-operator-name" } else { "mq-var" };
            format!(
                "<var class=\"{}\" mathquill-command-id=\"{}\">{}</var>",
                class,
                id.index(),
                escape_html(&ch.to_string())
            )
        }
        NodeKind::Digit { ch } | NodeKind::TextChar { ch } => cmd(escape_html(&ch.to_string())),
        NodeKind::Fraction { numerator, denominator } => cmd(format!(
            "{}{}",
            block_html(tree, *numerator),
            block_html(tree, *denominator)
        )),
        NodeKind::SupSub { sub, sup } | NodeKind::LargeOperator { sub, sup } => {
            let mut inner = String::new();
            if !node.ctrl_seq.starts_with('_') && !node.ctrl_seq.starts_with('^') {
                inner.push_str(&escape_html(node.ctrl_seq.trim()));
            }
            if let Some(sub) = sub {
                inner.push_str(&block_html(tree, *sub));
            }
            if let Some(sup) = sup {
                inner.push_str(&block_html(tree, *sup));
            }
            cmd(inner)
        }
        NodeKind::Radical { index, radicand } => {
            let mut inner = String::new();
            if let Some(index) = index {
                inner.push_str(&block_html(tree, *index));
            }
            inner.push_str(&block_html(tree, *radicand));
            cmd(inner)
        }
        NodeKind::TextBlock => cmd(escape_html(&block_text(tree, id))),
        NodeKind::MathSpan { body } => cmd(block_html(tree, *body)),
        NodeKind::CommandInput { body, .. } => cmd(format!("\\{}", block_text(tree, *body))),
    }
}
