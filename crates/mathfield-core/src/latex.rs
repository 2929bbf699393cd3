//! LaTeX parsing and serialization.
//!
//! The parser is a recursive-descent walk over a char stream, total over the
//! input alphabet: anything it cannot make sense of either degrades (unknown
//! `\name` becomes a `\text{name}` block) or comes back as a [`LatexError`]
//! that the controller recovers from at its boundary. The serializer folds
//! the tree back to a canonical string; [`export_latex`] additionally strips
//! the space after backslash-word tokens wherever no letter follows, so that
//! parsing a previously exported string reproduces the same tree.

use thiserror::Error;

use crate::node::{NodeKind, Script};
use crate::registry::{Registry, WordCommand};
use crate::tree::{Fragment, NodeId, Tree, R};

/// Recoverable parse failure. Never escapes the controller boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LatexError {
    /// Input ended inside an unclosed group or argument.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// A character that cannot start or continue anything at this position.
    #[error("unexpected {0:?} at offset {1}")]
    Unexpected(char, usize),
}

/// Char stream with one-char lookahead.
struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    fn new(src: &str) -> Self {
        Self { chars: src.chars().collect(), pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }
}

/// What ends the sequence currently being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    /// Top level: end of input.
    Eof,
    /// A `{...}` group: consumed closing `}` required.
    Brace,
    /// A `[...]` index: consumed closing `]` required.
    Bracket,
    /// A `$...$` span in a text root: `$` or end of input both close it.
    Dollar,
}

struct Parser<'a> {
    tree: &'a mut Tree,
    registry: &'a Registry,
    scanner: Scanner,
}

/// Parse math-mode LaTeX and append the result to `block`.
pub fn parse_math_into(
    tree: &mut Tree,
    registry: &Registry,
    block: NodeId,
    src: &str,
) -> Result<(), LatexError> {
    let mut parser = Parser { tree, registry, scanner: Scanner::new(src) };
    parser.parse_sequence(block, Stop::Eof)
}

/// Parse text-mode LaTeX (literal characters, `\$`/`\{`/`\}` escapes, and
/// `$...$` math re-entry) and append the result to `root`. An unterminated
/// `$` span is closed implicitly at end of input.
pub fn parse_text_into(
    tree: &mut Tree,
    registry: &Registry,
    root: NodeId,
    src: &str,
) -> Result<(), LatexError> {
    let mut parser = Parser { tree, registry, scanner: Scanner::new(src) };
    loop {
        let Some(ch) = parser.scanner.bump() else {
            return Ok(());
        };
        match ch {
            '\\' => match parser.scanner.peek() {
                Some('$') => {
                    parser.scanner.bump();
                    let sym = parser.tree.new_symbol("\\$", "$");
                    parser.append(root, sym);
                }
                Some('{') => {
                    parser.scanner.bump();
                    let sym = parser.tree.new_symbol("\\{", "{");
                    parser.append(root, sym);
                }
                Some('}') => {
                    parser.scanner.bump();
                    let sym = parser.tree.new_symbol("\\}", "}");
                    parser.append(root, sym);
                }
                _ => {
                    let ch = parser.tree.new_text_char('\\');
                    parser.append(root, ch);
                }
            },
            '$' => {
                let span = parser.tree.new_math_span();
                parser.append(root, span);
                let NodeKind::MathSpan { body } = parser.tree.get(span).kind else {
                    unreachable!();
                };
                parser.parse_sequence(body, Stop::Dollar)?;
            }
            ch => {
                let leaf = parser.tree.new_text_char(ch);
                parser.append(root, leaf);
            }
        }
    }
}

impl Parser<'_> {
    fn append(&mut self, block: NodeId, node: NodeId) {
        let last = self.tree.end(block, R);
        Fragment::single(node).adopt(self.tree, block, last, None);
    }

    fn parse_sequence(&mut self, block: NodeId, stop: Stop) -> Result<(), LatexError> {
        loop {
            self.scanner.skip_whitespace();
            match self.scanner.peek() {
                None => {
                    return match stop {
                        Stop::Eof | Stop::Dollar => Ok(()),
                        Stop::Brace | Stop::Bracket => Err(LatexError::UnexpectedEof),
                    };
                }
                Some('}') if stop == Stop::Brace => {
                    self.scanner.bump();
                    return Ok(());
                }
                Some(']') if stop == Stop::Bracket => {
                    self.scanner.bump();
                    return Ok(());
                }
                Some('$') if stop == Stop::Dollar => {
                    self.scanner.bump();
                    return Ok(());
                }
                Some('}') => {
                    return Err(LatexError::Unexpected('}', self.scanner.pos));
                }
                Some(_) => self.parse_token(block)?,
            }
        }
    }

    fn parse_token(&mut self, block: NodeId) -> Result<(), LatexError> {
        let ch = match self.scanner.bump() {
            Some(ch) => ch,
            None => return Err(LatexError::UnexpectedEof),
        };
        match ch {
            // Groups are transparent: their children land in `block`.
            '{' => self.parse_sequence(block, Stop::Brace),
            '\\' => self.parse_backslash(block),
            '^' => self.parse_script(block, Script::Sup),
            '_' => self.parse_script(block, Script::Sub),
            ch => {
                self.emit_literal(block, ch);
                Ok(())
            }
        }
    }

    fn emit_literal(&mut self, block: NodeId, ch: char) {
        let leaf = if ch.is_ascii_alphabetic() {
            self.tree.new_letter(ch)
        } else if ch.is_ascii_digit() {
            self.tree.new_digit(ch)
        } else if ch == '$' {
            self.tree.new_symbol("\\$", "$")
        } else {
            let token = ch.to_string();
            self.tree.new_symbol(&token, &token)
        };
        self.append(block, leaf);
    }

    fn parse_backslash(&mut self, block: NodeId) -> Result<(), LatexError> {
        match self.scanner.peek() {
            None => Err(LatexError::UnexpectedEof),
            Some(c) if c.is_ascii_alphabetic() => {
                let mut word = String::new();
                while let Some(c) = self.scanner.peek() {
                    if !c.is_ascii_alphabetic() {
                        break;
                    }
                    word.push(c);
                    self.scanner.bump();
                }
                self.parse_word_command(block, &word)
            }
            Some(c) => {
                // Escaped single character: \{  \}  \$  "\ " and friends.
                self.scanner.bump();
                let ctrl_seq = format!("\\{}", c);
                let text = c.to_string();
                let sym = self.tree.new_symbol(&ctrl_seq, &text);
                self.append(block, sym);
                Ok(())
            }
        }
    }

    fn parse_word_command(&mut self, block: NodeId, word: &str) -> Result<(), LatexError> {
        match self.registry.word_cmd(word) {
            Some(WordCommand::Fraction) => {
                let frac = self.tree.new_fraction();
                self.append(block, frac);
                let NodeKind::Fraction { numerator, denominator } = self.tree.get(frac).kind
                else {
                    unreachable!();
                };
                self.parse_argument(numerator)?;
                self.parse_argument(denominator)
            }
            Some(WordCommand::Radical) => {
                self.scanner.skip_whitespace();
                let with_index = self.scanner.peek() == Some('[');
                let radical = self.tree.new_radical(with_index);
                self.append(block, radical);
                let NodeKind::Radical { index, radicand } = self.tree.get(radical).kind else {
                    unreachable!();
                };
                if with_index {
                    self.scanner.bump();
                    self.parse_sequence(index.unwrap(), Stop::Bracket)?;
                }
                self.parse_argument(radicand)
            }
            Some(WordCommand::Text) => self.parse_text_block(block),
            Some(WordCommand::LargeOperator(token)) => {
                let op = self.tree.new_large_operator(token);
                self.append(block, op);
                // Greedy limit attachment; a repeated _ or ^ appends into
                // the existing limit block.
                loop {
                    self.scanner.skip_whitespace();
                    let slot = match self.scanner.peek() {
                        Some('_') => Script::Sub,
                        Some('^') => Script::Sup,
                        _ => return Ok(()),
                    };
                    self.scanner.bump();
                    let limit = match self.tree.script_block(op, slot) {
                        Some(existing) => existing,
                        None => self.tree.add_script_block(op, slot),
                    };
                    self.parse_argument(limit)?;
                }
            }
            Some(WordCommand::Symbol { ctrl_seq, text }) => {
                let sym = self.tree.new_symbol(ctrl_seq, text);
                self.append(block, sym);
                Ok(())
            }
            Some(WordCommand::OperatorName(name)) => {
                // Emitted as plain letters; the operator-name rescan marks
                // and re-tokenizes the run afterwards.
                for ch in name.chars() {
                    let letter = self.tree.new_letter(ch);
                    self.append(block, letter);
                }
                Ok(())
            }
            None => {
                // Unknown command: degrade to a text block, never an error.
                let text_block = self.tree.new_text_block();
                self.append(block, text_block);
                for ch in word.chars() {
                    let leaf = self.tree.new_text_char(ch);
                    self.append(text_block, leaf);
                }
                Ok(())
            }
        }
    }

    /// One command argument: a `{...}` group, a `\command`, or a single
    /// character (`\frac12` works).
    fn parse_argument(&mut self, block: NodeId) -> Result<(), LatexError> {
        self.scanner.skip_whitespace();
        match self.scanner.peek() {
            None => Err(LatexError::UnexpectedEof),
            Some('{') => {
                self.scanner.bump();
                self.parse_sequence(block, Stop::Brace)
            }
            Some('\\') => {
                self.scanner.bump();
                self.parse_backslash(block)
            }
            Some('}') => Err(LatexError::Unexpected('}', self.scanner.pos)),
            Some(ch) => {
                self.scanner.bump();
                self.emit_literal(block, ch);
                Ok(())
            }
        }
    }

    /// `^`/`_`: merge into a preceding sup/sub (or large operator) whose
    /// slot is free, otherwise open a fresh pair.
    fn parse_script(&mut self, block: NodeId, slot: Script) -> Result<(), LatexError> {
        let prev = self.tree.end(block, R);
        let target = match prev {
            Some(p)
                if matches!(
                    self.tree.get(p).kind,
                    NodeKind::SupSub { .. } | NodeKind::LargeOperator { .. }
                ) =>
            {
                match self.tree.script_block(p, slot) {
                    Some(existing) => existing,
                    None => self.tree.add_script_block(p, slot),
                }
            }
            _ => {
                let supsub = self.tree.new_sup_sub(slot);
                self.append(block, supsub);
                self.tree.script_block(supsub, slot).unwrap()
            }
        };
        self.parse_argument(target)
    }

    /// `\text{...}`: raw characters until the unescaped closing brace.
    fn parse_text_block(&mut self, block: NodeId) -> Result<(), LatexError> {
        self.scanner.skip_whitespace();
        if !self.scanner.eat('{') {
            return match self.scanner.peek() {
                Some(ch) => Err(LatexError::Unexpected(ch, self.scanner.pos)),
                None => Err(LatexError::UnexpectedEof),
            };
        }
        let text_block = self.tree.new_text_block();
        self.append(block, text_block);
        loop {
            match self.scanner.bump() {
                None => return Err(LatexError::UnexpectedEof),
                Some('}') => return Ok(()),
                Some('\\') => {
                    let ch = match self.scanner.peek() {
                        Some(c @ ('{' | '}' | '\\')) => {
                            self.scanner.bump();
                            c
                        }
                        _ => '\\',
                    };
                    let leaf = self.tree.new_text_char(ch);
                    self.append(text_block, leaf);
                }
                Some(ch) => {
                    let leaf = self.tree.new_text_char(ch);
                    self.append(text_block, leaf);
                }
            }
        }
    }
}

/// Serialize one node, children folded left to right.
pub fn node_latex(tree: &Tree, id: NodeId) -> String {
    let node = tree.get(id);
    match &node.kind {
        NodeKind::Block => block_latex(tree, id),
        NodeKind::Symbol { .. } => node.ctrl_seq.clone(),
        // Rescan may have re-tokenized the letter ("\\k", "e", "r ").
        NodeKind::Letter { .. } => node.ctrl_seq.clone(),
        NodeKind::Digit { ch } => ch.to_string(),
        NodeKind::TextChar { ch } => match ch {
            '{' => "\\{".to_string(),
            '}' => "\\}".to_string(),
            ch => ch.to_string(),
        },
        NodeKind::Fraction { numerator, denominator } => format!(
            "\\frac{}{}",
            braced(tree, *numerator),
            braced(tree, *denominator)
        ),
        NodeKind::SupSub { sub, sup } => {
            let mut out = String::new();
            if let Some(sub) = sub {
                out.push('_');
                out.push_str(&script(tree, *sub));
            }
            if let Some(sup) = sup {
                out.push('^');
                out.push_str(&script(tree, *sup));
            }
            out
        }
        // Radicals serialize their blocks raw: an empty radicand is `{}`.
        NodeKind::Radical { index, radicand } => match index {
            Some(index) => format!(
                "\\sqrt[{}]{{{}}}",
                block_latex(tree, *index),
                block_latex(tree, *radicand)
            ),
            None => format!("\\sqrt{{{}}}", block_latex(tree, *radicand)),
        },
        NodeKind::LargeOperator { sub, sup } => {
            let mut out = node.ctrl_seq.clone();
            if let Some(sub) = sub {
                out.push('_');
                out.push_str(&script(tree, *sub));
            }
            if let Some(sup) = sup {
                out.push('^');
                out.push_str(&script(tree, *sup));
            }
            out
        }
        NodeKind::TextBlock => {
            if tree.is_empty_node(id) {
                String::new()
            } else {
                format!("\\text{{{}}}", block_latex(tree, id))
            }
        }
        NodeKind::MathSpan { body } => format!("${}$", block_latex(tree, *body)),
        NodeKind::CommandInput { body, .. } => {
            format!("\\{} ", block_text(tree, *body))
        }
    }
}

/// Serialize a block's children, concatenated.
pub fn block_latex(tree: &Tree, block: NodeId) -> String {
    tree.child_ids(block)
        .iter()
        .map(|&id| node_latex(tree, id))
        .collect()
}

/// Serialize a text-mode root: literal characters and `$...$` spans.
pub fn text_root_latex(tree: &Tree, root: NodeId) -> String {
    block_latex(tree, root)
}

/// A block as a brace-wrapped argument; empty blocks render `{ }`.
fn braced(tree: &Tree, block: NodeId) -> String {
    let inner = block_latex(tree, block);
    if inner.is_empty() {
        "{ }".to_string()
    } else {
        format!("{{{}}}", inner)
    }
}

/// A sup/sub/limit block with the single-token shorthand (`x_2` not
/// `x_{2}`).
fn script(tree: &Tree, block: NodeId) -> String {
    let inner = block_latex(tree, block);
    if inner.chars().count() == 1 {
        inner
    } else {
        braced(tree, block)
    }
}

/// Strip the space after each backslash-word token unless a letter follows.
/// `\ker 2` becomes `\ker2`; `\ker x` keeps its separating space; the
/// backslash-space escape `\ ` is untouched.
pub fn normalize_command_spaces(src: &str) -> String {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len());
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        out.push(ch);
        if ch == '\\' {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_ascii_alphabetic() {
                out.push(chars[j]);
                j += 1;
            }
            let followed_by_letter =
                matches!(chars.get(j + 1), Some(c) if c.is_ascii_alphabetic());
            if j > i + 1 && chars.get(j) == Some(&' ') && !followed_by_letter {
                j += 1;
            }
            i = j;
        } else {
            i += 1;
        }
    }
    out
}

/// Normalized export of a math root, the string handed back by `get_latex`.
pub fn export_latex(tree: &Tree, root: NodeId) -> String {
    normalize_command_spaces(&block_latex(tree, root))
}

/// Lossy plaintext rendering of one node.
pub fn node_text(tree: &Tree, id: NodeId) -> String {
    let node = tree.get(id);
    match &node.kind {
        NodeKind::Block | NodeKind::TextBlock => block_text(tree, id),
        NodeKind::Symbol { text } => text.clone(),
        NodeKind::Letter { ch, .. } => ch.to_string(),
        NodeKind::Digit { ch } => ch.to_string(),
        NodeKind::TextChar { ch } => ch.to_string(),
        NodeKind::Fraction { numerator, denominator } => format!(
            "({})/({})",
            block_text(tree, *numerator),
            block_text(tree, *denominator)
        ),
        NodeKind::SupSub { sub, sup } => {
            let mut out = String::new();
            if let Some(sub) = sub {
                out.push('_');
                out.push_str(&block_text(tree, *sub));
            }
            if let Some(sup) = sup {
                out.push('^');
                out.push_str(&block_text(tree, *sup));
            }
            out
        }
        NodeKind::Radical { index, radicand } => match index {
            Some(index) => format!(
                "sqrt[{}]({})",
                block_text(tree, *index),
                block_text(tree, *radicand)
            ),
            None => format!("sqrt({})", block_text(tree, *radicand)),
        },
        NodeKind::LargeOperator { sub, sup } => {
            let mut out = node
                .ctrl_seq
                .trim_start_matches('\\')
                .trim_end()
                .to_string();
            if let Some(sub) = sub {
                out.push('_');
                out.push_str(&block_text(tree, *sub));
            }
            if let Some(sup) = sup {
                out.push('^');
                out.push_str(&block_text(tree, *sup));
            }
            out
        }
        NodeKind::MathSpan { body } => block_text(tree, *body),
        NodeKind::CommandInput { body, .. } => format!("\\{}", block_text(tree, *body)),
    }
}

/// Lossy plaintext rendering of a block's children.
pub fn block_text(tree: &Tree, block: NodeId) -> String {
    tree.child_ids(block)
        .iter()
        .map(|&id| node_text(tree, id))
        .collect()
}
