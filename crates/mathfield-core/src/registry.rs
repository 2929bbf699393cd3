//! Command lookup tables.
//!
//! All commands are registered in one explicit pass inside
//! [`Registry::default`], so the available command set is a function of this
//! file alone rather than of load order. The write path consults the char
//! table first; the parser and the backslash input box share the word table.

use std::collections::{HashMap, HashSet};

/// What a single typed character maps to, before falling through to the
/// generic symbol constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharCommand {
    /// `\` opens the backslash input box.
    CommandInput,
    /// `_` opens or extends a subscript.
    Subscript,
    /// `^` opens or extends a superscript.
    Superscript,
    /// `{`, `}` and `$` render as their escaped symbol in math mode.
    EscapedSymbol {
        /// Canonical LaTeX token (`"\\{"`, `"\\$"`).
        ctrl_seq: &'static str,
        /// Plaintext rendering.
        text: &'static str,
    },
}

/// What a backslash-word resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordCommand {
    /// `\frac{..}{..}`.
    Fraction,
    /// `\sqrt{..}` / `\sqrt[..]{..}`.
    Radical,
    /// `\text{..}`.
    Text,
    /// A large operator owning its limit blocks; the token carries its
    /// trailing space (`"\\sum "`).
    LargeOperator(&'static str),
    /// A vanilla symbol.
    Symbol {
        /// Canonical LaTeX token, trailing space included (`"\\pi "`).
        ctrl_seq: &'static str,
        /// Plaintext rendering.
        text: &'static str,
    },
    /// A named operator (`\ker`, `\sin`, ...) rendered as upright letters.
    OperatorName(&'static str),
}

/// The command tables: char commands, backslash words, and the
/// auto-operator-name set used by the letter rescan.
#[derive(Debug)]
pub struct Registry {
    char_cmds: HashMap<char, CharCommand>,
    word_cmds: HashMap<&'static str, WordCommand>,
    operator_names: HashSet<&'static str>,
    max_operator_name_len: usize,
}

impl Default for Registry {
    fn default() -> Self {
        let mut r = Self {
            char_cmds: HashMap::new(),
            word_cmds: HashMap::new(),
            operator_names: HashSet::new(),
            max_operator_name_len: 0,
        };

        r.char_cmds.insert('\\', CharCommand::CommandInput);
        r.char_cmds.insert('_', CharCommand::Subscript);
        r.char_cmds.insert('^', CharCommand::Superscript);
        r.char_cmds.insert(
            '{',
            CharCommand::EscapedSymbol { ctrl_seq: "\\{", text: "{" },
        );
        r.char_cmds.insert(
            '}',
            CharCommand::EscapedSymbol { ctrl_seq: "\\}", text: "}" },
        );
        r.char_cmds.insert(
            '$',
            CharCommand::EscapedSymbol { ctrl_seq: "\\$", text: "$" },
        );

        r.word_cmds.insert("frac", WordCommand::Fraction);
        r.word_cmds.insert("sqrt", WordCommand::Radical);
        r.word_cmds.insert("text", WordCommand::Text);

        r.word_cmds.insert("sum", WordCommand::LargeOperator("\\sum "));
        r.word_cmds.insert("prod", WordCommand::LargeOperator("\\prod "));
        r.word_cmds.insert("int", WordCommand::LargeOperator("\\int "));

        for (name, ctrl_seq, text) in [
            ("alpha", "\\alpha ", "α"),
            ("beta", "\\beta ", "β"),
            ("gamma", "\\gamma ", "γ"),
            ("delta", "\\delta ", "δ"),
            ("epsilon", "\\epsilon ", "ε"),
            ("zeta", "\\zeta ", "ζ"),
            ("eta", "\\eta ", "η"),
            ("theta", "\\theta ", "θ"),
            ("lambda", "\\lambda ", "λ"),
            ("mu", "\\mu ", "μ"),
            ("pi", "\\pi ", "π"),
            ("rho", "\\rho ", "ρ"),
            ("sigma", "\\sigma ", "σ"),
            ("tau", "\\tau ", "τ"),
            ("phi", "\\phi ", "φ"),
            ("chi", "\\chi ", "χ"),
            ("psi", "\\psi ", "ψ"),
            ("omega", "\\omega ", "ω"),
            ("Gamma", "\\Gamma ", "Γ"),
            ("Delta", "\\Delta ", "Δ"),
            ("Theta", "\\Theta ", "Θ"),
            ("Lambda", "\\Lambda ", "Λ"),
            ("Pi", "\\Pi ", "Π"),
            ("Sigma", "\\Sigma ", "Σ"),
            ("Phi", "\\Phi ", "Φ"),
            ("Psi", "\\Psi ", "Ψ"),
            ("Omega", "\\Omega ", "Ω"),
            ("pm", "\\pm ", "±"),
            ("mp", "\\mp ", "∓"),
            ("cdot", "\\cdot ", "·"),
            ("times", "\\times ", "×"),
            ("div", "\\div ", "÷"),
            ("infty", "\\infty ", "∞"),
            ("leq", "\\leq ", "≤"),
            ("geq", "\\geq ", "≥"),
            ("neq", "\\neq ", "≠"),
            ("approx", "\\approx ", "≈"),
            ("rightarrow", "\\rightarrow ", "→"),
            ("leftarrow", "\\leftarrow ", "←"),
            ("cup", "\\cup ", "∪"),
            ("cap", "\\cap ", "∩"),
            ("subset", "\\subset ", "⊂"),
            ("supset", "\\supset ", "⊃"),
            ("in", "\\in ", "∈"),
            ("forall", "\\forall ", "∀"),
            ("exists", "\\exists ", "∃"),
            ("partial", "\\partial ", "∂"),
            ("nabla", "\\nabla ", "∇"),
        ] {
            r.word_cmds.insert(name, WordCommand::Symbol { ctrl_seq, text });
        }

        for name in [
            "sin", "cos", "tan", "sec", "csc", "cot", "sinh", "cosh", "tanh",
            "ker", "log", "ln", "lim", "min", "max", "gcd", "det", "dim",
            "exp", "arg", "deg",
        ] {
            r.register_operator_name(name);
        }

        r
    }
}

impl Registry {
    fn register_operator_name(&mut self, name: &'static str) {
        self.word_cmds.insert(name, WordCommand::OperatorName(name));
        self.operator_names.insert(name);
        self.max_operator_name_len = self.max_operator_name_len.max(name.len());
    }

    /// Resolve a typed character. `None` falls through to the generic
    /// constructor.
    pub fn char_cmd(&self, ch: char) -> Option<CharCommand> {
        self.char_cmds.get(&ch).copied()
    }

    /// Resolve a backslash word. `None` degrades to `\text{name}`.
    pub fn word_cmd(&self, name: &str) -> Option<WordCommand> {
        self.word_cmds.get(name).copied()
    }

    /// Whether `name` is a recognized operator name.
    pub fn is_operator_name(&self, name: &str) -> bool {
        self.operator_names.contains(name)
    }

    /// Length of the longest registered operator name, bounding the rescan
    /// lookahead.
    pub fn max_operator_name_len(&self) -> usize {
        self.max_operator_name_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_commands_take_precedence_symbols_fall_through() {
        let r = Registry::default();
        assert_eq!(r.char_cmd('\\'), Some(CharCommand::CommandInput));
        assert_eq!(r.char_cmd('_'), Some(CharCommand::Subscript));
        assert_eq!(r.char_cmd('+'), None);
    }

    #[test]
    fn word_lookup_covers_commands_symbols_and_operator_names() {
        let r = Registry::default();
        assert_eq!(r.word_cmd("frac"), Some(WordCommand::Fraction));
        assert!(matches!(r.word_cmd("pi"), Some(WordCommand::Symbol { .. })));
        assert_eq!(r.word_cmd("ker"), Some(WordCommand::OperatorName("ker")));
        assert_eq!(r.word_cmd("nosuchcommand"), None);
    }

    #[test]
    fn operator_name_set_bounds_the_rescan() {
        let r = Registry::default();
        assert!(r.is_operator_name("sinh"));
        assert!(!r.is_operator_name("sine"));
        assert!(r.max_operator_name_len() >= 4);
    }
}
