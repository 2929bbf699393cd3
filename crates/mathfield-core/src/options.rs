//! Editor configuration.

/// Behavior switches owned by the controller and consulted by the write and
/// keystroke policies. All of them default to off.
#[derive(Debug, Clone)]
pub struct Options {
    /// Typing a digit immediately after a variable letter opens a subscript
    /// automatically, and `_` typed inside such a subscript is ignored.
    pub auto_subscript_numerals: bool,
    /// Characters that, typed at the right edge of a sup/sub block, hop the
    /// cursor out of the block before being written.
    pub chars_that_break_out_of_sup_sub: String,
    /// Pressing Space in a nested math block escapes rightward instead of
    /// being ignored.
    pub space_behaves_like_tab: bool,
    /// Maximum block nesting depth; writes that would exceed it are ignored.
    /// `None` means unlimited.
    pub max_depth: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            auto_subscript_numerals: false,
            chars_that_break_out_of_sup_sub: String::new(),
            space_behaves_like_tab: false,
            max_depth: None,
        }
    }
}

impl Options {
    /// Whether `ch` is configured to break out of sup/sub blocks.
    pub fn breaks_out_of_sup_sub(&self, ch: char) -> bool {
        self.chars_that_break_out_of_sup_sub.contains(ch)
    }
}
