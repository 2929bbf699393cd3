//! Text blocks inside math fields and the text-root field mode.

use mathfield_core::{Controller, NodeKind};

fn assert_latex(field: &Controller, latex: &str) {
    field.assert_well_formed();
    assert_eq!(field.get_latex(), latex);
}

#[test]
fn test_moving_around_does_not_change_latex() {
    let mut field = Controller::new();
    field.set_latex("\\text{x}");

    field.keystroke("Left");
    field.keystroke("Left");
    field.keystroke("Left");
    assert_latex(&field, "\\text{x}");
}

#[test]
fn test_moving_left_walks_through_a_text_block() {
    let mut field = Controller::new();
    field.set_latex("\\text{abc}");
    let block = field.tree().child_ids(field.root())[0];

    // Entering from the right, then hopping each character.
    field.keystroke("Left");
    assert_eq!(field.cursor().parent, block);
    assert_eq!(field.cursor().right, None);

    field.keystroke("Left");
    field.keystroke("Left");
    field.keystroke("Left");
    assert_eq!(field.cursor().parent, block);
    assert_eq!(field.cursor().left, None);

    // One more step exits to the left of the block.
    field.keystroke("Left");
    assert_eq!(field.cursor().parent, field.root());
    assert_eq!(field.cursor().right, Some(block));
    assert_latex(&field, "\\text{abc}");
}

#[test]
fn test_stepping_out_of_an_empty_text_block_deletes_it() {
    let mut field = Controller::new();
    field.set_latex("\\text{x}");
    assert_latex(&field, "\\text{x}");

    field.keystroke("Left");
    assert_latex(&field, "\\text{x}");

    field.keystroke("Backspace");
    assert_latex(&field, "");

    field.keystroke("Right");
    assert_eq!(field.cursor().parent, field.root());
    assert_eq!(field.cursor().left, None);
    assert_latex(&field, "");
}

#[test]
fn test_typing_dollar_in_a_text_block_splits_it() {
    let mut field = Controller::new();
    field.set_latex("\\text{asdf}");
    assert_latex(&field, "\\text{asdf}");

    field.keystroke("Left");
    field.keystroke("Left");
    field.keystroke("Left");
    assert_latex(&field, "\\text{asdf}");

    // The cursor sits between "as" and "df"; $ splits and drops the cursor
    // between the halves, back in math.
    field.typed_text("$");
    assert_latex(&field, "\\text{as}\\text{df}");
    assert_eq!(field.cursor().parent, field.root());
}

#[test]
fn test_typing_dollar_at_a_text_block_edge_steps_out() {
    let mut field = Controller::new();
    field.set_latex("\\text{ab}");
    field.keystroke("Left");

    // At the right edge $ exits without splitting.
    field.typed_text("$");
    assert_eq!(field.cursor().parent, field.root());
    assert_latex(&field, "\\text{ab}");
}

#[test]
fn test_paste_sanity() {
    let mut field = Controller::new();
    field.set_latex("\\text{asdf}");
    field.keystroke("Left");
    field.keystroke("Left");
    field.keystroke("Left");

    field.paste("foo");
    assert_latex(&field, "\\text{asfoodf}");
}

#[test]
fn test_pasting_a_dollar_sign() {
    let mut field = Controller::new();
    field.set_latex("\\text{asdf}");
    field.keystroke("Left");
    field.keystroke("Left");
    field.keystroke("Left");

    // Pasted $ inserts literally instead of splitting the block.
    field.paste("$foo");
    assert_latex(&field, "\\text{as$foodf}");
}

#[test]
fn test_pasting_a_backslash() {
    let mut field = Controller::new();
    field.set_latex("\\text{asdf}");
    field.keystroke("Left");
    field.keystroke("Left");
    field.keystroke("Left");

    field.paste("\\pi");
    assert_latex(&field, "\\text{as\\pidf}");
}

#[test]
fn test_pasting_a_curly_brace() {
    let mut field = Controller::new();
    field.set_latex("\\text{asdf}");
    field.keystroke("Left");
    field.keystroke("Left");
    field.keystroke("Left");

    field.paste("{");
    assert_latex(&field, "\\text{as\\{df}");
}

#[test]
fn test_text_root_typing_and_math_islands() {
    let mut field = Controller::new_text_field();
    field.typed_text("sum of ");
    field.typed_text("$");

    // The $ opened a math island; typed text inside it is math.
    let span = field.tree().child_ids(field.root())[7];
    assert!(matches!(field.tree().get(span).kind, NodeKind::MathSpan { .. }));
    field.typed_text("x^2");
    field.assert_well_formed();
    assert_eq!(field.get_latex(), "sum of $x^2$");

    // A closing $ at the right edge exits the island.
    field.keystroke("Right");
    field.typed_text("$");
    field.typed_text("!");
    assert_latex(&field, "sum of $x^2$!");
}

#[test]
fn test_dollar_in_an_empty_span_collapses_to_a_literal_dollar() {
    let mut field = Controller::new_text_field();
    field.typed_text("$");
    field.typed_text("$");
    field.assert_well_formed();
    assert_eq!(field.get_latex(), "\\$");
    assert_eq!(field.text(), "$");
}

#[test]
fn test_text_root_parsing_tolerates_an_unterminated_span() {
    let mut field = Controller::new_text_field();
    field.set_latex_text("hi $x");
    field.assert_well_formed();
    assert_eq!(field.get_latex(), "hi $x$");
}

#[test]
fn test_space_in_the_text_root_is_not_consumed_as_tab() {
    let mut field = Controller::new_text_field();
    field.options_mut().space_behaves_like_tab = true;
    field.typed_text("ab");
    let outcome = field.keystroke("Space");
    assert!(!outcome.handled);
    assert_latex(&field, "ab");
}
