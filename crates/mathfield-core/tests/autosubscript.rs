//! Automatic subscripts after variable letters, and the outside-in
//! subscript peeling that deletion switches to when the option is on.

use mathfield_core::Controller;

fn field() -> Controller {
    let mut field = Controller::new();
    field.options_mut().auto_subscript_numerals = true;
    field
}

fn assert_latex(field: &Controller, latex: &str) {
    field.assert_well_formed();
    assert_eq!(field.get_latex(), latex);
}

#[test]
fn test_auto_subscripting_variables() {
    let mut field = field();
    field.set_latex("x");
    field.typed_text("2");
    assert_latex(&field, "x_2");
    field.typed_text("3");
    assert_latex(&field, "x_{23}");
}

#[test]
fn test_do_not_autosubscript_operator_name() {
    let mut field = field();
    field.set_latex("ker");
    field.typed_text("2");
    assert_latex(&field, "\\ker2");
    field.typed_text("3");
    assert_latex(&field, "\\ker23");
}

#[test]
fn test_autosubscript_exponentiated_variables() {
    let mut field = field();
    field.set_latex("x^2");
    field.typed_text("2");
    assert_latex(&field, "x_2^2");
    field.typed_text("3");
    assert_latex(&field, "x_{23}^2");
}

#[test]
fn test_do_not_autosubscript_exponentiated_operator_name() {
    let mut field = field();
    field.set_latex("ker^{2}");
    field.typed_text("2");
    assert_latex(&field, "\\ker^22");
    field.typed_text("3");
    assert_latex(&field, "\\ker^223");
}

#[test]
fn test_do_not_autosubscript_subscripted_operator_name() {
    let mut field = field();
    field.set_latex("ker_{10}");
    field.typed_text("2");
    assert_latex(&field, "\\ker_{10}2");
}

#[test]
fn test_superscript_typed_in_an_auto_subscript_applies_to_the_base() {
    let mut field = field();
    field.typed_text("x2^3");
    assert_latex(&field, "x_2^3");
}

#[test]
fn test_backslash_commands_typed_in_an_auto_subscript_follow_the_pair() {
    let mut field = field();
    field.typed_text("x2\\pi ");
    assert_latex(&field, "x_2\\pi");
}

#[test]
fn test_backspace_through_compound_subscript() {
    let mut field = field();
    field.set_latex("x_{2_2}");

    // First backspace moves the cursor into the subscript and peels off
    // the inner pair.
    field.keystroke("Backspace");
    assert_latex(&field, "x_2");

    // Second backspace clears out the remaining subscript.
    field.keystroke("Backspace");
    assert_latex(&field, "x_{ }");

    // Unpeel the subscript.
    field.keystroke("Backspace");
    assert_latex(&field, "x");
}

#[test]
fn test_backspace_through_simple_subscript() {
    let mut field = field();
    field.set_latex("x_{2+3}");
    assert_eq!(field.cursor().parent, field.root());

    // Backspace peels pieces off the subscript without leaving the root.
    field.keystroke("Backspace");
    assert_latex(&field, "x_{2+}");
    assert_eq!(field.cursor().parent, field.root());
    field.keystroke("Backspace");
    assert_latex(&field, "x_2");
    assert_eq!(field.cursor().parent, field.root());

    // The last peel empties the subscript and unpeels it in one step.
    field.keystroke("Backspace");
    assert_latex(&field, "x");
}

#[test]
fn test_backspace_through_subscript_and_superscript() {
    let mut field = field();
    field.set_latex("x_2^{32}");

    // First backspace peels off the subscript; the pair keeps its
    // exponent.
    field.keystroke("Backspace");
    assert_latex(&field, "x^{32}");

    // Second backspace goes into the exponent.
    field.keystroke("Backspace");
    assert_latex(&field, "x^{32}");

    // Clear out the exponent.
    field.keystroke("Backspace");
    field.keystroke("Backspace");
    assert_latex(&field, "x^{ }");

    // Unpeel the exponent.
    field.keystroke("Backspace");
    assert_latex(&field, "x");
}
