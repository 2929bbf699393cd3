//! Parse/serialize round-tripping.
//!
//! The serializer is normalizing, so the property is a fixpoint: parsing an
//! exported string and exporting again reproduces it exactly. The property
//! tests drive a field with random typed text and keystrokes and check the
//! fixpoint plus tree well-formedness after every burst.

use mathfield_core::latex::normalize_command_spaces;
use mathfield_core::Controller;
use proptest::prelude::*;

/// Parse, export, reparse, export again; the two exports must agree.
fn export_fixpoint(src: &str) -> String {
    let mut first = Controller::new();
    first.set_latex(src);
    first.assert_well_formed();
    let exported = first.get_latex();

    let mut second = Controller::new();
    second.set_latex(&exported);
    second.assert_well_formed();
    assert_eq!(second.get_latex(), exported, "export of {:?} is not a fixpoint", src);
    exported
}

#[test]
fn test_canonical_strings_survive_unchanged() {
    for latex in [
        "",
        "1+2=3",
        "x_2",
        "x_{23}^2",
        "\\frac{1}{2}",
        "\\frac{ }{ }",
        "\\sqrt{x+1}",
        "\\sqrt[3]{2}",
        "\\sqrt[3]{}",
        "\\sum_{n=1}^3x",
        "\\pi r^2",
        "\\alpha+\\beta",
        "\\sin x",
        "\\text{hello world}",
        "\\text{a\\{b\\}c}",
        "a\\cdot b\\leq c\\neq d",
        "x^{ }",
    ] {
        assert_eq!(export_fixpoint(latex), latex);
    }
}

#[test]
fn test_non_canonical_input_normalizes() {
    for (src, expected) in [
        ("x ^ 2", "x^2"),
        ("\\frac12", "\\frac{1}{2}"),
        ("\\frac{1}2", "\\frac{1}{2}"),
        ("{x}+{y}", "x+y"),
        ("x^{2}", "x^2"),
        ("\\sum _{n=1}^{3}x", "\\sum_{n=1}^3x"),
        ("\\ker 2", "\\ker2"),
        ("\\pi ", "\\pi"),
        ("\\nosuchcmd ", "\\text{nosuchcmd}"),
    ] {
        assert_eq!(export_fixpoint(src), expected, "for input {:?}", src);
    }
}

#[test]
fn test_operator_name_runs_retokenize_on_parse() {
    // Plain letters that spell an operator name come back tokenized.
    assert_eq!(export_fixpoint("sin"), "\\sin");
    assert_eq!(export_fixpoint("sinker"), "\\sin\\ker");
    assert_eq!(export_fixpoint("arcsinx"), "arc\\sin x");
}

#[test]
fn test_text_roundtrip_keeps_literals() {
    let mut field = Controller::new_text_field();
    field.set_latex_text("for $n\\geq1$, n books cost $\\$n$");
    field.assert_well_formed();
    assert_eq!(field.get_latex(), "for $n\\geq1$, n books cost $\\$n$");
}

#[test]
fn test_normalization_is_idempotent_on_fixtures() {
    for latex in ["\\sum _{n=1}^3x", "\\pi r", "\\ker 2", "a\\neq b", "\\sin \\ker "] {
        let once = normalize_command_spaces(latex);
        assert_eq!(normalize_command_spaces(&once), once);
    }
}

// Characters that never leave a pending backslash box behind, so the
// export is a complete formula.
fn math_char() -> impl Strategy<Value = char> {
    prop::sample::select(vec![
        'a', 'b', 'x', 'y', 'z', 'k', 'e', 'r', 's', 'i', 'n', '0', '1', '2', '9', '+', '-',
        '=', '/', '.', ',', '<', '>', '^', '_', '$', ' ',
    ])
}

fn keystroke_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "Left",
        "Right",
        "Up",
        "Down",
        "Backspace",
        "Del",
        "Shift-Left",
        "Shift-Right",
        "Home",
        "End",
        "Tab",
    ])
}

proptest! {
    #[test]
    fn typed_text_exports_a_fixpoint(chars in proptest::collection::vec(math_char(), 0..40)) {
        let mut field = Controller::new();
        for ch in chars {
            field.typed_text(&ch.to_string());
        }
        field.assert_well_formed();
        let exported = field.get_latex();

        let mut reparsed = Controller::new();
        reparsed.set_latex(&exported);
        reparsed.assert_well_formed();
        prop_assert_eq!(reparsed.get_latex(), exported);
    }

    #[test]
    fn random_editing_preserves_well_formedness(
        steps in proptest::collection::vec(
            prop_oneof![
                math_char().prop_map(Step::Type),
                keystroke_name().prop_map(Step::Key),
            ],
            0..60,
        )
    ) {
        let mut field = Controller::new();
        field.options_mut().auto_subscript_numerals = true;
        for step in steps {
            match step {
                Step::Type(ch) => field.typed_text(&ch.to_string()),
                Step::Key(name) => {
                    field.keystroke(name);
                }
            }
            field.assert_well_formed();
        }
        let exported = field.get_latex();
        let mut reparsed = Controller::new();
        reparsed.set_latex(&exported);
        prop_assert_eq!(reparsed.get_latex(), exported);
    }
}

#[derive(Debug, Clone)]
enum Step {
    Type(char),
    Key(&'static str),
}
