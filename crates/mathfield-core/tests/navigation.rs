//! Cursor movement, selection, and the escape tier.

use mathfield_core::{Controller, NodeKind};

fn assert_latex(field: &Controller, latex: &str) {
    field.assert_well_formed();
    assert_eq!(field.get_latex(), latex);
}

#[test]
fn test_right_walks_into_and_out_of_a_fraction() {
    let mut field = Controller::new();
    field.set_latex("\\frac{1}{2}x");
    let frac = field.tree().child_ids(field.root())[0];
    let NodeKind::Fraction { numerator, denominator } = field.tree().get(frac).kind else {
        panic!("expected a fraction");
    };

    field.keystroke("Ctrl-Home");
    assert_eq!(field.cursor().parent, field.root());
    assert_eq!(field.cursor().left, None);

    // Into the numerator, through it, into the denominator, out.
    field.keystroke("Right");
    assert_eq!(field.cursor().parent, numerator);
    assert_eq!(field.cursor().left, None);

    field.keystroke("Right");
    assert_eq!(field.cursor().parent, numerator);
    assert_eq!(field.cursor().right, None);

    field.keystroke("Right");
    assert_eq!(field.cursor().parent, denominator);
    assert_eq!(field.cursor().left, None);

    field.keystroke("Right");
    field.keystroke("Right");
    assert_eq!(field.cursor().parent, field.root());
    assert_eq!(field.cursor().left, Some(frac));

    // Hop the x, then a further Right is a quiet no-op at the root edge.
    field.keystroke("Right");
    assert_eq!(field.cursor().right, None);
    field.keystroke("Right");
    assert_eq!(field.cursor().parent, field.root());
    assert_latex(&field, "\\frac{1}{2}x");
}

#[test]
fn test_up_and_down_cross_fraction_blocks() {
    let mut field = Controller::new();
    field.set_latex("\\frac{1}{2}");
    let frac = field.tree().child_ids(field.root())[0];
    let NodeKind::Fraction { numerator, denominator } = field.tree().get(frac).kind else {
        panic!("expected a fraction");
    };

    // From beside the fraction, Up lands in the numerator.
    field.keystroke("Up");
    assert_eq!(field.cursor().parent, numerator);

    field.keystroke("Down");
    assert_eq!(field.cursor().parent, denominator);

    field.keystroke("Up");
    assert_eq!(field.cursor().parent, numerator);
    assert_latex(&field, "\\frac{1}{2}");
}

#[test]
fn test_up_enters_a_superscript_and_down_a_subscript() {
    let mut field = Controller::new();
    field.set_latex("x_1^2");
    let pair = field.tree().child_ids(field.root())[1];
    let NodeKind::SupSub { sub: Some(sub), sup: Some(sup) } = field.tree().get(pair).kind
    else {
        panic!("expected a full pair");
    };

    field.keystroke("Up");
    assert_eq!(field.cursor().parent, sup);
    field.keystroke("Down");
    assert_eq!(field.cursor().parent, sub);
}

#[test]
fn test_home_and_end_jump_within_block_and_to_root() {
    let mut field = Controller::new();
    field.set_latex("1+\\frac{23}{45}");
    let frac = field.tree().child_ids(field.root())[2];
    let NodeKind::Fraction { denominator, .. } = field.tree().get(frac).kind else {
        panic!("expected a fraction");
    };

    field.keystroke("Left");
    assert_eq!(field.cursor().parent, denominator);

    field.keystroke("Home");
    assert_eq!(field.cursor().parent, denominator);
    assert_eq!(field.cursor().left, None);

    field.keystroke("End");
    assert_eq!(field.cursor().parent, denominator);
    assert_eq!(field.cursor().right, None);

    field.keystroke("Ctrl-Home");
    assert_eq!(field.cursor().parent, field.root());
    assert_eq!(field.cursor().left, None);

    field.keystroke("Ctrl-End");
    assert_eq!(field.cursor().parent, field.root());
    assert_eq!(field.cursor().right, None);
}

#[test]
fn test_shift_selection_grows_and_shrinks() {
    let mut field = Controller::new();
    field.set_latex("abc");
    let children = field.tree().child_ids(field.root());

    field.keystroke("Shift-Left");
    field.keystroke("Shift-Left");
    let selection = field.cursor().selection.unwrap();
    assert_eq!(selection.left, children[1]);
    assert_eq!(selection.right, children[2]);

    // Stepping back towards the anticursor shrinks the selection.
    field.keystroke("Shift-Right");
    let selection = field.cursor().selection.unwrap();
    assert_eq!(selection.left, children[2]);
    assert_eq!(selection.right, children[2]);
    assert_latex(&field, "abc");
}

#[test]
fn test_selection_at_a_block_edge_engulfs_the_command() {
    let mut field = Controller::new();
    field.set_latex("\\frac{1}{2}");
    let frac = field.tree().child_ids(field.root())[0];

    // Put the cursor inside the numerator, then select past its edge.
    field.keystroke("Ctrl-Home");
    field.keystroke("Right");
    field.keystroke("Shift-Right");
    field.keystroke("Shift-Right");
    let selection = field.cursor().selection.unwrap();
    assert_eq!(selection.left, frac);
    assert_eq!(selection.right, frac);
    field.assert_well_formed();
}

#[test]
fn test_arrow_collapses_a_selection_to_its_end() {
    let mut field = Controller::new();
    field.set_latex("abc");
    let children = field.tree().child_ids(field.root());

    field.keystroke("Shift-Left");
    field.keystroke("Shift-Left");
    field.keystroke("Left");
    assert!(field.cursor().selection.is_none());
    assert_eq!(field.cursor().left, Some(children[0]));
    assert_eq!(field.cursor().right, Some(children[1]));
}

#[test]
fn test_shift_up_extends_to_the_block_edge() {
    let mut field = Controller::new();
    field.set_latex("abc");
    let children = field.tree().child_ids(field.root());

    field.keystroke("Shift-Up");
    let selection = field.cursor().selection.unwrap();
    assert_eq!(selection.left, children[0]);
    assert_eq!(selection.right, children[2]);
}

#[test]
fn test_typing_replaces_the_selection() {
    let mut field = Controller::new();
    field.set_latex("1+2");
    field.keystroke("Ctrl-A");
    field.typed_text("x");
    assert_latex(&field, "x");
}

#[test]
fn test_deleting_the_selection() {
    let mut field = Controller::new();
    field.set_latex("a+b");
    field.keystroke("Shift-Left");
    field.keystroke("Shift-Left");
    field.keystroke("Backspace");
    assert_latex(&field, "a");
}

#[test]
fn test_space_behaves_like_tab_when_enabled() {
    let mut field = Controller::new();
    field.options_mut().space_behaves_like_tab = true;
    field.set_latex("\\frac{1}{2}");
    field.keystroke("Left");
    assert_ne!(field.cursor().parent, field.root());

    let outcome = field.keystroke("Space");
    assert!(outcome.handled);
    assert_eq!(field.cursor().parent, field.root());
    assert_latex(&field, "\\frac{1}{2}");
}

#[test]
fn test_space_types_literally_inside_text_blocks() {
    let mut field = Controller::new();
    field.options_mut().space_behaves_like_tab = true;
    field.set_latex("\\text{ab}");
    field.keystroke("Left");

    // Space types a literal space instead of escaping.
    field.typed_text(" ");
    assert_latex(&field, "\\text{ab }");
}

#[test]
fn test_movement_never_changes_content() {
    let mut field = Controller::new();
    field.set_latex("1+\\frac{x_2}{\\sqrt[3]{y}}+\\sum_{n=1}^{10}n");
    let before = field.get_latex();
    for combo in [
        "Left", "Left", "Up", "Right", "Down", "Home", "Left", "Up", "Up", "End", "Tab",
        "Right", "Down", "Ctrl-Home", "Right", "Right", "Ctrl-End",
    ] {
        field.keystroke(combo);
        field.assert_well_formed();
        assert_eq!(field.get_latex(), before, "content changed after {}", combo);
    }
}
