#![warn(missing_docs)]
//! Mathfield Core - Headless Structural Editor Kernel for Mathematical Notation
//!
//! # Overview
//!
//! `mathfield-core` is the editing kernel of a formula editor: an editable
//! tree of mathematical notation with a cursor, keystroke dispatch, and
//! LaTeX round-tripping. It does not involve the rendering process; it
//! produces one-directional HTML markup with addressable node ids and
//! assumes the upper layer maps that markup to a visual surface and feeds
//! logical keystrokes and typed text back in.
//!
//! # Core Features
//!
//! - **Structural Editing**: every edit is O(1) pointer surgery on a node
//!   arena, guarded by structural invariants
//! - **Cursor & Selection**: a position strictly between siblings, with
//!   shift-selection computed through common-ancestor lifting
//! - **Keystroke Dispatch**: ordered first-match dispatch over logical key
//!   combinations, with per-node-kind movement and deletion policies
//! - **LaTeX Round-Tripping**: a total recursive-descent parser and a
//!   normalizing serializer, `parse(export(tree)) == tree`
//! - **State Tracking**: version number mechanism and change notifications
//!
//! # Quick Start
//!
//! ```rust
//! use mathfield_core::Controller;
//!
//! let mut field = Controller::new();
//! field.set_latex("x_2+\\frac{1}{2}");
//! field.keystroke("Backspace"); // enters the denominator
//! field.keystroke("Backspace"); // deletes the 2
//! field.typed_text("y");
//!
//! field.assert_well_formed();
//! assert_eq!(field.get_latex(), "x_2+\\frac{1}{y}");
//! ```
//!
//! ## Using State Management
//!
//! ```rust
//! use mathfield_core::{Controller, StateChangeType};
//!
//! let mut field = Controller::new();
//! field.subscribe(|change| {
//!     println!("State changed: {:?}", change.change_type);
//! });
//! field.typed_text("42");
//! assert_eq!(field.version(), 1);
//! ```
//!
//! # Module Description
//!
//! - [`tree`] - node arena, fragments, adopt/disown splicing
//! - [`node`] - node kinds and their structural constructors
//! - [`cursor`] - point, cursor and selection
//! - [`registry`] - command lookup tables
//! - [`latex`] - LaTeX parser and serializer
//! - [`keystroke`] - keystroke dispatch and editing verbs
//! - [`controller`] - the public editing surface
//! - [`options`] - behavior switches
//!
//! # Unicode Support
//!
//! - UTF-8 throughout
//! - Typed text and paste are fed through grapheme-cluster segmentation, so
//!   combining sequences enter the tree as one symbol

pub mod controller;
pub mod cursor;
pub mod keystroke;
pub mod latex;
pub mod node;
pub mod options;
pub mod registry;
pub mod tree;
mod write;

pub use controller::{
    Controller, FieldMode, SpeechSink, StateChange, StateChangeCallback, StateChangeType,
};
pub use cursor::{Cursor, Point, Selection};
pub use keystroke::{Key, KeystrokeOutcome};
pub use latex::LatexError;
pub use node::{NodeKind, Script};
pub use options::Options;
pub use registry::{CharCommand, Registry, WordCommand};
pub use tree::{Direction, Ends, Fragment, Node, NodeId, Tree};
