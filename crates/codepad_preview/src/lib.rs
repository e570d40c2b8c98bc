//! Codepad Live Preview
//!
//! Debounced re-rendering of markup documents while they are edited.
//!
//! ## Model
//!
//! - **Target:** one rendering surface (an editor pane, a preview window)
//! - **Slot:** at most one pending render per target
//! - **Quiet period:** a render fires only after its target has gone this
//!   long without another edit
//!
//! Rendered documents are published on a broadcast channel; any number of
//! surfaces may subscribe and pick out their own target.

pub mod scheduler;

pub use scheduler::{PreviewScheduler, PreviewTarget, PreviewUpdate};
