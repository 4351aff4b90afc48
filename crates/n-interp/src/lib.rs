//! # n-interp: Modal keystroke interpreter for n-modal
//!
//! A pure function from `(buffer, state, tokens)` to `(buffer, state)`. The
//! caller owns both values and gets new ones back; nothing is rendered and no
//! file is touched.
//!
//! - **[`position`]**: `Position` (row, col) and half-open `Span`, 0-indexed
//! - **[`buffer`]**: `Buffer`, an immutable rope value
//! - **[`key`]**: `Token` and the `<esc>`-style key notation
//! - **[`mode`]**: `Normal`, `Insert`, `CommandLine`, `Search`, `Visual`
//! - **[`word`]**: word / WORD tokenizer behind `w b e`
//! - **[`register`]**: named registers and the numbered ring
//! - **[`mark`]**: named positions
//! - **[`history`]**: linear undo/redo checkpoints
//! - **[`search`]**: regex search and the query line buffer
//! - **[`options`]**: `ignorecase`, macro limits, `set`-style directives
//! - **[`state`]**: the state record threaded through every token
//! - **[`range`]**: applies operators to motion ranges
//! - **[`recorder`]**: macro capture and bounded playback
//! - **[`dispatch`]**: the token dispatcher, [`interpret`]
//!
//! ```
//! use n_interp::{interpret, parse_keys, Buffer};
//!
//! let buf = Buffer::from_text("hello world");
//! let (buf, state) = interpret(&buf, None, &parse_keys("dwP"));
//! assert_eq!(buf.contents(), "hello world");
//! assert_eq!(state.register('"'), "hello ");
//! ```

pub mod buffer;
pub mod dispatch;
pub mod history;
pub mod key;
pub mod mark;
pub mod mode;
pub mod options;
pub mod position;
pub mod range;
pub mod recorder;
pub mod register;
pub mod search;
pub mod state;
pub mod word;

pub use buffer::Buffer;
pub use dispatch::{Interpreter, interpret};
pub use key::{Token, parse_keys};
pub use mode::{Mode, VisualKind};
pub use options::Options;
pub use position::{Position, Span};
pub use state::State;
