//! Text forms for TBF documents.
//!
//! # STF Format Documentation
//!
//! **STF** is the stringified text form of the tagged binary format: a
//! compact, human-editable mirror of the tag tree that round-trips exactly
//! (`parse(emit(t)) == t`). Files are typically identified with the
//! `.snbt` extension.
//!
//! ## Grammar
//!
//! | Form        | Text                                                       |
//! |-------------|------------------------------------------------------------|
//! | Compound    | `{key:value,…}`; keys bare when `[A-Za-z_][A-Za-z0-9_\-\.\+]*`, else quoted |
//! | List        | `[value,…]`, homogeneous                                   |
//! | Byte array  | `[B;1b,2b,…]`                                              |
//! | Int array   | `[I;1,2,…]`                                                |
//! | Long array  | `[L;1L,2L,…]`                                              |
//! | Byte        | `1b`                                                       |
//! | Short       | `1s`                                                       |
//! | Int         | `1`                                                        |
//! | Long        | `1L`                                                       |
//! | Float       | `1.5f`                                                     |
//! | Double      | `1.5d`, or any bare literal containing `.`                 |
//! | String      | `"…"` with `\\ \" \n \t \r` escapes; parser also takes `'…'` |
//!
//! Pretty printing indents two spaces per depth and collapses short
//! children onto one line.
//!
//! # JSON view
//!
//! The [`json`] module renders a document as `{ name, type, value }` with
//! tags erased to native JSON — longs as strings to dodge binary64
//! truncation — and rebuilds documents from JSON by type inference, or
//! exactly where `type` envelopes are given.

pub mod error;
pub mod json;
pub mod read;
pub mod write;

pub use error::{Error, Result};
pub use json::{from_json, to_json};
pub use read::{from_stf, parse};
pub use write::{emit, emit_pretty, to_stf};
