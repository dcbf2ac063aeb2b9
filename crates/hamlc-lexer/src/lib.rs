//! hamlc Lexer
//!
//! Turns indentation-structured template source into a tree of [`Block`]s.
//! Each block owns one logical source line and the blocks nested under it.
//! Multiline continuations are joined before nesting is decided, and blocks
//! flagged as verbatim keep their nested lines as raw text instead of children.
//!
//! # Example
//!
//! ```
//! use hamlc_lexer::Scanner;
//!
//! let blocks = Scanner::scan("%ul\n  %li one\n  %li two");
//! assert_eq!(blocks.len(), 1);
//! assert_eq!(blocks[0].children.len(), 2);
//! ```

pub mod line;
pub mod scanner;

pub use line::{indentation, Block, Line, INDENT, MULTILINE};
pub use scanner::Scanner;
