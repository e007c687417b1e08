//! Core of the duskmark rendering pipeline: a two-pass parser over a
//! Markdown superset, emitting block and inline events through a
//! pluggable [`Renderer`].
//!
//! ```
//! use duskmark_core::{Buffer, Extensions, Markdown, Renderer};
//!
//! struct Plain;
//! impl Renderer for Plain {
//!     fn paragraph(&mut self, ob: &mut Buffer, content: &[u8]) {
//!         ob.put(content);
//!         ob.put_char(b'\n');
//!     }
//! }
//!
//! let mut plain = Plain;
//! let mut md = Markdown::new(&mut plain, Extensions::empty(), 16);
//! let mut out = Buffer::new(64);
//! md.render(&mut out, b"hello world\n").unwrap();
//! assert_eq!(out.as_slice(), b"hello world\n");
//! ```

pub mod autolink;
mod buffer;
mod markdown;
mod render;
mod tags;

pub use buffer::{Buffer, Error, MAX_ALLOC};
pub use markdown::Markdown;
pub use render::{AutolinkKind, Capabilities, Extensions, ListFlags, Renderer, TableFlags};
pub use tags::find_block_tag;
