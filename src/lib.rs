//! A small chainable DOM collection library over a deterministic in-memory
//! document.
//!
//! The crate ships its own document substrate (arena node store, HTML
//! parser, selector engine, synchronous event dispatch) and layers a
//! jQuery-like convenience API on top: resolve a selector to a
//! [`Collection`], then chain bulk operations over every matched element.
//!
//! ```
//! use zest_dom::Document;
//!
//! # fn main() -> zest_dom::Result<()> {
//! let doc = Document::from_html(
//!     r#"<article id="post-1"><span class="spanzy">a</span><span class="spanzy">b</span></article>"#,
//! )?;
//!
//! doc.select(".spanzy")?.add_class("active").set_attribute("data-seen", "1");
//! assert_eq!(doc.select(".active")?.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! Selector resolution prefers fast paths: a lone `#id`, `.class`, or tag
//! token bypasses the general selector engine entirely.

use std::fmt;

mod collection;
mod document;
mod dom;
mod events;
mod html;
mod matching;
mod resolve;
mod selector;

pub use collection::{Collection, Target};
pub use document::{ClientRect, Document, Viewport};
pub use dom::NodeId;
pub use events::{EventState, HandlerId};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    InvalidSelector(String),
    EmptyCollection(String),
    Dom(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::InvalidSelector(selector) => write!(f, "invalid selector: {selector}"),
            Self::EmptyCollection(op) => write!(f, "{op} requires a non-empty collection"),
            Self::Dom(msg) => write!(f, "dom error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
