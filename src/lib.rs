//! PO translation catalogs: parsing, editing and minimal-diff rewriting
//!
//! The [`catalog`] module holds the engine; [`escape`] and [`wrap`] are
//! the string codecs and the default field formatter it renders with.

pub mod catalog;
pub mod escape;
pub mod wrap;

pub use catalog::{Catalog, CatalogError, Entry, EntryState, Header, Key, SourceRef};
pub use wrap::{FieldFormatter, Wrapper};
