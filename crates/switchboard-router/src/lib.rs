//! The Switchboard router/dispatcher.
//!
//! Orchestrates classification, adapter selection, retry-wrapped provider
//! invocation, response normalization, and session bookkeeping for every
//! incoming chat turn.

pub mod router;
pub mod validate;

pub use router::{AdapterSet, Router, RouterError};
pub use validate::{count_pdf_pages, validate_attachment, validate_message, ValidationError};
