//! Collaborator traits the crawler is written against.

pub mod driver;
pub mod extractor;
pub mod runtime;
pub mod sink;
