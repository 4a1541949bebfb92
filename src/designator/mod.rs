//! Naming parts of a document: fragment identifiers, tags, and their resolution.

pub mod fragment_identifier;
pub mod interpreter;
pub mod tag;
pub mod tools;

pub use fragment_identifier::FragmentIdentifier;
pub use interpreter::DesignatorInterpreter;
pub use tag::Tag;
