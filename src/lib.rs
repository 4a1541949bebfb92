pub mod api;
pub mod command;
pub mod config;
pub mod context;
pub mod designator;
pub mod error;
pub mod lexer;
pub mod mangling;
pub mod node_kind;
pub mod novella;
pub mod opus;
pub mod ordering;
pub mod parser;
pub mod problem;
pub mod resource;
pub mod scanner;
pub mod traversal;
pub mod tree;
pub mod treepath;
pub mod utils;
pub mod version;
pub mod worker;
mod serialization;

pub use serialization::Value;
