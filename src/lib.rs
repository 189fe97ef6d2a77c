//! # ldap-filter
//!
//! A parser, stateful builder, and textual renderer for the RFC 2254 LDAP
//! search filter grammar.
//!
//! It is written in pure Rust, makes extensive use of owned, allocation-free
//! traversal once a tree is built, and aims to be panic-free outside its own
//! test code. Given a filter string such as `(&(cn=Babs Jensen)(!(sn=Day*)))`,
//! [`filter_parser::parse`] produces a [`filter::FilterNode`] tree; the same
//! tree can instead be assembled incrementally with
//! [`builder::FilterBuilder`], traversed lazily with
//! [`filter::FilterNode::iter`], and rendered back to text with
//! [`render::render`].

#![deny(unstable_features, unused_import_braces, unused_qualifications)]
#![warn(missing_debug_implementations, unreachable_pub)]
#![forbid(unsafe_code)]

mod tokenizer;

pub mod builder;
pub mod codec;
pub mod error;
pub mod filter;
pub mod filter_parser;
pub mod render;
pub mod validator;

pub use builder::FilterBuilder;
pub use error::{BuilderSequencingError, FilterError, FilterSyntaxError};
pub use filter::FilterNode;
pub use filter_parser::parse;
pub use render::render;
