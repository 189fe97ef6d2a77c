//! Errors raised while parsing, building or validating LDAP search filters

use std::fmt;

/// The reason a filter text failed to parse
///
/// Every variant corresponds to one of the named failure reasons produced by
/// RFC 2254 preprocessing and tokenizing: no reason is ever invented ad hoc
/// at a call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSyntaxReason {
    /// The filter text (after preprocessing) does not start with `(`
    MissingLeftParen,
    /// The filter text (after preprocessing) does not end with `)`, or a
    /// nested filter was never closed
    MissingRightParen,
    /// A `\` escape was followed by a non-hex-digit character
    InvalidEscape,
    /// The input ended in the middle of a `\HH` escape
    ShortEscape,
    /// A code point outside the RFC 2254 `char` production appeared
    /// unescaped in a value; carries the offending character for the error
    /// message
    InvalidCharacter(char),
    /// `peekChar` was called past the end of the input
    UnexpectedEnd,
    /// An attribute description was empty
    NoAttributeName,
    /// A `\` appeared inside an attribute description
    InvalidEscapeInDescriptor,
    /// A character outside `[A-Za-z0-9.\-;:]` appeared in an attribute
    /// description
    InvalidCharInDescriptor(char),
    /// An attribute description starts or ends with `;` with no option
    /// following it
    NoOption,
    /// None of `>=`, `<=`, `~=`, `:=`, `=` matched at the expected position
    InvalidComparison,
    /// Bare `:=` at the start of an attribute/decoration slot: neither an
    /// attribute type nor a matching rule was given
    NoMatchingRule,
    /// Bare `::=` or `:::=` at the start of an attribute/decoration slot
    NoDnNorMatchingRule,
    /// More than one non-`dn` colon-separated piece in an extensible-match
    /// decoration
    AmbiguousMatchingRule,
    /// Text remained after a complete top-level filter was parsed
    TrailingData,
    /// An `(&...)` or `(|...)` set had zero members
    EmptyFilterSet,
}

impl fmt::Display for FilterSyntaxReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSyntaxReason::MissingLeftParen => write!(f, "expected '('"),
            FilterSyntaxReason::MissingRightParen => write!(f, "expected ')'"),
            FilterSyntaxReason::InvalidEscape => write!(f, "invalid escape"),
            FilterSyntaxReason::ShortEscape => write!(f, "input ends mid-escape"),
            FilterSyntaxReason::InvalidCharacter(c) => {
                write!(f, "invalid character '{}' ({})", c, escape_for_message(*c))
            }
            FilterSyntaxReason::UnexpectedEnd => write!(f, "unexpected end of filter"),
            FilterSyntaxReason::NoAttributeName => write!(f, "no attribute name"),
            FilterSyntaxReason::InvalidEscapeInDescriptor => {
                write!(f, "invalid escape in attribute description")
            }
            FilterSyntaxReason::InvalidCharInDescriptor(c) => {
                write!(f, "invalid character '{}' in attribute description", c)
            }
            FilterSyntaxReason::NoOption => write!(f, "';' not followed by an option"),
            FilterSyntaxReason::InvalidComparison => write!(f, "invalid comparison operator"),
            FilterSyntaxReason::NoMatchingRule => write!(
                f,
                "extensible match has no attribute type and no matching rule"
            ),
            FilterSyntaxReason::NoDnNorMatchingRule => write!(
                f,
                "extensible match has no dn flag, attribute type or matching rule"
            ),
            FilterSyntaxReason::AmbiguousMatchingRule => {
                write!(f, "extensible match names more than one matching rule")
            }
            FilterSyntaxReason::TrailingData => {
                write!(f, "unexpected trailing data after filter")
            }
            FilterSyntaxReason::EmptyFilterSet => {
                write!(f, "'&' or '|' with no members")
            }
        }
    }
}

fn escape_for_message(c: char) -> String {
    let mut buf = [0u8; 4];
    let bytes = c.encode_utf8(&mut buf).as_bytes();
    let mut out = String::with_capacity(bytes.len() * 3);
    for b in bytes {
        out.push_str(&format!("\\{:02x}", b));
    }
    out
}

/// A filter text failed to parse
///
/// Always carries a [`FilterSyntaxReason`]; parsing is all-or-nothing, so no
/// partial AST is ever returned alongside this error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("filter syntax error: {reason}")]
pub struct FilterSyntaxError {
    pub reason: FilterSyntaxReason,
}

impl FilterSyntaxError {
    pub(crate) fn new(reason: FilterSyntaxReason) -> Self {
        FilterSyntaxError { reason }
    }
}

/// The reason a [`crate::builder::FilterBuilder`] operation was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderSequencingReason {
    /// A `Not` slot already had a child when a second object was added
    SecondChildForNot,
    /// `endNestedFilter`/`endSubstrings` was called but the kind on top of
    /// the stack does not match (or the stack was empty)
    MismatchedEnd,
    /// `addSubstring` was called while the top of the stack is not an open
    /// substring sequence
    OutOfSequence,
    /// `endSubstrings` was called on an empty sequence
    EmptySubstring,
    /// An assertion (equality, presence, ...) was added while a substring
    /// sequence is open
    AssertionInsideSubstrings,
    /// `endNestedFilter(And)`/`endNestedFilter(Or)` was called with no
    /// children ever added
    EmptyBooleanSet,
    /// `endNestedFilter(Not)` was called with no child ever added
    EmptyNot,
    /// There is no open container to add a top-level object into (the
    /// builder already produced a root object)
    NoOpenContainer,
}

impl fmt::Display for BuilderSequencingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuilderSequencingReason::SecondChildForNot => write!(f, "second child for not"),
            BuilderSequencingReason::MismatchedEnd => write!(f, "mismatched end"),
            BuilderSequencingReason::OutOfSequence => write!(f, "out of sequence"),
            BuilderSequencingReason::EmptySubstring => write!(f, "empty substring"),
            BuilderSequencingReason::AssertionInsideSubstrings => {
                write!(f, "assertion inside substrings")
            }
            BuilderSequencingReason::EmptyBooleanSet => write!(f, "empty boolean set"),
            BuilderSequencingReason::EmptyNot => write!(f, "empty not"),
            BuilderSequencingReason::NoOpenContainer => write!(f, "no open container"),
        }
    }
}

/// A [`crate::builder::FilterBuilder`] sequencing rule was violated
///
/// Distinct from [`FilterSyntaxError`]: this only ever comes from the
/// Builder's state machine, never from parsing filter text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("builder sequencing error: {reason}")]
pub struct BuilderSequencingError {
    pub reason: BuilderSequencingReason,
}

impl BuilderSequencingError {
    pub(crate) fn new(reason: BuilderSequencingReason) -> Self {
        BuilderSequencingError { reason }
    }
}

/// Either error kind the crate can produce
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error(transparent)]
    Syntax(#[from] FilterSyntaxError),
    #[error(transparent)]
    Sequencing(#[from] BuilderSequencingError),
}
