//! The `FilterNode` AST: a tagged sum type mirroring the RFC 2251 `Filter`
//! CHOICE.
//!
//! `FilterNode` is pure data: no parent pointer, structural equality, deep
//! clone, and no cycle is constructible. It is produced by either the
//! [`crate::filter_parser`] or the [`crate::builder`], immutable thereafter,
//! and destroyed as one whole tree — no subtree sharing between independent
//! filters is required or implied.

use crate::error::{FilterSyntaxError, FilterSyntaxReason};

/// Stable small-integer tags, shared by `FilterNode::tag()`, the traversal
/// in [`crate::render`], and any external BER encoder.
///
/// Context-specific tags 0,1,2,3,4,5,6,8,9 are CONSTRUCTED; tag 7
/// (`Present`) and the substring-piece tags 0,1,2 inside a `Substrings`
/// sequence are PRIMITIVE. That encoding detail belongs to the external BER
/// encoder, not to this crate — it is documented here only because the tag
/// numbers themselves are this crate's contract with that encoder.
pub mod tag {
    pub const AND: u8 = 0;
    pub const OR: u8 = 1;
    pub const NOT: u8 = 2;
    pub const EQUALITY_MATCH: u8 = 3;
    pub const SUBSTRINGS: u8 = 4;
    pub const GREATER_OR_EQUAL: u8 = 5;
    pub const LESS_OR_EQUAL: u8 = 6;
    pub const PRESENT: u8 = 7;
    pub const APPROX_MATCH: u8 = 8;
    pub const EXTENSIBLE_MATCH: u8 = 9;

    pub const SUBSTRING_INITIAL: u8 = 0;
    pub const SUBSTRING_ANY: u8 = 1;
    pub const SUBSTRING_FINAL: u8 = 2;
}

/// An attribute description: `[A-Za-z0-9][A-Za-z0-9.\-;:]*`, not starting
/// with `;`, and not ending with `;` (a `;` separates options and must be
/// followed by one).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeDescription(String);

impl AttributeDescription {
    /// Validate and wrap a raw attribute description
    ///
    /// This is the single invariant checkpoint used by both the Parser and
    /// the Builder, so the class-and-shape constraints above cannot be
    /// bypassed by either entry point.
    pub fn new(raw: impl Into<String>) -> Result<Self, FilterSyntaxError> {
        let raw = raw.into();
        validate_attribute_description(&raw)?;
        Ok(AttributeDescription(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub(crate) fn validate_attribute_description(s: &str) -> Result<(), FilterSyntaxError> {
    if s.is_empty() {
        return Err(FilterSyntaxError::new(FilterSyntaxReason::NoAttributeName));
    }
    if s.starts_with(';') || s.ends_with(';') {
        return Err(FilterSyntaxError::new(FilterSyntaxReason::NoOption));
    }
    let first = s.chars().next().expect("checked non-empty above");
    if !first.is_alphanumeric() {
        return Err(FilterSyntaxError::new(FilterSyntaxReason::InvalidCharInDescriptor(
            first,
        )));
    }
    for ch in s.chars() {
        if ch == '\\' {
            return Err(FilterSyntaxError::new(
                FilterSyntaxReason::InvalidEscapeInDescriptor,
            ));
        }
        if ch.is_alphanumeric() || matches!(ch, '.' | '-' | ';' | ':') {
            continue;
        }
        return Err(FilterSyntaxError::new(
            FilterSyntaxReason::InvalidCharInDescriptor(ch),
        ));
    }
    Ok(())
}

/// A matching rule OID or name, as used in an `ExtensibleMatch` decoration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchingRuleId(String);

impl MatchingRuleId {
    pub fn new(raw: impl Into<String>) -> Self {
        MatchingRuleId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The right-hand side octet string of a comparison; never reinterpreted as
/// text after unescaping
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AssertionValue(Vec<u8>);

impl AssertionValue {
    pub fn from_octets(octets: impl Into<Vec<u8>>) -> Self {
        AssertionValue(octets.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// `(attr <op> value)`: equality, ordering or approximate-match assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeValueAssertion {
    pub attribute_desc: AttributeDescription,
    pub assertion_value: AssertionValue,
}

/// One piece of a `Substrings` sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubstringPiece {
    Initial(AssertionValue),
    Any(AssertionValue),
    Final(AssertionValue),
}

impl SubstringPiece {
    pub const fn tag(&self) -> u8 {
        match self {
            SubstringPiece::Initial(_) => tag::SUBSTRING_INITIAL,
            SubstringPiece::Any(_) => tag::SUBSTRING_ANY,
            SubstringPiece::Final(_) => tag::SUBSTRING_FINAL,
        }
    }

    pub fn value(&self) -> &AssertionValue {
        match self {
            SubstringPiece::Initial(v) | SubstringPiece::Any(v) | SubstringPiece::Final(v) => v,
        }
    }
}

/// `attr=initial*any*...*final`, decomposed into at most one `Initial`
/// appearing first, any number of `Any` in the middle, at most one `Final`
/// appearing last, non-empty overall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstringFilter {
    pub attribute_desc: AttributeDescription,
    pub substrings: Vec<SubstringPiece>,
}

/// `attr[:dn][:rule]:=value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchingRuleAssertion {
    pub matching_rule: Option<MatchingRuleId>,
    pub rule_type: Option<AttributeDescription>,
    pub assertion_value: AssertionValue,
    pub dn_attributes: bool,
}

/// The filter AST: a tagged sum type mirroring the RFC 2251 `Filter` CHOICE
///
/// Invariants that hold over any constructed tree (enforced by the Parser
/// and the Builder, never by this type's fields directly, since both entry
/// points funnel through [`AttributeDescription::new`] and the
/// [`crate::builder::FilterBuilder`] sequencing rules):
/// - `And`/`Or` sets contain at least one child.
/// - `Not` contains exactly one child.
/// - A `Substrings` sequence is non-empty, with at most one `Initial`
///   (first) and at most one `Final` (last).
/// - `ExtensibleMatch` has at least one of `matching_rule`/`rule_type` set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterNode {
    And(Vec<FilterNode>),
    Or(Vec<FilterNode>),
    Not(Box<FilterNode>),
    EqualityMatch(AttributeValueAssertion),
    Substrings(SubstringFilter),
    GreaterOrEqual(AttributeValueAssertion),
    LessOrEqual(AttributeValueAssertion),
    Present(AttributeDescription),
    ApproxMatch(AttributeValueAssertion),
    ExtensibleMatch(MatchingRuleAssertion),
}

impl FilterNode {
    /// The stable small-integer tag for this node, see [`tag`]
    pub const fn tag(&self) -> u8 {
        match self {
            FilterNode::And(_) => tag::AND,
            FilterNode::Or(_) => tag::OR,
            FilterNode::Not(_) => tag::NOT,
            FilterNode::EqualityMatch(_) => tag::EQUALITY_MATCH,
            FilterNode::Substrings(_) => tag::SUBSTRINGS,
            FilterNode::GreaterOrEqual(_) => tag::GREATER_OR_EQUAL,
            FilterNode::LessOrEqual(_) => tag::LESS_OR_EQUAL,
            FilterNode::Present(_) => tag::PRESENT,
            FilterNode::ApproxMatch(_) => tag::APPROX_MATCH,
            FilterNode::ExtensibleMatch(_) => tag::EXTENSIBLE_MATCH,
        }
    }

    /// A lazy, stack-driven traversal over this node and its descendants;
    /// see [`crate::render::FilterIter`].
    pub fn iter(&self) -> crate::render::FilterIter<'_> {
        crate::render::FilterIter::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_description_rejects_empty() {
        assert_eq!(
            AttributeDescription::new("").unwrap_err().reason,
            FilterSyntaxReason::NoAttributeName
        );
    }

    #[test]
    fn attribute_description_rejects_trailing_semicolon() {
        assert_eq!(
            AttributeDescription::new("cn;").unwrap_err().reason,
            FilterSyntaxReason::NoOption
        );
    }

    #[test]
    fn attribute_description_rejects_leading_semicolon() {
        assert_eq!(
            AttributeDescription::new(";cn").unwrap_err().reason,
            FilterSyntaxReason::NoOption
        );
    }

    #[test]
    fn attribute_description_accepts_options() {
        assert!(AttributeDescription::new("cn;lang-en").is_ok());
    }

    #[test]
    fn attribute_description_rejects_backslash() {
        assert_eq!(
            AttributeDescription::new("c\\n").unwrap_err().reason,
            FilterSyntaxReason::InvalidEscapeInDescriptor
        );
    }

    #[test]
    fn attribute_description_rejects_non_alphanumeric_first_character() {
        for bad in [".foo", "-foo", ":foo"] {
            assert_eq!(
                AttributeDescription::new(bad).unwrap_err().reason,
                FilterSyntaxReason::InvalidCharInDescriptor(bad.chars().next().unwrap())
            );
        }
    }

    #[test]
    fn tags_match_the_rfc2251_choice_table() {
        let present = FilterNode::Present(AttributeDescription::new("cn").unwrap());
        assert_eq!(present.tag(), 7);
        let and = FilterNode::And(vec![present]);
        assert_eq!(and.tag(), 0);
    }
}
