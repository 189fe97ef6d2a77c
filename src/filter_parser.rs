//! Recursive-descent parser for RFC 2254 textual search filters
//!
//! `parse` turns a filter string straight into a [`FilterNode`] tree without
//! an intermediate parse tree: each grammar production below corresponds to
//! one function, and the whole thing is driven by a single [`Tokenizer`]
//! cursor threaded through by `&mut` reference.

use crate::codec;
use crate::error::{FilterSyntaxError, FilterSyntaxReason};
use crate::filter::{
    AssertionValue, AttributeDescription, AttributeValueAssertion, FilterNode,
    MatchingRuleAssertion, MatchingRuleId, SubstringFilter, SubstringPiece,
};
use crate::tokenizer::{BoolOp, ComparisonOp, Tokenizer};
use crate::validator::check_balance;

/// Parse a complete RFC 2254 filter string into a [`FilterNode`]
///
/// The whole string must be exactly one filter: `(cn=a)(sn=b)` is rejected
/// as trailing data even though both halves are individually well formed,
/// since the grammar's top production is a single `filter`.
pub fn parse(text: &str) -> Result<FilterNode, FilterSyntaxError> {
    if text.is_empty() {
        return parse("(objectclass=*)");
    }
    let upgraded = upgrade_v2_escapes(text);
    let preprocessed = wrap_if_bare(&upgraded);
    check_balance(&preprocessed)?;
    let mut tokenizer = Tokenizer::new(&preprocessed);
    let node = parse_filter(&mut tokenizer)?;
    if !tokenizer.is_at_end() {
        return Err(FilterSyntaxError::new(FilterSyntaxReason::TrailingData));
    }
    Ok(node)
}

/// Wrap a bare, unparenthesised expression in one pair of parentheses
///
/// Only triggers when the text neither starts with `(` nor ends with `)`;
/// a text that already looks wrapped (even if unbalanced) is passed through
/// unchanged so the balance check below can report the real problem.
fn wrap_if_bare(text: &str) -> std::borrow::Cow<'_, str> {
    if text.starts_with('(') || text.ends_with(')') {
        std::borrow::Cow::Borrowed(text)
    } else {
        std::borrow::Cow::Owned(format!("({text})"))
    }
}

/// Rewrite legacy V2 escapes (`\*`, `\(`, `\)`, `\\`) into V3 `\HH` form
///
/// Idempotent: a backslash that already introduces a `\HH` escape is never
/// followed directly by one of the four special characters, so running this
/// twice is a no-op.
fn upgrade_v2_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.peek().copied() {
                Some(next) if matches!(next, '*' | '(' | ')' | '\\') => {
                    chars.next();
                    out.push_str(&format!("\\{:02x}", next as u32 as u8));
                }
                _ => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

fn parse_filter(tok: &mut Tokenizer<'_>) -> Result<FilterNode, FilterSyntaxError> {
    tok.get_left_paren()?;
    let node = parse_filter_comp(tok)?;
    tok.get_right_paren()?;
    Ok(node)
}

fn parse_filter_comp(tok: &mut Tokenizer<'_>) -> Result<FilterNode, FilterSyntaxError> {
    match tok.op_or_attr()? {
        Some(BoolOp::And) => Ok(FilterNode::And(parse_filter_list(tok)?)),
        Some(BoolOp::Or) => Ok(FilterNode::Or(parse_filter_list(tok)?)),
        Some(BoolOp::Not) => {
            let child = parse_filter(tok)?;
            Ok(FilterNode::Not(Box::new(child)))
        }
        None => {
            let attr_raw = tok
                .attr()
                .expect("op_or_attr populates attr() on the None branch")
                .to_string();
            parse_item(tok, &attr_raw)
        }
    }
}

/// `1*filter`: every sibling of an `&`/`|` set, parsed until the next
/// character is not a `(`
fn parse_filter_list(tok: &mut Tokenizer<'_>) -> Result<Vec<FilterNode>, FilterSyntaxError> {
    let mut filters = Vec::new();
    while tok.peek_char()? == '(' {
        filters.push(parse_filter(tok)?);
    }
    if filters.is_empty() {
        return Err(FilterSyntaxError::new(FilterSyntaxReason::EmptyFilterSet));
    }
    Ok(filters)
}

fn parse_item(tok: &mut Tokenizer<'_>, attr_raw: &str) -> Result<FilterNode, FilterSyntaxError> {
    match tok.filter_type()? {
        ComparisonOp::Equal => parse_equal_form(tok, attr_raw),
        ComparisonOp::GreaterOrEqual => parse_ordering_form(tok, attr_raw, FilterNode::GreaterOrEqual),
        ComparisonOp::LessOrEqual => parse_ordering_form(tok, attr_raw, FilterNode::LessOrEqual),
        ComparisonOp::Approx => parse_ordering_form(tok, attr_raw, FilterNode::ApproxMatch),
        ComparisonOp::Extensible => parse_extensible_form(tok, attr_raw),
    }
}

fn parse_ordering_form(
    tok: &mut Tokenizer<'_>,
    attr_raw: &str,
    wrap: fn(AttributeValueAssertion) -> FilterNode,
) -> Result<FilterNode, FilterSyntaxError> {
    let value = tok.value();
    let attribute_desc = AttributeDescription::new(attr_raw)?;
    let assertion_value = AssertionValue::from_octets(codec::unescape(value)?);
    Ok(wrap(AttributeValueAssertion {
        attribute_desc,
        assertion_value,
    }))
}

/// `attr=value`, which could turn out to be a present, equality or substring
/// filter depending on whether (and where) the value contains a bare `*`
fn parse_equal_form(tok: &mut Tokenizer<'_>, attr_raw: &str) -> Result<FilterNode, FilterSyntaxError> {
    let value = tok.value();
    if value == "*" {
        return Ok(FilterNode::Present(AttributeDescription::new(attr_raw)?));
    }
    if value.contains('*') {
        return parse_substring_pieces(attr_raw, value);
    }
    let attribute_desc = AttributeDescription::new(attr_raw)?;
    let assertion_value = AssertionValue::from_octets(codec::unescape(value)?);
    Ok(FilterNode::EqualityMatch(AttributeValueAssertion {
        attribute_desc,
        assertion_value,
    }))
}

/// Split `value` on `*` into initial/any/final pieces
///
/// The first segment becomes `Initial` only if non-empty, the last becomes
/// `Final` only if non-empty, and every strictly-middle segment becomes
/// `Any` regardless of emptiness — this is what makes `**` collapse to a
/// single empty `Any` rather than being rejected or merged away.
fn parse_substring_pieces(
    attr_raw: &str,
    value: &str,
) -> Result<FilterNode, FilterSyntaxError> {
    let attribute_desc = AttributeDescription::new(attr_raw)?;
    let segments: Vec<&str> = value.split('*').collect();
    let last_index = segments.len() - 1;
    let mut substrings = Vec::with_capacity(segments.len());
    for (index, segment) in segments.iter().enumerate() {
        let is_first = index == 0;
        let is_last = index == last_index;
        if (is_first || is_last) && segment.is_empty() {
            continue;
        }
        let piece_value = AssertionValue::from_octets(codec::unescape(segment)?);
        substrings.push(if is_first {
            SubstringPiece::Initial(piece_value)
        } else if is_last {
            SubstringPiece::Final(piece_value)
        } else {
            SubstringPiece::Any(piece_value)
        });
    }
    Ok(FilterNode::Substrings(SubstringFilter {
        attribute_desc,
        substrings,
    }))
}

/// `[attr][:dn][:rule]:=value`
fn parse_extensible_form(
    tok: &mut Tokenizer<'_>,
    attr_raw: &str,
) -> Result<FilterNode, FilterSyntaxError> {
    let value = tok.value();
    let assertion_value = AssertionValue::from_octets(codec::unescape(value)?);

    let mut parts = attr_raw.split(':');
    let attr_type_part = parts.next().unwrap_or("");
    let mut dn_attributes = false;
    let mut rule_candidates: Vec<&str> = Vec::new();
    for part in parts {
        if part.is_empty() {
            continue;
        }
        if part == "dn" && !dn_attributes && rule_candidates.is_empty() {
            dn_attributes = true;
        } else {
            rule_candidates.push(part);
        }
    }
    if rule_candidates.len() > 1 {
        return Err(FilterSyntaxError::new(
            FilterSyntaxReason::AmbiguousMatchingRule,
        ));
    }
    let rule_type = if attr_type_part.is_empty() {
        None
    } else {
        Some(AttributeDescription::new(attr_type_part)?)
    };
    let matching_rule = rule_candidates.first().map(|r| MatchingRuleId::new(*r));
    if rule_type.is_none() && matching_rule.is_none() {
        return Err(FilterSyntaxError::new(FilterSyntaxReason::NoMatchingRule));
    }
    Ok(FilterNode::ExtensibleMatch(MatchingRuleAssertion {
        matching_rule,
        rule_type,
        assertion_value,
        dn_attributes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tag;

    #[test]
    fn parses_simple_equality() {
        let node = parse("(cn=Babs Jensen)").unwrap();
        match node {
            FilterNode::EqualityMatch(ava) => {
                assert_eq!(ava.attribute_desc.as_str(), "cn");
                assert_eq!(ava.assertion_value.as_bytes(), b"Babs Jensen");
            }
            _ => panic!("expected EqualityMatch"),
        }
    }

    #[test]
    fn parses_present() {
        let node = parse("(cn=*)").unwrap();
        assert_eq!(node.tag(), tag::PRESENT);
    }

    #[test]
    fn parses_and_with_two_children() {
        let node = parse("(&(cn=Babs)(sn=Jensen))").unwrap();
        match node {
            FilterNode::And(children) => assert_eq!(children.len(), 2),
            _ => panic!("expected And"),
        }
    }

    #[test]
    fn parses_not() {
        let node = parse("(!(cn=Babs))").unwrap();
        assert_eq!(node.tag(), tag::NOT);
    }

    #[test]
    fn parses_v2_escape_as_v3() {
        let node = parse("(o=Parens R Us \\(for all your parenthetical needs\\))").unwrap();
        match node {
            FilterNode::EqualityMatch(ava) => {
                assert_eq!(
                    ava.assertion_value.as_bytes(),
                    b"Parens R Us (for all your parenthetical needs)"
                );
            }
            _ => panic!("expected EqualityMatch"),
        }
    }

    #[test]
    fn parses_substring_with_all_pieces() {
        let node = parse("(cn=Babs J*)").unwrap();
        match node {
            FilterNode::Substrings(sf) => {
                assert_eq!(sf.substrings.len(), 1);
                assert_eq!(sf.substrings[0].value().as_bytes(), b"Babs J");
                assert_eq!(sf.substrings[0].tag(), tag::SUBSTRING_INITIAL);
            }
            _ => panic!("expected Substrings"),
        }
    }

    #[test]
    fn parses_substring_middle_pieces() {
        let node = parse("(o=univ*of*mich*)").unwrap();
        match node {
            FilterNode::Substrings(sf) => {
                assert_eq!(sf.substrings.len(), 3);
                assert_eq!(sf.substrings[0].tag(), tag::SUBSTRING_INITIAL);
                assert_eq!(sf.substrings[1].tag(), tag::SUBSTRING_ANY);
                assert_eq!(sf.substrings[2].tag(), tag::SUBSTRING_ANY);
            }
            _ => panic!("expected Substrings"),
        }
    }

    #[test]
    fn parses_bare_double_star_as_single_empty_any() {
        let node = parse("(cn=**)").unwrap();
        match node {
            FilterNode::Substrings(sf) => {
                assert_eq!(sf.substrings.len(), 1);
                assert_eq!(sf.substrings[0].tag(), tag::SUBSTRING_ANY);
                assert_eq!(sf.substrings[0].value().as_bytes(), b"");
            }
            _ => panic!("expected Substrings"),
        }
    }

    #[test]
    fn parses_extensible_with_dn_and_rule() {
        let node = parse("(cn:dn:2.4.6.8.10:=Jensen)").unwrap();
        match node {
            FilterNode::ExtensibleMatch(mra) => {
                assert!(mra.dn_attributes);
                assert_eq!(mra.matching_rule.unwrap().as_str(), "2.4.6.8.10");
                assert_eq!(mra.rule_type.unwrap().as_str(), "cn");
                assert_eq!(mra.assertion_value.as_bytes(), b"Jensen");
            }
            _ => panic!("expected ExtensibleMatch"),
        }
    }

    #[test]
    fn parses_extensible_rule_only() {
        let node = parse("(:2.4.6.8.10:=Jensen)").unwrap();
        match node {
            FilterNode::ExtensibleMatch(mra) => {
                assert!(mra.rule_type.is_none());
                assert_eq!(mra.matching_rule.unwrap().as_str(), "2.4.6.8.10");
            }
            _ => panic!("expected ExtensibleMatch"),
        }
    }

    #[test]
    fn parses_extensible_with_dn_and_trailing_empty_colon_piece() {
        let node = parse("(cn:dn::=Jensen)").unwrap();
        match node {
            FilterNode::ExtensibleMatch(mra) => {
                assert!(mra.dn_attributes);
                assert!(mra.matching_rule.is_none());
                assert_eq!(mra.rule_type.unwrap().as_str(), "cn");
            }
            _ => panic!("expected ExtensibleMatch"),
        }
    }

    #[test]
    fn rejects_trailing_data() {
        let err = parse("(cn=a)(sn=b)").unwrap_err();
        assert_eq!(err.reason, FilterSyntaxReason::TrailingData);
    }

    #[test]
    fn rejects_unbalanced_parens() {
        let err = parse("(cn=a").unwrap_err();
        assert_eq!(err.reason, FilterSyntaxReason::MissingRightParen);
    }

    #[test]
    fn rejects_empty_and_set() {
        let err = parse("(&)").unwrap_err();
        assert_eq!(err.reason, FilterSyntaxReason::EmptyFilterSet);
    }

    #[test]
    fn rejects_bare_extensible_operator() {
        let err = parse("(:=Jensen)").unwrap_err();
        assert_eq!(err.reason, FilterSyntaxReason::NoMatchingRule);
    }

    #[test]
    fn empty_input_parses_to_objectclass_present() {
        let node = parse("").unwrap();
        match node {
            FilterNode::Present(attr) => assert_eq!(attr.as_str(), "objectclass"),
            _ => panic!("expected Present"),
        }
    }

    #[test]
    fn bare_unwrapped_filter_is_auto_wrapped() {
        let node = parse("cn=Babs Jensen").unwrap();
        match node {
            FilterNode::EqualityMatch(ava) => assert_eq!(ava.attribute_desc.as_str(), "cn"),
            _ => panic!("expected EqualityMatch"),
        }
    }

    #[test]
    fn bare_filter_ending_in_v2_escaped_paren_is_still_wrapped() {
        // V2 upgrade must run before the bare-filter paren-wrap check, or the
        // raw `\)` at the end makes this look pre-wrapped and the wrap is
        // skipped, leaving no real delimiters at all.
        let node = parse("cn=foo\\)").unwrap();
        match node {
            FilterNode::EqualityMatch(ava) => {
                assert_eq!(ava.attribute_desc.as_str(), "cn");
                assert_eq!(ava.assertion_value.as_bytes(), b"foo)");
            }
            _ => panic!("expected EqualityMatch"),
        }
    }
}
