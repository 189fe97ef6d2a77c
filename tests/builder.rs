//! End-to-end coverage of assembling filters without parsing text first

use ldap_filter::builder::{BoolTag, FilterBuilder, SubstringKind};
use ldap_filter::error::BuilderSequencingReason;
use ldap_filter::filter::{tag, AssertionValue, AttributeDescription, MatchingRuleId};
use ldap_filter::render::render;

fn attr(s: &str) -> AttributeDescription {
    AttributeDescription::new(s).unwrap()
}

#[test]
fn builds_and_renders_a_deeply_nested_filter() {
    let mut b = FilterBuilder::new();
    b.start_nested_filter(BoolTag::And);
    b.add_attribute_value_assertion(
        tag::EQUALITY_MATCH,
        attr("objectClass"),
        AssertionValue::from_octets(*b"Person"),
    )
    .unwrap();
    b.start_nested_filter(BoolTag::Not);
    b.add_present(attr("telephoneNumber")).unwrap();
    b.end_nested_filter(BoolTag::Not).unwrap();
    b.end_nested_filter(BoolTag::And).unwrap();

    let node = b.build().unwrap();
    assert_eq!(
        render(&node),
        "(&(objectClass=Person)(!(telephoneNumber=*)))"
    );
}

#[test]
fn builds_a_substring_filter_piece_by_piece() {
    let mut b = FilterBuilder::new();
    b.start_substrings(attr("cn"));
    b.add_substring(SubstringKind::Initial, AssertionValue::from_octets(*b"Babs"))
        .unwrap();
    b.add_substring(SubstringKind::Any, AssertionValue::from_octets(*b"J"))
        .unwrap();
    b.end_substrings().unwrap();

    let node = b.build().unwrap();
    assert_eq!(render(&node), "(cn=Babs*J*)");
}

#[test]
fn builds_an_extensible_match_with_a_matching_rule() {
    let mut b = FilterBuilder::new();
    b.add_extensible_match(
        Some(MatchingRuleId::new("caseExactMatch")),
        Some(attr("cn")),
        AssertionValue::from_octets(*b"Fred Flintstone"),
        false,
    )
    .unwrap();

    let node = b.build().unwrap();
    assert_eq!(render(&node), "(cn:caseExactMatch:=Fred Flintstone)");
}

#[test]
fn rejects_attaching_a_second_top_level_object() {
    let mut b = FilterBuilder::new();
    b.add_present(attr("cn")).unwrap();
    let err = b.add_present(attr("sn")).unwrap_err();
    assert_eq!(err.reason, BuilderSequencingReason::NoOpenContainer);
}

#[test]
fn rejects_closing_a_container_that_was_never_opened() {
    let mut b = FilterBuilder::new();
    let err = b.end_nested_filter(BoolTag::And).unwrap_err();
    assert_eq!(err.reason, BuilderSequencingReason::MismatchedEnd);
}

#[test]
fn rejects_a_substring_with_no_pieces() {
    let mut b = FilterBuilder::new();
    b.start_substrings(attr("cn"));
    let err = b.end_substrings().unwrap_err();
    assert_eq!(err.reason, BuilderSequencingReason::EmptySubstring);
}

#[test]
fn an_unclosed_container_never_produces_a_tree() {
    let mut b = FilterBuilder::new();
    b.start_nested_filter(BoolTag::Or);
    b.add_present(attr("cn")).unwrap();
    assert!(b.build().is_none());
}
