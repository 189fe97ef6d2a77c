//! End-to-end coverage of the textual grammar: parse, then render back

use ldap_filter::filter::FilterNode;
use ldap_filter::{parse, render};

fn round_trips(text: &str) -> FilterNode {
    let node = parse(text).unwrap();
    let rendered = render(&node);
    let reparsed = parse(&rendered).unwrap();
    assert_eq!(node, reparsed, "re-parsing the rendered text changed the tree");
    node
}

#[test]
fn equality_filter_round_trips() {
    round_trips("(cn=Babs Jensen)");
}

#[test]
fn presence_filter_round_trips() {
    round_trips("(cn=*)");
}

#[test]
fn negated_equality_round_trips() {
    round_trips("(!(cn=Tim Howes))");
}

#[test]
fn conjunction_round_trips() {
    round_trips("(&(objectClass=Person)(|(sn=Jensen)(cn=Babs J*)))");
}

#[test]
fn substring_with_initial_and_final_round_trips() {
    round_trips("(cn=Babs J*)");
}

#[test]
fn substring_with_only_middle_pieces_round_trips() {
    round_trips("(o=univ*of*mich*)");
}

#[test]
fn extensible_match_round_trips() {
    round_trips("(cn:caseExactMatch:=Fred Flintstone)");
}

#[test]
fn extensible_match_with_dn_flag_round_trips() {
    round_trips("(sn:dn:2.4.6.8.10:=Barney Rubble)");
}

#[test]
fn extensible_match_with_rule_only_round_trips() {
    round_trips("(o:dn:=Sete Sois)");
}

#[test]
fn legacy_v2_escapes_upgrade_to_v3() {
    let node = parse("(o=Parens R Us \\(for all your parenthetical needs\\))").unwrap();
    let rendered = render(&node);
    assert_eq!(
        rendered,
        "(o=Parens R Us \\28for all your parenthetical needs\\29)"
    );
}

#[test]
fn bare_double_star_collapses_to_one_empty_any() {
    let node = parse("(cn=**)").unwrap();
    let rendered = render(&node);
    assert_eq!(rendered, "(cn=*)");
}

#[test]
fn missing_closing_paren_is_rejected() {
    assert!(parse("(cn=Babs Jensen").is_err());
}

#[test]
fn extra_closing_paren_is_rejected() {
    assert!(parse("(cn=Babs Jensen))").is_err());
}

#[test]
fn trailing_sibling_filter_is_rejected() {
    assert!(parse("(cn=a)(sn=b)").is_err());
}

#[test]
fn unescaped_wildcard_outside_substrings_is_accepted_as_substring() {
    // a bare unescaped '*' always means "substring", never a literal asterisk
    let node = parse("(cn=a*b)").unwrap();
    match node {
        FilterNode::Substrings(sf) => assert_eq!(sf.substrings.len(), 2),
        other => panic!("expected Substrings, got {other:?}"),
    }
}

#[test]
fn escaped_wildcard_is_a_literal_asterisk() {
    let node = parse("(cn=a\\2ab)").unwrap();
    match node {
        FilterNode::EqualityMatch(ava) => assert_eq!(ava.assertion_value.as_bytes(), b"a*b"),
        other => panic!("expected EqualityMatch, got {other:?}"),
    }
}

#[test]
fn non_ascii_values_round_trip_through_utf8() {
    let node = parse("(cn=café)").unwrap();
    match &node {
        FilterNode::EqualityMatch(ava) => {
            assert_eq!(ava.assertion_value.as_bytes(), "café".as_bytes());
        }
        other => panic!("expected EqualityMatch, got {other:?}"),
    }
    assert_eq!(render(&node), "(cn=café)");
}
