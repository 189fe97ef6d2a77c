//! Lazy traversal of a [`FilterNode`] tree, and the textual renderer layered
//! on top of it.
//!
//! [`FilterIter`] is a pull iterator driven by an explicit stack of
//! "what to emit next" work items, rather than a recursive walk — so a
//! caller (such as an external BER encoder) can drive the same traversal one
//! step at a time without the depth of the tree becoming Rust call-stack
//! depth. [`render`] is just one consumer of that traversal: it turns the
//! event stream back into RFC 2254 text.

use crate::filter::FilterNode;

/// One step of a filter traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    /// Entering a node with this tag
    Tag(u8),
    /// The number of children about to follow (`And`/`Or`: set members,
    /// `Substrings`: pieces)
    ChildCount(usize),
    /// An attribute description
    Attr(&'a str),
    /// An optional attribute description (`ExtensibleMatch`'s `rule_type`)
    OptAttr(Option<&'a str>),
    /// An optional matching rule id (`ExtensibleMatch`'s `matching_rule`)
    OptRule(Option<&'a str>),
    /// A comparison or assertion value, as raw octets
    Value(&'a [u8]),
    /// The `dn_attributes` flag of an `ExtensibleMatch`
    Bool(bool),
    /// The tag of one substring piece, immediately followed by its `Value`
    SubTag(u8),
}

/// One pending unit of output, pushed in reverse order so popping the stack
/// yields events in the right sequence.
#[derive(Debug)]
enum Work<'a> {
    Node(&'a FilterNode),
    Event(Event<'a>),
}

/// A lazy, stack-driven pull iterator over a [`FilterNode`] and its
/// descendants, yielding typed [`Event`]s in pre-order.
#[derive(Debug)]
pub struct FilterIter<'a> {
    stack: Vec<Work<'a>>,
}

impl<'a> FilterIter<'a> {
    pub(crate) fn new(root: &'a FilterNode) -> Self {
        FilterIter {
            stack: vec![Work::Node(root)],
        }
    }
}

impl<'a> Iterator for FilterIter<'a> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Event<'a>> {
        loop {
            match self.stack.pop()? {
                Work::Event(ev) => return Some(ev),
                Work::Node(node) => {
                    let tag_event = self.push_node(node);
                    return Some(tag_event);
                }
            }
        }
    }
}

impl<'a> FilterIter<'a> {
    /// Push this node's children/fields (in reverse emission order) onto the
    /// stack and return the `Tag` event for the node itself.
    fn push_node(&mut self, node: &'a FilterNode) -> Event<'a> {
        match node {
            FilterNode::And(children) | FilterNode::Or(children) => {
                for child in children.iter().rev() {
                    self.stack.push(Work::Node(child));
                }
                self.stack
                    .push(Work::Event(Event::ChildCount(children.len())));
            }
            FilterNode::Not(child) => {
                self.stack.push(Work::Node(child));
            }
            FilterNode::EqualityMatch(ava)
            | FilterNode::GreaterOrEqual(ava)
            | FilterNode::LessOrEqual(ava)
            | FilterNode::ApproxMatch(ava) => {
                self.stack
                    .push(Work::Event(Event::Value(ava.assertion_value.as_bytes())));
                self.stack
                    .push(Work::Event(Event::Attr(ava.attribute_desc.as_str())));
            }
            FilterNode::Present(attr) => {
                self.stack.push(Work::Event(Event::Attr(attr.as_str())));
            }
            FilterNode::Substrings(sf) => {
                for piece in sf.substrings.iter().rev() {
                    self.stack
                        .push(Work::Event(Event::Value(piece.value().as_bytes())));
                    self.stack.push(Work::Event(Event::SubTag(piece.tag())));
                }
                self.stack
                    .push(Work::Event(Event::ChildCount(sf.substrings.len())));
                self.stack
                    .push(Work::Event(Event::Attr(sf.attribute_desc.as_str())));
            }
            FilterNode::ExtensibleMatch(mra) => {
                self.stack.push(Work::Event(Event::Bool(mra.dn_attributes)));
                self.stack
                    .push(Work::Event(Event::Value(mra.assertion_value.as_bytes())));
                self.stack.push(Work::Event(Event::OptAttr(
                    mra.rule_type.as_ref().map(|a| a.as_str()),
                )));
                self.stack.push(Work::Event(Event::OptRule(
                    mra.matching_rule.as_ref().map(|r| r.as_str()),
                )));
            }
        }
        Event::Tag(node.tag())
    }
}

/// Render a filter tree back to RFC 2254 text, by consuming its [`FilterIter`]
/// traversal.
///
/// This never inspects `FilterNode` directly: it is "layered on" the
/// traversal the same way an external BER encoder would be, which keeps the
/// two consumers of the tree (this renderer, and any wire encoder) honest
/// about only depending on the public event stream.
pub fn render(node: &FilterNode) -> String {
    let mut out = String::new();
    render_events(&mut node.iter(), &mut out);
    out
}

fn render_events<'a, I>(events: &mut I, out: &mut String)
where
    I: Iterator<Item = Event<'a>>,
{
    use crate::filter::tag;

    match events.next().expect("caller ensures a Tag event is next") {
        Event::Tag(t) if matches!(t, tag::AND | tag::OR) => {
            out.push('(');
            out.push(if t == tag::AND { '&' } else { '|' });
            let count = match events.next() {
                Some(Event::ChildCount(n)) => n,
                _ => unreachable!("And/Or always emits ChildCount next"),
            };
            for _ in 0..count {
                render_events(events, out);
            }
            out.push(')');
        }
        Event::Tag(tag::NOT) => {
            out.push('(');
            out.push('!');
            render_events(events, out);
            out.push(')');
        }
        Event::Tag(t @ (tag::EQUALITY_MATCH | tag::GREATER_OR_EQUAL | tag::LESS_OR_EQUAL | tag::APPROX_MATCH)) => {
            let attr = match events.next() {
                Some(Event::Attr(a)) => a,
                _ => unreachable!(),
            };
            let value = match events.next() {
                Some(Event::Value(v)) => v,
                _ => unreachable!(),
            };
            let op = match t {
                tag::EQUALITY_MATCH => "=",
                tag::GREATER_OR_EQUAL => ">=",
                tag::LESS_OR_EQUAL => "<=",
                tag::APPROX_MATCH => "~=",
                _ => unreachable!(),
            };
            out.push('(');
            out.push_str(attr);
            out.push_str(op);
            out.push_str(&crate::codec::render(value));
            out.push(')');
        }
        Event::Tag(tag::PRESENT) => {
            let attr = match events.next() {
                Some(Event::Attr(a)) => a,
                _ => unreachable!(),
            };
            out.push('(');
            out.push_str(attr);
            out.push_str("=*)");
        }
        Event::Tag(tag::SUBSTRINGS) => {
            let attr = match events.next() {
                Some(Event::Attr(a)) => a,
                _ => unreachable!(),
            };
            let count = match events.next() {
                Some(Event::ChildCount(n)) => n,
                _ => unreachable!(),
            };
            let mut pieces = Vec::with_capacity(count);
            for _ in 0..count {
                let piece_tag = match events.next() {
                    Some(Event::SubTag(t)) => t,
                    _ => unreachable!(),
                };
                let value = match events.next() {
                    Some(Event::Value(v)) => v,
                    _ => unreachable!(),
                };
                pieces.push((piece_tag, value));
            }
            out.push('(');
            out.push_str(attr);
            out.push('=');
            // Reconstruct the star-separated segment list: a leading empty
            // segment unless the first piece is Initial, one segment per
            // Any piece, and a trailing empty segment unless the last piece
            // is Final.
            let has_initial = pieces.first().map(|(t, _)| *t == tag::SUBSTRING_INITIAL).unwrap_or(false);
            let has_final = pieces.last().map(|(t, _)| *t == tag::SUBSTRING_FINAL).unwrap_or(false);
            let mut segments: Vec<String> = Vec::new();
            if !has_initial {
                segments.push(String::new());
            }
            for (_, value) in &pieces {
                segments.push(crate::codec::render(value));
            }
            if !has_final {
                segments.push(String::new());
            }
            out.push_str(&segments.join("*"));
            out.push(')');
        }
        Event::Tag(tag::EXTENSIBLE_MATCH) => {
            let rule = match events.next() {
                Some(Event::OptRule(r)) => r,
                _ => unreachable!(),
            };
            let rule_type = match events.next() {
                Some(Event::OptAttr(a)) => a,
                _ => unreachable!(),
            };
            let value = match events.next() {
                Some(Event::Value(v)) => v,
                _ => unreachable!(),
            };
            let dn = match events.next() {
                Some(Event::Bool(b)) => b,
                _ => unreachable!(),
            };
            out.push('(');
            if let Some(a) = rule_type {
                out.push_str(a);
            }
            if dn {
                out.push_str(":dn");
            }
            if let Some(r) = rule {
                out.push(':');
                out.push_str(r);
            }
            out.push_str(":=");
            out.push_str(&crate::codec::render(value));
            out.push(')');
        }
        _ => unreachable!("unexpected leading event"),
    }
}
