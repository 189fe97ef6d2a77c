//! A stateful, frame-stack builder for assembling a [`crate::filter::FilterNode`]
//! incrementally, without constructing a textual filter first.
//!
//! This mirrors a SAX-style assembly API: callers open a container
//! (`start_nested_filter`/`start_substrings`), add children, and close it
//! (`end_nested_filter`/`end_substrings`). Each open container is an explicit
//! [`Frame`] on an explicit stack, never a back-pointer or a trait object, so
//! the whole state machine stays a plain `Vec`.

use crate::error::{BuilderSequencingError, BuilderSequencingReason};
use crate::filter::{
    AssertionValue, AttributeDescription, AttributeValueAssertion, FilterNode,
    MatchingRuleAssertion, MatchingRuleId, SubstringFilter, SubstringPiece,
};

/// Which boolean container a [`Frame::Nested`] is accumulating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolTag {
    And,
    Or,
    Not,
}

/// Which slot of a substring sequence the next piece fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstringKind {
    Initial,
    Any,
    Final,
}

#[derive(Debug)]
enum Frame {
    /// An open `And`/`Or`/`Not` awaiting children
    Nested {
        tag: BoolTag,
        children: Vec<FilterNode>,
    },
    /// An open `Substrings` sequence awaiting pieces
    Substrings {
        attribute_desc: AttributeDescription,
        pieces: Vec<SubstringPiece>,
        final_seen: bool,
    },
}

/// Incrementally assembles one [`FilterNode`] tree
///
/// A fresh builder has no frames and no root. Each top-level `add_*`/`start_*`
/// call attaches into the frame on top of the stack if one is open, or
/// becomes the root if the stack is empty. Once a root has been produced (the
/// stack has fully unwound after at least one attach), any further top-level
/// addition is rejected with [`BuilderSequencingReason::NoOpenContainer`] —
/// a builder produces exactly one tree.
#[derive(Debug, Default)]
pub struct FilterBuilder {
    stack: Vec<Frame>,
    root: Option<FilterNode>,
    done: bool,
}

impl FilterBuilder {
    pub fn new() -> Self {
        FilterBuilder::default()
    }

    fn attach(&mut self, node: FilterNode) -> Result<(), BuilderSequencingError> {
        match self.stack.last_mut() {
            Some(Frame::Nested {
                tag: BoolTag::Not,
                children,
            }) => {
                if !children.is_empty() {
                    return Err(BuilderSequencingError::new(
                        BuilderSequencingReason::SecondChildForNot,
                    ));
                }
                children.push(node);
                Ok(())
            }
            Some(Frame::Nested { children, .. }) => {
                children.push(node);
                Ok(())
            }
            Some(Frame::Substrings { .. }) => Err(BuilderSequencingError::new(
                BuilderSequencingReason::AssertionInsideSubstrings,
            )),
            None => {
                if self.done {
                    return Err(BuilderSequencingError::new(
                        BuilderSequencingReason::NoOpenContainer,
                    ));
                }
                self.root = Some(node);
                self.done = true;
                Ok(())
            }
        }
    }

    /// Open a new `And`/`Or`/`Not` container, pushing an empty frame
    pub fn start_nested_filter(&mut self, tag: BoolTag) {
        self.stack.push(Frame::Nested {
            tag,
            children: Vec::new(),
        });
    }

    /// Close the innermost open `And`/`Or`/`Not` container, build its node
    /// and attach it into whatever is now on top of the stack (or make it
    /// the root).
    pub fn end_nested_filter(&mut self, tag: BoolTag) -> Result<(), BuilderSequencingError> {
        match self.stack.pop() {
            Some(Frame::Nested {
                tag: open_tag,
                children,
            }) if open_tag == tag => {
                let node = match tag {
                    BoolTag::And => {
                        if children.is_empty() {
                            return Err(BuilderSequencingError::new(
                                BuilderSequencingReason::EmptyBooleanSet,
                            ));
                        }
                        FilterNode::And(children)
                    }
                    BoolTag::Or => {
                        if children.is_empty() {
                            return Err(BuilderSequencingError::new(
                                BuilderSequencingReason::EmptyBooleanSet,
                            ));
                        }
                        FilterNode::Or(children)
                    }
                    BoolTag::Not => {
                        let mut children = children;
                        let child = children.pop().ok_or_else(|| {
                            BuilderSequencingError::new(BuilderSequencingReason::EmptyNot)
                        })?;
                        FilterNode::Not(Box::new(child))
                    }
                };
                self.attach(node)
            }
            Some(other) => {
                self.stack.push(other);
                Err(BuilderSequencingError::new(
                    BuilderSequencingReason::MismatchedEnd,
                ))
            }
            None => Err(BuilderSequencingError::new(
                BuilderSequencingReason::MismatchedEnd,
            )),
        }
    }

    /// Open a new substring sequence for `attribute_desc`
    pub fn start_substrings(&mut self, attribute_desc: AttributeDescription) {
        self.stack.push(Frame::Substrings {
            attribute_desc,
            pieces: Vec::new(),
            final_seen: false,
        });
    }

    /// Add one piece to the innermost open substring sequence
    ///
    /// `Initial` is only accepted as the very first piece; once a `Final`
    /// has been added, no further piece of any kind is accepted — both
    /// violations fail *out of sequence*, matching the sequencing rule a
    /// textual `attr=initial*any*final` pattern enforces implicitly.
    pub fn add_substring(
        &mut self,
        kind: SubstringKind,
        value: AssertionValue,
    ) -> Result<(), BuilderSequencingError> {
        match self.stack.last_mut() {
            Some(Frame::Substrings {
                pieces, final_seen, ..
            }) => {
                if *final_seen {
                    return Err(BuilderSequencingError::new(
                        BuilderSequencingReason::OutOfSequence,
                    ));
                }
                if matches!(kind, SubstringKind::Initial) && !pieces.is_empty() {
                    return Err(BuilderSequencingError::new(
                        BuilderSequencingReason::OutOfSequence,
                    ));
                }
                if matches!(kind, SubstringKind::Final) {
                    *final_seen = true;
                }
                pieces.push(match kind {
                    SubstringKind::Initial => SubstringPiece::Initial(value),
                    SubstringKind::Any => SubstringPiece::Any(value),
                    SubstringKind::Final => SubstringPiece::Final(value),
                });
                Ok(())
            }
            _ => Err(BuilderSequencingError::new(
                BuilderSequencingReason::OutOfSequence,
            )),
        }
    }

    /// Close the innermost open substring sequence and attach its node
    pub fn end_substrings(&mut self) -> Result<(), BuilderSequencingError> {
        match self.stack.pop() {
            Some(Frame::Substrings {
                attribute_desc,
                pieces,
                ..
            }) => {
                if pieces.is_empty() {
                    return Err(BuilderSequencingError::new(
                        BuilderSequencingReason::EmptySubstring,
                    ));
                }
                self.attach(FilterNode::Substrings(SubstringFilter {
                    attribute_desc,
                    substrings: pieces,
                }))
            }
            Some(other) => {
                self.stack.push(other);
                Err(BuilderSequencingError::new(
                    BuilderSequencingReason::MismatchedEnd,
                ))
            }
            None => Err(BuilderSequencingError::new(
                BuilderSequencingReason::MismatchedEnd,
            )),
        }
    }

    /// Add an equality, ordering, or approximate-match assertion
    pub fn add_attribute_value_assertion(
        &mut self,
        tag: u8,
        attribute_desc: AttributeDescription,
        assertion_value: AssertionValue,
    ) -> Result<(), BuilderSequencingError> {
        let ava = AttributeValueAssertion {
            attribute_desc,
            assertion_value,
        };
        let node = match tag {
            crate::filter::tag::EQUALITY_MATCH => FilterNode::EqualityMatch(ava),
            crate::filter::tag::GREATER_OR_EQUAL => FilterNode::GreaterOrEqual(ava),
            crate::filter::tag::LESS_OR_EQUAL => FilterNode::LessOrEqual(ava),
            crate::filter::tag::APPROX_MATCH => FilterNode::ApproxMatch(ava),
            _ => unreachable!("caller must pass one of the four assertion tags"),
        };
        self.attach(node)
    }

    /// Add a `Present` assertion
    pub fn add_present(
        &mut self,
        attribute_desc: AttributeDescription,
    ) -> Result<(), BuilderSequencingError> {
        self.attach(FilterNode::Present(attribute_desc))
    }

    /// Add an extensible-match assertion
    ///
    /// Unlike parsing filter text, the Builder does not itself enforce "at
    /// least one of matching_rule/rule_type" — that invariant is the caller's
    /// to keep, same as the Parser enforces it on its own input before ever
    /// calling into the Builder.
    pub fn add_extensible_match(
        &mut self,
        matching_rule: Option<MatchingRuleId>,
        rule_type: Option<AttributeDescription>,
        assertion_value: AssertionValue,
        dn_attributes: bool,
    ) -> Result<(), BuilderSequencingError> {
        self.attach(FilterNode::ExtensibleMatch(MatchingRuleAssertion {
            matching_rule,
            rule_type,
            assertion_value,
            dn_attributes,
        }))
    }

    /// Finish building and take the assembled tree
    ///
    /// Returns `None` if the stack is not fully unwound (an open container
    /// was never closed) or nothing was ever attached.
    pub fn build(mut self) -> Option<FilterNode> {
        if !self.stack.is_empty() {
            return None;
        }
        self.root.take()
    }
}
