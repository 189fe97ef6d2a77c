//! Character-level cursor over an RFC 2254 filter string
//!
//! The Tokenizer owns the filter text and a byte cursor, and exposes typed
//! reads for the handful of positions the grammar can be in: `(`, `)`, an
//! operator-or-attribute, a comparison operator, and a value run up to the
//! next `)`. It never decodes multi-byte UTF-8 itself — that stays
//! centralised in [`crate::codec`].

use crate::error::{FilterSyntaxError, FilterSyntaxReason};
use crate::filter::validate_attribute_description;

/// The boolean operator read by [`Tokenizer::op_or_attr`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoolOp {
    And,
    Or,
    Not,
}

/// The comparison operator read by [`Tokenizer::filter_type`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ComparisonOp {
    Equal,
    GreaterOrEqual,
    LessOrEqual,
    Approx,
    Extensible,
}

pub(crate) struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    attr: Option<String>,
}

impl<'a> Tokenizer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Tokenizer {
            input,
            pos: 0,
            attr: None,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub(crate) fn get_left_paren(&mut self) -> Result<(), FilterSyntaxError> {
        match self.rest().chars().next() {
            Some('(') => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(FilterSyntaxError::new(FilterSyntaxReason::MissingLeftParen)),
        }
    }

    pub(crate) fn get_right_paren(&mut self) -> Result<(), FilterSyntaxError> {
        match self.rest().chars().next() {
            Some(')') => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(FilterSyntaxError::new(
                FilterSyntaxReason::MissingRightParen,
            )),
        }
    }

    pub(crate) fn peek_char(&self) -> Result<char, FilterSyntaxError> {
        self.rest()
            .chars()
            .next()
            .ok_or_else(|| FilterSyntaxError::new(FilterSyntaxReason::UnexpectedEnd))
    }

    /// Read either a single boolean operator character (advancing by one)
    /// or a bare attribute description, captured into the side slot read
    /// back by [`Tokenizer::attr`]. Returns `None` in the attribute case.
    pub(crate) fn op_or_attr(&mut self) -> Result<Option<BoolOp>, FilterSyntaxError> {
        let rest = self.rest();
        if rest.starts_with(":::=") || rest.starts_with("::=") {
            return Err(FilterSyntaxError::new(
                FilterSyntaxReason::NoDnNorMatchingRule,
            ));
        }
        if rest.starts_with(":=") {
            return Err(FilterSyntaxError::new(FilterSyntaxReason::NoMatchingRule));
        }
        match self.peek_char()? {
            '&' => {
                self.pos += 1;
                Ok(Some(BoolOp::And))
            }
            '|' => {
                self.pos += 1;
                Ok(Some(BoolOp::Or))
            }
            '!' => {
                self.pos += 1;
                Ok(Some(BoolOp::Not))
            }
            _ => {
                let attr = self.read_attribute_description()?;
                self.attr = Some(attr);
                Ok(None)
            }
        }
    }

    fn read_attribute_description(&mut self) -> Result<String, FilterSyntaxError> {
        let start = self.pos;
        loop {
            let rest = self.rest();
            if rest.is_empty() || rest.starts_with(":=") {
                break;
            }
            let ch = rest.chars().next().expect("checked non-empty above");
            if matches!(ch, '=' | '~' | '<' | '>' | '(' | ')') {
                break;
            }
            self.pos += ch.len_utf8();
        }
        let raw = self.input[start..self.pos].trim();
        if raw.chars().any(|c| c == '\\') {
            return Err(FilterSyntaxError::new(
                FilterSyntaxReason::InvalidEscapeInDescriptor,
            ));
        }
        validate_attribute_description(raw)?;
        Ok(raw.to_string())
    }

    /// Read the comparison operator at the cursor, advancing past it
    pub(crate) fn filter_type(&mut self) -> Result<ComparisonOp, FilterSyntaxError> {
        let rest = self.rest();
        if rest.starts_with(">=") {
            self.pos += 2;
            Ok(ComparisonOp::GreaterOrEqual)
        } else if rest.starts_with("<=") {
            self.pos += 2;
            Ok(ComparisonOp::LessOrEqual)
        } else if rest.starts_with("~=") {
            self.pos += 2;
            Ok(ComparisonOp::Approx)
        } else if rest.starts_with(":=") {
            self.pos += 2;
            Ok(ComparisonOp::Extensible)
        } else if rest.starts_with('=') {
            self.pos += 1;
            Ok(ComparisonOp::Equal)
        } else {
            Err(FilterSyntaxError::new(FilterSyntaxReason::InvalidComparison))
        }
    }

    /// Read the raw (unescaped) value text up to the next `)` or
    /// end-of-string; the cursor lands on the `)`, not past it.
    pub(crate) fn value(&mut self) -> &'a str {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos] != b')' {
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    /// The attribute description last captured by [`Tokenizer::op_or_attr`]
    pub(crate) fn attr(&self) -> Option<&str> {
        self.attr.as_deref()
    }

    /// True once the cursor has consumed the entire input
    pub(crate) fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }
}
