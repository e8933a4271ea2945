//! The character-driven state machine.
//!
//! A `Scanner` consumes a manifest one character at a time, classifying each
//! against the current machine state and driving mutations of the
//! [`ParseState`](crate::parser::ParseState) under construction. It performs:
//! - structural dispatch (`{`, `}`, `[`, `]`, `:`, `,`)
//! - lexeme accumulation for keys, strings, numbers, and booleans
//! - comment recognition (`//` and `/* */`) with resume-state bookkeeping
//! - escaped-quote handling inside keys and string values
//! - line/offset tracking for diagnostics
//!
//! A scanner is built fresh for every parse call and never reused; all
//! mutable scan state lives on the one value.

use crate::error::{ParseContext, ParseError, Result};
use crate::parser::ParseState;
use std::fmt;

/// Machine states. The set is closed: every character of input is handled
/// by exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Before the opening `{` of the document.
    Begin,
    /// Inside a mapping, before a key (or the closing `}`).
    AwaitingKey,
    /// Accumulating a quoted key.
    InKey,
    /// Between a completed key and its `:`.
    BetweenKeyAndValue,
    /// After `:`, before the first character of a value.
    AwaitingValue,
    /// Just after the `{` of a mapping-typed value.
    AwaitingCompoundValue,
    /// Accumulating a quoted string value.
    InValue,
    /// Accumulating a numeric value lexeme.
    InNumericValue,
    /// Accumulating a boolean value lexeme.
    InBooleanValue,
    /// Inside a sequence, before an element (or the closing `]`).
    AwaitingArrayElement,
    /// Accumulating a quoted string element.
    InArrayElement,
    /// Accumulating a numeric element lexeme.
    InNumericArrayElement,
    /// Accumulating a boolean element lexeme.
    InBooleanArrayElement,
    /// After a completed mapping entry, before `,` or `}`.
    AfterValue,
    /// After a completed sequence element, before `,` or `]`.
    AfterArrayElement,
    /// After the `/` that may open a comment.
    AwaitBeginComment,
    /// Inside a `/* */` comment.
    InComment,
    /// Inside a `//` comment.
    InLineComment,
}

impl State {
    /// States that accumulate raw text, where `/` and `"` lose their
    /// structural meaning.
    fn in_text(self) -> bool {
        matches!(self, State::InKey | State::InValue | State::InArrayElement)
    }

    fn in_comment(self) -> bool {
        matches!(
            self,
            State::AwaitBeginComment | State::InComment | State::InLineComment
        )
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Begin => "BEGIN",
            State::AwaitingKey => "AWAITING_KEY",
            State::InKey => "IN_KEY",
            State::BetweenKeyAndValue => "BETWEEN_KEY_AND_VALUE",
            State::AwaitingValue => "AWAITING_VALUE",
            State::AwaitingCompoundValue => "AWAITING_COMPOUND_VALUE",
            State::InValue => "IN_VALUE",
            State::InNumericValue => "IN_NUMERIC_VALUE",
            State::InBooleanValue => "IN_BOOLEAN_VALUE",
            State::AwaitingArrayElement => "AWAITING_ARRAY_ELEMENT",
            State::InArrayElement => "IN_ARRAY_ELEMENT",
            State::InNumericArrayElement => "IN_NUMERIC_ARRAY_ELEMENT",
            State::InBooleanArrayElement => "IN_BOOLEAN_ARRAY_ELEMENT",
            State::AfterValue => "AFTER_VALUE",
            State::AfterArrayElement => "AFTER_ARRAY_ELEMENT",
            State::AwaitBeginComment => "AWAIT_BEGIN_COMMENT",
            State::InComment => "IN_COMMENT",
            State::InLineComment => "IN_LINE_COMMENT",
        };
        f.write_str(name)
    }
}

/// Transient scan state, owned by exactly one parse invocation.
pub(crate) struct Scanner {
    state: State,
    /// Lexeme accumulation buffer.
    buf: String,
    /// Previous character, for escape and comment-close lookback.
    last_char: Option<char>,
    /// State to restore when the current comment ends.
    resume_after_comment: State,
    /// 0-based line of the character being visited.
    line: usize,
    /// Character offset from the start of the input.
    offset: usize,
}

impl Scanner {
    pub(crate) fn new() -> Self {
        Scanner {
            state: State::Begin,
            buf: String::new(),
            last_char: None,
            resume_after_comment: State::Begin,
            line: 0,
            offset: 0,
        }
    }

    /// Feed one character through the machine.
    pub(crate) fn visit_char(
        &mut self,
        c: char,
        doc: &mut ParseState,
        ctx: &ParseContext,
    ) -> Result<()> {
        if c == '\n' {
            self.line += 1;
        }
        let result = self.dispatch(c, doc, ctx);
        self.last_char = Some(c);
        self.offset += 1;
        result
    }

    /// Validate the resting state once input is exhausted. A well-formed
    /// document rests in `AfterValue` at depth zero.
    pub(crate) fn finish(&self, doc: &ParseState, ctx: &ParseContext) -> Result<()> {
        if self.state.in_text() {
            return Err(self.unexpected_end("unterminated string at end of input", ctx));
        }
        if self.state == State::Begin {
            return Err(self.unexpected_end("no top-level mapping found", ctx));
        }
        if self.state != State::AfterValue || !doc.is_settled() {
            return Err(self.unexpected_end("input ended before the document was complete", ctx));
        }
        Ok(())
    }

    fn dispatch(&mut self, c: char, doc: &mut ParseState, ctx: &ParseContext) -> Result<()> {
        // A slash outside text and comments always opens a comment; the
        // pre-comment state is restored when the comment ends.
        if c == '/' && !self.state.in_text() && !self.state.in_comment() {
            self.resume_after_comment = self.state;
            self.state = State::AwaitBeginComment;
            return Ok(());
        }

        // A quote preceded by a backslash inside a key or string is a
        // literal quote; the backslash is dropped from the lexeme.
        if c == '"' && self.last_char == Some('\\') && self.state.in_text() {
            self.buf.pop();
            self.buf.push('"');
            return Ok(());
        }

        match self.state {
            State::Begin => match c {
                c if c.is_whitespace() => Ok(()),
                '{' => {
                    self.state = State::AwaitingKey;
                    Ok(())
                }
                _ => Err(self.fail("Expected '{'", c, ctx)),
            },

            State::AwaitBeginComment => match c {
                '*' => {
                    self.state = State::InComment;
                    Ok(())
                }
                '/' => {
                    self.state = State::InLineComment;
                    Ok(())
                }
                c if c.is_whitespace() => Ok(()),
                _ => Err(self.fail("Expected '/' or '*' awaiting comment marker", c, ctx)),
            },

            State::InComment => {
                if c == '/' && self.last_char == Some('*') {
                    self.state = self.resume_after_comment;
                }
                Ok(())
            }

            State::InLineComment => {
                if c == '\n' {
                    self.state = self.resume_after_comment;
                }
                Ok(())
            }

            State::AwaitingKey => match c {
                c if c.is_whitespace() => Ok(()),
                '"' => {
                    self.buf.clear();
                    self.state = State::InKey;
                    Ok(())
                }
                '}' => self.close_mapping(c, doc, ctx),
                _ => Err(self.fail("Expected '\"' or whitespace before key", c, ctx)),
            },

            State::AwaitingCompoundValue => match c {
                c if c.is_whitespace() => Ok(()),
                '"' => {
                    self.buf.clear();
                    self.state = State::InKey;
                    Ok(())
                }
                '}' => self.close_mapping(c, doc, ctx),
                _ => Err(self.fail("Expected '\"' or '}' awaiting compound value", c, ctx)),
            },

            State::InKey => {
                if c == '"' {
                    doc.push_key(std::mem::take(&mut self.buf));
                    self.state = State::BetweenKeyAndValue;
                } else {
                    self.buf.push(c);
                }
                Ok(())
            }

            State::BetweenKeyAndValue => match c {
                c if c.is_whitespace() => Ok(()),
                ':' => {
                    self.state = State::AwaitingValue;
                    Ok(())
                }
                _ => Err(self.fail("Expected ':' or whitespace between key and value", c, ctx)),
            },

            State::AwaitingValue => match c {
                c if c.is_whitespace() => Ok(()),
                '"' => {
                    self.buf.clear();
                    self.state = State::InValue;
                    Ok(())
                }
                '{' => {
                    doc.enter_mapping_value()
                        .map_err(|m| self.fail(&m, c, ctx))?;
                    self.state = State::AwaitingCompoundValue;
                    Ok(())
                }
                '[' => {
                    doc.enter_sequence_value()
                        .map_err(|m| self.fail(&m, c, ctx))?;
                    self.state = State::AwaitingArrayElement;
                    Ok(())
                }
                't' | 'f' => {
                    self.buf.clear();
                    self.buf.push(c);
                    self.state = State::InBooleanValue;
                    Ok(())
                }
                '-' | '.' | '0'..='9' => {
                    self.buf.clear();
                    self.buf.push(c);
                    self.state = State::InNumericValue;
                    Ok(())
                }
                _ => Err(self.fail("Expected a value to follow ':'", c, ctx)),
            },

            State::InValue => {
                if c == '"' {
                    doc.set_string_value(std::mem::take(&mut self.buf))
                        .map_err(|m| self.fail(&m, c, ctx))?;
                    self.state = State::AfterValue;
                } else {
                    self.buf.push(c);
                }
                Ok(())
            }

            State::InNumericValue => match c {
                c if c.is_whitespace() => {
                    self.commit_number_value(c, doc, ctx)?;
                    self.state = State::AfterValue;
                    Ok(())
                }
                ',' => {
                    self.commit_number_value(c, doc, ctx)?;
                    self.state = State::AwaitingKey;
                    Ok(())
                }
                '}' => {
                    self.commit_number_value(c, doc, ctx)?;
                    self.close_mapping(c, doc, ctx)
                }
                '.' if !self.buf.contains('.') => {
                    self.buf.push(c);
                    Ok(())
                }
                '.' => Err(self.fail("Extra decimal point in number", c, ctx)),
                '0'..='9' => {
                    self.buf.push(c);
                    Ok(())
                }
                _ => Err(self.fail("Invalid character in number", c, ctx)),
            },

            State::InBooleanValue => match c {
                c if c.is_whitespace() => {
                    self.commit_boolean_value(c, doc, ctx)?;
                    self.state = State::AfterValue;
                    Ok(())
                }
                ',' => {
                    self.commit_boolean_value(c, doc, ctx)?;
                    self.state = State::AwaitingKey;
                    Ok(())
                }
                '}' => {
                    self.commit_boolean_value(c, doc, ctx)?;
                    self.close_mapping(c, doc, ctx)
                }
                _ => {
                    self.push_boolean_char(c, ctx)?;
                    Ok(())
                }
            },

            State::AwaitingArrayElement => match c {
                c if c.is_whitespace() => Ok(()),
                '{' => {
                    doc.enter_mapping_element()
                        .map_err(|m| self.fail(&m, c, ctx))?;
                    self.state = State::AwaitingKey;
                    Ok(())
                }
                '[' => {
                    doc.enter_sequence_element()
                        .map_err(|m| self.fail(&m, c, ctx))?;
                    self.state = State::AwaitingArrayElement;
                    Ok(())
                }
                '"' => {
                    self.buf.clear();
                    self.state = State::InArrayElement;
                    Ok(())
                }
                't' | 'f' => {
                    self.buf.clear();
                    self.buf.push(c);
                    self.state = State::InBooleanArrayElement;
                    Ok(())
                }
                '-' | '.' | '0'..='9' => {
                    self.buf.clear();
                    self.buf.push(c);
                    self.state = State::InNumericArrayElement;
                    Ok(())
                }
                ']' => self.close_sequence(c, doc, ctx),
                _ => Err(self.fail("Expected a value or ']' awaiting array element", c, ctx)),
            },

            State::InArrayElement => {
                if c == '"' {
                    doc.push_string_element(std::mem::take(&mut self.buf))
                        .map_err(|m| self.fail(&m, c, ctx))?;
                    self.state = State::AfterArrayElement;
                } else {
                    self.buf.push(c);
                }
                Ok(())
            }

            State::InNumericArrayElement => match c {
                c if c.is_whitespace() => {
                    self.commit_number_element(c, doc, ctx)?;
                    self.state = State::AfterArrayElement;
                    Ok(())
                }
                ',' => {
                    self.commit_number_element(c, doc, ctx)?;
                    self.state = State::AwaitingArrayElement;
                    Ok(())
                }
                ']' => {
                    self.commit_number_element(c, doc, ctx)?;
                    self.close_sequence(c, doc, ctx)
                }
                '.' if !self.buf.contains('.') => {
                    self.buf.push(c);
                    Ok(())
                }
                '.' => Err(self.fail("Extra decimal point in number", c, ctx)),
                '0'..='9' => {
                    self.buf.push(c);
                    Ok(())
                }
                _ => Err(self.fail("Invalid character in numeric array element", c, ctx)),
            },

            State::InBooleanArrayElement => match c {
                c if c.is_whitespace() => {
                    self.commit_boolean_element(c, doc, ctx)?;
                    self.state = State::AfterArrayElement;
                    Ok(())
                }
                ',' => {
                    self.commit_boolean_element(c, doc, ctx)?;
                    self.state = State::AwaitingArrayElement;
                    Ok(())
                }
                ']' => {
                    self.commit_boolean_element(c, doc, ctx)?;
                    self.close_sequence(c, doc, ctx)
                }
                _ => {
                    self.push_boolean_char(c, ctx)?;
                    Ok(())
                }
            },

            State::AfterValue => match c {
                c if c.is_whitespace() => Ok(()),
                ',' => {
                    self.state = State::AwaitingKey;
                    Ok(())
                }
                '}' => self.close_mapping(c, doc, ctx),
                _ => Err(self.fail("Expected ',' or '}' after value", c, ctx)),
            },

            State::AfterArrayElement => match c {
                c if c.is_whitespace() => Ok(()),
                ',' => {
                    self.state = State::AwaitingArrayElement;
                    Ok(())
                }
                ']' => self.close_sequence(c, doc, ctx),
                _ => Err(self.fail("Expected ',' or ']' after array element", c, ctx)),
            },
        }
    }

    /// Pop the innermost open mapping and land in the state the enclosing
    /// context calls for.
    fn close_mapping(&mut self, c: char, doc: &mut ParseState, ctx: &ParseContext) -> Result<()> {
        doc.exit_mapping().map_err(|m| self.fail(&m, c, ctx))?;
        self.state = if doc.has_open_sequence() {
            State::AfterArrayElement
        } else {
            State::AfterValue
        };
        Ok(())
    }

    /// Pop the innermost open sequence; a still-open enclosing sequence
    /// keeps the machine in array-element mode.
    fn close_sequence(&mut self, c: char, doc: &mut ParseState, ctx: &ParseContext) -> Result<()> {
        doc.exit_sequence().map_err(|m| self.fail(&m, c, ctx))?;
        self.state = if doc.has_open_sequence() {
            State::AfterArrayElement
        } else {
            State::AfterValue
        };
        Ok(())
    }

    fn commit_number_value(&mut self, c: char, doc: &mut ParseState, ctx: &ParseContext) -> Result<()> {
        let lexeme = std::mem::take(&mut self.buf);
        doc.set_number_value(&lexeme).map_err(|m| self.fail(&m, c, ctx))
    }

    fn commit_boolean_value(&mut self, c: char, doc: &mut ParseState, ctx: &ParseContext) -> Result<()> {
        let lexeme = std::mem::take(&mut self.buf);
        doc.set_boolean_value(&lexeme).map_err(|m| self.fail(&m, c, ctx))
    }

    fn commit_number_element(&mut self, c: char, doc: &mut ParseState, ctx: &ParseContext) -> Result<()> {
        let lexeme = std::mem::take(&mut self.buf);
        doc.push_number_element(&lexeme).map_err(|m| self.fail(&m, c, ctx))
    }

    fn commit_boolean_element(&mut self, c: char, doc: &mut ParseState, ctx: &ParseContext) -> Result<()> {
        let lexeme = std::mem::take(&mut self.buf);
        doc.push_boolean_element(&lexeme).map_err(|m| self.fail(&m, c, ctx))
    }

    /// Accept the next boolean character only while the lexeme remains a
    /// prefix of `true` or `false`.
    fn push_boolean_char(&mut self, c: char, ctx: &ParseContext) -> Result<()> {
        let mut candidate = self.buf.clone();
        candidate.push(c);
        if "true".starts_with(&candidate) || "false".starts_with(&candidate) {
            self.buf.push(c);
            Ok(())
        } else {
            Err(self.fail("Invalid character in boolean", c, ctx))
        }
    }

    fn fail(&self, message: &str, c: char, ctx: &ParseContext) -> ParseError {
        ParseError::Structural {
            state: self.state,
            message: message.to_string(),
            character: c,
            line: self.line,
            offset: self.offset,
            file: ctx.file_suffix(),
        }
    }

    fn unexpected_end(&self, message: &str, ctx: &ParseContext) -> ParseError {
        ParseError::UnexpectedEnd {
            state: self.state,
            message: message.to_string(),
            file: ctx.file_suffix(),
        }
    }
}
