//! Document construction and the strict/permissive driving loops.
//!
//! Nesting is tracked with explicit context stacks rather than call-stack
//! recursion: a stack of open mappings, a stack of open sequences, and a
//! stack of pending keys awaiting a value. Containers are built bottom-up;
//! each frame remembers the slot it attaches to when it closes (the root,
//! a key in the enclosing mapping, or the end of the enclosing sequence).
//!
//! A `ParseState` is created fresh per parse call and destroyed when the
//! call returns; it is never reused or shared.

use crate::error::{ParseContext, ParseError, Result};
use crate::scanner::Scanner;
use crate::value::{Mapping, Value};

/// Where a closing container attaches in its parent.
enum MappingSlot {
    /// The document root.
    Root,
    /// A key in the enclosing mapping.
    Key(String),
    /// The next element of the enclosing sequence.
    Element,
}

enum SequenceSlot {
    Key(String),
    Element,
}

struct MappingFrame {
    map: Mapping,
    slot: MappingSlot,
    /// Push ordinal, used to unwind interleaved frames innermost-first.
    id: u64,
}

struct SequenceFrame {
    items: Vec<Value>,
    slot: SequenceSlot,
    id: u64,
}

/// Transient parse state: the document under construction plus the context
/// stacks. Owned exclusively by one parse invocation.
pub(crate) struct ParseState {
    mappings: Vec<MappingFrame>,
    sequences: Vec<SequenceFrame>,
    keys: Vec<String>,
    root: Option<Mapping>,
    next_id: u64,
}

impl ParseState {
    pub(crate) fn new() -> Self {
        ParseState {
            mappings: vec![MappingFrame {
                map: Mapping::new(),
                slot: MappingSlot::Root,
                id: 0,
            }],
            sequences: Vec::new(),
            keys: Vec::new(),
            root: None,
            next_id: 1,
        }
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn push_key(&mut self, key: String) {
        self.keys.push(key);
    }

    pub(crate) fn has_open_sequence(&self) -> bool {
        !self.sequences.is_empty()
    }

    /// True once the root mapping has been closed and nothing is pending.
    pub(crate) fn is_settled(&self) -> bool {
        self.root.is_some()
            && self.mappings.is_empty()
            && self.sequences.is_empty()
            && self.keys.is_empty()
    }

    pub(crate) fn set_string_value(&mut self, value: String) -> std::result::Result<(), String> {
        self.set_value(Value::String(value))
    }

    pub(crate) fn set_number_value(&mut self, lexeme: &str) -> std::result::Result<(), String> {
        self.set_value(to_number(lexeme)?)
    }

    pub(crate) fn set_boolean_value(&mut self, lexeme: &str) -> std::result::Result<(), String> {
        self.set_value(to_boolean(lexeme)?)
    }

    fn set_value(&mut self, value: Value) -> std::result::Result<(), String> {
        let key = self
            .keys
            .pop()
            .ok_or_else(|| "No pending key for value".to_string())?;
        let frame = self
            .mappings
            .last_mut()
            .ok_or_else(|| "No open mapping for value".to_string())?;
        frame.map.insert(key, value);
        Ok(())
    }

    pub(crate) fn push_string_element(&mut self, value: String) -> std::result::Result<(), String> {
        self.push_element(Value::String(value))
    }

    pub(crate) fn push_number_element(&mut self, lexeme: &str) -> std::result::Result<(), String> {
        self.push_element(to_number(lexeme)?)
    }

    pub(crate) fn push_boolean_element(&mut self, lexeme: &str) -> std::result::Result<(), String> {
        self.push_element(to_boolean(lexeme)?)
    }

    fn push_element(&mut self, value: Value) -> std::result::Result<(), String> {
        let frame = self
            .sequences
            .last_mut()
            .ok_or_else(|| "No open sequence for array element".to_string())?;
        frame.items.push(value);
        Ok(())
    }

    /// Open a mapping keyed by the pending key.
    pub(crate) fn enter_mapping_value(&mut self) -> std::result::Result<(), String> {
        let key = self
            .keys
            .pop()
            .ok_or_else(|| "No pending key for compound value".to_string())?;
        let id = self.take_id();
        self.mappings.push(MappingFrame {
            map: Mapping::new(),
            slot: MappingSlot::Key(key),
            id,
        });
        Ok(())
    }

    /// Open a mapping that is an element of the innermost open sequence.
    pub(crate) fn enter_mapping_element(&mut self) -> std::result::Result<(), String> {
        if self.sequences.is_empty() {
            return Err("No open sequence for mapping element".to_string());
        }
        let id = self.take_id();
        self.mappings.push(MappingFrame {
            map: Mapping::new(),
            slot: MappingSlot::Element,
            id,
        });
        Ok(())
    }

    /// Open a sequence keyed by the pending key.
    pub(crate) fn enter_sequence_value(&mut self) -> std::result::Result<(), String> {
        let key = self
            .keys
            .pop()
            .ok_or_else(|| "No pending key for array value".to_string())?;
        let id = self.take_id();
        self.sequences.push(SequenceFrame {
            items: Vec::new(),
            slot: SequenceSlot::Key(key),
            id,
        });
        Ok(())
    }

    /// Open a sequence nested directly inside another sequence.
    pub(crate) fn enter_sequence_element(&mut self) -> std::result::Result<(), String> {
        if self.sequences.is_empty() {
            return Err("No open sequence for nested array".to_string());
        }
        let id = self.take_id();
        self.sequences.push(SequenceFrame {
            items: Vec::new(),
            slot: SequenceSlot::Element,
            id,
        });
        Ok(())
    }

    pub(crate) fn exit_mapping(&mut self) -> std::result::Result<(), String> {
        let frame = self
            .mappings
            .pop()
            .ok_or_else(|| "Unbalanced '}' with no open mapping".to_string())?;
        self.attach_mapping(frame);
        Ok(())
    }

    pub(crate) fn exit_sequence(&mut self) -> std::result::Result<(), String> {
        let frame = self
            .sequences
            .pop()
            .ok_or_else(|| "Unbalanced ']' with no open sequence".to_string())?;
        self.attach_sequence(frame);
        Ok(())
    }

    fn attach_mapping(&mut self, frame: MappingFrame) {
        match frame.slot {
            MappingSlot::Root => self.root = Some(frame.map),
            MappingSlot::Key(key) => {
                if let Some(parent) = self.mappings.last_mut() {
                    parent.map.insert(key, Value::Mapping(frame.map));
                }
            }
            MappingSlot::Element => {
                if let Some(parent) = self.sequences.last_mut() {
                    parent.items.push(Value::Mapping(frame.map));
                }
            }
        }
    }

    fn attach_sequence(&mut self, frame: SequenceFrame) {
        match frame.slot {
            SequenceSlot::Key(key) => {
                if let Some(parent) = self.mappings.last_mut() {
                    parent.map.insert(key, Value::Sequence(frame.items));
                }
            }
            SequenceSlot::Element => {
                if let Some(parent) = self.sequences.last_mut() {
                    parent.items.push(Value::Sequence(frame.items));
                }
            }
        }
    }

    /// Consume the state, closing any still-open contexts innermost-first
    /// so content parsed before a truncation point stays attached.
    pub(crate) fn into_document(mut self) -> Mapping {
        loop {
            let open_mapping = self.mappings.last().map(|f| f.id);
            let open_sequence = self.sequences.last().map(|f| f.id);
            match (open_mapping, open_sequence) {
                (None, None) => break,
                (Some(_), None) => {
                    if let Some(frame) = self.mappings.pop() {
                        self.attach_mapping(frame);
                    }
                }
                (None, Some(_)) => {
                    if let Some(frame) = self.sequences.pop() {
                        self.attach_sequence(frame);
                    }
                }
                (Some(m), Some(s)) => {
                    if m > s {
                        if let Some(frame) = self.mappings.pop() {
                            self.attach_mapping(frame);
                        }
                    } else if let Some(frame) = self.sequences.pop() {
                        self.attach_sequence(frame);
                    }
                }
            }
        }
        self.root.unwrap_or_default()
    }
}

/// Convert a numeric lexeme, selecting the narrowest representation: no
/// decimal point means an integer, a decimal point means a float.
fn to_number(lexeme: &str) -> std::result::Result<Value, String> {
    if lexeme.contains('.') {
        lexeme
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| format!("Invalid number '{}'", lexeme))
    } else {
        lexeme
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| format!("Invalid number '{}'", lexeme))
    }
}

fn to_boolean(lexeme: &str) -> std::result::Result<Value, String> {
    match lexeme {
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        _ => Err(format!("Invalid boolean '{}'", lexeme)),
    }
}

/// Outcome of a permissive parse: the best-effort document plus the first
/// recorded error, if any.
#[derive(Debug, Clone)]
pub struct Parsed {
    /// Whatever mapping was built by the time scanning stopped. May be a
    /// prefix of the intended document when an error was recorded.
    pub document: Mapping,
    /// The first structural error, if one was suppressed.
    pub error: Option<ParseError>,
}

impl Parsed {
    /// True if a structural error was recorded during the parse.
    pub fn has_errors(&self) -> bool {
        self.error.is_some()
    }
}

/// Strict mode: the first structural error aborts with no document.
pub(crate) fn parse_strict(input: &str, ctx: &ParseContext) -> Result<Mapping> {
    let mut doc = ParseState::new();
    let mut scanner = Scanner::new();
    for c in input.chars() {
        scanner.visit_char(c, &mut doc, ctx)?;
    }
    scanner.finish(&doc, ctx)?;
    Ok(doc.into_document())
}

/// Permissive mode: the first structural error is recorded and scanning
/// stops; the caller receives whatever was built so far. Feeding further
/// input into a machine whose invariants are already violated produces
/// artifacts, so the scan is cut off at the error instead.
pub(crate) fn parse_permissive(input: &str, ctx: &ParseContext) -> Parsed {
    let mut doc = ParseState::new();
    let mut scanner = Scanner::new();
    let mut error = None;
    for c in input.chars() {
        if let Err(e) = scanner.visit_char(c, &mut doc, ctx) {
            log::warn!("suppressing structural error in permissive parse: {}", e);
            error = Some(e);
            break;
        }
    }
    if error.is_none() {
        if let Err(e) = scanner.finish(&doc, ctx) {
            log::warn!("manifest ended incomplete in permissive parse: {}", e);
            error = Some(e);
        }
    }
    Parsed {
        document: doc.into_document(),
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::State;
    use crate::{parse, parse_permissive, parse_with_filename};
    use crate::value::{Mapping, Value};

    #[test]
    fn test_numeric_narrowing() {
        let doc = parse(r#"{"n": 42}"#).unwrap();
        assert_eq!(doc["n"], Value::Int(42));

        let doc = parse(r#"{"n": 1.5}"#).unwrap();
        assert_eq!(doc["n"], Value::Float(1.5));

        let doc = parse(r#"{"n": -7}"#).unwrap();
        assert_eq!(doc["n"], Value::Int(-7));
    }

    #[test]
    fn test_nested_mapping() {
        let doc = parse(r#"{"a": {"b": {"c": "deep"}}}"#).unwrap();
        let a = doc["a"].as_mapping().unwrap();
        let b = a["b"].as_mapping().unwrap();
        assert_eq!(b["c"], Value::String("deep".to_string()));
    }

    #[test]
    fn test_nested_sequence() {
        let doc = parse(r#"{"deps": ["a", "b"]}"#).unwrap();
        assert_eq!(
            doc["deps"],
            Value::Sequence(vec![Value::from("a"), Value::from("b")])
        );
    }

    #[test]
    fn test_sequence_of_mappings() {
        let doc = parse(r#"{"people": [{"name": "Ann"}, {"name": "Ben"}]}"#).unwrap();
        let people = doc["people"].as_sequence().unwrap();
        assert_eq!(people.len(), 2);
        assert_eq!(
            people[1].as_mapping().unwrap()["name"],
            Value::String("Ben".to_string())
        );
    }

    #[test]
    fn test_sequence_within_sequence() {
        let doc = parse(r#"{"m": [[1, 2], [3]]}"#).unwrap();
        let m = doc["m"].as_sequence().unwrap();
        assert_eq!(
            m[0],
            Value::Sequence(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(m[1], Value::Sequence(vec![Value::Int(3)]));
    }

    #[test]
    fn test_empty_mapping_value() {
        let doc = parse(r#"{"a": {}}"#).unwrap();
        assert_eq!(doc["a"], Value::Mapping(Mapping::new()));
    }

    #[test]
    fn test_empty_document() {
        let doc = parse("{}").unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_strict_failure_identifies_state_and_character() {
        let err = parse(r#"{"a": }"#).unwrap_err();
        match err {
            ParseError::Structural {
                state,
                character,
                line,
                offset,
                ..
            } => {
                assert_eq!(state, State::AwaitingValue);
                assert_eq!(character, '}');
                assert_eq!(line, 0);
                assert_eq!(offset, 6);
            }
            other => panic!("expected structural error, got {}", other),
        }
    }

    #[test]
    fn test_permissive_survives_missing_value() {
        let parsed = parse_permissive(r#"{"a": }"#);
        assert!(parsed.has_errors());
        assert!(parsed.document.is_empty());
    }

    #[test]
    fn test_permissive_keeps_entries_before_the_error() {
        let parsed = parse_permissive(r#"{"a": 1, "b": {"c": 2}, "d": }"#);
        assert!(parsed.has_errors());
        assert_eq!(parsed.document["a"], Value::Int(1));
        assert_eq!(
            parsed.document["b"].as_mapping().unwrap()["c"],
            Value::Int(2)
        );
        assert!(!parsed.document.contains_key("d"));
    }

    #[test]
    fn test_permissive_stops_consuming_after_first_error() {
        // Content after the error point is never fed to the machine.
        let parsed = parse_permissive(r#"{"a": ], "b": 1}"#);
        assert!(parsed.has_errors());
        assert!(!parsed.document.contains_key("b"));
    }

    #[test]
    fn test_mode_equivalence_on_valid_input() {
        let inputs = [
            r#"{"a": 1, "b": [true, false], "c": {"d": "x"}}"#,
            "{ /* header */ \"name\": \"demo\" // trailing\n }",
            r#"{"deps": ["a", "b"], "n": -2.25}"#,
        ];
        for input in inputs {
            let strict = parse(input).unwrap();
            let lenient = parse_permissive(input);
            assert!(!lenient.has_errors(), "unexpected errors for {}", input);
            assert_eq!(strict, lenient.document, "trees differ for {}", input);
        }
    }

    #[test]
    fn test_unterminated_string_fails_strict() {
        let err = parse(r#"{"a": "oops"#).unwrap_err();
        match err {
            ParseError::UnexpectedEnd { state, .. } => assert_eq!(state, State::InValue),
            other => panic!("expected unexpected-end error, got {}", other),
        }
    }

    #[test]
    fn test_unterminated_string_flagged_permissive() {
        let parsed = parse_permissive(r#"{"a": "oops"#);
        assert!(parsed.has_errors());
    }

    #[test]
    fn test_truncated_document_fails_strict() {
        assert!(parse(r#"{"a": {"b": 1}"#).is_err());
    }

    #[test]
    fn test_truncated_document_keeps_nested_content_permissive() {
        let parsed = parse_permissive(r#"{"a": {"b": 1}"#);
        assert!(parsed.has_errors());
        assert_eq!(
            parsed.document["a"].as_mapping().unwrap()["b"],
            Value::Int(1)
        );
    }

    #[test]
    fn test_empty_input_fails_strict() {
        assert!(parse("").is_err());
        assert!(parse("   \n  ").is_err());
    }

    #[test]
    fn test_empty_input_permissive_yields_empty_mapping() {
        let parsed = parse_permissive("");
        assert!(parsed.has_errors());
        assert!(parsed.document.is_empty());
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let doc = parse(r#"{"a": 1, "a": 2}"#).unwrap();
        assert_eq!(doc["a"], Value::Int(2));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_filename_appears_in_diagnostics() {
        let err = parse_with_filename(r#"{"a": }"#, Some("package.json")).unwrap_err();
        assert!(err.to_string().contains("of <package.json>"));
        assert!(err.to_string().contains("AWAITING_VALUE"));
    }

    #[test]
    fn test_line_numbers_are_zero_based() {
        let err = parse("{\n  \"a\": }").unwrap_err();
        match err {
            ParseError::Structural { line, .. } => assert_eq!(line, 1),
            other => panic!("expected structural error, got {}", other),
        }
    }
}
