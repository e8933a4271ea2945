//! Canonical serialization.
//!
//! Produces the single deterministic rendering of a document: keys sorted
//! alphabetically at every level, 4-space indentation, one key per line,
//! and a trailing newline. Two logically equal documents always serialize
//! to byte-identical text, so manifests diff cleanly under version control.
//!
//! Nested containers are spooled through explicit work stacks, matching
//! the parser's stack discipline: any depth the parser accepts can be
//! serialized and pruned without exhausting the call stack.

use crate::value::{Mapping, Value};
use indexmap::map::IntoIter;

const INDENT: usize = 4;

/// One pending emission on the writer's work stack.
enum Step<'a> {
    /// A value at the given nesting level.
    Value { value: &'a Value, indent: usize },
    Literal(&'static str),
    Quoted(&'a str),
    Pad(usize),
}

/// Serialize a document to canonical text.
///
/// Re-parsing the output in strict mode yields an equal document, and
/// re-serializing that document reproduces the text byte for byte. One
/// representational hole: the grammar has no spelling for a string whose
/// final character is a backslash (a closing quote after a backslash is
/// always read as an escaped quote), so such a value, constructible only
/// through the API and never by the parser, does not survive a re-parse.
pub fn to_canonical_string(map: &Mapping) -> String {
    if map.is_empty() {
        return "{}\n".to_string();
    }
    let mut out = String::from("{\n");
    let mut stack: Vec<Step> = vec![Step::Literal("}\n")];
    push_mapping_entries(map, 1, &mut stack);
    while let Some(step) = stack.pop() {
        match step {
            Step::Literal(text) => out.push_str(text),
            Step::Quoted(s) => write_quoted(s, &mut out),
            Step::Pad(indent) => pad(&mut out, indent),
            Step::Value { value, indent } => write_value(value, indent, &mut out, &mut stack),
        }
    }
    out
}

fn pad(out: &mut String, indent: usize) {
    for _ in 0..indent * INDENT {
        out.push(' ');
    }
}

/// Queue one `"key": value` line per entry, alphabetically. Steps are
/// pushed in reverse so the first key is emitted first.
fn push_mapping_entries<'a>(map: &'a Mapping, indent: usize, stack: &mut Vec<Step<'a>>) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    for (i, key) in keys.iter().enumerate().rev() {
        stack.push(Step::Literal("\n"));
        if i + 1 != keys.len() {
            stack.push(Step::Literal(","));
        }
        stack.push(Step::Value {
            value: &map[key.as_str()],
            indent,
        });
        stack.push(Step::Literal(": "));
        stack.push(Step::Quoted(key.as_str()));
        stack.push(Step::Pad(indent));
    }
}

/// Emit a scalar directly; queue a compound's pieces on the work stack.
fn write_value<'a>(value: &'a Value, indent: usize, out: &mut String, stack: &mut Vec<Step<'a>>) {
    match value {
        Value::Mapping(map) => {
            if map.is_empty() {
                out.push_str("{}");
            } else {
                out.push_str("{\n");
                stack.push(Step::Literal("}"));
                stack.push(Step::Pad(indent));
                push_mapping_entries(map, indent + 1, stack);
            }
        }
        Value::Sequence(items) => write_sequence(items, indent, out, stack),
        scalar => write_scalar(scalar, out),
    }
}

fn write_sequence<'a>(items: &'a [Value], indent: usize, out: &mut String, stack: &mut Vec<Step<'a>>) {
    if items.is_empty() {
        out.push_str("[]");
        return;
    }
    let scalars_only = items
        .iter()
        .all(|v| !matches!(v, Value::Mapping(_) | Value::Sequence(_)));
    if scalars_only {
        out.push('[');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            write_scalar(item, out);
        }
        out.push(']');
        return;
    }
    out.push_str("[\n");
    stack.push(Step::Literal("]"));
    stack.push(Step::Pad(indent));
    let last = items.len() - 1;
    for (i, item) in items.iter().enumerate().rev() {
        stack.push(Step::Literal("\n"));
        if i != last {
            stack.push(Step::Literal(","));
        }
        stack.push(Step::Value {
            value: item,
            indent: indent + 1,
        });
        stack.push(Step::Pad(indent + 1));
    }
}

fn write_scalar(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(n) => out.push_str(&n.to_string()),
        Value::Float(f) => write_float(*f, out),
        Value::String(s) => write_quoted(s, out),
        // compounds are queued by write_value, never written here
        Value::Mapping(_) | Value::Sequence(_) => {}
    }
}

fn write_quoted(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        if c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

/// A float must re-parse as a float, so a value with no fractional digits
/// still carries a decimal point.
fn write_float(f: f64, out: &mut String) {
    let text = f.to_string();
    out.push_str(&text);
    if !text.contains('.') {
        out.push_str(".0");
    }
}

/// An in-progress mapping on the prune stack: entries kept so far, the
/// remaining source entries, and the key this mapping holds in its parent
/// (`None` for the root).
struct PruneFrame {
    kept: Mapping,
    rest: IntoIter<String, Value>,
    slot: Option<String>,
}

/// Save-time pruning: recursively remove keys whose value is null or an
/// all-whitespace string, and drop any mapping left empty by the removal.
/// Sequences pass through untouched. Applied only at the persistence
/// boundary, never during parsing.
pub fn prune(map: &mut Mapping) {
    let source = std::mem::take(map);
    *map = prune_map(source);
}

fn prune_map(map: Mapping) -> Mapping {
    let mut stack = vec![PruneFrame {
        kept: Mapping::new(),
        rest: map.into_iter(),
        slot: None,
    }];
    loop {
        let next = match stack.last_mut() {
            Some(frame) => frame.rest.next(),
            None => return Mapping::new(),
        };
        match next {
            Some((_, Value::Null)) => {}
            Some((key, Value::String(s))) => {
                if !s.trim().is_empty() {
                    if let Some(frame) = stack.last_mut() {
                        frame.kept.insert(key, Value::String(s));
                    }
                }
            }
            Some((key, Value::Mapping(inner))) => {
                stack.push(PruneFrame {
                    kept: Mapping::new(),
                    rest: inner.into_iter(),
                    slot: Some(key),
                });
            }
            Some((key, value)) => {
                if let Some(frame) = stack.last_mut() {
                    frame.kept.insert(key, value);
                }
            }
            None => {
                let frame = match stack.pop() {
                    Some(frame) => frame,
                    None => return Mapping::new(),
                };
                match frame.slot {
                    Some(key) => {
                        if !frame.kept.is_empty() {
                            if let Some(parent) = stack.last_mut() {
                                parent.kept.insert(key, Value::Mapping(frame.kept));
                            }
                        }
                    }
                    None => return frame.kept,
                }
            }
        }
    }
}
