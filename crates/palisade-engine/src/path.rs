//! Field path parsing and resolution.
//!
//! A field path selects one value inside the evaluation context.  The
//! grammar is deliberately small — this is not a JSONPath implementation:
//!
//! - map-key segments: `[A-Za-z_][A-Za-z0-9_]*`
//! - array-index segments: `[<digits>]`, non-negative only
//! - an optional `.` between a segment and a following map-key segment
//!
//! Examples: `input.items[0].name`, `matrix[0][1]`.
//!
//! The parser must consume the entire input; anything left over is a
//! `FieldPathResolution` error, as are empty paths, empty or unterminated
//! brackets, and `-` inside a bracket (negative index).

use serde_json::Value;

use palisade_contracts::error::{GuardError, GuardResult};

/// One step of a field path walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Look up a key in an object.
    Key(String),
    /// Index into an array.
    Index(usize),
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Segment::Key(k) => write!(f, "{}", k),
            Segment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

fn path_error(path: &str, reason: impl std::fmt::Display) -> GuardError {
    GuardError::FieldPathResolution {
        reason: format!("path '{}': {}", path, reason),
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parse a field path into segments.
///
/// Returns `FieldPathResolution` for an empty path or any syntax the
/// grammar above does not produce.
pub fn parse(path: &str) -> GuardResult<Vec<Segment>> {
    if path.is_empty() {
        return Err(path_error(path, "empty path"));
    }

    let chars: Vec<char> = path.chars().collect();
    let mut segments = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '.' => {
                // A dot separates a preceding segment from a following
                // map-key segment.  Leading, trailing, and doubled dots
                // are all rejected here.
                if segments.is_empty() {
                    return Err(path_error(path, "path must not start with '.'"));
                }
                i += 1;
                if i >= chars.len() || !is_ident_start(chars[i]) {
                    return Err(path_error(path, "expected a field name after '.'"));
                }
            }
            '[' => {
                i += 1;
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                if i >= chars.len() || chars[i] != ']' {
                    if i < chars.len() && chars[i] == '-' {
                        return Err(path_error(path, "negative indices are not allowed"));
                    }
                    return Err(path_error(path, "unterminated or non-numeric index"));
                }
                if start == i {
                    return Err(path_error(path, "empty index '[]'"));
                }
                let digits: String = chars[start..i].iter().collect();
                let index: usize = digits
                    .parse()
                    .map_err(|_| path_error(path, format!("index '{}' out of range", digits)))?;
                segments.push(Segment::Index(index));
                i += 1; // consume ']'
            }
            c if is_ident_start(c) => {
                let start = i;
                while i < chars.len() && is_ident_continue(chars[i]) {
                    i += 1;
                }
                let key: String = chars[start..i].iter().collect();
                segments.push(Segment::Key(key));
            }
            c => {
                return Err(path_error(path, format!("unexpected character '{}'", c)));
            }
        }
    }

    Ok(segments)
}

/// Render the already-walked prefix of a path for error messages.
fn prefix_of(segments: &[Segment], upto: usize) -> String {
    if upto == 0 {
        return "<root>".to_string();
    }
    let mut out = String::new();
    for seg in &segments[..upto] {
        match seg {
            Segment::Key(k) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(k);
            }
            Segment::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
        }
    }
    out
}

/// Resolve `path` against `root`, returning a reference to the selected
/// value.
///
/// Walks segments left to right: a key segment requires the current value
/// to be an object containing the key; an index segment requires an array
/// with `index < len`.  Any violation is a `FieldPathResolution` error
/// naming the offending segment and the position it failed at.
pub fn resolve<'v>(root: &'v Value, path: &str) -> GuardResult<&'v Value> {
    let segments = parse(path)?;
    let mut current = root;

    for (pos, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Key(key) => {
                let map = current.as_object().ok_or_else(|| {
                    path_error(
                        path,
                        format!(
                            "cannot resolve key '{}': value at '{}' is not an object",
                            key,
                            prefix_of(&segments, pos)
                        ),
                    )
                })?;
                current = map.get(key).ok_or_else(|| {
                    path_error(
                        path,
                        format!("key '{}' not found at '{}'", key, prefix_of(&segments, pos)),
                    )
                })?;
            }
            Segment::Index(index) => {
                let arr = current.as_array().ok_or_else(|| {
                    path_error(
                        path,
                        format!(
                            "cannot index [{}]: value at '{}' is not an array",
                            index,
                            prefix_of(&segments, pos)
                        ),
                    )
                })?;
                current = arr.get(*index).ok_or_else(|| {
                    path_error(
                        path,
                        format!(
                            "index [{}] out of range at '{}' (len {})",
                            index,
                            prefix_of(&segments, pos),
                            arr.len()
                        ),
                    )
                })?;
            }
        }
    }

    Ok(current)
}

/// Mutable twin of [`resolve`], used by the modify executor to splice a
/// deep copy of the context.  Same walk, same errors.
pub fn resolve_mut<'v>(root: &'v mut Value, path: &str) -> GuardResult<&'v mut Value> {
    let segments = parse(path)?;
    let mut current = root;

    for (pos, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Key(key) => {
                if !current.is_object() {
                    return Err(path_error(
                        path,
                        format!(
                            "cannot resolve key '{}': value at '{}' is not an object",
                            key,
                            prefix_of(&segments, pos)
                        ),
                    ));
                }
                current = current.get_mut(key.as_str()).ok_or_else(|| {
                    path_error(
                        path,
                        format!("key '{}' not found at '{}'", key, prefix_of(&segments, pos)),
                    )
                })?;
            }
            Segment::Index(index) => {
                let len = match current.as_array() {
                    Some(arr) => arr.len(),
                    None => {
                        return Err(path_error(
                            path,
                            format!(
                                "cannot index [{}]: value at '{}' is not an array",
                                index,
                                prefix_of(&segments, pos)
                            ),
                        ))
                    }
                };
                current = current.get_mut(*index).ok_or_else(|| {
                    path_error(
                        path,
                        format!(
                            "index [{}] out of range at '{}' (len {})",
                            index,
                            prefix_of(&segments, pos),
                            len
                        ),
                    )
                })?;
            }
        }
    }

    Ok(current)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{parse, resolve, resolve_mut, Segment};

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn parse_dotted_keys() {
        let segs = parse("input.user.name").unwrap();
        assert_eq!(
            segs,
            vec![
                Segment::Key("input".into()),
                Segment::Key("user".into()),
                Segment::Key("name".into())
            ]
        );
    }

    #[test]
    fn parse_mixed_keys_and_indices() {
        let segs = parse("input.items[0].name").unwrap();
        assert_eq!(
            segs,
            vec![
                Segment::Key("input".into()),
                Segment::Key("items".into()),
                Segment::Index(0),
                Segment::Key("name".into())
            ]
        );
    }

    #[test]
    fn parse_consecutive_indices() {
        let segs = parse("matrix[0][1]").unwrap();
        assert_eq!(
            segs,
            vec![
                Segment::Key("matrix".into()),
                Segment::Index(0),
                Segment::Index(1)
            ]
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse("").is_err(), "empty path");
        assert!(parse(".input").is_err(), "leading dot");
        assert!(parse("input.").is_err(), "trailing dot");
        assert!(parse("a..b").is_err(), "doubled dot");
        assert!(parse("items[").is_err(), "unterminated bracket");
        assert!(parse("items[]").is_err(), "empty index");
        assert!(parse("items[x]").is_err(), "non-numeric index");
        assert!(parse("items[-1]").is_err(), "negative index");
        assert!(parse("a b").is_err(), "whitespace");
        assert!(parse("9lives").is_err(), "key starting with a digit");
    }

    // ── Resolution ────────────────────────────────────────────────────────────

    #[test]
    fn resolve_nested_key() {
        let ctx = json!({ "a": { "b": 1 } });
        assert_eq!(resolve(&ctx, "a.b").unwrap(), &json!(1));
    }

    #[test]
    fn resolve_array_index() {
        let ctx = json!({ "items": ["x", "y"] });
        assert_eq!(resolve(&ctx, "items[1]").unwrap(), &json!("y"));
    }

    #[test]
    fn resolve_manual_indexing_equivalence() {
        // For a path built only from valid segments, resolve() must return
        // exactly the value reachable by manual indexing.
        let ctx = json!({
            "input": { "items": [ { "name": "a" }, { "name": "b" } ] }
        });
        let resolved = resolve(&ctx, "input.items[1].name").unwrap();
        assert_eq!(resolved, &ctx["input"]["items"][1]["name"]);
    }

    #[test]
    fn resolve_index_on_non_array_fails() {
        let ctx = json!({ "a": 1 });
        let err = resolve(&ctx, "a[0]").unwrap_err();
        assert!(err.to_string().contains("not an array"), "{}", err);
    }

    #[test]
    fn resolve_key_on_non_object_fails() {
        let ctx = json!({ "a": [1, 2] });
        let err = resolve(&ctx, "a.b").unwrap_err();
        assert!(err.to_string().contains("not an object"), "{}", err);
    }

    #[test]
    fn resolve_missing_key_fails() {
        let ctx = json!({ "a": {} });
        let err = resolve(&ctx, "a.missing").unwrap_err();
        assert!(err.to_string().contains("not found"), "{}", err);
    }

    #[test]
    fn resolve_index_out_of_range_fails() {
        let ctx = json!({ "items": ["only"] });
        let err = resolve(&ctx, "items[3]").unwrap_err();
        assert!(err.to_string().contains("out of range"), "{}", err);
    }

    #[test]
    fn resolve_null_value_is_returned() {
        // A null leaf resolves successfully — null handling belongs to the
        // condition evaluator, not the resolver.
        let ctx = json!({ "a": { "b": null } });
        assert_eq!(resolve(&ctx, "a.b").unwrap(), &serde_json::Value::Null);
    }

    // ── Mutable resolution ────────────────────────────────────────────────────

    #[test]
    fn resolve_mut_allows_in_place_edit() {
        let mut ctx = json!({ "input": { "user": { "name": "A" } } });
        let user = resolve_mut(&mut ctx, "input.user").unwrap();
        user.as_object_mut().unwrap().remove("name");
        assert_eq!(ctx, json!({ "input": { "user": {} } }));
    }

    #[test]
    fn resolve_mut_same_errors_as_resolve() {
        let mut ctx = json!({ "a": 1 });
        assert!(resolve_mut(&mut ctx, "a[0]").is_err());
        assert!(resolve_mut(&mut ctx, "b").is_err());
    }
}
