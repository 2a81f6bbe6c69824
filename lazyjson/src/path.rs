// SPDX-License-Identifier: Apache-2.0

//! JSONPath-style queries: `$`, `.key`, `['key']`, `["key"]`, `[n]`, and the
//! wildcards `.*` / `[*]`.

use crate::cursor::{element_at, find_field_unordered, Position};
use crate::error_code::ErrorCode;
use crate::tape::NodeKind;
use crate::value::Frame;

type CodeResult<T> = core::result::Result<T, ErrorCode>;

/// One step of a parsed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    Key(String),
    Index(usize),
    Wildcard,
}

/// Parse a path into steps. An empty path selects the current value.
pub(crate) fn parse(path: &str) -> CodeResult<Vec<Step>> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = path.strip_prefix('$') else {
        return Err(ErrorCode::InvalidJsonPointer);
    };
    let bytes = rest.as_bytes();
    let mut steps = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        match bytes[pos] {
            b'.' => {
                pos += 1;
                if bytes.get(pos) == Some(&b'*') {
                    steps.push(Step::Wildcard);
                    pos += 1;
                    continue;
                }
                let end = bytes[pos..]
                    .iter()
                    .position(|&b| b == b'.' || b == b'[')
                    .map_or(bytes.len(), |offset| pos + offset);
                if end == pos {
                    return Err(ErrorCode::InvalidJsonPointer);
                }
                steps.push(Step::Key(rest[pos..end].to_string()));
                pos = end;
            }
            b'[' => {
                let (step, end) = bracket(rest, pos + 1)?;
                steps.push(step);
                pos = end;
            }
            _ => return Err(ErrorCode::InvalidJsonPointer),
        }
    }
    Ok(steps)
}

/// Parse the inside of `[...]` starting just after the bracket. Returns the
/// step and the position after the closing bracket.
fn bracket(path: &str, start: usize) -> CodeResult<(Step, usize)> {
    let bytes = path.as_bytes();
    match bytes.get(start) {
        Some(&quote @ (b'\'' | b'"')) => {
            let mut key = String::new();
            let mut pos = start + 1;
            loop {
                let c = path[pos..]
                    .chars()
                    .next()
                    .ok_or(ErrorCode::InvalidJsonPointer)?;
                if c as u32 == quote as u32 {
                    break;
                }
                if c == '\\' {
                    let escaped = path[pos + 1..]
                        .chars()
                        .next()
                        .ok_or(ErrorCode::InvalidJsonPointer)?;
                    key.push(escaped);
                    pos += 1 + escaped.len_utf8();
                } else {
                    key.push(c);
                    pos += c.len_utf8();
                }
            }
            close(bytes, pos + 1).map(|end| (Step::Key(key), end))
        }
        Some(b'*') => close(bytes, start + 1).map(|end| (Step::Wildcard, end)),
        Some(b'0'..=b'9') => {
            let digits = bytes[start..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count();
            let index = path[start..start + digits]
                .parse()
                .map_err(|_| ErrorCode::InvalidJsonPointer)?;
            close(bytes, start + digits).map(|end| (Step::Index(index), end))
        }
        _ => Err(ErrorCode::InvalidJsonPointer),
    }
}

fn close(bytes: &[u8], pos: usize) -> CodeResult<usize> {
    match bytes.get(pos) {
        Some(b']') => Ok(pos + 1),
        _ => Err(ErrorCode::InvalidJsonPointer),
    }
}

fn step(frame: Frame<'_>, current: usize, step: &Step) -> CodeResult<usize> {
    match (frame.node(current)?.kind, step) {
        (NodeKind::Object, Step::Key(key)) => {
            let mut pos = Position::start(current);
            find_field_unordered(frame, current, &mut pos, key)
        }
        (NodeKind::Array, Step::Index(index)) => {
            let mut pos = Position::start(current);
            element_at(frame, current, &mut pos, *index)
        }
        (_, Step::Wildcard) => Err(ErrorCode::InvalidJsonPointer),
        _ => Err(ErrorCode::IncorrectType),
    }
}

/// Resolve a wildcard-free path against the value at `start`.
pub(crate) fn resolve(frame: Frame<'_>, start: usize, path: &str) -> CodeResult<usize> {
    let steps = parse(path)?;
    if steps.contains(&Step::Wildcard) {
        return Err(ErrorCode::InvalidJsonPointer);
    }
    steps
        .iter()
        .try_fold(start, |current, s| step(frame, current, s))
}

/// Resolve a path that may contain wildcards, collecting every match in
/// document order. Steps that miss drop that branch silently.
pub(crate) fn resolve_all(frame: Frame<'_>, start: usize, path: &str) -> CodeResult<Vec<usize>> {
    let steps = parse(path)?;
    let matches = collect(frame, start, &steps)?;
    log::trace!("path: {:?} matched {} values", path, matches.len());
    Ok(matches)
}

fn collect(frame: Frame<'_>, start: usize, steps: &[Step]) -> CodeResult<Vec<usize>> {
    let mut out = Vec::new();
    // (tape index, index of the next step to apply there)
    let mut pending = vec![(start, 0)];
    while let Some((current, depth)) = pending.pop() {
        let Some(next_step) = steps.get(depth) else {
            out.push(current);
            continue;
        };
        match next_step {
            Step::Wildcard => {
                let node = frame.node(current)?;
                let first = pending.len();
                let mut child = current + 1;
                for _ in 0..node.count {
                    // Object children are key/value pairs; the value follows its key.
                    let value = if node.kind == NodeKind::Object { child + 1 } else { child };
                    pending.push((value, depth + 1));
                    child = frame.node(value)?.next as usize;
                }
                // Last in, first out: reverse so the first child is visited first.
                pending[first..].reverse();
            }
            _ => match step(frame, current, next_step) {
                Ok(next) => pending.push((next, depth + 1)),
                Err(code) if crate::error::is_lookup_miss(code) => {}
                Err(code) => return Err(code),
            },
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tape::Tape;

    const DOC: &str = r#"{"items": [{"id": 1, "tags": ["x"]}, {"id": 2}, {"name": "n"}], "it's": true}"#;

    fn raw_matches(path: &str) -> CodeResult<Vec<String>> {
        let mut tape = Tape::with_capacity(DOC.len(), 32);
        tape.build(DOC.as_bytes()).unwrap();
        let frame = Frame::new(tape.nodes(), DOC.as_bytes());
        let found = resolve_all(frame, 0, path)?;
        Ok(found
            .into_iter()
            .map(|i| String::from_utf8_lossy(frame.node(i).unwrap().raw(DOC.as_bytes())).into_owned())
            .collect())
    }

    fn raw_single(path: &str) -> CodeResult<String> {
        let mut tape = Tape::with_capacity(DOC.len(), 32);
        tape.build(DOC.as_bytes()).unwrap();
        let frame = Frame::new(tape.nodes(), DOC.as_bytes());
        let index = resolve(frame, 0, path)?;
        Ok(String::from_utf8_lossy(frame.node(index)?.raw(DOC.as_bytes())).into_owned())
    }

    #[test]
    fn parses_every_step_form() {
        assert_eq!(
            parse(r#"$.a['b c']["d"][12].*[*]"#).unwrap(),
            vec![
                Step::Key("a".into()),
                Step::Key("b c".into()),
                Step::Key("d".into()),
                Step::Index(12),
                Step::Wildcard,
                Step::Wildcard,
            ]
        );
        assert_eq!(parse(r"$['it\'s']").unwrap(), vec![Step::Key("it's".into())]);
        assert_eq!(parse("$").unwrap(), vec![]);
        assert_eq!(parse("").unwrap(), vec![]);
    }

    #[test]
    fn rejects_malformed_paths() {
        for bad in ["a.b", "$.", "$..a", "$[", "$[1", "$['a'", "$['a'x]", "$[-1]", "$x"] {
            assert_eq!(parse(bad), Err(ErrorCode::InvalidJsonPointer), "path {bad}");
        }
    }

    #[test]
    fn single_resolution() {
        assert_eq!(raw_single("$.items[1].id").unwrap(), "2");
        assert_eq!(raw_single("$['items'][0].tags[0]").unwrap(), "x");
        assert_eq!(raw_single(r#"$["it's"]"#).unwrap(), "true");
        assert_eq!(raw_single("$.items[5]"), Err(ErrorCode::IndexOutOfBounds));
        assert_eq!(raw_single("$.nope"), Err(ErrorCode::NoSuchField));
        assert_eq!(raw_single("$.items.id"), Err(ErrorCode::IncorrectType));
        assert_eq!(raw_single("$.items[*]"), Err(ErrorCode::InvalidJsonPointer));
    }

    #[test]
    fn wildcards_collect_in_document_order() {
        assert_eq!(raw_matches("$.items[*].id").unwrap(), vec!["1", "2"]);
        assert_eq!(raw_matches("$.items[0].*").unwrap(), vec!["1", r#"["x"]"#]);
        assert_eq!(raw_matches("$.items[*].tags[*]").unwrap(), vec!["x"]);
        assert_eq!(raw_matches("$.*").unwrap().len(), 2);
        assert_eq!(raw_matches("$.nope[*]").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn wildcards_reach_deep_leaves() {
        let levels = 30_000;
        let json = format!("{}7{}", "[".repeat(levels), "]".repeat(levels));
        let mut tape = Tape::with_capacity(json.len(), levels);
        tape.build(json.as_bytes()).unwrap();
        let frame = Frame::new(tape.nodes(), json.as_bytes());
        let path = format!("${}", "[*]".repeat(levels));
        let found = resolve_all(frame, 0, &path).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(frame.node(found[0]).unwrap().raw(json.as_bytes()), b"7");
    }
}
