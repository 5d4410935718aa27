//! `.env` text format: one `NAME=VALUE` per line.
//!
//! Two quoting styles are supported. `Verbatim` wraps whitespace-bearing
//! values (and values opening with a quote character) in double quotes and
//! writes them untouched, which is what existing `.env` files produced by this
//! tool look like. A value holding `"` cannot be read back from that form;
//! the parser rejects such lines instead of truncating them. `Escaped`
//! additionally backslash-escapes the quoted content so every value
//! round-trips.

use std::io::{self, Write};

use thiserror::Error;

use crate::store::EnvVars;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Quoting {
    #[default]
    Verbatim,
    Escaped,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: expected NAME=VALUE")]
    MissingDelimiter { line: usize },

    #[error("line {line}: empty variable name")]
    EmptyName { line: usize },

    #[error("line {line}: unterminated quoted value")]
    Unterminated { line: usize },

    #[error("line {line}: unexpected characters after closing quote")]
    TrailingCharacters { line: usize },
}

fn has_whitespace(value: &str) -> bool {
    value.contains([' ', '\t', '\n', '\r'])
}

fn needs_quotes(value: &str, quoting: Quoting) -> bool {
    // An unquoted value opening with a quote would be read back as quoted.
    if has_whitespace(value) || value.starts_with(['"', '\'']) {
        return true;
    }
    quoting == Quoting::Escaped && value.contains(['"', '\\', '#'])
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

/// Render a single entry, without the trailing newline.
pub fn format_entry(name: &str, value: &str, quoting: Quoting) -> String {
    if !needs_quotes(value, quoting) {
        return format!("{name}={value}");
    }
    match quoting {
        Quoting::Verbatim => format!("{name}=\"{value}\""),
        Quoting::Escaped => format!("{name}=\"{}\"", escape(value)),
    }
}

/// Write every entry in name order, each line terminated by `\n`.
pub fn write_vars<W: Write>(out: &mut W, vars: &EnvVars, quoting: Quoting) -> io::Result<()> {
    for (name, value) in vars {
        writeln!(out, "{}", format_entry(name, value, quoting))?;
    }
    Ok(())
}

pub fn to_string(vars: &EnvVars, quoting: Quoting) -> String {
    let mut out = String::new();
    for (name, value) in vars {
        out.push_str(&format_entry(name, value, quoting));
        out.push('\n');
    }
    out
}

/// Parse `.env` text. Later definitions of a name replace earlier ones.
pub fn parse(text: &str, quoting: Quoting) -> Result<EnvVars, ParseError> {
    let mut vars = EnvVars::new();
    let lines: Vec<&str> = text.lines().collect();
    let mut idx = 0;
    while idx < lines.len() {
        let line_no = idx + 1;
        let line = lines[idx].trim_start();
        idx += 1;
        if line.trim_end().is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").map_or(line, str::trim_start);
        let Some((name, raw)) = line.split_once('=') else {
            return Err(ParseError::MissingDelimiter { line: line_no });
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(ParseError::EmptyName { line: line_no });
        }
        let raw = raw.trim_start();

        let value = if let Some(rest) = raw.strip_prefix('"') {
            let mut collected = String::new();
            let mut current = rest;
            let mut current_no = line_no;
            loop {
                if let Some(end) = closing_quote(current, quoting) {
                    collected.push_str(&current[..end]);
                    ensure_line_ends(&current[end + 1..], current_no)?;
                    break;
                }
                collected.push_str(current);
                collected.push('\n');
                if idx >= lines.len() {
                    return Err(ParseError::Unterminated { line: line_no });
                }
                current = lines[idx];
                idx += 1;
                current_no = idx;
            }
            match quoting {
                Quoting::Verbatim => collected,
                Quoting::Escaped => unescape(&collected),
            }
        } else if let Some(rest) = raw.strip_prefix('\'') {
            let end = rest
                .find('\'')
                .ok_or(ParseError::Unterminated { line: line_no })?;
            ensure_line_ends(&rest[end + 1..], line_no)?;
            rest[..end].to_string()
        } else {
            strip_inline_comment(raw).trim_end().to_string()
        };
        vars.insert(name.to_string(), value);
    }
    Ok(vars)
}

/// Only whitespace or a `#` comment may follow a closing quote.
fn ensure_line_ends(tail: &str, line: usize) -> Result<(), ParseError> {
    let tail = tail.trim_start();
    if tail.is_empty() || tail.starts_with('#') {
        Ok(())
    } else {
        Err(ParseError::TrailingCharacters { line })
    }
}

fn closing_quote(text: &str, quoting: Quoting) -> Option<usize> {
    match quoting {
        Quoting::Verbatim => text.find('"'),
        Quoting::Escaped => {
            let mut escaped = false;
            for (pos, ch) in text.char_indices() {
                match ch {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => return Some(pos),
                    _ => {}
                }
            }
            None
        }
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// ` #` starts a comment after an unquoted value; a `#` glued to text does not.
fn strip_inline_comment(raw: &str) -> &str {
    match raw.find(" #") {
        Some(pos) => &raw[..pos],
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(entries: &[(&str, &str)]) -> EnvVars {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn whitespace_values_are_quoted() {
        let text = to_string(&vars(&[("A", "1"), ("B", "has space")]), Quoting::Verbatim);
        assert_eq!(text, "A=1\nB=\"has space\"\n");
    }

    #[test]
    fn every_whitespace_kind_triggers_quotes() {
        for value in ["a b", "a\tb", "a\nb", "a\rb"] {
            let line = format_entry("K", value, Quoting::Verbatim);
            assert_eq!(line, format!("K=\"{value}\""));
        }
    }

    #[test]
    fn verbatim_leaves_quotes_alone() {
        assert_eq!(
            format_entry("K", "say \"hi\"", Quoting::Verbatim),
            "K=\"say \"hi\"\""
        );
        assert_eq!(format_entry("K", "a\"b", Quoting::Verbatim), "K=a\"b");
    }

    #[test]
    fn escaped_quoting_escapes_content() {
        assert_eq!(
            format_entry("K", "say \"hi\"\n", Quoting::Escaped),
            "K=\"say \\\"hi\\\"\\n\""
        );
        assert_eq!(format_entry("K", "c:\\tmp", Quoting::Escaped), "K=\"c:\\\\tmp\"");
        assert_eq!(format_entry("K", "plain", Quoting::Escaped), "K=plain");
    }

    #[test]
    fn output_is_sorted_by_name() {
        let text = to_string(&vars(&[("ZED", "1"), ("ALPHA", "2")]), Quoting::Verbatim);
        assert_eq!(text, "ALPHA=2\nZED=1\n");
    }

    #[test]
    fn write_vars_matches_to_string() -> io::Result<()> {
        let set = vars(&[("FOO", "bar"), ("BAZ", "qux value")]);
        let mut buf = Vec::new();
        write_vars(&mut buf, &set, Quoting::Verbatim)?;
        assert_eq!(String::from_utf8_lossy(&buf), to_string(&set, Quoting::Verbatim));
        Ok(())
    }

    #[test]
    fn parse_common_forms() {
        let text = "\
# comment
export PORT=8080
NAME = demo  # trailing comment
URL=http://x/#frag
GREETING=\"hello world\"
RAW='single $quoted'

EMPTY=
";
        let parsed = parse(text, Quoting::Verbatim).unwrap();
        assert_eq!(
            parsed,
            vars(&[
                ("PORT", "8080"),
                ("NAME", "demo"),
                ("URL", "http://x/#frag"),
                ("GREETING", "hello world"),
                ("RAW", "single $quoted"),
                ("EMPTY", ""),
            ])
        );
    }

    #[test]
    fn parse_reads_back_multiline_output() {
        let set = vars(&[("KEY", "first\nsecond"), ("OTHER", "x")]);
        for quoting in [Quoting::Verbatim, Quoting::Escaped] {
            let text = to_string(&set, quoting);
            assert_eq!(parse(&text, quoting).unwrap(), set);
        }
    }

    #[test]
    fn escaped_mode_handles_embedded_quotes() {
        let set = vars(&[("JSON", "{\"a\": \"b c\"}"), ("PATH_ISH", "c:\\dir")]);
        let text = to_string(&set, Quoting::Escaped);
        assert_eq!(parse(&text, Quoting::Escaped).unwrap(), set);
    }

    #[test]
    fn parse_errors_carry_line_numbers() {
        assert_eq!(
            parse("A=1\nnonsense\n", Quoting::Verbatim),
            Err(ParseError::MissingDelimiter { line: 2 })
        );
        assert_eq!(
            parse("=value", Quoting::Verbatim),
            Err(ParseError::EmptyName { line: 1 })
        );
        assert_eq!(
            parse("A=1\nB=\"open\nstill open\n", Quoting::Verbatim),
            Err(ParseError::Unterminated { line: 2 })
        );
    }

    #[test]
    fn text_after_closing_quote_is_rejected() {
        assert_eq!(
            parse("A=\"say \"hi\" now\"\n", Quoting::Verbatim),
            Err(ParseError::TrailingCharacters { line: 1 })
        );
        assert_eq!(
            parse("A=1\nB=\"x\ny\" z\n", Quoting::Verbatim),
            Err(ParseError::TrailingCharacters { line: 3 })
        );
        assert_eq!(
            parse("C='one' two\n", Quoting::Verbatim),
            Err(ParseError::TrailingCharacters { line: 1 })
        );
        assert_eq!(
            parse("D=\"ok value\"  # note\n", Quoting::Verbatim),
            Ok(vars(&[("D", "ok value")]))
        );
    }

    #[test]
    fn leading_quote_values_do_not_read_back_silently() {
        let line = format_entry("B", "\"abc\"", Quoting::Verbatim);
        assert_eq!(line, "B=\"\"abc\"\"");
        assert_eq!(
            parse(&line, Quoting::Verbatim),
            Err(ParseError::TrailingCharacters { line: 1 })
        );

        let set = vars(&[("B", "\"abc\""), ("S", "'lit'")]);
        let text = to_string(&set, Quoting::Escaped);
        assert_eq!(parse(&text, Quoting::Escaped), Ok(set));
    }
}
