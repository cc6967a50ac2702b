use thiserror::Error;

use crate::{
    formats::time::{Timestamp, TimestampParts},
    model::{SubtitleEntry, SubtitlePeriod, SubtitleTextPart},
    timeline::Timeline,
};

/// `block` is the 1-based ordinal of the offending block and `line` the
/// 1-based source line it starts on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SrtError {
    #[error("block {block} (line {line}): expected an index line and a period line, found {found} line(s)")]
    TooFewLines {
        block: usize,
        line: usize,
        found: usize,
    },
    #[error("block {block} (line {line}): unexpected period: '{text}'")]
    MalformedPeriod {
        block: usize,
        line: usize,
        text: String,
    },
    #[error("block {block} (line {line}): unexpected timestamp: '{text}'")]
    MalformedTimestamp {
        block: usize,
        line: usize,
        text: String,
    },
    #[error("block {block} (line {line}): not a number: '{text}'")]
    InvalidNumber {
        block: usize,
        line: usize,
        text: String,
    },
    #[error("block {block} (line {line}): unterminated or nested italic markup: '{text}'")]
    MalformedMarkup {
        block: usize,
        line: usize,
        text: String,
    },
}

impl SrtError {
    pub fn block(&self) -> usize {
        match self {
            SrtError::TooFewLines { block, .. }
            | SrtError::MalformedPeriod { block, .. }
            | SrtError::MalformedTimestamp { block, .. }
            | SrtError::InvalidNumber { block, .. }
            | SrtError::MalformedMarkup { block, .. } => *block,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BlockFault {
    TooFewLines(usize),
    Period(String),
    Timestamp(String),
    Number(String),
    Markup(String),
}

impl BlockFault {
    fn at(self, block: usize, line: usize) -> SrtError {
        match self {
            BlockFault::TooFewLines(found) => SrtError::TooFewLines { block, line, found },
            BlockFault::Period(text) => SrtError::MalformedPeriod { block, line, text },
            BlockFault::Timestamp(text) => SrtError::MalformedTimestamp { block, line, text },
            BlockFault::Number(text) => SrtError::InvalidNumber { block, line, text },
            BlockFault::Markup(text) => SrtError::MalformedMarkup { block, line, text },
        }
    }
}

/// The first malformed block aborts the parse.
pub fn parse_srt(input: &str) -> Result<Timeline, SrtError> {
    let mut entries = Vec::new();
    for (ordinal, (line, block)) in split_blocks(input).into_iter().enumerate() {
        let entry = parse_block(&block).map_err(|fault| fault.at(ordinal + 1, line))?;
        entries.push(entry);
    }
    Ok(Timeline::new(entries))
}

fn split_blocks(input: &str) -> Vec<(usize, Vec<&str>)> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut start_line = 0;

    for (i, raw) in input.split('\n').enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push((start_line, std::mem::take(&mut current)));
            }
            continue;
        }
        if current.is_empty() {
            start_line = i + 1;
        }
        current.push(line);
    }
    if !current.is_empty() {
        blocks.push((start_line, current));
    }

    blocks
}

// 956
// 01:43:12,436 --> 01:43:16,782
// - <i>four, three, two, one.</i>
// - <i>[Steady Beep]</i>
fn parse_block(lines: &[&str]) -> Result<SubtitleEntry, BlockFault> {
    if lines.len() < 2 {
        return Err(BlockFault::TooFewLines(lines.len()));
    }
    let index =
        parse_leading_int(lines[0]).ok_or_else(|| BlockFault::Number(lines[0].to_string()))?;
    let period = parse_period(lines[1])?;
    let body = lines[2..].join("\n");
    let text = parse_text_tokens(&body)?;
    Ok(SubtitleEntry {
        index,
        period,
        text,
    })
}

/// `01:42:00,740 --> 01:42:05,621`, any number of spaces around the arrow.
fn parse_period(line: &str) -> Result<SubtitlePeriod, BlockFault> {
    let pieces: Vec<&str> = line.split("-->").collect();
    let [start, end] = pieces.as_slice() else {
        return Err(BlockFault::Period(line.to_string()));
    };
    let start = parse_timestamp(start.trim_end_matches(' '))?;
    let end = parse_timestamp(end.trim_start_matches(' '))?;
    Ok(SubtitlePeriod::new(start, end))
}

/// `01:52:45,517`: four integer fields split on `:` and `,`.
fn parse_timestamp(s: &str) -> Result<Timestamp, BlockFault> {
    let fields: Vec<&str> = s.split([':', ',']).collect();
    let [hours, minutes, seconds, millis] = fields.as_slice() else {
        return Err(BlockFault::Timestamp(s.to_string()));
    };
    let field = |f: &str| parse_leading_int(f).ok_or_else(|| BlockFault::Number(s.to_string()));
    Timestamp::checked_from_parts(TimestampParts {
        hours: field(*hours)?,
        minutes: field(*minutes)?,
        seconds: field(*seconds)?,
        millis: field(*millis)?,
    })
    .ok_or_else(|| BlockFault::Timestamp(s.to_string()))
}

/// Reads an optionally signed decimal prefix after leading whitespace and
/// ignores whatever follows it, so `"12 "` and `"007x"` both parse.
fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let sign_len = usize::from(s.starts_with(['+', '-']));
    let digits = s[sign_len..].bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    s[..sign_len + digits].parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Open,
    Close,
    Text(&'a str),
}

fn tokenize(body: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = body;
    while !rest.is_empty() {
        match next_tag(rest) {
            Some((pos, tag, len)) => {
                if pos > 0 {
                    tokens.push(Token::Text(&rest[..pos]));
                }
                tokens.push(tag);
                rest = &rest[pos + len..];
            }
            None => {
                tokens.push(Token::Text(rest));
                break;
            }
        }
    }
    tokens
}

fn next_tag(s: &str) -> Option<(usize, Token<'static>, usize)> {
    let mut from = 0;
    while let Some(offset) = s[from..].find('<') {
        let pos = from + offset;
        let tail = &s[pos..];
        if tail.starts_with("<i>") {
            return Some((pos, Token::Open, 3));
        }
        if tail.starts_with("</i>") {
            return Some((pos, Token::Close, 4));
        }
        from = pos + 1;
    }
    None
}

/// Turns a caption body into styled parts.
///
/// `<i></i>` contributes nothing. Any other `<i>` must enclose exactly one
/// run of text. A stray `</i>` is kept as literal text.
pub fn parse_text(body: &str) -> Result<Vec<SubtitleTextPart>, SrtError> {
    parse_text_tokens(body).map_err(|fault| fault.at(1, 1))
}

fn parse_text_tokens(body: &str) -> Result<Vec<SubtitleTextPart>, BlockFault> {
    let tokens = tokenize(body);
    let malformed = || BlockFault::Markup(body.to_string());

    let mut parts = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            Token::Open => match (tokens.get(i + 1), tokens.get(i + 2)) {
                (Some(Token::Close), _) => i += 2,
                (Some(Token::Text(text)), Some(Token::Close)) => {
                    parts.push(SubtitleTextPart::italic(*text));
                    i += 3;
                }
                _ => return Err(malformed()),
            },
            Token::Close => {
                parts.push(SubtitleTextPart::plain("</i>"));
                i += 1;
            }
            Token::Text(text) => {
                parts.push(SubtitleTextPart::plain(text));
                i += 1;
            }
        }
    }
    Ok(parts)
}

pub fn plain_text(parts: &[SubtitleTextPart]) -> String {
    parts.iter().map(|p| p.text.as_str()).collect()
}

/// Caption text for an HTML page: escaped, italics as `<em>`, line breaks
/// as `<br/>`.
pub fn html_text(parts: &[SubtitleTextPart]) -> String {
    let mut out = String::new();
    for part in parts {
        let escaped = escape_html(&part.text).replace('\n', "<br/>");
        if part.italic {
            out.push_str("<em>");
            out.push_str(&escaped);
            out.push_str("</em>");
        } else {
            out.push_str(&escaped);
        }
    }
    out
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn pretty_print_period(period: &SubtitlePeriod) -> String {
    format!("{} --> {}", period.start, period.end)
}

pub fn pretty_print_subtitle(entry: &SubtitleEntry) -> String {
    format!(
        "{}\n{}\n{}",
        entry.index,
        pretty_print_period(&entry.period),
        plain_text(&entry.text)
    )
}
