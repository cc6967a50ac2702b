use anyhow::{Context, Result, anyhow};
use std::{fmt, fs, path::Path};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf16Le => "UTF-16LE",
            Encoding::Utf16Be => "UTF-16BE",
        })
    }
}

#[derive(Debug, Clone)]
pub struct TextFile {
    pub encoding: Encoding,
    pub content: String,
}

pub fn read_text_file(path: &Path) -> Result<TextFile> {
    let bytes =
        fs::read(path).with_context(|| format!("failed reading file: {}", path.display()))?;
    decode(&bytes).with_context(|| format!("failed decoding file: {}", path.display()))
}

/// Decodes UTF-8 or UTF-16 text, dropping any byte-order mark.
pub fn decode(bytes: &[u8]) -> Result<TextFile> {
    if let Some(rest) = bytes.strip_prefix(b"\xEF\xBB\xBF") {
        return decode_utf8(rest);
    }
    if let Some(rest) = bytes.strip_prefix(b"\xFF\xFE") {
        return decode_utf16(rest, Encoding::Utf16Le);
    }
    if let Some(rest) = bytes.strip_prefix(b"\xFE\xFF") {
        return decode_utf16(rest, Encoding::Utf16Be);
    }
    if looks_like_utf16le(bytes) {
        return decode_utf16(bytes, Encoding::Utf16Le);
    }
    decode_utf8(bytes)
}

fn decode_utf8(bytes: &[u8]) -> Result<TextFile> {
    let content = std::str::from_utf8(bytes)
        .map_err(|e| anyhow!("failed to determine file encoding: {e}"))?
        .to_string();
    Ok(TextFile {
        encoding: Encoding::Utf8,
        content,
    })
}

fn decode_utf16(bytes: &[u8], encoding: Encoding) -> Result<TextFile> {
    if bytes.len() % 2 != 0 {
        return Err(anyhow!("odd byte length for {encoding} text"));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| match encoding {
            Encoding::Utf16Be => u16::from_be_bytes([pair[0], pair[1]]),
            _ => u16::from_le_bytes([pair[0], pair[1]]),
        })
        .collect();
    let content = String::from_utf16(&units).map_err(|e| anyhow!("invalid {encoding} text: {e}"))?;
    Ok(TextFile { encoding, content })
}

// BOM-less UTF-16LE: ASCII-heavy text has a NUL in every odd byte.
fn looks_like_utf16le(bytes: &[u8]) -> bool {
    if bytes.len() < 4 || bytes.len() % 2 != 0 {
        return false;
    }
    let odd_nuls = bytes.iter().skip(1).step_by(2).filter(|b| **b == 0).count();
    let even_nuls = bytes.iter().step_by(2).filter(|b| **b == 0).count();
    even_nuls == 0 && odd_nuls * 2 >= bytes.len() / 2
}

pub fn strip_non_ascii(s: &str) -> String {
    s.chars().filter(char::is_ascii).collect()
}
