// DeRez text extraction
//
// DeRez prints a resource fork as Rez source:
//
//     data 'PICT' (128, "Logo", purgeable) {
//         $"0A2E 0000 0000 0040 0040 1101"
//     };
//
// This module pulls the resources back out as bytes so that PICT resources
// can be handed to the parser.

use crate::common::binary::FourCc;
use crate::common::error::{Error, Result};
use crate::images::pict::parser::FILE_HEADER_SIZE;
use once_cell::sync::Lazy;
use regex::Regex;

/// Line patterns of Rez source
struct Patterns {
    start: Regex,
    data: Regex,
    end: Regex,
    name: Regex,
}

impl Patterns {
    fn build() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::ParseError(format!("building DeRez pattern: {}", e)))
        };
        Ok(Self {
            start: compile(r#"^\s*data\s*'(.{4})'\s*\(\s*(-?\d+)\s*([^)]*)\)\s*\{"#)?,
            data: compile(r#"^\s*\$"([0-9A-Fa-f\s]*)""#)?,
            end: compile(r"^\s*\};")?,
            name: compile(r#""([^"]+)""#)?,
        })
    }
}

static PATTERNS: Lazy<Result<Patterns>> = Lazy::new(Patterns::build);

/// One resource from DeRez output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerezResource {
    pub kind: FourCc,
    pub id: i16,
    pub name: Option<String>,
    pub data: Vec<u8>,
}

impl DerezResource {
    pub fn is_pict(&self) -> bool {
        self.kind.0 == *b"PICT"
    }

    /// Resource data behind a zeroed 512-byte file header
    pub fn to_pict_file(&self) -> Vec<u8> {
        let mut file = vec![0u8; FILE_HEADER_SIZE];
        file.extend_from_slice(&self.data);
        file
    }

    /// `<name>.<type>`, or `R<id>.<type>` for unnamed resources
    pub fn file_name(&self) -> String {
        match &self.name {
            Some(name) => format!("{}.{}", name, self.kind),
            None => format!("R{}.{}", self.id, self.kind),
        }
    }
}

/// Resource type in Mac Roman, when every character maps into four bytes
fn resource_type(text: &str) -> Option<[u8; 4]> {
    let (bytes, _, unmappable) = encoding_rs::MACINTOSH.encode(text);
    if unmappable {
        return None;
    }
    bytes.as_ref().try_into().ok()
}

fn parse_hex(digits: &str, line: usize) -> Result<Vec<u8>> {
    let digits: Vec<u8> = digits.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err(Error::ParseError(format!("odd number of hex digits on line {}", line)));
    }
    digits
        .chunks_exact(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(|| Error::ParseError(format!("bad hex digits on line {}", line)))
        })
        .collect()
}

/// Extract every `data` resource from DeRez output
pub fn extract_resources(text: &str) -> Result<Vec<DerezResource>> {
    let patterns = PATTERNS.as_ref().map_err(Clone::clone)?;
    let mut resources = Vec::new();
    let mut current: Option<DerezResource> = None;

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        if let Some(caps) = patterns.start.captures(line) {
            if let Some(open) = current.take() {
                log::warn!("resource {} {} not terminated before line {}", open.kind, open.id, line_number);
            }
            let Some(kind_bytes) = resource_type(&caps[1]) else {
                log::warn!("skipping resource of type '{}' on line {}", &caps[1], line_number);
                continue;
            };
            let id = caps[2]
                .parse::<i16>()
                .map_err(|e| Error::InvalidFormat(format!("resource id on line {}: {}", line_number, e)))?;
            let name = patterns.name.captures(&caps[3]).map(|name| name[1].to_string());
            current = Some(DerezResource {
                kind: FourCc(kind_bytes),
                id,
                name,
                data: Vec::new(),
            });
            continue;
        }
        let Some(resource) = current.as_mut() else {
            continue;
        };
        if let Some(caps) = patterns.data.captures(line) {
            resource.data.extend(parse_hex(&caps[1], line_number)?);
        } else if patterns.end.is_match(line) {
            if let Some(done) = current.take() {
                log::debug!("resource {} {}: {} bytes", done.kind, done.id, done.data.len());
                resources.push(done);
            }
        }
    }

    if let Some(open) = current {
        log::warn!("resource {} {} not terminated at end of input", open.kind, open.id);
    }
    Ok(resources)
}
