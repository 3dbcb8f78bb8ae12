//! Minimal BibTeX handling
//!
//! Only what the catalog needs: tidy an entry returned by a resolver (one
//! field per line) and pull out the few fields shown on the site.

use regex::Regex;

/// One parsed entry
#[derive(Debug, Clone, PartialEq)]
pub struct BibEntry {
    pub entry_type: String,
    pub key: String,
    /// (lowercased name, raw value) in source order
    pub fields: Vec<(String, String)>,
}

impl BibEntry {
    /// Parse the first entry in `text`
    pub fn parse(text: &str) -> Option<Self> {
        let header = Regex::new(r"^\s*@\s*([A-Za-z]+)\s*\{").ok()?;
        let caps = header.captures(text)?;
        let entry_type = caps.get(1)?.as_str().to_lowercase();
        let body_start = caps.get(0)?.end();

        let body = enclosed(&text[body_start..])?;
        let mut parts = split_top_level(body).into_iter();
        let key = parts.next()?.trim().to_string();

        let fields = parts
            .filter_map(|part| {
                let (name, value) = part.split_once('=')?;
                let name = name.trim().to_lowercase();
                let value = collapse_whitespace(value);
                (!name.is_empty() && !value.is_empty()).then_some((name, value))
            })
            .collect();

        Some(Self {
            entry_type,
            key,
            fields,
        })
    }

    /// Raw value of a field
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Field value with braces and quotes removed
    pub fn text(&self, name: &str) -> Option<String> {
        self.field(name)
            .map(strip_markup)
            .filter(|v| !v.is_empty())
    }

    pub fn title(&self) -> Option<String> {
        self.text("title")
    }

    /// Authors joined with "; "
    pub fn authors(&self) -> Option<String> {
        self.text("author").map(|authors| {
            authors
                .split(" and ")
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .collect::<Vec<_>>()
                .join("; ")
        })
    }

    pub fn year(&self) -> Option<String> {
        let year = Regex::new(r"\b(\d{4})\b").ok()?;
        let value = self.text("year")?;
        year.captures(&value)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    pub fn journal(&self) -> Option<String> {
        self.text("journal").or_else(|| self.text("booktitle"))
    }

    /// Render with one field per line
    pub fn to_bibtex(&self) -> String {
        let mut out = format!("@{}{{{}", self.entry_type, self.key);
        for (name, value) in &self.fields {
            out.push_str(",\n  ");
            out.push_str(name);
            out.push_str(" = ");
            out.push_str(value);
        }
        out.push_str("\n}");
        out
    }
}

/// Tidy a BibTeX response. Unparseable input is only trimmed.
pub fn normalize(raw: &str) -> String {
    match BibEntry::parse(raw) {
        Some(entry) => entry.to_bibtex(),
        None => raw.trim().to_string(),
    }
}

/// Text up to the brace closing the one just opened
fn enclosed(text: &str) -> Option<&str> {
    let mut depth = 1usize;
    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[..i]);
                }
            },
            _ => {},
        }
    }
    None
}

/// Split on commas outside braces and quotes
fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '"' if depth == 0 => in_quotes = !in_quotes,
            ',' if depth == 0 && !in_quotes => {
                parts.push(&body[start..i]);
                start = i + 1;
            },
            _ => {},
        }
    }
    parts.push(&body[start..]);
    parts
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_markup(value: &str) -> String {
    let stripped: String = value.chars().filter(|c| *c != '{' && *c != '}').collect();
    collapse_whitespace(stripped.trim().trim_matches('"'))
}
