//! Compiled placeholder templates.
//!
//! A template records the byte offsets of every `{name}` slot in a text so
//! substitution is a single pass with no re-scanning. Slots whose name is
//! not supplied are emitted verbatim.

use std::fmt::Display;

/// Named placeholder values supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholders(Vec<(String, String)>);

impl Placeholders {
    /// No placeholders.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds or replaces a value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Display) {
        let name = name.into();
        let value = value.to_string();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Looks up a value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if nothing was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<K: Into<String>, V: Display> FromIterator<(K, V)> for Placeholders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut placeholders = Self::new();
        for (name, value) in iter {
            placeholders.insert(name, value);
        }
        placeholders
    }
}

/// One `{name}` occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    /// Offset of `{`.
    start: usize,
    /// Offset one past `}`.
    end: usize,
}

impl Slot {
    fn name<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start + 1..self.end - 1]
    }
}

/// A text with pre-located placeholder slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    slots: Vec<Slot>,
}

impl Template {
    /// Scans `source` for `{name}` slots.
    #[must_use]
    pub fn compile(source: &str) -> Self {
        let bytes = source.as_bytes();
        let mut slots = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] != b'{' {
                i += 1;
                continue;
            }
            let name_len = bytes[i + 1..]
                .iter()
                .take_while(|b| is_name_byte(**b))
                .count();
            let close = i + 1 + name_len;
            if name_len > 0 && bytes.get(close) == Some(&b'}') {
                slots.push(Slot {
                    start: i,
                    end: close + 1,
                });
                i = close + 1;
            } else {
                i += 1;
            }
        }
        Self {
            source: source.to_string(),
            slots,
        }
    }

    /// The original text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns true if the text has at least one slot.
    #[must_use]
    pub fn has_slots(&self) -> bool {
        !self.slots.is_empty()
    }

    /// Slot names in order of appearance (duplicates kept).
    pub fn slot_names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.name(&self.source))
    }

    /// Substitutes supplied values into the slots.
    #[must_use]
    pub fn render(&self, placeholders: &Placeholders) -> String {
        if self.slots.is_empty() || placeholders.is_empty() {
            return self.source.clone();
        }
        let mut out = String::with_capacity(self.source.len() + 16);
        let mut cursor = 0;
        for slot in &self.slots {
            out.push_str(&self.source[cursor..slot.start]);
            match placeholders.get(slot.name(&self.source)) {
                Some(value) => out.push_str(value),
                None => out.push_str(&self.source[slot.start..slot.end]),
            }
            cursor = slot.end;
        }
        out.push_str(&self.source[cursor..]);
        out
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_offsets_cover_braces() {
        let t = Template::compile("Hi {name}!");
        assert_eq!(t.slots, vec![Slot { start: 3, end: 9 }]);
        assert_eq!(t.slot_names().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn unterminated_and_empty_braces_are_literal() {
        let t = Template::compile("{} and {open and {bad name}");
        assert!(!t.has_slots());
    }

    #[test]
    fn multibyte_text_around_slots() {
        let t = Template::compile("Größe: {size} → ok");
        let out = t.render(&Placeholders::new().with("size", 3));
        assert_eq!(out, "Größe: 3 → ok");
    }
}
