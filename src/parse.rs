//! Item-line parsing
//!
//! Turns free-form lines such as `8 oak_log`, `oak log x8` or `#planks 4`
//! into item references.

use std::fmt;

use anyhow::Result;
use regex::Regex;

use crate::models::ItemRef;

/// A line that could not be turned into an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub line: String,
    pub reason: String,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.line, self.reason)
    }
}

#[derive(Debug, Default)]
pub struct ParsedItems {
    pub items: Vec<ItemRef>,
    pub errors: Vec<ParseFailure>,
}

/// Parse item lines
///
/// Each entry may hold several newline-separated lines; blank lines are
/// skipped. A leading amount wins over a trailing one and the default is 1.
/// Repeated items are merged into the first occurrence.
pub fn parse_item_lines<S: AsRef<str>>(lines: &[S]) -> Result<ParsedItems> {
    let line_re = Regex::new(
        r"^\s*(?:(?P<lead>[\d,]+)\s*(?:[xX]\s)?\s*)?(?P<hash>#)?(?P<name>[A-Za-z][A-Za-z0-9_\-: ]*?)(?:\s*(?:\s[xX])?\s*(?P<trail>[\d,]+))?\s*$",
    )?;

    let mut parsed = ParsedItems::default();

    for line in lines.iter().flat_map(|entry| entry.as_ref().lines()) {
        if line.trim().is_empty() {
            continue;
        }

        let Some(cap) = line_re.captures(line) else {
            parsed.errors.push(ParseFailure {
                line: line.to_string(),
                reason: "expected an item name with an optional amount".to_string(),
            });
            continue;
        };

        let amount_text = cap.name("lead").or_else(|| cap.name("trail")).map(|m| m.as_str());
        let amount = match amount_text.map(parse_amount) {
            None => 1,
            Some(Some(amount)) => amount,
            Some(None) => {
                parsed.errors.push(ParseFailure {
                    line: line.to_string(),
                    reason: "amount is out of range".to_string(),
                });
                continue;
            }
        };

        let name = normalize_name(&cap["name"]);
        if name.is_empty() {
            parsed.errors.push(ParseFailure {
                line: line.to_string(),
                reason: "empty item name".to_string(),
            });
            continue;
        }

        let item = if cap.name("hash").is_some() {
            ItemRef::tag(name, amount)
        } else {
            ItemRef::item(name, amount)
        };

        match parsed.items.iter_mut().find(|existing| existing.key == item.key) {
            Some(existing) => {
                existing.amount_required = existing.amount_required.saturating_add(item.amount_required);
            }
            None => parsed.items.push(item),
        }
    }

    Ok(parsed)
}

fn parse_amount(text: &str) -> Option<u32> {
    text.replace(',', "").parse().ok()
}

/// `Minecraft:Oak Log` -> `oak_log`
pub fn normalize_name(raw: &str) -> String {
    let unqualified = raw.rsplit(':').next().unwrap_or(raw);
    unqualified
        .to_lowercase()
        .split(|c: char| c == ' ' || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(lines: &[&str]) -> ParsedItems {
        parse_item_lines(lines).unwrap()
    }

    #[test]
    fn leading_and_trailing_amounts() {
        let parsed = parse(&["8 oak_log", "torch 2", "crafting table x3", "4x stick"]);

        assert!(parsed.errors.is_empty());
        assert_eq!(
            parsed.items,
            vec![
                ItemRef::item("oak_log", 8),
                ItemRef::item("torch", 2),
                ItemRef::item("crafting_table", 3),
                ItemRef::item("stick", 4),
            ]
        );
    }

    #[test]
    fn leading_amount_wins_and_default_is_one() {
        let parsed = parse(&["3 torch 9", "chest"]);
        assert_eq!(parsed.items, vec![ItemRef::item("torch", 3), ItemRef::item("chest", 1)]);
    }

    #[test]
    fn commas_tags_and_namespaces() {
        let parsed = parse(&["1,000 stone", "#planks 4", "minecraft:Oak-Log"]);

        assert_eq!(
            parsed.items,
            vec![
                ItemRef::item("stone", 1000),
                ItemRef::tag("planks", 4),
                ItemRef::item("oak_log", 1),
            ]
        );
    }

    #[test]
    fn names_ending_in_x_are_not_amount_markers() {
        let parsed = parse(&["box", "2 x box"]);
        assert_eq!(parsed.items, vec![ItemRef::item("box", 3)]);
    }

    #[test]
    fn multi_line_entries_and_blank_lines() {
        let parsed = parse(&["oak_log 2\n\n  torch\n"]);
        assert_eq!(parsed.items.len(), 2);
    }

    #[test]
    fn bad_lines_are_reported_not_fatal() {
        let parsed = parse(&["12", "torch", "99999999999 stone", "!!"]);

        assert_eq!(parsed.items, vec![ItemRef::item("torch", 1)]);
        assert_eq!(parsed.errors.len(), 3);
        assert_eq!(parsed.errors[1].line, "99999999999 stone");
        assert_eq!(parsed.errors[1].reason, "amount is out of range");
    }
}
