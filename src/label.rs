//! Display labels for items and option groups

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::models::TreeNode;

/// Identities whose display name differs from their id
pub const ITEM_ALIASES: &[(&str, &str)] = &[
    ("writable_book", "book_and_quill"),
    ("heavy_weighted_pressure_plate", "iron_pressure_plate"),
    ("light_weighted_pressure_plate", "gold_pressure_plate"),
];

pub fn alias(identity: &str) -> &str {
    ITEM_ALIASES
        .iter()
        .find(|(id, _)| *id == identity)
        .map_or(identity, |(_, alias)| *alias)
}

/// `oak_planks` -> `oak planks`
pub fn item_label(identity: &str) -> String {
    alias(identity).replace('_', " ")
}

#[derive(Debug)]
struct Phrase {
    count: usize,
    dist_from_end: usize,
}

/// Caption for a set of names: the shortest run of shared phrases that
/// covers every name. `[oak_planks, birch_planks]` becomes `planks`.
pub fn phrase_label<S: AsRef<str>>(names: &[S]) -> String {
    let mut phrases: IndexMap<String, Phrase> = IndexMap::new();

    for name in names {
        let name = alias(name.as_ref());
        let parts: Vec<&str> = name.split('_').collect();
        let mut seen = HashSet::new();

        let mut offset = 0;
        for start in 0..parts.len() {
            let mut end_offset = offset;
            for end in start..parts.len() {
                end_offset += parts[end].len() + usize::from(end > start);
                let phrase = parts[start..=end].join("_");
                if !seen.insert(phrase.clone()) {
                    continue;
                }

                let dist_from_end = name.len() - end_offset;
                phrases
                    .entry(phrase)
                    .and_modify(|p| {
                        p.count += 1;
                        p.dist_from_end = p.dist_from_end.min(dist_from_end);
                    })
                    .or_insert(Phrase { count: 1, dist_from_end });
            }
            offset += parts[start].len() + 1;
        }
    }

    let mut ranked: Vec<(String, Phrase)> = phrases.into_iter().collect();
    ranked.sort_by(|(a, pa), (b, pb)| {
        pb.count
            .cmp(&pa.count)
            .then(pa.dist_from_end.cmp(&pb.dist_from_end))
            .then(b.len().cmp(&a.len()))
            .then_with(|| a.cmp(b))
    });

    let mut described = 0;
    let mut found = Vec::new();
    for (phrase, stats) in ranked {
        found.push(phrase.replace('_', " "));
        described += stats.count;
        if described >= names.len() {
            break;
        }
    }

    found.join(" / ")
}

/// Caption for an option group from its members' identities
pub fn group_label(members: &[TreeNode]) -> String {
    let names: Vec<&str> = members
        .iter()
        .filter_map(|member| member.identity().map(|identity| identity.as_str()))
        .collect();

    match names.as_slice() {
        [] => String::new(),
        [only] => item_label(only),
        _ => phrase_label(&names),
    }
}
