//! Text rendering of recipe trees and shopping lists

use std::fmt;

use crate::label::{group_label, item_label};
use crate::models::{ShoppingList, TreeElement, TreeNode};

/// Format a recipe tree as an indented outline
///
/// Option groups and multi-recipe items list every alternative with an
/// `[x]`/`[ ]` marker; only the selected branch is expanded.
pub fn format_recipe_tree(tree: &[TreeElement], indent: usize) -> String {
    let mut output = String::new();
    format_elements(tree, indent, &mut output);
    output
}

fn format_elements(elements: &[TreeElement], indent: usize, output: &mut String) {
    let prefix = "  ".repeat(indent);

    for element in elements {
        match element {
            TreeElement::Node(node) => {
                if node.selected {
                    format_node(node, indent, output);
                }
            }
            TreeElement::Group(members) => {
                let amount = members.first().map_or(0, |member| member.amount_required);
                output.push_str(&format!("{}{}x {} (choose one)\n", prefix, amount, group_label(members)));

                for member in members {
                    output.push_str(&format!("{}  {} {}\n", prefix, marker(member.selected), member.label()));
                    if member.selected {
                        format_body(member, indent + 2, output);
                    }
                }
            }
        }
    }
}

fn format_node(node: &TreeNode, indent: usize, output: &mut String) {
    let prefix = "  ".repeat(indent);
    let raw = if node.is_raw() { " (raw)" } else { "" };

    output.push_str(&format!("{}{}x {}{}\n", prefix, node.amount_required, node.label(), raw));
    format_body(node, indent + 1, output);
}

fn format_body(node: &TreeNode, indent: usize, output: &mut String) {
    if !node.has_recipes() {
        format_elements(&node.ingredients, indent, output);
        return;
    }

    let prefix = "  ".repeat(indent);
    if node.recipes.len() > 1 {
        output.push_str(&format!("{}recipe ({} options):\n", prefix, node.recipes.len()));
        for recipe in &node.recipes {
            output.push_str(&format!("{}  {} {}\n", prefix, marker(recipe.selected), describe_recipe(recipe)));
            if recipe.selected {
                format_elements(&recipe.ingredients, indent + 2, output);
            }
        }
    } else if let Some(recipe) = node.recipes.first() {
        output.push_str(&format!("{}via {}\n", prefix, describe_recipe(recipe)));
        format_elements(&recipe.ingredients, indent + 1, output);
    }
}

fn describe_recipe(recipe: &TreeNode) -> String {
    let kind = recipe.kind.as_deref().unwrap_or("recipe");
    match recipe.amount_created {
        Some(created) => format!("{} ({}, makes {})", recipe.label(), kind, created),
        None => format!("{} ({})", recipe.label(), kind),
    }
}

fn marker(selected: bool) -> &'static str {
    if selected { "[x]" } else { "[ ]" }
}

/// One line of the summary: identity, amount still needed, amount on hand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLine {
    pub name: String,
    pub still_needed: u32,
    pub have: u32,
}

/// Shopping list split into raw materials to gather and items to craft
#[derive(Debug, Default)]
pub struct ShoppingSummary {
    pub to_gather: Vec<SummaryLine>,
    pub to_craft: Vec<SummaryLine>,
}

/// Generate a summary of a shopping list, sorted by name
pub fn summarize_shopping_list(list: &ShoppingList) -> ShoppingSummary {
    let mut summary = ShoppingSummary::default();

    for (name, entry) in list {
        let line = SummaryLine {
            name: name.clone(),
            still_needed: entry.still_needed(),
            have: entry.have,
        };
        if entry.has_recipe {
            summary.to_craft.push(line);
        } else {
            summary.to_gather.push(line);
        }
    }

    summary.to_gather.sort_by(|a, b| a.name.cmp(&b.name));
    summary.to_craft.sort_by(|a, b| a.name.cmp(&b.name));
    summary
}

impl fmt::Display for ShoppingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Shopping List ===")?;

        writeln!(f, "To gather:")?;
        for line in &self.to_gather {
            writeln!(f, "  {}: {} (have {})", item_label(&line.name), line.still_needed, line.have)?;
        }
        writeln!(f)?;

        writeln!(f, "To craft:")?;
        for line in &self.to_craft {
            writeln!(f, "  {}: {} (have {})", item_label(&line.name), line.still_needed, line.have)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShoppingEntry;

    fn torch_tree() -> Vec<TreeElement> {
        let recipe = TreeNode::recipe("torch", "crafting_shaped", 2, 4)
            .with_selected(true)
            .with_ingredients(vec![
                TreeElement::Group(vec![
                    TreeNode::item("coal", 1),
                    TreeNode::item("charcoal", 1).with_selected(false),
                ]),
                TreeNode::item("stick", 1).into(),
            ]);
        vec![TreeNode::item("torch", 2).with_recipes(vec![recipe]).into()]
    }

    #[test]
    fn outline_marks_choices_and_expands_selected_branch() {
        let text = format_recipe_tree(&torch_tree(), 0);

        assert_eq!(
            text,
            "2x torch\n\
             \x20 via torch (crafting_shaped, makes 4)\n\
             \x20   1x charcoal / coal (choose one)\n\
             \x20     [x] coal\n\
             \x20     [ ] charcoal\n\
             \x20   1x stick (raw)\n"
        );
    }

    #[test]
    fn summary_splits_and_sorts() {
        let mut list = ShoppingList::new();
        list.insert(
            "stick".to_string(),
            ShoppingEntry {
                amount_required: 1,
                has_recipe: true,
                ..ShoppingEntry::default()
            },
        );
        list.insert(
            "oak_planks".to_string(),
            ShoppingEntry {
                amount_required: 4,
                have: 1,
                ..ShoppingEntry::default()
            },
        );
        list.insert(
            "coal".to_string(),
            ShoppingEntry {
                amount_required: 1,
                ..ShoppingEntry::default()
            },
        );

        let summary = summarize_shopping_list(&list);
        let gathered: Vec<_> = summary.to_gather.iter().map(|line| line.name.as_str()).collect();
        assert_eq!(gathered, ["coal", "oak_planks"]);
        assert_eq!(summary.to_gather[1].still_needed, 3);
        assert!(summary.to_string().contains("  oak planks: 3 (have 1)"));
    }
}
