//! Build-path extraction
//!
//! Collapses a recipe tree into the selected-only projection sent back to the
//! recipe service. Every option group contributes exactly one node: its first
//! selected member in declaration order.

use crate::error::StructuralError;
use crate::models::{BuildPath, PathNode, TreeElement, TreeNode, display_location};

/// Extract the build path of a fully resolved recipe tree
///
/// Unselected plain nodes are skipped. An option group with no members or no
/// selected member is a structural error; run the tree through
/// [`crate::reconcile::reconcile`] first.
pub fn extract(tree: &[TreeElement]) -> Result<BuildPath, StructuralError> {
    extract_elements(tree, "")
}

fn extract_elements(elements: &[TreeElement], location: &str) -> Result<BuildPath, StructuralError> {
    let mut path = BuildPath::new();

    for (index, element) in elements.iter().enumerate() {
        let (key, entry) = match element {
            TreeElement::Node(node) => {
                if !node.selected {
                    continue;
                }
                extract_node(node, location)?
            }
            TreeElement::Group(members) => {
                let here = format!("{location}/{index}");
                extract_node(chosen_member(members, &here)?, &here)?
            }
        };
        path.insert(key, entry);
    }

    Ok(path)
}

/// First selected member of a group; stops at the first match even if the
/// group wrongly has several.
fn chosen_member<'a>(members: &'a [TreeNode], location: &str) -> Result<&'a TreeNode, StructuralError> {
    if members.is_empty() {
        return Err(StructuralError::EmptyGroup {
            location: display_location(location),
        });
    }

    members
        .iter()
        .find(|member| member.selected)
        .ok_or_else(|| StructuralError::UnresolvedGroup {
            location: display_location(location),
        })
}

fn extract_node(node: &TreeNode, location: &str) -> Result<(String, PathNode), StructuralError> {
    let key = node.require_identity(location)?.as_str().to_string();
    let here = format!("{location}/{key}");

    let mut entry = PathNode {
        name: node.name.clone(),
        tag: node.tag.clone(),
        selected: true,
        kind: node.kind.clone(),
        amount_required: node.amount_required,
        amount_created: node.amount_created,
        recipe: None,
        ingredients: None,
    };

    if node.has_recipes() {
        let recipes_at = format!("{here}/recipes");
        let recipe = chosen_member(&node.recipes, &recipes_at)?;
        let (_, recipe_entry) = extract_node(recipe, &recipes_at)?;
        entry.recipe = Some(Box::new(recipe_entry));
    } else if !node.ingredients.is_empty() {
        entry.ingredients = Some(extract_elements(&node.ingredients, &here)?);
    }

    Ok((key, entry))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planks_group(oak_selected: bool, birch_selected: bool) -> TreeElement {
        TreeElement::Group(vec![
            TreeNode::item("oak_planks", 4).with_selected(oak_selected),
            TreeNode::item("birch_planks", 4).with_selected(birch_selected),
        ])
    }

    fn crafting_table(planks: TreeElement) -> TreeElement {
        TreeNode::item("crafting_table", 1)
            .with_recipes(vec![
                TreeNode::recipe("crafting_table", "minecraft:crafting_shaped", 1, 1)
                    .with_selected(true)
                    .with_ingredients(vec![planks]),
            ])
            .into()
    }

    #[test]
    fn collapses_recipes_and_groups_to_the_selected_branch() {
        let tree = vec![crafting_table(planks_group(false, true))];

        let path = extract(&tree).unwrap();
        let table = &path["crafting_table"];
        assert!(table.selected);
        assert_eq!(table.amount_required, 1);
        assert!(table.ingredients.is_none());

        let recipe = table.recipe.as_deref().expect("chosen recipe");
        assert_eq!(recipe.kind.as_deref(), Some("minecraft:crafting_shaped"));
        assert_eq!(recipe.amount_created, Some(1));

        let ingredients = recipe.ingredients.as_ref().expect("recipe ingredients");
        assert_eq!(ingredients.len(), 1);
        assert_eq!(ingredients["birch_planks"].amount_required, 4);
        assert!(!ingredients.contains_key("oak_planks"));
    }

    #[test]
    fn first_selected_member_wins_when_several_are_selected() {
        let tree = vec![planks_group(true, true)];

        let path = extract(&tree).unwrap();
        assert_eq!(path.keys().collect::<Vec<_>>(), vec!["oak_planks"]);
    }

    #[test]
    fn unselected_plain_nodes_are_skipped() {
        let tree = vec![
            TreeNode::item("torch", 4).into(),
            TreeNode::item("stick", 1).with_selected(false).into(),
        ];

        let path = extract(&tree).unwrap();
        assert!(path.contains_key("torch"));
        assert!(!path.contains_key("stick"));
    }

    #[test]
    fn keys_follow_tree_order() {
        let tree = vec![
            TreeNode::item("torch", 4).into(),
            TreeNode::item("oak_log", 2).into(),
            planks_group(false, true),
        ];

        let path = extract(&tree).unwrap();
        assert_eq!(
            path.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["torch", "oak_log", "birch_planks"]
        );
    }

    #[test]
    fn unresolved_group_is_a_structural_error() {
        let tree = vec![crafting_table(planks_group(false, false))];

        let err = extract(&tree).unwrap_err();
        assert_eq!(
            err,
            StructuralError::UnresolvedGroup {
                location: "/crafting_table/recipes/crafting_table/0".to_string()
            }
        );
    }

    #[test]
    fn empty_group_is_a_structural_error() {
        let tree = vec![TreeElement::Group(Vec::new())];

        assert!(matches!(extract(&tree), Err(StructuralError::EmptyGroup { .. })));
    }

    #[test]
    fn declared_recipes_must_be_present() {
        let mut node = TreeNode::item("furnace", 1);
        node.num_recipes = 1;

        let err = extract(&[node.into()]).unwrap_err();
        assert!(matches!(err, StructuralError::EmptyGroup { .. }));
    }

    #[test]
    fn selected_node_without_identity_is_rejected() {
        let node = TreeNode {
            selected: true,
            ..TreeNode::default()
        };

        let err = extract(&[node.into()]).unwrap_err();
        assert_eq!(err, StructuralError::MissingIdentity { location: "/".to_string() });
    }
}
