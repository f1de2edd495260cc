//! Selection reconciliation
//!
//! A freshly fetched recipe tree knows nothing about what the user picked on
//! the previous tree. `reconcile` walks the new tree alongside the previous
//! build path and restores those picks, falling back to the service default
//! (or the first member) where a previous pick no longer exists.
//!
//! All operations take the tree by reference and return a new owned tree.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SelectionError, StructuralError};
use crate::models::{BuildPath, PathNode, RecipeTree, TreeElement, TreeNode, display_location};

/// Re-apply the selections of `previous` onto `tree`
///
/// Every option group reachable through selected nodes ends up with exactly
/// one selected member. Subtrees of unselected nodes are left untouched.
pub fn reconcile(tree: &[TreeElement], previous: Option<&BuildPath>) -> Result<RecipeTree, StructuralError> {
    let mut owned = tree.to_vec();
    resolve_elements(&mut owned, previous, "")?;
    Ok(owned)
}

fn resolve_elements(
    elements: &mut [TreeElement],
    previous: Option<&BuildPath>,
    location: &str,
) -> Result<(), StructuralError> {
    for (index, element) in elements.iter_mut().enumerate() {
        match element {
            TreeElement::Node(node) => {
                let entry = {
                    let identity = node.require_identity(location)?;
                    previous.and_then(|path| path.get(identity.as_str()))
                };
                resolve_node(node, entry, location)?;
            }
            TreeElement::Group(members) => {
                let here = format!("{location}/{index}");
                resolve_group(members, |id| previous.and_then(|path| path.get(id)), &here)?;
            }
        }
    }
    Ok(())
}

/// Index of the member to use when no previous choice applies
fn default_member(members: &[TreeNode]) -> usize {
    members.iter().position(|member| member.selected).unwrap_or(0)
}

fn resolve_group<'p, F>(members: &mut [TreeNode], lookup: F, location: &str) -> Result<(), StructuralError>
where
    F: Fn(&str) -> Option<&'p PathNode>,
{
    if members.is_empty() {
        return Err(StructuralError::EmptyGroup {
            location: display_location(location),
        });
    }

    let mut matched = None;
    for (index, member) in members.iter().enumerate() {
        let identity = member.require_identity(location)?;
        if matched.is_none() {
            matched = lookup(identity.as_str()).map(|entry| (index, entry));
        }
    }

    let (chosen, entry) = match matched {
        Some((index, entry)) => (index, Some(entry)),
        None => {
            let index = default_member(members);
            debug!(
                location = %display_location(location),
                member = ?members[index].identity(),
                "no previous choice applies, using default"
            );
            (index, None)
        }
    };

    for (index, member) in members.iter_mut().enumerate() {
        member.selected = index == chosen;
    }

    resolve_node(&mut members[chosen], entry, location)
}

fn resolve_node(node: &mut TreeNode, entry: Option<&PathNode>, location: &str) -> Result<(), StructuralError> {
    if !node.selected {
        return Ok(());
    }

    let here = format!("{location}/{}", node.require_identity(location)?.as_str());

    if node.has_recipes() {
        let previous_recipe = entry.and_then(|e| e.recipe.as_deref());
        resolve_group(
            &mut node.recipes,
            |id| previous_recipe.filter(|recipe| recipe.identity().map(|i| i.as_str()) == Some(id)),
            &format!("{here}/recipes"),
        )?;
    }

    resolve_elements(&mut node.ingredients, entry.and_then(|e| e.ingredients.as_ref()), &here)
}

/// One hop from a tree position towards an option group
///
/// `Element(i)` indexes a sequence (the tree itself, or the ingredients of
/// the current node), `Member(i)` a member of the current option group and
/// `Recipe(i)` an alternative recipe of the current node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    Element(usize),
    Member(usize),
    Recipe(usize),
}

enum Cursor<'a> {
    Sequence(&'a mut [TreeElement]),
    Group(&'a mut [TreeNode]),
    Node(&'a mut TreeNode),
}

fn enter_element(elements: &mut [TreeElement], index: usize, step: usize) -> Result<Cursor<'_>, SelectionError> {
    match elements.get_mut(index) {
        Some(TreeElement::Node(node)) => Ok(Cursor::Node(node)),
        Some(TreeElement::Group(members)) => Ok(Cursor::Group(members)),
        None => Err(SelectionError::InvalidStep { step }),
    }
}

/// Select member `choice` of the option group at `at`
///
/// A path ending at a node addresses that node's recipe alternatives. Groups
/// left unresolved inside the newly chosen member are defaulted.
pub fn select_alternative(tree: &[TreeElement], at: &[Step], choice: usize) -> Result<RecipeTree, SelectionError> {
    let mut owned = tree.to_vec();
    let mut cursor = Cursor::Sequence(&mut owned);

    for (step_index, step) in at.iter().enumerate() {
        let invalid = SelectionError::InvalidStep { step: step_index };
        cursor = match (cursor, *step) {
            (Cursor::Sequence(elements), Step::Element(i)) => enter_element(elements, i, step_index)?,
            (Cursor::Node(node), Step::Element(i)) => enter_element(&mut node.ingredients, i, step_index)?,
            (Cursor::Group(members), Step::Member(i)) => Cursor::Node(members.get_mut(i).ok_or(invalid)?),
            (Cursor::Node(node), Step::Recipe(i)) => Cursor::Node(node.recipes.get_mut(i).ok_or(invalid)?),
            _ => return Err(invalid),
        };
    }

    let members: &mut [TreeNode] = match cursor {
        Cursor::Group(members) => members,
        Cursor::Node(node) if node.has_recipes() => &mut node.recipes,
        _ => return Err(SelectionError::NotAGroup),
    };

    if choice >= members.len() {
        return Err(SelectionError::ChoiceOutOfRange {
            choice,
            len: members.len(),
        });
    }

    for (index, member) in members.iter_mut().enumerate() {
        member.selected = index == choice;
    }
    resolve_node(&mut members[choice], None, "")?;

    Ok(owned)
}

/// Find the first option group on the selected build path that offers an
/// alternative named `identity`
///
/// Returns the path to the group and the member index, suitable for
/// [`select_alternative`].
pub fn find_alternative(tree: &[TreeElement], identity: &str) -> Option<(Vec<Step>, usize)> {
    let mut trail = Vec::new();
    find_in_elements(tree, identity, &mut trail)
}

fn position_of(members: &[TreeNode], identity: &str) -> Option<usize> {
    members
        .iter()
        .position(|member| member.identity().map(|i| i.as_str()) == Some(identity))
}

fn find_in_elements(elements: &[TreeElement], identity: &str, trail: &mut Vec<Step>) -> Option<(Vec<Step>, usize)> {
    for (index, element) in elements.iter().enumerate() {
        trail.push(Step::Element(index));

        let found = match element {
            TreeElement::Group(members) => match position_of(members, identity) {
                Some(choice) => Some((trail.clone(), choice)),
                None => members.iter().position(|m| m.selected).and_then(|selected| {
                    trail.push(Step::Member(selected));
                    let found = find_in_node(&members[selected], identity, trail);
                    trail.pop();
                    found
                }),
            },
            TreeElement::Node(node) if node.selected => find_in_node(node, identity, trail),
            TreeElement::Node(_) => None,
        };

        trail.pop();
        if found.is_some() {
            return found;
        }
    }
    None
}

fn find_in_node(node: &TreeNode, identity: &str, trail: &mut Vec<Step>) -> Option<(Vec<Step>, usize)> {
    if node.has_recipes() && node.recipes.len() > 1 {
        if let Some(choice) = position_of(&node.recipes, identity) {
            return Some((trail.clone(), choice));
        }
    }

    if let Some(selected) = node.recipes.iter().position(|r| r.selected) {
        trail.push(Step::Recipe(selected));
        let found = find_in_node(&node.recipes[selected], identity, trail);
        trail.pop();
        if found.is_some() {
            return found;
        }
    }

    find_in_elements(&node.ingredients, identity, trail)
}
