//! Data models for recipe trees, build paths and shopping lists
//!
//! These mirror the JSON exchanged with the recipe service. Fields the planner
//! does not interpret (ids, efficiency stats, ...) are kept in `extra` so a
//! front end can still read them after a tree has been reconciled.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StructuralError;
use crate::label;

/// Identity of a requirement: a concrete item name or an item tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity<'a> {
    Name(&'a str),
    Tag(&'a str),
}

impl<'a> Identity<'a> {
    pub fn as_str(&self) -> &'a str {
        match self {
            Identity::Name(value) | Identity::Tag(value) => value,
        }
    }
}

fn identity_of<'a>(name: &'a Option<String>, tag: &'a Option<String>) -> Option<Identity<'a>> {
    let name = name.as_deref().filter(|n| !n.is_empty());
    let tag = tag.as_deref().filter(|t| !t.is_empty());
    match (name, tag) {
        (Some(name), _) => Some(Identity::Name(name)),
        (None, Some(tag)) => Some(Identity::Tag(tag)),
        (None, None) => None,
    }
}

/// A target item chosen by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub amount_required: u32,
}

impl ItemRef {
    pub fn item(name: impl Into<String>, amount_required: u32) -> Self {
        let name = name.into();
        Self {
            key: name.clone(),
            name: Some(name),
            tag: None,
            amount_required,
        }
    }

    pub fn tag(tag: impl Into<String>, amount_required: u32) -> Self {
        let tag = tag.into();
        Self {
            key: tag.clone(),
            name: None,
            tag: Some(tag),
            amount_required,
        }
    }

    pub fn identity(&self) -> Option<Identity<'_>> {
        identity_of(&self.name, &self.tag)
    }
}

/// Alternatives for one requirement; at most one member is selected
pub type OptionGroup = Vec<TreeNode>;

/// Top-level recipe tree, or the ingredient list of a recipe
pub type RecipeTree = Vec<TreeElement>;

/// One element of a recipe tree sequence
///
/// On the wire a group is a JSON array and a node is a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeElement {
    Group(OptionGroup),
    Node(TreeNode),
}

impl TreeElement {
    pub fn as_node(&self) -> Option<&TreeNode> {
        match self {
            TreeElement::Node(node) => Some(node),
            TreeElement::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&[TreeNode]> {
        match self {
            TreeElement::Group(members) => Some(members),
            TreeElement::Node(_) => None,
        }
    }
}

impl From<TreeNode> for TreeElement {
    fn from(node: TreeNode) -> Self {
        TreeElement::Node(node)
    }
}

/// A resolved requirement: an item to gather, or an item (or recipe) to craft
///
/// Item nodes carry their alternative recipes in `recipes`; recipe nodes carry
/// what they consume in `ingredients`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Tag this item was expanded from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    pub amount_required: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_created: Option<u32>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub num_recipes: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipes: OptionGroup,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ingredients: RecipeTree,
    #[serde(default)]
    pub selected: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TreeNode {
    /// A selected, uncraftable item
    pub fn item(name: impl Into<String>, amount_required: u32) -> Self {
        Self {
            name: Some(name.into()),
            amount_required,
            selected: true,
            ..Self::default()
        }
    }

    /// A recipe alternative producing `amount_created` per craft
    pub fn recipe(
        name: impl Into<String>,
        kind: impl Into<String>,
        amount_required: u32,
        amount_created: u32,
    ) -> Self {
        Self {
            name: Some(name.into()),
            kind: Some(kind.into()),
            amount_required,
            amount_created: Some(amount_created),
            ..Self::default()
        }
    }

    pub fn with_recipes(mut self, recipes: OptionGroup) -> Self {
        self.num_recipes = recipes.len();
        self.recipes = recipes;
        self
    }

    pub fn with_ingredients(mut self, ingredients: RecipeTree) -> Self {
        self.ingredients = ingredients;
        self
    }

    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn identity(&self) -> Option<Identity<'_>> {
        identity_of(&self.name, &self.tag)
    }

    pub fn require_identity(&self, location: &str) -> Result<Identity<'_>, StructuralError> {
        self.identity().ok_or_else(|| StructuralError::MissingIdentity {
            location: display_location(location),
        })
    }

    pub fn has_recipes(&self) -> bool {
        self.num_recipes > 0 || !self.recipes.is_empty()
    }

    /// Raw materials are gathered, not crafted
    pub fn is_raw(&self) -> bool {
        !self.has_recipes() && self.ingredients.is_empty()
    }

    pub fn selected_recipe(&self) -> Option<&TreeNode> {
        self.recipes.iter().find(|recipe| recipe.selected)
    }

    pub fn label(&self) -> String {
        self.identity()
            .map(|identity| label::item_label(identity.as_str()))
            .unwrap_or_default()
    }
}

/// Compact, selection-only projection of a tree node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default)]
    pub selected: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub amount_required: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_created: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<Box<PathNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<BuildPath>,
}

impl PathNode {
    pub fn identity(&self) -> Option<Identity<'_>> {
        identity_of(&self.name, &self.tag)
    }
}

/// Selected branches of a recipe tree, keyed by identity in tree order
pub type BuildPath = IndexMap<String, PathNode>;

/// One line of a shopping list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShoppingEntry {
    #[serde(default)]
    pub amount_required: u32,
    #[serde(default)]
    pub have: u32,
    #[serde(default)]
    pub has_recipe: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ShoppingEntry {
    pub fn still_needed(&self) -> u32 {
        self.amount_required.saturating_sub(self.have)
    }
}

/// Shopping list keyed by item identity
pub type ShoppingList = IndexMap<String, ShoppingEntry>;

/// An item that can be selected for a given game version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawItemSummary")]
pub struct ItemSummary {
    pub name: String,
    pub display_name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_created: Option<u32>,
}

// The service has sent both bare names and full objects over time.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawItemSummary {
    Bare(String),
    Full {
        name: String,
        #[serde(default)]
        display_name: Option<String>,
        #[serde(rename = "type", default)]
        kind: Option<String>,
        #[serde(default)]
        amount_created: Option<u32>,
    },
}

impl From<RawItemSummary> for ItemSummary {
    fn from(raw: RawItemSummary) -> Self {
        match raw {
            RawItemSummary::Bare(name) => Self {
                display_name: label::item_label(&name),
                name,
                kind: None,
                amount_created: None,
            },
            RawItemSummary::Full {
                name,
                display_name,
                kind,
                amount_created,
            } => Self {
                display_name: display_name.unwrap_or_else(|| label::item_label(&name)),
                name,
                kind,
                amount_created,
            },
        }
    }
}

/// User preferences persisted between runs for one game version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub version: String,
    pub selected_items: Vec<ItemRef>,
    pub build_path: BuildPath,
    pub have_already: IndexMap<String, u32>,
}

pub(crate) fn display_location(location: &str) -> String {
    if location.is_empty() {
        "/".to_string()
    } else {
        location.to_string()
    }
}
