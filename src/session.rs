//! Session state store
//!
//! Holds the user's selections and everything derived from them, and runs
//! the items -> recipe tree -> shopping list fetches through the supersession
//! controller. State sits behind one mutex that is never held across an
//! `.await`, so each compound update (tree plus build path, list plus have
//! overlay) is applied in a single critical section.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::build_path::extract;
use crate::error::{SelectionError, SessionResult, TransportError};
use crate::models::{
    BuildPath, ItemRef, ItemSummary, Preferences, RecipeTree, ShoppingList, TreeElement, TreeNode,
};
use crate::reconcile::{self, Step};
use crate::service::{RecipeService, RecipeTreeRequest, ShoppingListRequest};
use crate::supersession::{Completion, Concern, Supersession, Ticket};

/// Result of a session operation that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// New data was applied to the session
    Applied,
    /// Nothing needed doing
    Unchanged,
    /// A newer request for the same concern took over; nothing was applied
    Superseded,
}

#[derive(Debug, Default)]
struct SessionState {
    version: String,
    selected_items: Vec<ItemRef>,
    recipe_tree: Option<RecipeTree>,
    /// Items (with amounts) the current tree was built for
    tree_items: Vec<ItemRef>,
    build_path: BuildPath,
    shopping_list: Option<ShoppingList>,
    have_already: IndexMap<String, u32>,
    items: HashMap<String, Vec<ItemSummary>>,
    requests: Supersession,
}

impl SessionState {
    /// Apply new top-level amounts without refetching the tree.
    ///
    /// Returns `false` when a tree fetch is in flight, when there is no
    /// tree, or when the tree was built for different items.
    fn apply_amounts(&mut self, items: &[ItemRef]) -> SessionResult<bool> {
        if self.requests.is_loading(Concern::RecipeTree) || !same_identities(&self.tree_items, items) {
            return Ok(false);
        }
        let Some(tree) = self.recipe_tree.as_mut() else {
            return Ok(false);
        };
        if tree.len() != items.len() {
            return Ok(false);
        }

        set_top_level_amounts(tree, items);
        self.build_path = extract(tree)?;
        self.tree_items = items.to_vec();
        Ok(true)
    }

    /// Whether the tree and list on hand already answer `items`
    fn is_settled_for(&self, items: &[ItemRef]) -> bool {
        self.selected_items == items
            && self.tree_items == items
            && self.recipe_tree.is_some()
            && self.shopping_list.is_some()
            && !self.requests.is_loading(Concern::RecipeTree)
    }

    fn clear_tree(&mut self) {
        self.recipe_tree = None;
        self.tree_items.clear();
        self.shopping_list = None;
    }
}

fn set_top_level_amounts(tree: &mut [TreeElement], items: &[ItemRef]) {
    for (element, item) in tree.iter_mut().zip(items) {
        match element {
            TreeElement::Node(node) => set_amount(node, item.amount_required),
            TreeElement::Group(members) => {
                for member in members {
                    set_amount(member, item.amount_required);
                }
            }
        }
    }
}

fn set_amount(node: &mut TreeNode, amount: u32) {
    node.amount_required = amount;
    for recipe in &mut node.recipes {
        recipe.amount_required = amount;
    }
}

/// Same items in the same order, amounts aside
fn same_identities(current: &[ItemRef], next: &[ItemRef]) -> bool {
    current.len() == next.len() && current.iter().zip(next).all(|(a, b)| a.key == b.key)
}

/// One user's planning session against a recipe service
pub struct Session {
    service: Arc<dyn RecipeService>,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(service: Arc<dyn RecipeService>, version: impl Into<String>) -> Self {
        Self {
            service,
            state: Mutex::new(SessionState {
                version: version.into(),
                ..SessionState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn version(&self) -> String {
        self.state().version.clone()
    }

    pub fn selected_items(&self) -> Vec<ItemRef> {
        self.state().selected_items.clone()
    }

    pub fn recipe_tree(&self) -> Option<RecipeTree> {
        self.state().recipe_tree.clone()
    }

    pub fn build_path(&self) -> BuildPath {
        self.state().build_path.clone()
    }

    pub fn shopping_list(&self) -> Option<ShoppingList> {
        self.state().shopping_list.clone()
    }

    pub fn have_already(&self) -> IndexMap<String, u32> {
        self.state().have_already.clone()
    }

    /// Items available in the current version, once fetched
    pub fn items(&self) -> Option<Vec<ItemSummary>> {
        let state = self.state();
        state.items.get(&state.version).cloned()
    }

    pub fn is_loading(&self, concern: Concern) -> bool {
        self.state().requests.is_loading(concern)
    }

    /// What should survive a restart
    pub fn snapshot(&self) -> Preferences {
        let state = self.state();
        Preferences {
            version: state.version.clone(),
            selected_items: state.selected_items.clone(),
            build_path: state.build_path.clone(),
            have_already: state.have_already.clone(),
        }
    }

    /// Seed the session from saved preferences. Nothing is fetched; call
    /// [`Session::refresh`] afterwards.
    pub fn restore(&self, preferences: Preferences) {
        let mut state = self.state();
        state.requests.cancel_all();
        if !preferences.version.is_empty() {
            state.version = preferences.version;
        }
        state.selected_items = preferences.selected_items;
        state.build_path = preferences.build_path;
        state.have_already = preferences.have_already;
        state.clear_tree();
    }

    fn settle<T>(
        &self,
        ticket: &Ticket,
        completion: Completion<Result<T, TransportError>>,
        apply: impl FnOnce(&mut SessionState, T) -> SessionResult<()>,
    ) -> SessionResult<Outcome> {
        let mut state = self.state();
        if !state.requests.finish(ticket) {
            return Ok(Outcome::Superseded);
        }

        match completion {
            Completion::Cancelled => Ok(Outcome::Superseded),
            Completion::Completed(Err(err)) => {
                warn!(concern = %ticket.concern(), error = %err, "request failed, keeping last good state");
                Err(err.into())
            }
            Completion::Completed(Ok(value)) => {
                apply(&mut *state, value)?;
                Ok(Outcome::Applied)
            }
        }
    }

    /// Fetch the selectable items for the current version unless cached
    pub async fn fetch_items(&self) -> SessionResult<Outcome> {
        let (version, ticket) = {
            let mut state = self.state();
            if state.items.contains_key(&state.version) {
                return Ok(Outcome::Unchanged);
            }
            let ticket = state.requests.begin(Concern::Items);
            (state.version.clone(), ticket)
        };

        let completion = ticket.run(self.service.items(&version)).await;
        self.settle(&ticket, completion, |state, items| {
            info!(%version, count = items.len(), "items loaded");
            state.items.insert(version.clone(), items);
            Ok(())
        })
    }

    /// Fetch the tree for the selected items. With `keep_choices` the
    /// current build path is sent along and restored onto the response;
    /// without it the service's defaults stand.
    async fn refresh_recipe_tree(&self, keep_choices: bool) -> SessionResult<Outcome> {
        let (version, request, ticket) = {
            let mut state = self.state();
            if state.selected_items.is_empty() {
                state.requests.cancel(Concern::RecipeTree);
                state.recipe_tree = Some(RecipeTree::new());
                state.tree_items.clear();
                state.build_path.clear();
                return Ok(Outcome::Applied);
            }

            let request = RecipeTreeRequest {
                items: state.selected_items.clone(),
                selected_build_paths: if keep_choices { state.build_path.clone() } else { BuildPath::new() },
            };
            let ticket = state.requests.begin(Concern::RecipeTree);
            (state.version.clone(), request, ticket)
        };

        let completion = ticket.run(self.service.recipe_tree(&version, &request)).await;
        self.settle(&ticket, completion, |state, tree| {
            let previous = keep_choices.then_some(&state.build_path);
            let reconciled = reconcile::reconcile(&tree, previous)?;
            let build_path = extract(&reconciled)?;
            info!(%version, elements = reconciled.len(), keep_choices, "recipe tree applied");
            state.recipe_tree = Some(reconciled);
            state.tree_items = request.items.clone();
            state.build_path = build_path;
            Ok(())
        })
    }

    async fn refresh_shopping_list(&self) -> SessionResult<Outcome> {
        let (version, request, ticket) = {
            let mut state = self.state();
            if state.recipe_tree.is_none() {
                return Ok(Outcome::Unchanged);
            }
            if state.build_path.is_empty() {
                state.requests.cancel(Concern::ShoppingList);
                state.shopping_list = Some(ShoppingList::new());
                return Ok(Outcome::Applied);
            }

            let request = ShoppingListRequest {
                recipe_path: state.build_path.clone(),
                have_already: state.have_already.clone(),
            };
            let ticket = state.requests.begin(Concern::ShoppingList);
            (state.version.clone(), request, ticket)
        };

        let completion = ticket.run(self.service.shopping_list(&version, &request)).await;
        self.settle(&ticket, completion, |state, mut list| {
            for (key, entry) in list.iter_mut() {
                entry.have = state.have_already.get(key).copied().unwrap_or(0);
            }
            info!(%version, entries = list.len(), "shopping list applied");
            state.shopping_list = Some(list);
            Ok(())
        })
    }

    /// Refetch the tree for the current selections, then the shopping list
    pub async fn refresh(&self) -> SessionResult<Outcome> {
        if self.refresh_recipe_tree(true).await? == Outcome::Superseded {
            return Ok(Outcome::Superseded);
        }
        self.refresh_shopping_list().await
    }

    /// Replace the selected items
    ///
    /// A change to which items are selected (or their order) refetches the
    /// tree before the shopping list. An amount-only change against the tree
    /// on hand patches it and only recomputes the shopping list; while a
    /// tree fetch is in flight, or after one failed, the tree is refetched.
    pub async fn update_selected_items(&self, items: Vec<ItemRef>) -> SessionResult<Outcome> {
        let tree_needed = {
            let mut state = self.state();
            if state.is_settled_for(&items) {
                return Ok(Outcome::Unchanged);
            }

            let patched = state.apply_amounts(&items)?;
            state.selected_items = items;
            !patched
        };

        if tree_needed && self.refresh_recipe_tree(true).await? == Outcome::Superseded {
            return Ok(Outcome::Superseded);
        }
        self.refresh_shopping_list().await
    }

    /// Select member `choice` of the option group at `at`, then recompute
    /// the build path and shopping list
    pub async fn select_alternative(&self, at: &[Step], choice: usize) -> SessionResult<Outcome> {
        {
            let mut state = self.state();
            let tree = state.recipe_tree.as_ref().ok_or(SelectionError::NoTree)?;
            let updated = reconcile::select_alternative(tree, at, choice)?;
            let build_path = extract(&updated)?;
            state.recipe_tree = Some(updated);
            state.build_path = build_path;
        }
        self.refresh_shopping_list().await
    }

    /// Select the alternative named `identity` on the current build path
    pub async fn choose(&self, identity: &str) -> SessionResult<Outcome> {
        let (at, choice) = {
            let state = self.state();
            let tree = state.recipe_tree.as_ref().ok_or(SelectionError::NoTree)?;
            reconcile::find_alternative(tree, identity)
                .ok_or_else(|| SelectionError::UnknownAlternative(identity.to_string()))?
        };
        self.select_alternative(&at, choice).await
    }

    /// Record how many of `key` the user already has; zero forgets it
    pub async fn update_have_already(&self, key: &str, amount: u32) -> SessionResult<Outcome> {
        {
            let mut state = self.state();
            if amount == 0 {
                state.have_already.shift_remove(key);
            } else {
                state.have_already.insert(key.to_string(), amount);
            }
            if let Some(entry) = state.shopping_list.as_mut().and_then(|list| list.get_mut(key)) {
                entry.have = amount;
            }
        }
        self.refresh_shopping_list().await
    }

    /// Drop the user's choices: refetch the tree without a build path so the
    /// service's own defaults come back, then recompute the shopping list
    pub async fn reset_recipe_tree(&self) -> SessionResult<Outcome> {
        if self.state().selected_items.is_empty() {
            return Ok(Outcome::Unchanged);
        }
        if self.refresh_recipe_tree(false).await? == Outcome::Superseded {
            return Ok(Outcome::Superseded);
        }
        self.refresh_shopping_list().await
    }

    /// Forget all have-already quantities and recompute the shopping list
    pub async fn reset_shopping_list(&self) -> SessionResult<Outcome> {
        {
            let mut state = self.state();
            state.have_already.clear();
            if let Some(list) = state.shopping_list.as_mut() {
                for entry in list.values_mut() {
                    entry.have = 0;
                }
            }
        }
        self.refresh_shopping_list().await
    }

    /// Switch game-data version: cancel everything in flight, load the
    /// version's items, then recompute tree and list for the same selections
    pub async fn change_version(&self, version: &str) -> SessionResult<Outcome> {
        {
            let mut state = self.state();
            if state.version == version {
                return Ok(Outcome::Unchanged);
            }
            info!(from = %state.version, to = %version, "changing game version");
            state.requests.cancel_all();
            state.version = version.to_string();
            state.clear_tree();
        }

        if self.fetch_items().await? == Outcome::Superseded {
            return Ok(Outcome::Superseded);
        }
        self.refresh().await
    }
}
