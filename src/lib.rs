//! Craft Planner
//!
//! Recipe tree selection, build-path reconciliation and shopping-list
//! planning against a recipe-computation service.

pub mod build_path;
pub mod config;
pub mod db;
pub mod error;
pub mod label;
pub mod models;
pub mod parse;
pub mod reconcile;
pub mod report;
pub mod service;
pub mod session;
pub mod supersession;

pub use config::Config;
pub use error::{SelectionError, SessionError, SessionResult, StructuralError, TransportError};
pub use models::{BuildPath, ItemRef, PathNode, RecipeTree, ShoppingList, TreeElement, TreeNode};
pub use service::{HttpRecipeService, RecipeService};
pub use session::{Outcome, Session};
