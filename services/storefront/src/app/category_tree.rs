//! services/storefront/src/app/category_tree.rs
//!
//! Expand/collapse state over the server-built category tree, with products
//! fetched lazily the first time a node is opened.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use storefront_core::domain::{Category, CategoryDraft, CategoryNode, Product};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use super::admin::{AdminConsole, AdminError};

/// One rendered line of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow {
    pub depth: usize,
    pub id: Uuid,
    pub name: String,
    pub products_count: u32,
    pub has_children: bool,
    pub expanded: bool,
    /// `None` until the node's products have been fetched.
    pub products: Option<Vec<Product>>,
}

#[derive(Default)]
struct TreeState {
    roots: Vec<CategoryNode>,
    expanded: HashSet<Uuid>,
    products: HashMap<Uuid, Vec<Product>>,
    error: Option<String>,
}

impl TreeState {
    fn push_rows(&self, nodes: &[CategoryNode], depth: usize, rows: &mut Vec<TreeRow>) {
        for node in nodes {
            let expanded = self.expanded.contains(&node.id);
            rows.push(TreeRow {
                depth,
                id: node.id,
                name: node.name.clone(),
                products_count: node.products_count,
                has_children: node.has_children(),
                expanded,
                products: self.products.get(&node.id).cloned(),
            });
            if expanded {
                self.push_rows(&node.children, depth + 1, rows);
            }
        }
    }
}

pub struct CategoryTree {
    console: Arc<AdminConsole>,
    state: RwLock<TreeState>,
}

impl CategoryTree {
    pub fn new(console: Arc<AdminConsole>) -> Self {
        Self {
            console,
            state: RwLock::new(TreeState::default()),
        }
    }

    /// Refetches the tree. On failure the previous tree stays on screen and
    /// the message is kept for a retry control.
    pub async fn load(&self) -> Result<(), AdminError> {
        let result = self.console.category_tree().await;
        let mut state = self.state.write().await;
        match result {
            Ok(roots) => {
                debug!(roots = roots.len(), "Category tree loaded");
                state.roots = roots;
                state.error = None;
                Ok(())
            }
            Err(e) => {
                warn!("Could not load the category tree: {}", e);
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    /// Flips a node open or closed and returns whether it is now open. The
    /// first successful opening fetches the node's products.
    pub async fn toggle(&self, id: Uuid) -> bool {
        {
            let mut state = self.state.write().await;
            if state.expanded.remove(&id) {
                return false;
            }
            state.expanded.insert(id);
            if state.products.contains_key(&id) {
                return true;
            }
        }

        match self.console.products_in_category(id).await {
            Ok(products) => {
                self.state.write().await.products.insert(id, products);
            }
            Err(e) => warn!(category_id = %id, "Could not load category products: {}", e),
        }
        true
    }

    /// Depth-first rows, descending only into open nodes.
    pub async fn visible_rows(&self) -> Vec<TreeRow> {
        let state = self.state.read().await;
        let mut rows = Vec::new();
        state.push_rows(&state.roots, 0, &mut rows);
        rows
    }

    pub async fn find(&self, id: Uuid) -> Option<CategoryNode> {
        let state = self.state.read().await;
        state.roots.iter().find_map(|root| root.find(id)).cloned()
    }

    pub async fn create(&self, draft: &CategoryDraft) -> Result<Category, AdminError> {
        let category = self.console.create_category(draft).await?;
        self.reload_after_change().await;
        Ok(category)
    }

    pub async fn add_child(
        &self,
        parent: Uuid,
        draft: CategoryDraft,
    ) -> Result<Category, AdminError> {
        let draft = CategoryDraft {
            parent: Some(parent),
            ..draft
        };
        let category = self.create(&draft).await?;
        // Open the parent so the new child is visible.
        self.state.write().await.expanded.insert(parent);
        Ok(category)
    }

    pub async fn update(&self, id: Uuid, draft: &CategoryDraft) -> Result<Category, AdminError> {
        let category = self.console.update_category(id, draft).await?;
        self.reload_after_change().await;
        Ok(category)
    }

    /// Deletes a node; its children go with it server-side.
    pub async fn delete(&self, id: Uuid) -> Result<(), AdminError> {
        self.console.delete_category(id).await?;
        {
            let mut state = self.state.write().await;
            state.expanded.remove(&id);
            state.products.remove(&id);
        }
        self.reload_after_change().await;
        Ok(())
    }

    async fn reload_after_change(&self) {
        // The mutation already succeeded; a failed reload only leaves the
        // previous tree and its error message.
        let _ = self.load().await;
    }
}
