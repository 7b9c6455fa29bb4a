//! Category Aggregate
//!
//! Categories form a parent/child hierarchy stored as a parent id per row.
//! [`CategoryTree`] indexes a loaded set of categories by id and answers
//! hierarchy questions by repeated lookup. Every walk is capped at
//! [`MAX_DEPTH`] so corrupt data surfaces as [`ShopError::CycleDetected`]
//! instead of looping forever.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::{Result, ShopError};

pub const MAX_DEPTH: usize = 64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn is_parent(&self) -> bool { self.parent_id.is_none() }
    pub fn is_child(&self) -> bool { self.parent_id.is_some() }
}

/// Which categories a listing returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Roots,
    ChildrenOf(Uuid),
}

impl CategoryFilter {
    /// Parses the `parent` query parameter: `null` selects roots, a UUID selects direct children.
    pub fn from_param(parent: Option<&str>) -> Result<Self> {
        match parent.map(str::trim) {
            None | Some("") => Ok(Self::All),
            Some("null") => Ok(Self::Roots),
            Some(raw) => Uuid::parse_str(raw)
                .map(Self::ChildrenOf)
                .map_err(|_| ShopError::Validation(format!("parent must be `null` or a category id, got {raw:?}"))),
        }
    }

    pub fn matches(&self, category: &Category) -> bool {
        match self {
            Self::All => true,
            Self::Roots => category.parent_id.is_none(),
            Self::ChildrenOf(parent) => category.parent_id == Some(*parent),
        }
    }
}

/// Category with its parent's name and nested subcategories.
#[derive(Clone, Debug, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub parent_name: Option<String>,
    pub is_parent: bool,
    pub is_child: bool,
    pub subcategories: Vec<CategoryNode>,
}

#[derive(Clone, Debug, Default)]
pub struct CategoryTree {
    nodes: HashMap<Uuid, Category>,
    children: HashMap<Uuid, Vec<Uuid>>,
    order: Vec<Uuid>,
}

impl CategoryTree {
    /// Builds the index. Siblings keep the order they arrive in, which the
    /// store supplies as creation order.
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        let mut tree = Self::default();
        for category in categories {
            if let Some(parent) = category.parent_id {
                tree.children.entry(parent).or_default().push(category.id);
            }
            tree.order.push(category.id);
            tree.nodes.insert(category.id, category);
        }
        tree
    }

    pub fn get(&self, id: Uuid) -> Result<&Category> {
        self.nodes.get(&id).ok_or_else(|| ShopError::not_found(format!("category {id}")))
    }

    /// Direct children of `id`, in sibling order.
    pub fn children(&self, id: Uuid) -> Vec<&Category> {
        self.children
            .get(&id)
            .map(|ids| ids.iter().filter_map(|child| self.nodes.get(child)).collect())
            .unwrap_or_default()
    }

    /// Categories matching `filter`, newest first.
    pub fn list(&self, filter: CategoryFilter) -> Vec<&Category> {
        let mut matching: Vec<&Category> = self
            .order
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .filter(|c| filter.matches(c))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        matching
    }

    /// Parents of `id`, root first. Does not include `id` itself.
    pub fn ancestors(&self, id: Uuid) -> Result<Vec<&Category>> {
        let mut current = self.get(id)?;
        let mut seen = HashSet::from([id]);
        let mut ancestors = Vec::new();
        while let Some(parent_id) = current.parent_id {
            // a dangling parent id ends the walk; the foreign key keeps this from happening
            let Some(parent) = self.nodes.get(&parent_id) else { break };
            if !seen.insert(parent_id) || ancestors.len() >= MAX_DEPTH {
                return Err(ShopError::CycleDetected(parent_id));
            }
            ancestors.push(parent);
            current = parent;
        }
        ancestors.reverse();
        Ok(ancestors)
    }

    /// All transitive children of `id`, depth first, each parent before its children.
    pub fn descendants(&self, id: Uuid) -> Result<Vec<&Category>> {
        self.get(id)?;
        let mut seen = HashSet::from([id]);
        let mut out = Vec::new();
        let mut stack: Vec<(Uuid, usize)> = self.child_ids(id).rev().map(|c| (c, 1)).collect();
        while let Some((next, depth)) = stack.pop() {
            if !seen.insert(next) || depth > MAX_DEPTH {
                return Err(ShopError::CycleDetected(next));
            }
            if let Some(category) = self.nodes.get(&next) {
                out.push(category);
            }
            stack.extend(self.child_ids(next).rev().map(|c| (c, depth + 1)));
        }
        Ok(out)
    }

    /// `id` followed by the ids of all its descendants.
    pub fn subtree_ids(&self, id: Uuid) -> Result<Vec<Uuid>> {
        let descendants = self.descendants(id)?;
        Ok(std::iter::once(id).chain(descendants.into_iter().map(|c| c.id)).collect())
    }

    /// Rejects moving `id` under `new_parent` when that would close a loop.
    pub fn check_reparent(&self, id: Uuid, new_parent: Option<Uuid>) -> Result<()> {
        let Some(parent) = new_parent else { return Ok(()) };
        if parent == id {
            return Err(ShopError::CycleDetected(id));
        }
        self.get(parent)
            .map_err(|_| ShopError::not_found(format!("parent category {parent}")))?;
        if self.descendants(id)?.iter().any(|c| c.id == parent) {
            return Err(ShopError::CycleDetected(parent));
        }
        Ok(())
    }

    /// `id` with its subcategories nested to full depth.
    pub fn node(&self, id: Uuid) -> Result<CategoryNode> {
        self.node_at(id, 0)
    }

    fn node_at(&self, id: Uuid, depth: usize) -> Result<CategoryNode> {
        if depth > MAX_DEPTH {
            return Err(ShopError::CycleDetected(id));
        }
        let category = self.get(id)?;
        let parent_name = category
            .parent_id
            .and_then(|p| self.nodes.get(&p))
            .map(|p| p.name.clone());
        let subcategories = self
            .child_ids(id)
            .map(|child| self.node_at(child, depth + 1))
            .collect::<Result<Vec<_>>>()?;
        Ok(CategoryNode {
            category: category.clone(),
            parent_name,
            is_parent: category.is_parent(),
            is_child: category.is_child(),
            subcategories,
        })
    }

    fn child_ids(&self, id: Uuid) -> impl DoubleEndedIterator<Item = Uuid> + '_ {
        self.children.get(&id).into_iter().flatten().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn category(name: &str, parent: Option<Uuid>, age_secs: i64) -> Category {
        let ts = Utc::now() - Duration::seconds(age_secs);
        Category {
            id: Uuid::new_v4(), name: name.into(), slug: name.to_lowercase(), description: String::new(),
            parent_id: parent, created_at: ts, updated_at: ts,
        }
    }

    /// electronics > (phones > android, laptops), books
    fn sample() -> (CategoryTree, [Uuid; 5]) {
        let electronics = category("Electronics", None, 50);
        let phones = category("Phones", Some(electronics.id), 40);
        let laptops = category("Laptops", Some(electronics.id), 30);
        let android = category("Android", Some(phones.id), 20);
        let books = category("Books", None, 10);
        let ids = [electronics.id, phones.id, laptops.id, android.id, books.id];
        (CategoryTree::new([electronics, phones, laptops, android, books]), ids)
    }

    #[test]
    fn test_ancestors_root_first() {
        let (tree, [electronics, phones, _, android, books]) = sample();
        let names: Vec<_> = tree.ancestors(android).unwrap().iter().map(|c| c.id).collect();
        assert_eq!(names, vec![electronics, phones]);
        assert!(tree.ancestors(books).unwrap().is_empty());
    }

    #[test]
    fn test_descendants_preorder() {
        let (tree, [electronics, phones, laptops, android, _]) = sample();
        let ids: Vec<_> = tree.descendants(electronics).unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![phones, android, laptops]);
        assert_eq!(tree.subtree_ids(phones).unwrap(), vec![phones, android]);
    }

    #[test]
    fn test_descendants_exclude_ancestors() {
        let (tree, ids) = sample();
        for id in ids {
            let ancestors: HashSet<Uuid> = tree.ancestors(id).unwrap().iter().map(|c| c.id).collect();
            assert!(tree.descendants(id).unwrap().iter().all(|d| !ancestors.contains(&d.id)));
        }
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut a = category("A", None, 2);
        let b = category("B", Some(a.id), 1);
        a.parent_id = Some(b.id);
        let (a_id, b_id) = (a.id, b.id);
        let tree = CategoryTree::new([a, b]);
        assert!(matches!(tree.ancestors(a_id), Err(ShopError::CycleDetected(_))));
        assert!(matches!(tree.descendants(b_id), Err(ShopError::CycleDetected(_))));
        assert!(matches!(tree.node(a_id), Err(ShopError::CycleDetected(_))));
    }

    #[test]
    fn test_depth_cap() {
        let mut chain = vec![category("c0", None, 0)];
        for i in 1..=MAX_DEPTH + 1 {
            let parent = chain[i - 1].id;
            chain.push(category(&format!("c{i}"), Some(parent), 0));
        }
        let (root, leaf) = (chain[0].id, chain[MAX_DEPTH + 1].id);
        let tree = CategoryTree::new(chain);
        assert!(matches!(tree.ancestors(leaf), Err(ShopError::CycleDetected(_))));
        assert!(matches!(tree.descendants(root), Err(ShopError::CycleDetected(_))));
    }

    #[test]
    fn test_filter_and_listing() {
        let (tree, [electronics, phones, laptops, _, books]) = sample();
        let roots: Vec<_> = tree.list(CategoryFilter::Roots).iter().map(|c| c.id).collect();
        assert_eq!(roots, vec![books, electronics]);
        let children: Vec<_> = tree.list(CategoryFilter::ChildrenOf(electronics)).iter().map(|c| c.id).collect();
        assert_eq!(children, vec![laptops, phones]);
        assert_eq!(tree.list(CategoryFilter::All).len(), 5);

        assert_eq!(CategoryFilter::from_param(Some("null")).unwrap(), CategoryFilter::Roots);
        assert_eq!(CategoryFilter::from_param(None).unwrap(), CategoryFilter::All);
        assert!(matches!(CategoryFilter::from_param(Some("abc")), Err(ShopError::Validation(_))));
    }

    #[test]
    fn test_check_reparent() {
        let (tree, [electronics, phones, _, android, books]) = sample();
        assert!(tree.check_reparent(phones, Some(books)).is_ok());
        assert!(tree.check_reparent(phones, None).is_ok());
        assert!(matches!(tree.check_reparent(electronics, Some(android)), Err(ShopError::CycleDetected(_))));
        assert!(matches!(tree.check_reparent(phones, Some(phones)), Err(ShopError::CycleDetected(_))));
        assert!(matches!(tree.check_reparent(phones, Some(Uuid::new_v4())), Err(ShopError::NotFound(_))));
    }

    #[test]
    fn test_node_nesting() {
        let (tree, [electronics, phones, ..]) = sample();
        let node = tree.node(electronics).unwrap();
        assert!(node.is_parent);
        assert_eq!(node.subcategories.len(), 2);
        let phones_node = &node.subcategories[0];
        assert_eq!(phones_node.category.id, phones);
        assert_eq!(phones_node.parent_name.as_deref(), Some("Electronics"));
        assert!(phones_node.is_child);
        assert_eq!(phones_node.subcategories.len(), 1);
    }
}
