//! Read-only access to vocabulary items.

use std::collections::HashMap;

use crate::error::{QuizError, Result};
use crate::types::VocabularyItem;

/// Source of vocabulary items consulted during generation.
pub trait ItemStore {
    /// All items of the given grade.
    fn filter_by_grade(&self, grade: i32) -> Vec<VocabularyItem>;

    /// Look up one item.
    fn get_by_id(&self, id: i64) -> Option<&VocabularyItem>;

    /// Number of items in the store.
    fn count(&self) -> usize;
}

/// In-memory item store indexed by id.
///
/// Keeps the insertion order of the items it was built from.
#[derive(Debug, Clone, Default)]
pub struct ItemPool {
    items: Vec<VocabularyItem>,
    index: HashMap<i64, usize>,
}

impl ItemPool {
    /// Build a pool, rejecting duplicate ids.
    pub fn new(items: Vec<VocabularyItem>) -> Result<Self> {
        let mut index = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            if index.insert(item.id, position).is_some() {
                return Err(QuizError::InvalidRequest(format!(
                    "duplicate item id {} in pool",
                    item.id
                )));
            }
        }
        Ok(Self { items, index })
    }

    pub fn items(&self) -> &[VocabularyItem] {
        &self.items
    }
}

impl ItemStore for ItemPool {
    fn filter_by_grade(&self, grade: i32) -> Vec<VocabularyItem> {
        self.items
            .iter()
            .filter(|item| item.difficulty == grade)
            .cloned()
            .collect()
    }

    fn get_by_id(&self, id: i64) -> Option<&VocabularyItem> {
        self.index.get(&id).map(|&position| &self.items[position])
    }

    fn count(&self) -> usize {
        self.items.len()
    }
}
