//! Categories and the category name index.

use crate::error::{CoreError, CoreResult};
use crate::store::Store;
use crate::transaction::TransactionManager;
use crate::types::Partition;
use reaper_codec::{Document, ObjectId};
use serde::{Deserialize, Serialize};

/// Name of the index mapping category names to ids.
pub const NAME_INDEX: &str = "name";

/// A user-defined grouping of feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category id.
    pub id: ObjectId,
    /// Display name, unique per user.
    pub name: String,
}

impl Document for Category {}

/// Category storage with a unique name index.
///
/// For every category there is exactly one name entry pointing at its id,
/// and every name entry points at an existing category.
#[derive(Debug, Clone)]
pub struct CategoryIndex {
    txm: TransactionManager,
}

impl CategoryIndex {
    /// Creates the index over a store.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            txm: TransactionManager::new(store, Partition::Categories),
        }
    }

    /// Creates a category.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateName`] if the user already has a
    /// category with this name.
    pub fn add_category(&self, user: &str, name: &str) -> CoreResult<Category> {
        self.txm.update(user, |writer| {
            if writer.index_lookup(NAME_INDEX, name.as_bytes()).is_some() {
                return Err(CoreError::DuplicateName {
                    name: name.to_owned(),
                });
            }

            let category = Category {
                id: ObjectId::new(),
                name: name.to_owned(),
            };
            let key = category.id.to_hex();
            writer.put_document(&key, &category)?;
            writer.put_index_entry(NAME_INDEX, name.as_bytes(), &key)?;
            Ok(category)
        })
    }

    /// Returns one category.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if there is no such category, or
    /// [`CoreError::Serialization`] if `id` is not a valid hex id.
    pub fn get_category_by_id(&self, user: &str, id: &str) -> CoreResult<Category> {
        let key = ObjectId::parse_hex(id)?.to_hex();
        self.txm.view(user, |ns| {
            ns.get_document(&key)?
                .ok_or_else(|| CoreError::not_found("category", key.as_str()))
        })
    }

    /// Returns all categories of a user, in id order.
    pub fn get_categories(&self, user: &str) -> CoreResult<Vec<Category>> {
        self.txm.view(user, |ns| ns.documents())
    }

    /// Looks a category up by name.
    ///
    /// Returns `None` when the name is not indexed or its entry points at
    /// nothing.
    pub fn get_category_by_name(&self, user: &str, name: &str) -> CoreResult<Option<Category>> {
        self.txm.view(user, |ns| match ns.index_lookup(NAME_INDEX, name.as_bytes()) {
            Some(id) => ns.get_document(id),
            None => Ok(None),
        })
    }

    /// Renames a category, keeping its id.
    ///
    /// Renaming to the current name succeeds and changes nothing visible.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidId`] if there is no such category
    /// - [`CoreError::DuplicateName`] if another category already has `new_name`
    pub fn edit_category(&self, user: &str, id: &str, new_name: &str) -> CoreResult<bool> {
        let category_id = ObjectId::parse_hex(id)?;
        let key = category_id.to_hex();

        self.txm.update(user, |writer| {
            let old: Category = writer
                .get_document(&key)?
                .ok_or_else(|| CoreError::invalid_id(key.as_str()))?;

            if let Some(holder) = writer.index_lookup(NAME_INDEX, new_name.as_bytes()) {
                if holder != key {
                    return Err(CoreError::DuplicateName {
                        name: new_name.to_owned(),
                    });
                }
            }

            writer.delete_index_entry(NAME_INDEX, old.name.as_bytes())?;
            let renamed = Category {
                id: category_id,
                name: new_name.to_owned(),
            };
            writer.put_document(&key, &renamed)?;
            writer.put_index_entry(NAME_INDEX, new_name.as_bytes(), &key)?;
            Ok(true)
        })
    }

    /// Deletes a category and its name entry.
    ///
    /// Feeds that reference the category keep the reference.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the user has never created a
    /// category or there is no such category.
    pub fn remove_category(&self, user: &str, id: &str) -> CoreResult<bool> {
        let key = ObjectId::parse_hex(id)?.to_hex();

        self.txm.update(user, |writer| {
            if writer.namespace().index(NAME_INDEX).is_none() {
                return Err(CoreError::not_found("category index", writer.user()));
            }
            let category: Category = writer
                .get_document(&key)?
                .ok_or_else(|| CoreError::not_found("category", key.as_str()))?;

            writer.delete_index_entry(NAME_INDEX, category.name.as_bytes())?;
            writer.delete(&key)?;
            Ok(true)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> (Store, CategoryIndex) {
        let store = Store::open_in_memory().unwrap();
        (store.clone(), CategoryIndex::new(store))
    }

    #[test]
    fn add_and_get_by_id() {
        let (_, categories) = index();
        let tech = categories.add_category("u", "Tech").unwrap();
        assert_eq!(tech.name, "Tech");

        let loaded = categories
            .get_category_by_id("u", &tech.id.to_hex())
            .unwrap();
        assert_eq!(loaded, tech);
    }

    #[test]
    fn duplicate_name_is_rejected_without_writes() {
        let (store, categories) = index();
        categories.add_category("u", "Tech").unwrap();
        let seq = store.committed_seq();

        let result = categories.add_category("u", "Tech");
        assert!(matches!(result, Err(CoreError::DuplicateName { name }) if name == "Tech"));
        assert_eq!(store.committed_seq(), seq);
        assert_eq!(categories.get_categories("u").unwrap().len(), 1);
    }

    #[test]
    fn names_are_per_user() {
        let (_, categories) = index();
        categories.add_category("alice", "Tech").unwrap();
        categories.add_category("bob", "Tech").unwrap();
        assert_eq!(categories.get_categories("alice").unwrap().len(), 1);
        assert_eq!(categories.get_categories("bob").unwrap().len(), 1);
    }

    #[test]
    fn get_categories_excludes_index_entries() {
        let (_, categories) = index();
        assert!(categories.get_categories("u").unwrap().is_empty());

        let mut added: Vec<_> = ["Tech", "News", "Art"]
            .iter()
            .map(|name| categories.add_category("u", name).unwrap())
            .collect();
        let mut listed = categories.get_categories("u").unwrap();

        added.sort_by_key(|c| c.id);
        listed.sort_by_key(|c| c.id);
        assert_eq!(listed, added);
    }

    #[test]
    fn get_by_name() {
        let (_, categories) = index();
        assert_eq!(categories.get_category_by_name("u", "Tech").unwrap(), None);

        let tech = categories.add_category("u", "Tech").unwrap();
        assert_eq!(
            categories.get_category_by_name("u", "Tech").unwrap(),
            Some(tech)
        );
        assert_eq!(categories.get_category_by_name("u", "tech").unwrap(), None);
    }

    #[test]
    fn missing_id_is_not_found() {
        let (_, categories) = index();
        let result = categories.get_category_by_id("u", &ObjectId::new().to_hex());
        assert!(result.unwrap_err().is_not_found());
    }

    #[test]
    fn malformed_id_is_serialization_error() {
        let (_, categories) = index();
        let result = categories.get_category_by_id("u", "not-hex");
        assert!(matches!(result, Err(CoreError::Serialization(_))));
    }

    #[test]
    fn edit_moves_name_entry() {
        let (_, categories) = index();
        let tech = categories.add_category("u", "Tech").unwrap();
        let id = tech.id.to_hex();

        assert!(categories.edit_category("u", &id, "Science").unwrap());

        assert_eq!(categories.get_category_by_name("u", "Tech").unwrap(), None);
        let renamed = categories
            .get_category_by_name("u", "Science")
            .unwrap()
            .unwrap();
        assert_eq!(renamed.id, tech.id);
        assert_eq!(categories.get_category_by_id("u", &id).unwrap().name, "Science");
        assert_eq!(categories.get_categories("u").unwrap().len(), 1);
    }

    #[test]
    fn edit_to_own_name_succeeds() {
        let (_, categories) = index();
        let tech = categories.add_category("u", "Tech").unwrap();
        assert!(categories
            .edit_category("u", &tech.id.to_hex(), "Tech")
            .unwrap());
        assert_eq!(
            categories.get_category_by_name("u", "Tech").unwrap(),
            Some(tech)
        );
    }

    #[test]
    fn edit_to_taken_name_is_rejected() {
        let (_, categories) = index();
        let tech = categories.add_category("u", "Tech").unwrap();
        let news = categories.add_category("u", "News").unwrap();

        let result = categories.edit_category("u", &news.id.to_hex(), "Tech");
        assert!(matches!(result, Err(CoreError::DuplicateName { .. })));
        assert_eq!(
            categories.get_category_by_name("u", "Tech").unwrap(),
            Some(tech)
        );
        assert_eq!(
            categories.get_category_by_name("u", "News").unwrap(),
            Some(news)
        );
    }

    #[test]
    fn edit_missing_is_invalid_id() {
        let (_, categories) = index();
        let result = categories.edit_category("u", &ObjectId::new().to_hex(), "X");
        assert!(matches!(result, Err(CoreError::InvalidId { .. })));
    }

    #[test]
    fn remove_deletes_record_and_entry() {
        let (_, categories) = index();
        let tech = categories.add_category("u", "Tech").unwrap();
        let id = tech.id.to_hex();

        assert!(categories.remove_category("u", &id).unwrap());
        assert!(categories.get_category_by_id("u", &id).unwrap_err().is_not_found());
        assert_eq!(categories.get_category_by_name("u", "Tech").unwrap(), None);

        // The name is free again.
        categories.add_category("u", "Tech").unwrap();
    }

    #[test]
    fn remove_without_any_category_is_not_found() {
        let (_, categories) = index();
        let result = categories.remove_category("fresh", &ObjectId::new().to_hex());
        assert!(result.unwrap_err().is_not_found());
    }

    #[test]
    fn remove_twice_is_not_found() {
        let (_, categories) = index();
        let id = categories.add_category("u", "Tech").unwrap().id.to_hex();
        categories.remove_category("u", &id).unwrap();
        assert!(categories.remove_category("u", &id).unwrap_err().is_not_found());
    }

    #[test]
    fn first_read_provisions_namespace() {
        let (store, categories) = index();
        assert!(categories.get_categories("new-user").unwrap().is_empty());
        assert!(store
            .begin_read()
            .namespace(Partition::Categories, "new-user")
            .is_some());
    }
}
