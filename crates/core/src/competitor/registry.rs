//! Registry implementation.

use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::info;

use super::types::{Competitor, RegistryError, DEFAULT_NAMES, MAX_COMPETITORS};
use crate::preparation::Item;

/// Owned set of competitors plus every map keyed by competitor name.
#[derive(Debug, Clone, Default)]
pub struct CompetitorRegistry {
    competitors: Vec<Competitor>,
    items: HashMap<String, Vec<Item>>,
}

impl CompetitorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `count` competitors with the default names and empty tokens.
    ///
    /// Discards previously fetched items.
    pub fn setup(&mut self, count: usize) -> Result<(), RegistryError> {
        if count == 0 {
            return Err(RegistryError::NoCompetitors);
        }
        if count > MAX_COMPETITORS {
            return Err(RegistryError::TooManyCompetitors {
                max: MAX_COMPETITORS,
            });
        }

        self.competitors = DEFAULT_NAMES
            .iter()
            .take(count)
            .map(|name| Competitor::new(*name, ""))
            .collect();
        self.items.clear();

        info!(count, "Competitors set up");
        Ok(())
    }

    /// Replace all competitors with the given entries.
    pub fn replace(&mut self, competitors: Vec<Competitor>) -> Result<(), RegistryError> {
        if competitors.len() > MAX_COMPETITORS {
            return Err(RegistryError::TooManyCompetitors {
                max: MAX_COMPETITORS,
            });
        }

        let mut seen = HashSet::new();
        for competitor in &competitors {
            let name = competitor.name.trim();
            if name.is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if !seen.insert(name.to_string()) {
                return Err(RegistryError::DuplicateName(name.to_string()));
            }
        }

        self.competitors = competitors
            .into_iter()
            .map(|c| Competitor::new(c.name.trim(), c.token))
            .collect();
        self.items.clear();
        Ok(())
    }

    pub fn competitors(&self) -> &[Competitor] {
        &self.competitors
    }

    pub fn len(&self) -> usize {
        self.competitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.competitors.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Competitor> {
        self.competitors.iter().find(|c| c.name == name)
    }

    /// Competitors with a usable token, in registry order.
    pub fn active(&self) -> impl Iterator<Item = &Competitor> {
        self.competitors.iter().filter(|c| c.is_active())
    }

    /// Derived headers for a competitor.
    pub fn headers(&self, name: &str) -> Option<BTreeMap<String, String>> {
        self.get(name).and_then(Competitor::headers)
    }

    pub fn set_token(&mut self, name: &str, token: &str) -> Result<(), RegistryError> {
        let competitor = self
            .competitors
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        competitor.token = token.to_string();
        Ok(())
    }

    /// Rename a competitor, migrating every map keyed by its name.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> Result<(), RegistryError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if old_name == new_name {
            return if self.get(old_name).is_some() {
                Ok(())
            } else {
                Err(RegistryError::NotFound(old_name.to_string()))
            };
        }
        if self.get(new_name).is_some() {
            return Err(RegistryError::DuplicateName(new_name.to_string()));
        }

        let competitor = self
            .competitors
            .iter_mut()
            .find(|c| c.name == old_name)
            .ok_or_else(|| RegistryError::NotFound(old_name.to_string()))?;
        competitor.name = new_name.to_string();

        if let Some(items) = self.items.remove(old_name) {
            self.items.insert(new_name.to_string(), items);
        }

        info!(from = old_name, to = new_name, "Competitor renamed");
        Ok(())
    }

    /// Store the item lists produced by the preparation stage.
    pub fn set_items(&mut self, items: HashMap<String, Vec<Item>>) {
        self.items = items;
    }

    pub fn items(&self) -> &HashMap<String, Vec<Item>> {
        &self.items
    }

    pub fn items_for(&self, name: &str) -> Option<&[Item]> {
        self.items.get(name).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_setup_assigns_default_names() {
        let mut registry = CompetitorRegistry::new();
        registry.setup(3).unwrap();
        let names: Vec<_> = registry.competitors().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Andy", "Bob", "Chris"]);
        assert_eq!(registry.active().count(), 0);
    }

    #[test]
    fn test_setup_bounds() {
        let mut registry = CompetitorRegistry::new();
        assert_eq!(registry.setup(0), Err(RegistryError::NoCompetitors));
        assert_eq!(
            registry.setup(11),
            Err(RegistryError::TooManyCompetitors { max: 10 })
        );
        assert!(registry.setup(10).is_ok());
        assert_eq!(registry.competitors()[9].name, "Jack");
    }

    #[test]
    fn test_setup_discards_items() {
        let mut registry = CompetitorRegistry::new();
        registry.setup(2).unwrap();
        let mut items = HashMap::new();
        items.insert("Andy".to_string(), vec![Item::new(json!({"id": 1}))]);
        registry.set_items(items);
        registry.setup(2).unwrap();
        assert!(registry.items().is_empty());
    }

    #[test]
    fn test_set_token_activates_competitor() {
        let mut registry = CompetitorRegistry::new();
        registry.setup(2).unwrap();
        registry.set_token("Bob", "tok").unwrap();
        let active: Vec<_> = registry.active().map(|c| c.name.clone()).collect();
        assert_eq!(active, vec!["Bob"]);
        assert!(registry.headers("Bob").is_some());
        assert!(registry.headers("Andy").is_none());
        assert_eq!(
            registry.set_token("Zed", "tok"),
            Err(RegistryError::NotFound("Zed".to_string()))
        );
    }

    #[test]
    fn test_rename_migrates_items() {
        let mut registry = CompetitorRegistry::new();
        registry.setup(2).unwrap();
        registry.set_token("Andy", "a").unwrap();
        let mut items = HashMap::new();
        items.insert("Andy".to_string(), vec![Item::new(json!({"id": "x"}))]);
        registry.set_items(items);

        registry.rename("Andy", "Alice").unwrap();

        assert!(registry.get("Andy").is_none());
        assert_eq!(registry.get("Alice").unwrap().token, "a");
        assert!(registry.items_for("Andy").is_none());
        assert_eq!(registry.items_for("Alice").unwrap().len(), 1);
    }

    #[test]
    fn test_rename_rejects_duplicates_and_blank() {
        let mut registry = CompetitorRegistry::new();
        registry.setup(2).unwrap();
        assert_eq!(
            registry.rename("Andy", "Bob"),
            Err(RegistryError::DuplicateName("Bob".to_string()))
        );
        assert_eq!(registry.rename("Andy", "  "), Err(RegistryError::EmptyName));
        assert_eq!(
            registry.rename("Nobody", "Carl"),
            Err(RegistryError::NotFound("Nobody".to_string()))
        );
        assert!(registry.rename("Andy", "Andy").is_ok());
    }

    #[test]
    fn test_replace_validates_names() {
        let mut registry = CompetitorRegistry::new();
        let result = registry.replace(vec![
            Competitor::new("Same", "a"),
            Competitor::new("Same", "b"),
        ]);
        assert_eq!(result, Err(RegistryError::DuplicateName("Same".to_string())));

        registry
            .replace(vec![Competitor::new(" Alpha ", "a"), Competitor::new("Beta", "")])
            .unwrap();
        assert_eq!(registry.competitors()[0].name, "Alpha");
        assert_eq!(registry.active().count(), 1);
    }
}
