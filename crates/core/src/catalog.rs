use crate::domain::contract::CatalogFile;
use crate::domain::Item;
use crate::error::{PricingError, Result};
use anyhow::Context;
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../catalog/default.json");

/// Read-only item table. Built once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<Item>,
}

impl Catalog {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    /// The marketplace snapshot bundled with the crate.
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_json_str(BUILTIN_CATALOG).context("bundled catalog is invalid")
    }

    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        let parsed = serde_json::from_str::<CatalogFile>(text)
            .context("catalog is not valid JSON for the catalog schema")?;
        Ok(Self::new(parsed.validate_and_into_items()?))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("failed to load catalog {}", path.display()))
    }

    /// Uses `path` when given, otherwise the bundled catalog.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::from_json_file(p),
            None => Self::builtin(),
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn find(&self, item_id: &str) -> Result<&Item> {
        self.items
            .iter()
            .find(|item| item.id == item_id)
            .ok_or_else(|| PricingError::NotFound(item_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PricingKind;
    use serde_json::json;

    #[test]
    fn builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.items().len(), 13);

        let void = catalog.find("cmdmch4xb056cqn01rc10afcq").unwrap();
        assert_eq!(void.pricing, PricingKind::Fixed);
        assert_eq!(void.base_price, 1);

        let stipend = catalog.find("cmd7in0r4000kro01x3l2c1v8").unwrap();
        assert_eq!(stipend.pricing, PricingKind::Stipend { usd_cost: 10.0 });

        let pi = catalog.find("cmebn7caq0118nv01spx78x4t").unwrap();
        assert!(!pi.is_fixed());
        assert_eq!(pi.base_price, 478);
    }

    #[test]
    fn unknown_item_is_not_found() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(
            catalog.find("nope").unwrap_err(),
            PricingError::NotFound("nope".to_string())
        );
    }

    #[test]
    fn parses_minimal_records() {
        let text = json!({
            "items": [
                {"id": " a ", "name": "Thing", "base_price": 100},
            ]
        })
        .to_string();
        let catalog = Catalog::from_json_str(&text).unwrap();
        let item = catalog.find("a").unwrap();
        assert_eq!(item.name, "Thing");
        assert_eq!(item.description, "");
        assert_eq!(item.pricing, PricingKind::Randomized);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let text = json!({
            "items": [
                {"id": "a", "name": "One", "base_price": 1},
                {"id": "a", "name": "Two", "base_price": 2},
            ]
        })
        .to_string();
        assert!(Catalog::from_json_str(&text).is_err());
    }

    #[test]
    fn rejects_zero_base_price_and_stray_usd_cost() {
        let zero = json!({"items": [{"id": "a", "name": "A", "base_price": 0}]}).to_string();
        assert!(Catalog::from_json_str(&zero).is_err());

        let stray = json!({
            "items": [{"id": "a", "name": "A", "base_price": 5, "usd_cost": 10.0}]
        })
        .to_string();
        assert!(Catalog::from_json_str(&stray).is_err());
    }

    #[test]
    fn rejects_empty_catalog_and_bad_json() {
        assert!(Catalog::from_json_str(r#"{"items": []}"#).is_err());
        assert!(Catalog::from_json_str("not json").is_err());
    }
}
