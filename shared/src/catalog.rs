//! Catalog lookup types
//!
//! The menu catalog is an external collaborator; the core only needs a
//! read-only price lookup keyed by item id. These types describe what the
//! lookup returns.

use serde::{Deserialize, Serialize};

/// One selectable option inside an addon group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddonOption {
    pub id: String,
    pub name: String,
    /// Price in minor currency units
    pub price: i64,
}

/// Addon group with its options and optional default
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddonGroup {
    pub id: String,
    pub name: String,
    pub options: Vec<AddonOption>,
    /// Option selected when the caller makes no explicit choice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_option_id: Option<String>,
}

impl AddonGroup {
    /// The group's designated default option, when one exists
    pub fn default_option(&self) -> Option<&AddonOption> {
        let id = self.default_option_id.as_ref()?;
        self.options.iter().find(|o| &o.id == id)
    }
}

/// Topping available on a catalog item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToppingDef {
    pub id: String,
    pub name: String,
    /// Price in minor currency units
    pub price: i64,
}

/// Catalog item as returned by the lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    /// Base price in minor currency units
    pub price: i64,
    #[serde(default)]
    pub addon_groups: Vec<AddonGroup>,
    #[serde(default)]
    pub toppings: Vec<ToppingDef>,
}
