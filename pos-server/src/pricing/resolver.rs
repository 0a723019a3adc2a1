//! Pricing resolver - catalog item id + modifier selections to priced unit
//!
//! A missing base item is fatal (the operation cannot be priced). A missing
//! modifier never is: an unresolvable addon or topping id is dropped with a
//! warning so a stale client selection cannot block an edit.

use crate::catalog::CatalogStore;
use shared::RevisionError;
use shared::order::{PricedModifier, UnitComponents};

/// Resolve a catalog item and modifier selections into unit price components
pub fn resolve_unit(
    catalog: &dyn CatalogStore,
    catalog_item_id: &str,
    addon_ids: &[String],
    topping_ids: &[String],
) -> Result<UnitComponents, RevisionError> {
    let item = catalog
        .get_item(catalog_item_id)
        .ok_or_else(|| RevisionError::CatalogItemNotFound(catalog_item_id.to_string()))?;

    let mut addons = Vec::new();
    let mut matched_addon_ids: Vec<&str> = Vec::new();

    for group in &item.addon_groups {
        let selected: Vec<_> = group
            .options
            .iter()
            .filter(|o| addon_ids.iter().any(|id| id == &o.id))
            .collect();

        if selected.is_empty() {
            // No explicit selection for this group: fall back to its default
            if let Some(default) = group.default_option() {
                addons.push(PricedModifier {
                    name: default.name.clone(),
                    price: default.price,
                });
            }
        } else {
            for option in selected {
                matched_addon_ids.push(&option.id);
                addons.push(PricedModifier {
                    name: option.name.clone(),
                    price: option.price,
                });
            }
        }
    }

    for id in addon_ids {
        if !matched_addon_ids.contains(&id.as_str()) {
            tracing::warn!(
                catalog_item_id,
                addon_id = %id,
                "Addon selection did not resolve, dropping"
            );
        }
    }

    let mut toppings = Vec::new();
    for id in topping_ids {
        match item.toppings.iter().find(|t| &t.id == id) {
            Some(topping) => toppings.push(PricedModifier {
                name: topping.name.clone(),
                price: topping.price,
            }),
            None => {
                tracing::warn!(
                    catalog_item_id,
                    topping_id = %id,
                    "Topping selection did not resolve, dropping"
                );
            }
        }
    }

    Ok(UnitComponents {
        base_price: item.price,
        addons,
        toppings,
    })
}
