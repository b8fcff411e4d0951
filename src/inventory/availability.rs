// Recipe resolution and availability decisions
//
// Pure functions over resolved product kinds and a snapshot of current
// stock. Repositories feed these with fresh reads; nothing here touches the
// database, which keeps every policy rule unit-testable.

use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::models::ProductKind;
use crate::settings::InventoryPolicy;

/// Availability of a product for menu display and sale
///
/// `Unavailable` hides a resale product from the menu outright; `SoldOut`
/// keeps a manufactured product listed but flagged. The asymmetry is menu
/// policy: a resale item with no stock has nothing to offer, while the
/// kitchen may still want visibility into a near-miss recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityState {
    Available,
    SoldOut,
    Unavailable,
}

/// One ingredient falling short of what an order requires
#[derive(Debug, Clone, Serialize)]
pub struct Shortage {
    pub ingredient_id: i32,
    pub ingredient_name: Option<String>,
    pub required: f64,
    pub on_hand: f64,
}

/// Resolve the ingredients one order line draws from stock
///
/// Resale products consume their linked ingredient 1:1 per unit sold;
/// manufactured products consume each recipe line times the quantity
/// ordered. Untracked products consume nothing.
pub fn required_ingredients(kind: &ProductKind, quantity_ordered: i32) -> Vec<(i32, f64)> {
    let quantity_ordered = f64::from(quantity_ordered);
    match kind {
        ProductKind::Resale { ingredient_id } => vec![(*ingredient_id, quantity_ordered)],
        ProductKind::Manufactured { recipe } => recipe
            .iter()
            .map(|line| (line.ingredient_id, line.quantity * quantity_ordered))
            .collect(),
        ProductKind::Untracked => Vec::new(),
    }
}

/// Sum requirements per ingredient across a whole order
///
/// The same ingredient reached through several lines must be checked (and
/// later deducted) as one combined draw.
pub fn aggregate_requirements<'a, I>(lines: I) -> HashMap<i32, f64>
where
    I: IntoIterator<Item = (&'a ProductKind, i32)>,
{
    let mut requirements: HashMap<i32, f64> = HashMap::new();
    for (kind, quantity) in lines {
        for (ingredient_id, required) in required_ingredients(kind, quantity) {
            *requirements.entry(ingredient_id).or_insert(0.0) += required;
        }
    }
    requirements
}

/// Compute a product's availability under the given policy
///
/// With inventory disabled everything is sellable. An ingredient missing
/// from the stock snapshot counts as zero on hand.
pub fn availability_of(
    policy: &InventoryPolicy,
    kind: &ProductKind,
    stock: &HashMap<i32, f64>,
) -> AvailabilityState {
    if !policy.checks_display() {
        return AvailabilityState::Available;
    }

    let on_hand = |id: &i32| stock.get(id).copied().unwrap_or(0.0);

    match kind {
        ProductKind::Resale { ingredient_id } => {
            if on_hand(ingredient_id) <= 0.0 {
                AvailabilityState::Unavailable
            } else {
                AvailabilityState::Available
            }
        }
        ProductKind::Manufactured { recipe } => {
            if recipe.iter().any(|line| on_hand(&line.ingredient_id) <= 0.0) {
                AvailabilityState::SoldOut
            } else {
                AvailabilityState::Available
            }
        }
        ProductKind::Untracked => AvailabilityState::Available,
    }
}

/// Compare aggregated requirements against a stock snapshot
///
/// Returns every ingredient the order would overdraw, sorted by id so the
/// itemized rejection reads deterministically. Names are filled in by the
/// caller, which knows them.
pub fn find_shortages(
    requirements: &HashMap<i32, f64>,
    stock: &HashMap<i32, f64>,
) -> Vec<Shortage> {
    let mut shortages: Vec<Shortage> = requirements
        .iter()
        .filter_map(|(&ingredient_id, &required)| {
            let on_hand = stock.get(&ingredient_id).copied().unwrap_or(0.0);
            if on_hand < required {
                Some(Shortage {
                    ingredient_id,
                    ingredient_name: None,
                    required,
                    on_hand,
                })
            } else {
                None
            }
        })
        .collect();

    shortages.sort_by_key(|s| s.ingredient_id);
    shortages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::models::RecipeLine;

    fn strict() -> InventoryPolicy {
        InventoryPolicy {
            inventory_enabled: true,
            allow_negative_stock: false,
        }
    }

    fn disabled() -> InventoryPolicy {
        InventoryPolicy {
            inventory_enabled: false,
            allow_negative_stock: true,
        }
    }

    fn pizza_kind() -> ProductKind {
        ProductKind::Manufactured {
            recipe: vec![
                RecipeLine {
                    ingredient_id: 1,
                    quantity: 0.2,
                },
                RecipeLine {
                    ingredient_id: 2,
                    quantity: 0.3,
                },
            ],
        }
    }

    #[test]
    fn test_required_ingredients_resale() {
        let kind = ProductKind::Resale { ingredient_id: 5 };
        assert_eq!(required_ingredients(&kind, 3), vec![(5, 3.0)]);
    }

    #[test]
    fn test_required_ingredients_manufactured_scales() {
        let required = required_ingredients(&pizza_kind(), 2);
        assert_eq!(required, vec![(1, 0.4), (2, 0.6)]);
    }

    #[test]
    fn test_required_ingredients_untracked_is_empty() {
        assert!(required_ingredients(&ProductKind::Untracked, 4).is_empty());
    }

    #[test]
    fn test_aggregate_sums_shared_ingredient_across_lines() {
        let pizza = pizza_kind();
        let calzone = ProductKind::Manufactured {
            recipe: vec![RecipeLine {
                ingredient_id: 1,
                quantity: 0.1,
            }],
        };

        let requirements = aggregate_requirements(vec![(&pizza, 1), (&calzone, 2)]);

        assert_eq!(requirements.get(&1).copied(), Some(0.2 + 0.2));
        assert_eq!(requirements.get(&2).copied(), Some(0.3));
    }

    #[test]
    fn test_manufactured_available_when_all_ingredients_positive() {
        let stock = HashMap::from([(1, 1.0), (2, 0.5)]);
        assert_eq!(
            availability_of(&strict(), &pizza_kind(), &stock),
            AvailabilityState::Available
        );
    }

    #[test]
    fn test_manufactured_sold_out_when_any_ingredient_depleted() {
        let stock = HashMap::from([(1, 1.0), (2, 0.0)]);
        assert_eq!(
            availability_of(&strict(), &pizza_kind(), &stock),
            AvailabilityState::SoldOut
        );
    }

    #[test]
    fn test_resale_unavailable_at_zero_stock() {
        let kind = ProductKind::Resale { ingredient_id: 9 };
        let stock = HashMap::from([(9, 0.0)]);
        assert_eq!(
            availability_of(&strict(), &kind, &stock),
            AvailabilityState::Unavailable
        );
    }

    #[test]
    fn test_resale_missing_from_snapshot_counts_as_zero() {
        let kind = ProductKind::Resale { ingredient_id: 9 };
        assert_eq!(
            availability_of(&strict(), &kind, &HashMap::new()),
            AvailabilityState::Unavailable
        );
    }

    #[test]
    fn test_disabled_policy_bypasses_everything() {
        let stock = HashMap::from([(1, 0.0), (2, 0.0)]);
        assert_eq!(
            availability_of(&disabled(), &pizza_kind(), &stock),
            AvailabilityState::Available
        );
    }

    #[test]
    fn test_find_shortages_reports_overdraw() {
        let requirements = HashMap::from([(1, 0.4), (2, 0.3)]);
        let stock = HashMap::from([(1, 0.2), (2, 1.0)]);

        let shortages = find_shortages(&requirements, &stock);

        assert_eq!(shortages.len(), 1);
        assert_eq!(shortages[0].ingredient_id, 1);
        assert_eq!(shortages[0].required, 0.4);
        assert_eq!(shortages[0].on_hand, 0.2);
    }

    #[test]
    fn test_exact_stock_is_not_a_shortage() {
        // 0.2 kg on hand, recipe needs exactly 0.2 kg for one unit
        let requirements = HashMap::from([(1, 0.2)]);
        let stock = HashMap::from([(1, 0.2)]);

        assert!(find_shortages(&requirements, &stock).is_empty());
    }

    #[test]
    fn test_shortages_sorted_by_ingredient_id() {
        let requirements = HashMap::from([(7, 1.0), (3, 1.0), (5, 1.0)]);
        let stock = HashMap::new();

        let ids: Vec<i32> = find_shortages(&requirements, &stock)
            .iter()
            .map(|s| s.ingredient_id)
            .collect();

        assert_eq!(ids, vec![3, 5, 7]);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::catalog::models::RecipeLine;
    use proptest::prelude::*;

    fn recipe_strategy() -> impl Strategy<Value = Vec<RecipeLine>> {
        prop::collection::vec(
            (1i32..50, 0.01f64..5.0).prop_map(|(ingredient_id, quantity)| RecipeLine {
                ingredient_id,
                quantity,
            }),
            1..6,
        )
    }

    /// Required quantities scale linearly with the quantity ordered
    #[test]
    fn prop_requirements_scale_linearly() {
        proptest!(|(recipe in recipe_strategy(), qty in 1i32..20)| {
            let kind = ProductKind::Manufactured { recipe: recipe.clone() };
            let required = required_ingredients(&kind, qty);

            prop_assert_eq!(required.len(), recipe.len());
            for ((id, amount), line) in required.iter().zip(recipe.iter()) {
                prop_assert_eq!(*id, line.ingredient_id);
                prop_assert!((amount - line.quantity * f64::from(qty)).abs() < 1e-9);
            }
        });
    }

    /// A fully stocked recipe is always Available under any enabled policy
    #[test]
    fn prop_positive_stock_is_available() {
        proptest!(|(recipe in recipe_strategy(), allow_negative in any::<bool>())| {
            let policy = InventoryPolicy {
                inventory_enabled: true,
                allow_negative_stock: allow_negative,
            };
            let stock: HashMap<i32, f64> = recipe
                .iter()
                .map(|line| (line.ingredient_id, line.quantity + 1.0))
                .collect();
            let kind = ProductKind::Manufactured { recipe };

            prop_assert_eq!(
                availability_of(&policy, &kind, &stock),
                AvailabilityState::Available
            );
        });
    }

    /// Zeroing any single ingredient flags a manufactured product sold out
    #[test]
    fn prop_any_depleted_ingredient_flags_sold_out() {
        proptest!(|(recipe in recipe_strategy(), seed in any::<prop::sample::Index>())| {
            let policy = InventoryPolicy {
                inventory_enabled: true,
                allow_negative_stock: false,
            };
            let depleted = recipe[seed.index(recipe.len())].ingredient_id;
            let stock: HashMap<i32, f64> = recipe
                .iter()
                .map(|line| {
                    let qty = if line.ingredient_id == depleted { 0.0 } else { 10.0 };
                    (line.ingredient_id, qty)
                })
                .collect();
            let kind = ProductKind::Manufactured { recipe };

            prop_assert_eq!(
                availability_of(&policy, &kind, &stock),
                AvailabilityState::SoldOut
            );
        });
    }

    /// find_shortages never reports an ingredient with enough on hand
    #[test]
    fn prop_no_false_shortages() {
        proptest!(|(pairs in prop::collection::hash_map(1i32..30, 0.0f64..10.0, 1..8))| {
            let stock: HashMap<i32, f64> = pairs
                .iter()
                .map(|(&id, &req)| (id, req))
                .collect();

            // Stock exactly matches requirements everywhere
            prop_assert!(find_shortages(&pairs, &stock).is_empty());
        });
    }
}
