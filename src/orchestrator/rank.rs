use std::collections::HashMap;

use crate::db::models::{Recipe, RecipeId};

/// Reorder rehydrated recipes to follow `ranked_ids`.
/// Recipes whose id is not ranked sort last, keeping their relative order.
pub fn order_by_rank(mut recipes: Vec<Recipe>, ranked_ids: &[RecipeId]) -> Vec<Recipe> {
    let position: HashMap<&RecipeId, usize> = ranked_ids
        .iter()
        .enumerate()
        .rev()
        .map(|(idx, id)| (id, idx))
        .collect();

    recipes.sort_by_key(|r| position.get(&r.id).copied().unwrap_or(usize::MAX));
    recipes
}
