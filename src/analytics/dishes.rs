use std::collections::HashMap;

use serde::Serialize;

use crate::data::record::Restaurant;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DishCount {
    pub dish: String,
    pub count: usize,
}

/// Most mentioned liked dishes. Tokens are trimmed and lowercased; every mention
/// counts, including repeats inside one record. Equal counts keep first-seen order.
pub fn top_dishes(records: &[Restaurant], top_n: usize) -> Vec<DishCount> {
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<DishCount> = Vec::new();
    for dish in records.iter().flat_map(Restaurant::dish_tokens) {
        match position.get(&dish) {
            Some(&index) => counts[index].count += 1,
            None => {
                position.insert(dish.clone(), counts.len());
                counts.push(DishCount { dish, count: 1 });
            }
        }
    }
    counts.sort_by(|left, right| right.count.cmp(&left.count));
    counts.truncate(top_n);
    counts
}
