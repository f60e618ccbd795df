use crate::models::{DebtItem, IdentityKey};
use std::collections::{BTreeSet, HashMap};

/// Merge items describing the same logical debt.
///
/// Items sharing an identity key collapse into the first one seen, whose
/// `source_set` becomes the sorted, de-duplicated, comma-joined union of the
/// group's source sets. Groups keep the order of their first member.
pub fn aggregate(items: Vec<DebtItem>) -> Vec<DebtItem> {
    let mut index: HashMap<IdentityKey, usize> = HashMap::new();
    let mut groups: Vec<(DebtItem, BTreeSet<String>)> = Vec::new();

    for item in items {
        match index.get(&item.identity_key()) {
            Some(&position) => {
                groups[position].1.insert(item.source_set);
            }
            None => {
                index.insert(item.identity_key(), groups.len());
                let source_sets = BTreeSet::from([item.source_set.clone()]);
                groups.push((item, source_sets));
            }
        }
    }

    groups
        .into_iter()
        .map(|(mut representative, source_sets)| {
            representative.source_set = source_sets.into_iter().collect::<Vec<_>>().join(", ");
            representative
        })
        .collect()
}

/// Stable sort by module name, then priority rank
pub fn sort_items(items: &mut [DebtItem]) {
    items.sort_by(|a, b| {
        a.module_name
            .cmp(&b.module_name)
            .then_with(|| a.priority_rank().cmp(&b.priority_rank()))
    });
}

pub fn aggregate_and_sort(items: Vec<DebtItem>) -> Vec<DebtItem> {
    let mut merged = aggregate(items);
    sort_items(&mut merged);
    merged
}
