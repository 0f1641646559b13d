use std::collections::HashSet;

use crate::state::{CatalogItem, ItemKind};

/// What: Borrow each listing once, keeping the first occurrence of each identity.
///
/// Inputs:
/// - `items`: Accumulated feed in arrival order
///
/// Output:
/// - References with unique `(kind, id)` pairs, order preserved.
///
/// Details:
/// - Runs over the whole feed before ranking, so a record that offset paging
///   shifts across a page boundary is shown once. The loader keeps every record.
#[must_use]
pub fn unique_by_identity(items: &[CatalogItem]) -> Vec<&CatalogItem> {
    let mut seen: HashSet<(ItemKind, i64)> = HashSet::with_capacity(items.len());
    items
        .iter()
        .filter(|it| seen.insert(it.identity()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    /// What: Same id across kinds is kept, same identity twice is dropped
    fn unique_respects_kind() {
        let now = Utc::now();
        let mut second = CatalogItem::new(1, ItemKind::Channel, now);
        second.title = "later copy".into();
        let items = vec![
            CatalogItem::new(1, ItemKind::Channel, now),
            CatalogItem::new(1, ItemKind::Bot, now),
            second,
            CatalogItem::new(2, ItemKind::Channel, now),
        ];
        let out = unique_by_identity(&items);
        let keys: Vec<_> = out.iter().map(|it| it.identity()).collect();
        assert_eq!(
            keys,
            vec![
                (ItemKind::Channel, 1),
                (ItemKind::Bot, 1),
                (ItemKind::Channel, 2)
            ]
        );
        assert!(out[0].title.is_empty());
        assert_eq!(items.len(), 4);
    }
}
