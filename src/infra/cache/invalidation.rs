use crate::infra::cache::scope::ScopeKey;

/// One successful mutation, carrying every parent scope it touched. For
/// moves that means the origin AND the destination; forgetting the origin
/// is how stale lists survive indefinitely, so the event itself records
/// both.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationEvent {
    CategoryCreated { id: String },
    CategoryUpdated { id: String },
    CategoriesReordered,
    CategoryDeleted { id: String },
    GoodsItemCreated { category_id: String },
    GoodsItemUpdated {
        id: String,
        old_category_id: String,
        new_category_id: String,
    },
    GoodsItemsReordered { category_id: String },
    GoodsItemDeleted { id: String, category_id: String },
    TradeCreated { goods_item_id: String },
    TradeUpdated {
        id: String,
        old_goods_item_id: String,
        goods_item_id: String,
    },
    TradesBatchStatusUpdated { goods_item_ids: Vec<String> },
    TradeDeleted { id: String, goods_item_id: String },
    TodosChanged { trade_id: String },
}

/// The computed invalidation set: prefixes to mark stale (and eagerly
/// refetch where registered), plus an optional tombstone prefix under
/// which cache writes are discarded from now on (deleted entities must not
/// be revived by a racing response).
#[derive(Debug, Clone, Default)]
pub struct InvalidationPlan {
    pub invalidate: Vec<ScopeKey>,
    pub tombstone: Option<ScopeKey>,
}

impl InvalidationPlan {
    pub fn covers(&self, key: &ScopeKey) -> bool {
        self.invalidate.iter().any(|prefix| key.starts_with(prefix))
    }
}

impl MutationEvent {
    /// Over-invalidation is the policy: a redundant refetch is cheap, a
    /// missed dependency is silently stale UI. Specific parent scopes come
    /// first, then the coarse roots that sweep up detail views, searches
    /// and aggregates.
    pub fn plan(&self) -> InvalidationPlan {
        match self {
            MutationEvent::CategoryCreated { .. }
            | MutationEvent::CategoriesReordered => InvalidationPlan {
                invalidate: vec![ScopeKey::categories(), ScopeKey::statistics()],
                tombstone: None,
            },
            MutationEvent::CategoryUpdated { id } => InvalidationPlan {
                invalidate: vec![
                    ScopeKey::category(id),
                    ScopeKey::categories(),
                    ScopeKey::statistics(),
                    // Renames surface in joined goods/trade views too.
                    ScopeKey::goods_items(),
                    ScopeKey::trades(),
                ],
                tombstone: None,
            },
            MutationEvent::CategoryDeleted { id } => InvalidationPlan {
                invalidate: vec![
                    ScopeKey::categories(),
                    ScopeKey::goods_items(),
                    ScopeKey::trades(),
                    ScopeKey::todos(),
                    ScopeKey::statistics(),
                ],
                tombstone: Some(ScopeKey::category(id)),
            },
            MutationEvent::GoodsItemCreated { category_id } => InvalidationPlan {
                invalidate: vec![
                    ScopeKey::goods_by_category(category_id),
                    ScopeKey::category_stats(category_id),
                    ScopeKey::goods_items(),
                    ScopeKey::statistics(),
                ],
                tombstone: None,
            },
            MutationEvent::GoodsItemUpdated {
                id,
                old_category_id,
                new_category_id,
            } => {
                let mut invalidate = vec![
                    ScopeKey::goods_item(id),
                    ScopeKey::goods_by_category(new_category_id),
                    ScopeKey::category_stats(new_category_id),
                ];
                if old_category_id != new_category_id {
                    // The move case: the origin list still holds the item
                    // until invalidated.
                    invalidate.push(ScopeKey::goods_by_category(old_category_id));
                    invalidate.push(ScopeKey::category_stats(old_category_id));
                }
                invalidate.push(ScopeKey::goods_items());
                invalidate.push(ScopeKey::trades());
                invalidate.push(ScopeKey::statistics());
                InvalidationPlan {
                    invalidate,
                    tombstone: None,
                }
            }
            MutationEvent::GoodsItemsReordered { category_id } => InvalidationPlan {
                invalidate: vec![
                    ScopeKey::goods_by_category(category_id),
                    ScopeKey::goods_items(),
                ],
                tombstone: None,
            },
            MutationEvent::GoodsItemDeleted { id, category_id } => InvalidationPlan {
                invalidate: vec![
                    ScopeKey::goods_by_category(category_id),
                    ScopeKey::category_stats(category_id),
                    ScopeKey::goods_items(),
                    ScopeKey::trades(),
                    ScopeKey::todos(),
                    ScopeKey::statistics(),
                ],
                tombstone: Some(ScopeKey::goods_item(id)),
            },
            MutationEvent::TradeCreated { goods_item_id } => InvalidationPlan {
                invalidate: vec![
                    ScopeKey::trades_by_goods_item(goods_item_id),
                    ScopeKey::goods_item_stats(goods_item_id),
                    ScopeKey::goods_with_trades(goods_item_id),
                    ScopeKey::trades(),
                    ScopeKey::statistics(),
                ],
                tombstone: None,
            },
            MutationEvent::TradeUpdated {
                id,
                old_goods_item_id,
                goods_item_id,
            } => {
                let mut invalidate = vec![
                    ScopeKey::trade(id),
                    ScopeKey::trades_by_goods_item(goods_item_id),
                    ScopeKey::goods_item_stats(goods_item_id),
                    ScopeKey::goods_with_trades(goods_item_id),
                ];
                if old_goods_item_id != goods_item_id {
                    invalidate.push(ScopeKey::trades_by_goods_item(old_goods_item_id));
                    invalidate.push(ScopeKey::goods_item_stats(old_goods_item_id));
                    invalidate.push(ScopeKey::goods_with_trades(old_goods_item_id));
                }
                invalidate.push(ScopeKey::trades());
                invalidate.push(ScopeKey::statistics());
                InvalidationPlan {
                    invalidate,
                    tombstone: None,
                }
            }
            MutationEvent::TradesBatchStatusUpdated { goods_item_ids } => {
                let mut invalidate: Vec<ScopeKey> = goods_item_ids
                    .iter()
                    .flat_map(|gid| {
                        [
                            ScopeKey::trades_by_goods_item(gid),
                            ScopeKey::goods_item_stats(gid),
                            ScopeKey::goods_with_trades(gid),
                        ]
                    })
                    .collect();
                invalidate.push(ScopeKey::trades());
                invalidate.push(ScopeKey::statistics());
                InvalidationPlan {
                    invalidate,
                    tombstone: None,
                }
            }
            MutationEvent::TradeDeleted { id, goods_item_id } => InvalidationPlan {
                invalidate: vec![
                    ScopeKey::trades_by_goods_item(goods_item_id),
                    ScopeKey::goods_item_stats(goods_item_id),
                    ScopeKey::goods_with_trades(goods_item_id),
                    ScopeKey::trades(),
                    ScopeKey::todos(),
                    ScopeKey::statistics(),
                ],
                tombstone: Some(ScopeKey::trade(id)),
            },
            MutationEvent::TodosChanged { trade_id } => InvalidationPlan {
                invalidate: vec![ScopeKey::todos_by_trade(trade_id)],
                tombstone: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_covers_origin_and_destination_scopes() {
        let plan = MutationEvent::GoodsItemUpdated {
            id: "g-1".into(),
            old_category_id: "cat-a".into(),
            new_category_id: "cat-b".into(),
        }
        .plan();

        assert!(plan.covers(&ScopeKey::goods_by_category("cat-a")));
        assert!(plan.covers(&ScopeKey::goods_by_category("cat-b")));
        assert!(plan.covers(&ScopeKey::category_stats("cat-a")));
        assert!(plan.covers(&ScopeKey::category_stats("cat-b")));
        assert!(plan.covers(&ScopeKey::goods_item("g-1")));
        // Global aggregate views fall too.
        assert!(plan.covers(&ScopeKey::goods_all()));
        assert!(plan.covers(&ScopeKey::category_statistics()));
    }

    #[test]
    fn in_place_update_does_not_name_a_second_category() {
        let plan = MutationEvent::GoodsItemUpdated {
            id: "g-1".into(),
            old_category_id: "cat-a".into(),
            new_category_id: "cat-a".into(),
        }
        .plan();
        let per_category: Vec<&ScopeKey> = plan
            .invalidate
            .iter()
            .filter(|k| k.starts_with(&ScopeKey::goods_by_category_root()))
            .collect();
        assert_eq!(per_category, vec![&ScopeKey::goods_by_category("cat-a")]);
    }

    #[test]
    fn trade_move_covers_both_goods_item_scopes() {
        let plan = MutationEvent::TradeUpdated {
            id: "t-1".into(),
            old_goods_item_id: "g-a".into(),
            goods_item_id: "g-b".into(),
        }
        .plan();
        assert!(plan.covers(&ScopeKey::trades_by_goods_item("g-a")));
        assert!(plan.covers(&ScopeKey::trades_by_goods_item("g-b")));
        assert!(plan.covers(&ScopeKey::goods_item_stats("g-a")));
        assert!(plan.covers(&ScopeKey::goods_item_stats("g-b")));
    }

    #[test]
    fn deletes_tombstone_the_detail_prefix() {
        let plan = MutationEvent::GoodsItemDeleted {
            id: "g-1".into(),
            category_id: "cat-a".into(),
        }
        .plan();
        assert_eq!(plan.tombstone, Some(ScopeKey::goods_item("g-1")));
        // Every scope that could have contained the subtree falls.
        assert!(plan.covers(&ScopeKey::trades_all()));
        assert!(plan.covers(&ScopeKey::goods_by_category("cat-a")));
        assert!(plan.covers(&ScopeKey::goods_search("badge", None)));
    }

    #[test]
    fn trade_mutations_reach_category_aggregates() {
        let plan = MutationEvent::TradeCreated {
            goods_item_id: "g-1".into(),
        }
        .plan();
        assert!(plan.covers(&ScopeKey::category_stats("any-cat")));
        assert!(plan.covers(&ScopeKey::category_statistics()));
        // But the category list itself is untouched by a trade write.
        assert!(!plan.covers(&ScopeKey::categories()));
    }
}
