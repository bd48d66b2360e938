use std::collections::{BTreeMap, HashMap};

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use time::{Date, Duration, OffsetDateTime};

use crate::entities;
use crate::flags::{FlagParams, parse_expiry};
use crate::pantry::PantryStorage;
use crate::storage::{RequestStatus, StorageResult};

const RECENT_WINDOW_DAYS: i64 = 30;
const TOP_ITEMS_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct ItemLevel {
    pub item_name: String,
    pub unit: String,
    pub qty_available: f64,
    pub expiry_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingGap {
    pub request_id: i64,
    pub item_name: String,
    pub unit: String,
    pub qty_requested: f64,
    pub qty_available: f64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopItem {
    pub item_name: String,
    pub unit: String,
    pub total_requested: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub low_threshold: i64,
    pub exp_days: i64,
    pub total_items: usize,
    pub active_items: usize,
    pub inactive_items: usize,
    pub in_stock_items: usize,
    pub out_of_stock_items: usize,
    pub total_qty: f64,
    pub low_stock: Vec<ItemLevel>,
    pub expiring: Vec<ItemLevel>,
    pub status_counts: BTreeMap<String, usize>,
    pub total_requests: usize,
    pub recent_requests: usize,
    pub pending_gaps: Vec<PendingGap>,
    pub top_items: Vec<TopItem>,
    /// `IN`/`OUT` totals over the recent window.
    pub movement_totals: BTreeMap<String, f64>,
}

impl PantryStorage {
    pub async fn report(&self, params: FlagParams, now: OffsetDateTime) -> StorageResult<Report> {
        let db = self.connection();
        let items = entities::Items::find().all(db).await?;
        let requests = entities::Requests::find().all(db).await?;
        let lines = entities::RequestItems::find().all(db).await?;
        let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
        let movements = entities::StockMovements::find()
            .filter(entities::stock_movements::Column::CreatedAt.gte(cutoff))
            .all(db)
            .await?;

        let today = now.date();
        let items_by_id: HashMap<i64, &entities::items::Model> =
            items.iter().map(|item| (item.id, item)).collect();

        let mut status_counts: BTreeMap<String, usize> = BTreeMap::new();
        for request in &requests {
            *status_counts.entry(request.status.clone()).or_default() += 1;
        }
        let recent_requests = requests
            .iter()
            .filter(|request| request.created_at.date() >= cutoff.date())
            .count();

        let pending: Vec<i64> = requests
            .iter()
            .filter(|request| request.status == RequestStatus::Pending.as_str())
            .map(|request| request.id)
            .collect();
        let mut pending_gaps: Vec<PendingGap> = lines
            .iter()
            .filter(|line| pending.contains(&line.request_id))
            .filter_map(|line| {
                let item = items_by_id.get(&line.item_id)?;
                let short = !item.is_active || line.qty_requested > item.qty_available;
                short.then(|| PendingGap {
                    request_id: line.request_id,
                    item_name: item.item_name.clone(),
                    unit: item.unit.clone(),
                    qty_requested: line.qty_requested,
                    qty_available: item.qty_available,
                    is_active: item.is_active,
                })
            })
            .collect();
        pending_gaps.sort_by(|a, b| {
            b.request_id
                .cmp(&a.request_id)
                .then_with(|| a.item_name.cmp(&b.item_name))
        });

        let mut requested: HashMap<i64, f64> = HashMap::new();
        for line in &lines {
            *requested.entry(line.item_id).or_default() += line.qty_requested;
        }
        let mut top_items: Vec<TopItem> = requested
            .into_iter()
            .filter_map(|(item_id, total)| {
                let item = items_by_id.get(&item_id)?;
                Some(TopItem {
                    item_name: item.item_name.clone(),
                    unit: item.unit.clone(),
                    total_requested: total,
                })
            })
            .collect();
        top_items.sort_by(|a, b| {
            b.total_requested
                .total_cmp(&a.total_requested)
                .then_with(|| a.item_name.cmp(&b.item_name))
        });
        top_items.truncate(TOP_ITEMS_LIMIT);

        let mut movement_totals: BTreeMap<String, f64> = BTreeMap::new();
        for movement in &movements {
            *movement_totals
                .entry(movement.movement_type.clone())
                .or_default() += movement.qty;
        }

        Ok(Report {
            low_threshold: params.low_threshold,
            exp_days: params.exp_days,
            total_items: items.len(),
            active_items: items.iter().filter(|item| item.is_active).count(),
            inactive_items: items.iter().filter(|item| !item.is_active).count(),
            in_stock_items: items.iter().filter(|item| item.qty_available > 0.0).count(),
            out_of_stock_items: items.iter().filter(|item| item.qty_available <= 0.0).count(),
            total_qty: items.iter().map(|item| item.qty_available).sum(),
            low_stock: low_stock(&items, params),
            expiring: expiring(&items, params, today),
            total_requests: requests.len(),
            status_counts,
            recent_requests,
            pending_gaps,
            top_items,
            movement_totals,
        })
    }
}

/// Active items with some, but not much, stock left; lowest first.
fn low_stock(items: &[entities::items::Model], params: FlagParams) -> Vec<ItemLevel> {
    let mut rows: Vec<&entities::items::Model> = items
        .iter()
        .filter(|item| item.is_active && params.is_low(item.qty_available))
        .collect();
    rows.sort_by(|a, b| {
        a.qty_available
            .total_cmp(&b.qty_available)
            .then_with(|| a.item_name.cmp(&b.item_name))
    });
    rows.into_iter().map(item_level).collect()
}

/// Items whose expiry date falls on or before the horizon, including ones
/// already expired; soonest first.
fn expiring(items: &[entities::items::Model], params: FlagParams, today: Date) -> Vec<ItemLevel> {
    let horizon = params.expiry_horizon(today);
    let mut rows: Vec<(Date, &entities::items::Model)> = items
        .iter()
        .filter_map(|item| {
            let expiry = item.expiry_date.as_deref().and_then(parse_expiry)?;
            (expiry <= horizon).then_some((expiry, item))
        })
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.item_name.cmp(&b.1.item_name)));
    rows.into_iter().map(|(_, item)| item_level(item)).collect()
}

fn item_level(item: &entities::items::Model) -> ItemLevel {
    ItemLevel {
        item_name: item.item_name.clone(),
        unit: item.unit.clone(),
        qty_available: item.qty_available,
        expiry_date: item.expiry_date.clone(),
    }
}
