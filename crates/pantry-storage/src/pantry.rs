#![allow(clippy::needless_update)]

use std::collections::{BTreeMap, HashMap};

use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, ConnectionTrait, Database,
    DatabaseBackend, DatabaseConnection, EntityTrait, Order, QueryFilter, QueryOrder, Schema,
    TransactionTrait,
};
use time::{Date, OffsetDateTime};
use tracing::debug;

use crate::entities;
use crate::flags::{FlagParams, parse_expiry, stock_flags};
use crate::storage::{
    CatalogItem, Decision, ItemQuery, ItemSort, ItemUpdateInput, MemberRequestInput, MemberView,
    MovementType, NewItemInput, RequestDetail, RequestLine, RequestQuery, RequestSort,
    RequestStatus, SortDirection, StockItem, StorageError, StorageResult, format_timestamp,
};

const MANAGER: &str = "manager";

#[derive(Clone)]
pub struct PantryStorage {
    db: DatabaseConnection,
}

impl PantryStorage {
    pub async fn connect(dsn: &str) -> StorageResult<Self> {
        let db = Database::connect(dsn).await?;
        // sqlx already enables foreign keys on every pooled sqlite connection;
        // this keeps the first one explicit.
        if db.get_database_backend() == DatabaseBackend::Sqlite {
            db.execute_unprepared("PRAGMA foreign_keys = ON").await?;
        }
        Ok(Self { db })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Entity-first schema sync: creates missing tables and adds missing
    /// columns to tables left behind by older deployments.
    pub async fn sync(&self) -> StorageResult<()> {
        Schema::new(self.db.get_database_backend())
            .builder()
            .register(entities::Members)
            .register(entities::Items)
            .register(entities::StockMovements)
            .register(entities::Requests)
            .register(entities::RequestItems)
            .sync(&self.db)
            .await?;
        Ok(())
    }

    pub async fn health(&self) -> StorageResult<()> {
        entities::Items::find()
            .order_by_asc(entities::items::Column::Id)
            .one(&self.db)
            .await?;
        Ok(())
    }

    pub async fn list_catalog(&self) -> StorageResult<Vec<CatalogItem>> {
        use entities::items::Column;

        let rows = entities::Items::find()
            .filter(Column::IsActive.eq(true))
            .filter(Column::QtyAvailable.gt(0.0))
            .order_by_asc(Column::ItemName)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(CatalogItem::from).collect())
    }

    /// Store a member's request. Lines with a non-positive quantity or an
    /// inactive/unknown item are dropped; if none remain nothing is written.
    pub async fn submit_request(&self, input: MemberRequestInput) -> StorageResult<i64> {
        use entities::items::Column as ItemColumn;

        let name = input.name.trim().to_string();
        let phone = input.phone.trim().to_string();
        let email = input.email.trim().to_string();
        if name.is_empty() || phone.is_empty() || email.is_empty() {
            return Err(StorageError::Invalid(
                "name, phone, and email are required".to_string(),
            ));
        }

        let mut wanted: BTreeMap<i64, f64> = BTreeMap::new();
        for line in input.lines {
            if line.qty.is_finite() && line.qty > 0.0 {
                *wanted.entry(line.item_id).or_default() += line.qty;
            }
        }
        if wanted.is_empty() {
            return Err(StorageError::EmptyRequest);
        }

        let now = OffsetDateTime::now_utc();
        let txn = self.db.begin().await?;

        // The active check and the line inserts share one transaction.
        let active_ids: Vec<i64> = entities::Items::find()
            .filter(ItemColumn::IsActive.eq(true))
            .filter(ItemColumn::Id.is_in(wanted.keys().copied().collect::<Vec<_>>()))
            .all(&txn)
            .await?
            .into_iter()
            .map(|item| item.id)
            .collect();
        wanted.retain(|item_id, _| active_ids.contains(item_id));
        if wanted.is_empty() {
            return Err(StorageError::EmptyRequest);
        }

        let member = entities::members::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(name),
            phone: ActiveValue::Set(phone),
            email: ActiveValue::Set(email),
            created_at: ActiveValue::Set(now),
            ..Default::default()
        };
        let member_id = entities::Members::insert(member)
            .exec(&txn)
            .await?
            .last_insert_id;

        let note = input
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let request = entities::requests::ActiveModel {
            id: ActiveValue::NotSet,
            member_id: ActiveValue::Set(member_id),
            status: ActiveValue::Set(RequestStatus::Pending.as_str().to_string()),
            note: ActiveValue::Set(note),
            created_at: ActiveValue::Set(now),
            decided_at: ActiveValue::Set(None),
            decided_by: ActiveValue::Set(None),
            ..Default::default()
        };
        let request_id = entities::Requests::insert(request)
            .exec(&txn)
            .await?
            .last_insert_id;

        for (item_id, qty) in &wanted {
            let line = entities::request_items::ActiveModel {
                id: ActiveValue::NotSet,
                request_id: ActiveValue::Set(request_id),
                item_id: ActiveValue::Set(*item_id),
                qty_requested: ActiveValue::Set(*qty),
                ..Default::default()
            };
            entities::RequestItems::insert(line).exec(&txn).await?;
        }

        txn.commit().await?;
        debug!(request_id, lines = wanted.len(), "member request stored");
        Ok(request_id)
    }

    pub async fn add_item(&self, input: NewItemInput) -> StorageResult<i64> {
        use entities::items::Column;

        let item_name = input.item_name.trim().to_string();
        let unit = input.unit.trim().to_string();
        if item_name.is_empty() || unit.is_empty() {
            return Err(StorageError::Invalid(
                "item_name and unit are required".to_string(),
            ));
        }
        let expiry_date = normalize_expiry(input.expiry_date)?;

        let existing = entities::Items::find()
            .filter(Column::ItemName.eq(item_name.as_str()))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(StorageError::Conflict(format!(
                "item {item_name} already exists"
            )));
        }

        let initial_qty = if input.initial_qty.is_finite() {
            input.initial_qty.max(0.0)
        } else {
            0.0
        };
        let now = OffsetDateTime::now_utc();
        let txn = self.db.begin().await?;

        let item = entities::items::ActiveModel {
            id: ActiveValue::NotSet,
            sku: ActiveValue::Set(non_empty(input.sku)),
            item_name: ActiveValue::Set(item_name),
            unit: ActiveValue::Set(unit),
            qty_available: ActiveValue::Set(initial_qty),
            is_active: ActiveValue::Set(true),
            image_url: ActiveValue::Set(non_empty(input.image_url)),
            expiry_date: ActiveValue::Set(expiry_date),
            created_at: ActiveValue::Set(now),
            ..Default::default()
        };
        let item_id = entities::Items::insert(item).exec(&txn).await?.last_insert_id;

        if initial_qty > 0.0 {
            insert_movement(&txn, item_id, MovementType::In, initial_qty, "Initial stock", now)
                .await?;
        }

        txn.commit().await?;
        Ok(item_id)
    }

    pub async fn update_item(&self, item_id: i64, input: ItemUpdateInput) -> StorageResult<()> {
        let expiry_date = normalize_expiry(input.expiry_date)?;
        let now = OffsetDateTime::now_utc();
        let txn = self.db.begin().await?;

        let Some(model) = entities::Items::find_by_id(item_id).one(&txn).await? else {
            return Err(StorageError::NotFound(format!("item {item_id}")));
        };
        let qty_available = model.qty_available;
        let mut active: entities::items::ActiveModel = model.into();

        if input.add_qty.is_finite() && input.add_qty > 0.0 {
            insert_movement(&txn, item_id, MovementType::In, input.add_qty, "Intake", now).await?;
            active.qty_available = ActiveValue::Set(qty_available + input.add_qty);
        }
        if let Some(expiry_date) = expiry_date {
            active.expiry_date = ActiveValue::Set(Some(expiry_date));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = ActiveValue::Set(is_active);
        }
        active.update(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    pub async fn list_items(
        &self,
        query: &ItemQuery,
        params: FlagParams,
        today: Date,
    ) -> StorageResult<Vec<StockItem>> {
        use entities::items::Column;

        let column = match query.sort {
            ItemSort::Name => Column::ItemName,
            ItemSort::Qty => Column::QtyAvailable,
            ItemSort::Expiry => Column::ExpiryDate,
            ItemSort::Status => Column::IsActive,
        };
        let mut select = entities::Items::find();
        if let Some(q) = search_term(query.q.as_deref()) {
            select = select.filter(
                Condition::any()
                    .add(Column::ItemName.contains(q))
                    .add(Column::Unit.contains(q)),
            );
        }
        let rows = select
            .order_by(column, order(query.dir))
            .order_by_asc(Column::ItemName)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|item| StockItem {
                flags: stock_flags(
                    item.expiry_date.as_deref(),
                    item.qty_available,
                    item.is_active,
                    params,
                    today,
                ),
                status: if item.is_active { "Active" } else { "Inactive" },
                id: item.id,
                sku: item.sku,
                item_name: item.item_name,
                unit: item.unit,
                qty_available: item.qty_available,
                expiry_date: item.expiry_date,
                is_active: item.is_active,
            })
            .collect())
    }

    pub async fn list_requests(&self, query: &RequestQuery) -> StorageResult<Vec<RequestDetail>> {
        use entities::requests::Column;

        let column = match query.sort {
            RequestSort::Id => Column::Id,
            RequestSort::Status => Column::Status,
            RequestSort::Created => Column::CreatedAt,
        };
        let requests = entities::Requests::find()
            .order_by(column, order(query.dir))
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await?;
        let details = self.assemble_requests(requests).await?;

        let Some(q) = search_term(query.q.as_deref()) else {
            return Ok(details);
        };
        let needle = q.to_lowercase();
        Ok(details
            .into_iter()
            .filter(|detail| {
                detail.id.to_string().contains(&needle)
                    || detail.member.as_ref().is_some_and(|m| {
                        m.name.to_lowercase().contains(&needle)
                            || m.phone.to_lowercase().contains(&needle)
                            || m.email.to_lowercase().contains(&needle)
                    })
            })
            .collect())
    }

    pub async fn get_request(&self, request_id: i64) -> StorageResult<RequestDetail> {
        let Some(request) = entities::Requests::find_by_id(request_id)
            .one(&self.db)
            .await?
        else {
            return Err(StorageError::NotFound(format!("request {request_id}")));
        };
        self.assemble_requests(vec![request])
            .await?
            .pop()
            .ok_or_else(|| StorageError::NotFound(format!("request {request_id}")))
    }

    /// Approve or reject a pending request. Approval deducts stock for every
    /// line and records `OUT` movements; if any line is short nothing changes.
    pub async fn decide_request(
        &self,
        request_id: i64,
        decision: Decision,
    ) -> StorageResult<RequestStatus> {
        use entities::request_items::Column as LineColumn;

        let now = OffsetDateTime::now_utc();
        let txn = self.db.begin().await?;

        let Some(request) = entities::Requests::find_by_id(request_id).one(&txn).await? else {
            return Err(StorageError::NotFound(format!("request {request_id}")));
        };
        let current = RequestStatus::parse(&request.status).unwrap_or(RequestStatus::Pending);
        if current != RequestStatus::Pending {
            return Err(StorageError::AlreadyDecided(current));
        }

        let next = match decision {
            Decision::Reject => RequestStatus::Rejected,
            Decision::Approve => {
                let lines = entities::RequestItems::find()
                    .filter(LineColumn::RequestId.eq(request_id))
                    .order_by_asc(LineColumn::Id)
                    .all(&txn)
                    .await?;
                let item_ids: Vec<i64> = lines.iter().map(|line| line.item_id).collect();
                let mut items: HashMap<i64, entities::items::Model> = entities::Items::find()
                    .filter(entities::items::Column::Id.is_in(item_ids))
                    .all(&txn)
                    .await?
                    .into_iter()
                    .map(|item| (item.id, item))
                    .collect();

                let mut remaining: HashMap<i64, f64> = items
                    .iter()
                    .map(|(id, item)| (*id, item.qty_available))
                    .collect();
                for line in &lines {
                    let available = remaining.get(&line.item_id).copied().unwrap_or(0.0);
                    if line.qty_requested > available {
                        let item = items
                            .get(&line.item_id)
                            .map(|item| item.item_name.clone())
                            .unwrap_or_else(|| format!("item {}", line.item_id));
                        return Err(StorageError::InsufficientStock {
                            item,
                            requested: line.qty_requested,
                            available,
                        });
                    }
                    remaining.insert(line.item_id, available - line.qty_requested);
                }

                let note = format!("Approved request #{request_id}");
                for line in &lines {
                    insert_movement(
                        &txn,
                        line.item_id,
                        MovementType::Out,
                        line.qty_requested,
                        &note,
                        now,
                    )
                    .await?;
                }
                for (item_id, qty) in remaining {
                    let Some(model) = items.remove(&item_id) else {
                        continue;
                    };
                    if model.qty_available == qty {
                        continue;
                    }
                    let mut active: entities::items::ActiveModel = model.into();
                    active.qty_available = ActiveValue::Set(qty);
                    active.update(&txn).await?;
                }
                RequestStatus::Approved
            }
        };

        let mut active: entities::requests::ActiveModel = request.into();
        active.status = ActiveValue::Set(next.as_str().to_string());
        active.decided_at = ActiveValue::Set(Some(now));
        active.decided_by = ActiveValue::Set(Some(MANAGER.to_string()));
        active.update(&txn).await?;

        txn.commit().await?;
        debug!(request_id, status = next.as_str(), "request decided");
        Ok(next)
    }

    async fn assemble_requests(
        &self,
        requests: Vec<entities::requests::Model>,
    ) -> StorageResult<Vec<RequestDetail>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }
        let request_ids: Vec<i64> = requests.iter().map(|r| r.id).collect();
        let member_ids: Vec<i64> = requests.iter().map(|r| r.member_id).collect();

        let members: HashMap<i64, entities::members::Model> = entities::Members::find()
            .filter(entities::members::Column::Id.is_in(member_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let lines = entities::RequestItems::find()
            .filter(entities::request_items::Column::RequestId.is_in(request_ids))
            .order_by_asc(entities::request_items::Column::Id)
            .all(&self.db)
            .await?;
        let item_ids: Vec<i64> = lines.iter().map(|line| line.item_id).collect();
        let items: HashMap<i64, entities::items::Model> = entities::Items::find()
            .filter(entities::items::Column::Id.is_in(item_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        let mut lines_by_request: HashMap<i64, Vec<RequestLine>> = HashMap::new();
        for line in lines {
            let Some(item) = items.get(&line.item_id) else {
                continue;
            };
            lines_by_request
                .entry(line.request_id)
                .or_default()
                .push(RequestLine {
                    item_id: item.id,
                    item_name: item.item_name.clone(),
                    unit: item.unit.clone(),
                    qty_requested: line.qty_requested,
                    qty_available: item.qty_available,
                    is_active: item.is_active,
                });
        }

        Ok(requests
            .into_iter()
            .map(|request| RequestDetail {
                id: request.id,
                member: members.get(&request.member_id).map(|m| MemberView {
                    id: m.id,
                    name: m.name.clone(),
                    phone: m.phone.clone(),
                    email: m.email.clone(),
                }),
                lines: lines_by_request.remove(&request.id).unwrap_or_default(),
                status: request.status,
                note: request.note,
                created_at: format_timestamp(request.created_at),
                decided_at: request.decided_at.map(format_timestamp),
                decided_by: request.decided_by,
            })
            .collect())
    }
}

async fn insert_movement<C: ConnectionTrait>(
    db: &C,
    item_id: i64,
    movement_type: MovementType,
    qty: f64,
    note: &str,
    at: OffsetDateTime,
) -> StorageResult<()> {
    let movement = entities::stock_movements::ActiveModel {
        id: ActiveValue::NotSet,
        item_id: ActiveValue::Set(item_id),
        movement_type: ActiveValue::Set(movement_type.as_str().to_string()),
        qty: ActiveValue::Set(qty),
        note: ActiveValue::Set(Some(note.to_string())),
        created_by: ActiveValue::Set(MANAGER.to_string()),
        created_at: ActiveValue::Set(at),
        ..Default::default()
    };
    entities::StockMovements::insert(movement).exec(db).await?;
    Ok(())
}

fn order(dir: SortDirection) -> Order {
    match dir {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    }
}

fn search_term(q: Option<&str>) -> Option<&str> {
    q.map(str::trim).filter(|q| !q.is_empty())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn normalize_expiry(value: Option<String>) -> StorageResult<Option<String>> {
    let Some(value) = non_empty(value) else {
        return Ok(None);
    };
    if parse_expiry(&value).is_none() {
        return Err(StorageError::Invalid(format!(
            "expiry_date must be YYYY-MM-DD, got {value}"
        )));
    }
    Ok(Some(value))
}
