use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::entities;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("db error: {0}")]
    Db(#[from] sea_orm::DbErr),
    #[error("{0}")]
    Invalid(String),
    #[error("no quantities selected")]
    EmptyRequest,
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("request already {}", .0.as_str())]
    AlreadyDecided(RequestStatus),
    #[error("not enough stock for {item}: requested {requested}, available {available}")]
    InsufficientStock {
        item: String,
        requested: f64,
        available: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "APPROVE" => Some(Self::Approve),
            "REJECT" => Some(Self::Reject),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementType {
    In,
    Out,
}

impl MovementType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Unrecognized values keep `default`.
    pub fn from_param(value: Option<&str>, default: Self) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "desc" => Self::Desc,
            Some(v) if v == "asc" => Self::Asc,
            _ => default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemSort {
    #[default]
    Name,
    Qty,
    Expiry,
    Status,
}

impl ItemSort {
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("qty") => Self::Qty,
            Some("expiry") => Self::Expiry,
            Some("status") => Self::Status,
            _ => Self::Name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestSort {
    #[default]
    Id,
    Status,
    Created,
}

impl RequestSort {
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("status") => Self::Status,
            Some("created") => Self::Created,
            _ => Self::Id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestLineInput {
    pub item_id: i64,
    pub qty: f64,
}

#[derive(Debug, Clone)]
pub struct MemberRequestInput {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub note: Option<String>,
    pub lines: Vec<RequestLineInput>,
}

#[derive(Debug, Clone, Default)]
pub struct NewItemInput {
    pub item_name: String,
    pub unit: String,
    pub sku: Option<String>,
    pub expiry_date: Option<String>,
    pub image_url: Option<String>,
    pub initial_qty: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ItemUpdateInput {
    pub add_qty: f64,
    pub expiry_date: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    pub q: Option<String>,
    pub sort: ItemSort,
    pub dir: SortDirection,
}

#[derive(Debug, Clone)]
pub struct RequestQuery {
    pub q: Option<String>,
    pub sort: RequestSort,
    pub dir: SortDirection,
}

impl Default for RequestQuery {
    fn default() -> Self {
        Self {
            q: None,
            sort: RequestSort::Id,
            dir: SortDirection::Desc,
        }
    }
}

/// An orderable item as shown to members.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogItem {
    pub id: i64,
    pub item_name: String,
    pub unit: String,
    pub qty_available: f64,
    pub image_url: Option<String>,
}

impl From<entities::items::Model> for CatalogItem {
    fn from(model: entities::items::Model) -> Self {
        Self {
            id: model.id,
            item_name: model.item_name,
            unit: model.unit,
            qty_available: model.qty_available,
            image_url: model.image_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StockItem {
    pub id: i64,
    pub sku: Option<String>,
    pub item_name: String,
    pub unit: String,
    pub qty_available: f64,
    pub expiry_date: Option<String>,
    pub is_active: bool,
    pub status: &'static str,
    pub flags: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberView {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestLine {
    pub item_id: i64,
    pub item_name: String,
    pub unit: String,
    pub qty_requested: f64,
    pub qty_available: f64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestDetail {
    pub id: i64,
    pub status: String,
    pub note: Option<String>,
    pub created_at: String,
    pub decided_at: Option<String>,
    pub decided_by: Option<String>,
    pub member: Option<MemberView>,
    pub lines: Vec<RequestLine>,
}

pub(crate) fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_default()
}
