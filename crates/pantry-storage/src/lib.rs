pub mod entities;
pub mod flags;
pub mod pantry;
pub mod report;
pub mod storage;

pub use flags::FlagParams;
pub use pantry::PantryStorage;
pub use report::{ItemLevel, PendingGap, Report, TopItem};
pub use storage::{
    CatalogItem, Decision, ItemQuery, ItemSort, ItemUpdateInput, MemberRequestInput, MemberView,
    MovementType, NewItemInput, RequestDetail, RequestLine, RequestLineInput, RequestQuery,
    RequestSort, RequestStatus, SortDirection, StockItem, StorageError, StorageResult,
};
