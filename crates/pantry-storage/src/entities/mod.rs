pub mod items;
pub mod members;
pub mod request_items;
pub mod requests;
pub mod stock_movements;

pub use items::Entity as Items;
pub use members::Entity as Members;
pub use request_items::Entity as RequestItems;
pub use requests::Entity as Requests;
pub use stock_movements::Entity as StockMovements;
