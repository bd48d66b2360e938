pub mod bootstrap;

pub use bootstrap::initializer::{CommandInitializer, INIT_DB_FLAG, Initializer, SchemaInitializer};
pub use bootstrap::{BootstrapError, InitOutcome, Server, ensure_data_dir, launch, prepare_database};
