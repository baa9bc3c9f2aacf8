pub mod loader;
pub mod types;
pub mod utils;

pub use loader::{FileFormat, TableLoader};
pub use types::{CellValue, Column, ColumnType, Table};
