pub mod module;
pub mod pagination;
pub mod registry;
pub mod settings;

pub use module::{module_path, InitCtx, Migration, Module, API_PREFIX};
pub use pagination::{Direction, Page, PageQuery, PageQueryError, PageRequest, Sort, SortKey};
pub use registry::ModuleRegistry;
