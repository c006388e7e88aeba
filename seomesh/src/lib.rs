// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

pub use handlers::{
    CatalogImport, PageImport, SchemaImport, Workspace, load_catalog_from_file,
    parse_catalog_import, parse_format, resolve_data_dir,
};
