pub mod app_config;
pub mod config;
pub mod products;
pub mod projection;

pub use app_config::{AppConfig, DatabaseSettings};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use products::{stores_to_json, Patch, Product, ProductBody, ProductPatch, Stores};
pub use projection::{
    is_zero_value, project_fields, Assignment, ColumnValue, FieldDescriptor, FieldKind,
    FieldValue, Projection, ProjectionError, SparseRecord,
};
