pub mod app_config;
pub mod config;
pub mod profiles;
pub mod records;
pub mod sheet;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use profiles::{
    load_profiles, Locator, PriceRule, SiteProfile, SiteRegistry, StoreId, SubmitAction,
    UnknownStore, UrlRewrite,
};
pub use records::{FieldValue, ProductRecord, RunResults, SearchIssue, SearchStep, SearchTask};
pub use sheet::{locate_anchors, plan_updates, CellUpdate, SheetAnchors, SheetGrid, SheetItem};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read store profiles file {path}: {source}")]
    ProfilesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse store profiles: {0}")]
    ProfilesFileParse(#[from] serde_yaml::Error),

    #[error("store profile validation failed: {0}")]
    Validation(String),

    #[error("failed to access sheet {path}: {source}")]
    SheetIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("sheet layout error: {0}")]
    SheetLayout(String),

    #[error("malformed sheet data: {0}")]
    SheetFormat(#[from] csv::Error),
}
