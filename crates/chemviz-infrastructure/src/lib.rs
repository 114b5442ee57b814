pub mod config_service;
pub mod paths;
pub mod storage;
pub mod token_repository;

pub use crate::config_service::ConfigService;
pub use crate::paths::ChemvizPaths;
pub use crate::token_repository::FileTokenRepository;
