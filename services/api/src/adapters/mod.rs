pub mod assets;
pub mod db;

pub use assets::LocalAssetAdapter;
pub use db::DbAdapter;
