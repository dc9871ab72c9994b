pub mod catalogue;
pub mod cold_storage;
pub mod db;
pub mod identity;
pub mod keys;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod statement;

pub mod util {
    pub mod env;
}

pub use db::Db;
pub use identity::IdentityStore;
