pub mod asset;
pub mod asset_locations;
pub mod vaccine;
