//! Discovery, building and publishing of collections of artifacts, with
//! smart dates resolved from publication metadata.

pub mod build;
pub mod config;
pub mod discovery;
pub mod filter;
pub mod manifest;
pub mod publish;
pub mod schema;
pub mod smartdates;
pub mod tree;
pub mod value;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
