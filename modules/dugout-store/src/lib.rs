//! Postgres persistence for the forum. `PgStore` is the production
//! `ForumStore`; `schema` and `seed` bring a fresh database up to a usable
//! state (tables, indexes, the persona cast, the category list).

pub mod schema;
pub mod seed;
mod store;

pub use store::PgStore;
