pub mod clients;

pub use clients::{ClientRepository, InMemoryClientRepository, PgClientRepository};
