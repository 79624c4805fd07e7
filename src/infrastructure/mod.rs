pub mod feeds;
pub mod notifiers;
pub mod scorers;
pub mod sqlite;
