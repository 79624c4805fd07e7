pub mod aggregate;
pub mod book;
pub mod detect;
pub mod dispatch;
pub mod events;
pub mod ledger;
pub mod messages;
pub mod stats;
pub mod worker;
