pub mod notifier;
pub mod scorer;
pub mod signal_repository;
