pub mod confidence;
pub mod direction;
pub mod signal_state;
pub mod timestamp;
