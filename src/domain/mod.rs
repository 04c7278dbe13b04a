pub mod fertilizer;
pub mod health;
pub mod measures;
pub mod plant;
pub mod timestamp;
