// Domain layer - Readings and the analytics derived from them
pub mod analytics;
pub mod reading;
