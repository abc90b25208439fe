// Presentation-facing surface: tracing setup and display-ready view models.

pub mod simple;
pub mod views;
