//! Pure helpers shared by state and controllers.

pub mod render;
pub mod scenarios;
