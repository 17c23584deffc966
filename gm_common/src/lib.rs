pub mod op;
mod points;
mod secret;

pub use points::{Points, PointsConversionError};
pub use secret::Secret;
