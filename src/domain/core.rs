mod registry;
mod reservation;

pub use self::registry::*;
pub use self::reservation::*;
