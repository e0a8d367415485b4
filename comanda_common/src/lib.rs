mod colones;

pub mod helpers;
pub mod op;
mod secret;

pub use colones::{Colones, ColonesConversionError, CRC_CURRENCY_CODE, CRC_SYMBOL};
pub use secret::Secret;
