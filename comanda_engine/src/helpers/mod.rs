mod epoch;
mod single_flight;

pub use epoch::{Epoch, EpochTicket};
pub use single_flight::{FlightGuard, SingleFlight};
