pub mod protocol;
pub mod socket;

pub use socket::RealtimeClient;
