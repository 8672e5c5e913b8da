pub mod enqueue;

pub use enqueue::{enqueue_caller, peer_ip};
