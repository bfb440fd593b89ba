//! Concrete [`SinkAdapter`](crate::connection::SinkAdapter) /
//! [`StreamAdapter`](crate::connection::StreamAdapter) pairs.
pub mod axum;
pub mod mpsc;
