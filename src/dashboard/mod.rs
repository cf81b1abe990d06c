pub mod server;

pub use server::{router, start_status_server};
