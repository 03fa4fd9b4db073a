mod request;
mod server;

pub use server::{HttpServer, Welcome};
