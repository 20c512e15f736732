pub mod import;
pub mod orders;
pub mod serve;
pub mod status;
pub mod sync;

mod client;

pub(crate) use client::ApiClient;
