pub mod chronicle_client;
pub mod http_client;
pub mod insights_client;
