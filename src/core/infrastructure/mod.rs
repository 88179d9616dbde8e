pub mod cluster_client;
pub mod config_file;
pub mod http_client;
