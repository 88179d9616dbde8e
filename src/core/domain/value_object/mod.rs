mod backend_address;
mod label_selector;
mod service_port;

pub use backend_address::BackendAddress;
pub use label_selector::LabelSelector;
pub use service_port::ServicePort;
