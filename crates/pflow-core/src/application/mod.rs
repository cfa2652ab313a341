/// Ports to the remote engine, the event bus and the flow catalogue
pub mod ports;

/// Flow management service
pub mod flow_service;

/// Work order management service
pub mod work_order_service;

/// Flow lookup backed by the flow service
pub mod flow_lookup;
