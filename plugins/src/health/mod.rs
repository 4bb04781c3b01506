mod tcp;

pub use tcp::TcpStoreClient;
