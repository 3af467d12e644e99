pub mod proxy;
pub mod request;
