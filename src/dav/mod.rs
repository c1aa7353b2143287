pub mod bodies;
pub mod http;
pub mod multistatus;
pub mod props;
pub mod transport;

#[cfg(test)]
pub mod fake;
