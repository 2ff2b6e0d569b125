pub mod enrich;
pub mod export;
pub mod filter;
pub mod pagination;
pub mod params;
pub mod repository;
pub mod service;
pub mod sort;

#[cfg(test)]
pub mod test_support;
