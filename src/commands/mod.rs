pub mod combine;
pub mod occurrence;
pub mod recommend;
pub mod rollup;
pub mod status;
