pub mod audit;
pub mod message;
pub mod status;
pub mod topology;
pub mod validation;
