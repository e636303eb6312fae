pub mod model;
pub mod preview;
pub mod service;
pub mod validate;
