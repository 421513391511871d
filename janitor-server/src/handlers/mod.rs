pub mod reports;
pub mod scan;
pub mod status;
pub mod webhook;
