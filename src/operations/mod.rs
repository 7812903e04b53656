pub mod add;
pub mod command;
pub mod edit;
pub mod filter;
pub mod import;
pub mod receipt;
pub mod remove;
pub mod report;
pub mod summary;
pub mod validate;
