pub mod challenge;
pub mod login;
