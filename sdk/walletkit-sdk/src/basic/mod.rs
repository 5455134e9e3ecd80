pub mod accounts;
pub mod balance;
pub mod cache;
pub mod capability;
pub mod message;
pub mod sign_in;
pub mod submission;
pub mod transfer;
