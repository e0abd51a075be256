pub mod accounts;

pub use accounts::Accounts;
