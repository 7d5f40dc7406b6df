pub mod checkout;
pub mod session;
pub mod upgrade_types;
