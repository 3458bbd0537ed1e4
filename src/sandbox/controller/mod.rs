pub(crate) mod account;
pub mod error;
pub(crate) mod qr;
pub(crate) mod table;
