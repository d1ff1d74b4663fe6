pub mod coot;
pub mod doctor;
pub mod env;
pub mod ledger;
pub mod refmac;
pub mod view;
