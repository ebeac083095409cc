pub mod identity;
pub mod item;
pub mod ledger;
