pub mod capacity;
pub mod compare;
pub mod costs;
pub mod input;
pub mod loan;
pub mod metrics;
pub mod money;
pub mod projection;
pub mod rates;
pub mod time;
pub mod validate;
