pub mod checkout;
pub mod reference;
pub mod status;
pub mod store;

pub use status::{diff_status, StatusTransition};
pub use store::{OrderContext, OrderStore, SeaOrderStore};
