//! Entity schemas of the commerce APIs tradelink talks to.
//!
//! Each schema is declared with [`tradelink_core::entity!`]; transport and
//! authentication live with the API clients, not here.

pub mod adcurve;
pub mod auctio;
pub mod hexon;

pub use adcurve::{batch_payload, Product, ProductList};
pub use auctio::{LotMetaData, LotMetaDataList, MetaData};
pub use hexon::{Vehicle, VehicleList};
