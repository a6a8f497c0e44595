//! Hexon vehicle stock.

use chrono::FixedOffset;
use tradelink_core::{entity, Collection, Date, DateTime};

entity! {
    /// A vehicle in the Hexon stock feed.
    pub struct Vehicle {
        pub stocknumber: Option<String>,
        pub brand: Option<String>,
        pub model: Option<String>,
        pub mileage: Option<u64>,
        pub build_date: Date as "buildDate",
        pub publication_start: DateTime as "publicationStart",
        pub registered_at: Option<chrono::DateTime<FixedOffset>> as "registeredAt",
        pub imported_at: DateTime as "importedAt" [read_only],
    }
}

pub type VehicleList = Collection<Vehicle>;
