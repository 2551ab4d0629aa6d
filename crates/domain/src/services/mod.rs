//! Domain services.

pub mod field_order;

pub use field_order::order_labels;
