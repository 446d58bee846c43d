//! SMS service facade applying the delivery-error policy.

pub(crate) mod structure;

pub use structure::SmsService;
