pub mod catalog_service;
pub mod donation_service;
pub mod engagement_service;
pub mod identity_service;
pub mod lifecycle_service;
pub mod notification_service;
