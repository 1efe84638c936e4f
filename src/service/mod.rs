pub mod access;
pub mod error;
pub mod premium_service;
pub mod referral_service;
