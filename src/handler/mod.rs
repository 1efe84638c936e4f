pub mod auth;
pub mod predictions;
pub mod premium;
pub mod referral;
pub mod users;
