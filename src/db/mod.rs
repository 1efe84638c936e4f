pub mod cache;
pub mod db;
pub mod predictiondb;
pub mod premiumdb;
pub mod referraldb;
pub mod userdb;
