pub mod predictiondtos;
pub mod premiumdtos;
pub mod referraldtos;
pub mod userdtos;
