pub mod premiummodels;
pub mod predictionmodel;
pub mod referralmodel;
pub mod usermodel;
