//! Database entities

pub mod audit_log;
pub mod canteen;
pub mod donation_request;
pub mod food;
pub mod leaderboard;
pub mod login_activity;
pub mod meal_beneficiary;
pub mod ngo;
pub mod role;
pub mod user;
pub mod waste_report;

pub use audit_log::Entity as AuditLog;
pub use canteen::Entity as Canteen;
pub use donation_request::Entity as DonationRequest;
pub use food::Entity as Food;
pub use leaderboard::Entity as Leaderboard;
pub use login_activity::Entity as LoginActivity;
pub use meal_beneficiary::Entity as MealBeneficiary;
pub use ngo::Entity as Ngo;
pub use role::Entity as Role;
pub use user::Entity as User;
pub use waste_report::Entity as WasteReport;
