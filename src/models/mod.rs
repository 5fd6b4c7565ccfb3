pub mod account;
pub mod application;
pub mod internship;
pub mod notification;
pub mod onboarding;
pub mod profile;
pub mod recruiter;

pub use account::*;
pub use application::*;
pub use internship::*;
pub use notification::*;
pub use onboarding::*;
pub use profile::*;
pub use recruiter::*;
