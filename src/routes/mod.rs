pub mod account;
pub mod admin;
pub mod application;
pub mod callable;
pub mod internship;
pub mod notification;
pub mod og;
pub mod onboarding;
pub mod profile;
pub mod recruiter;
