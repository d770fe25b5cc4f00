// Business domains
pub mod member;
