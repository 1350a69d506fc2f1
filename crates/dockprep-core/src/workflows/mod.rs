pub mod inspect;
pub mod prepare;
pub mod session;
