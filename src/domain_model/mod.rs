mod token;
mod user;

pub use token::*;
pub use user::*;
