pub mod appointment;
pub mod call;
pub mod error;
pub mod reminder;

pub use appointment::*;
pub use call::*;
pub use error::AppError;
pub use reminder::*;
