//! Data models for the Estante client
//!
//! All entities are owned by the backend; these are the transient copies the
//! pages hold between re-fetches.

pub mod book;
pub mod fine;
pub mod loan;
pub mod notification;
pub mod report;
pub mod reservation;
pub(crate) mod timestamp;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookRef, BookStatus};
pub use fine::{Fine, FineStatus};
pub use loan::{Loan, LoanStatus};
pub use notification::Notification;
pub use reservation::{Reservation, ReservationStatus};
pub use user::{Identity, Role, User, UserRef};
