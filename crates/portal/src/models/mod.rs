//! Domain models for the portal.
//!
//! Gateway tables map to [`Account`], [`Course`] and [`Enrollment`]. Session
//! types live in [`session`].

pub mod account;
pub mod course;
pub mod enrollment;
pub mod session;

pub use account::{Account, NewAccount};
pub use course::{Course, CourseSelection};
pub use enrollment::{Enrollment, EnrollmentDraft};
pub use session::{CurrentAccount, StoredSession, session_keys};
