pub mod cancel;
pub mod contact;
pub mod eligibility;
pub mod models;

pub use cancel::{BookingRepository, CancelError, StatusMirror, StatusRequestTag};
pub use contact::{ContactCard, ContactDirectory, ContactReveal, PartyProfile};
pub use eligibility::{BookingActions, RefundPolicy};
pub use models::{Booking, BookingStatus, RevealSwitch};
