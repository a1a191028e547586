pub mod notify;
pub mod session;

pub use notify::{ChangeFeed, ChangeNotice, Subscription};
pub use session::{PlanSession, PlanView, RefreshOutcome, SessionError, SessionSettings};
