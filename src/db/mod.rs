pub mod complaints;
pub mod models;
pub mod users;

pub use complaints::ComplaintRepository;
pub use models::{Complaint, ComplaintStatus, ComplaintWithStudent, User, UserProfile};
pub use users::UserRepository;
