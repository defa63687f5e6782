pub mod r_meetings;
pub mod r_users;
