pub mod s_meetings;
