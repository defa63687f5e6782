pub mod c_meetings;
