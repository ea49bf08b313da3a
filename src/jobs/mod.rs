pub mod attendance_reset;
