pub mod drivetrain;
pub mod geometry;
pub mod heading;
pub mod io;
pub mod kinematics;
pub mod module;
pub mod odometry;
pub mod samples;
pub mod sim;
