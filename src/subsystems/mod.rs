pub mod auto_aim;
pub mod shot_table;
pub mod swerve;
