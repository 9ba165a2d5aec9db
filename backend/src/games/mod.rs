pub mod backend_wheel_game;
pub mod wheel_table;
