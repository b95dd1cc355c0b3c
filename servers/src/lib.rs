//! Host applications around `lib_parking`: the parking host with its status board
//! and operator console, and a demo feed server.

pub mod parking_logic;
