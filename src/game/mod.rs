// Game rules: the board engine is deterministic and free of I/O.

pub mod board;

pub use board::Board;
