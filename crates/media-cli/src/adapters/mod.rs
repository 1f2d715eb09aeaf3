//! In-tree service adapter implementations (C4).

pub mod example;
