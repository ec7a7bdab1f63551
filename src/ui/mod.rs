//! 控制台层：crossterm 着色的对话渲染（render）与 stdin 人类输入（console）

pub mod console;
pub mod render;

pub use console::ConsoleInput;
pub use render::{format_turn, print_outcome, ConsoleObserver};
