//! 比较等半径与等面积两种收缩策略.

mod profile;
mod result;
mod runner;

fn main() {
    simple_logger::init_with_level(log::Level::Info).unwrap();
    runner::run().analyze();
}
