pub mod tacky;

mod print_tacky;
mod tacky_gen;

pub use print_tacky::debug_tacky;
pub use tacky_gen::gen_tacky;
