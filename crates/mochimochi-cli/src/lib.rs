pub mod drivers;
pub mod util;
