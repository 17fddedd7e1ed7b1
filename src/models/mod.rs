pub mod enums;
pub mod financial;
pub mod idea;
pub mod investor;
pub mod roadmap;
pub mod scenario;
pub mod startup;
pub mod user;

pub use financial::*;
pub use idea::*;
pub use investor::*;
pub use roadmap::*;
pub use scenario::*;
pub use startup::*;
pub use user::*;
