// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route here sits behind `jwt_auth_middleware`, which loads `AuthUser`
// from the `users` row. Role and ownership gates are checked per handler.

pub mod capacity;
pub mod constraints;
pub mod equipment;
pub mod mines;
pub mod payload;
pub mod production;
pub mod records;
pub mod roads;
pub mod shipping;
pub mod users;
pub mod weather;

pub use capacity::*;
pub use constraints::*;
pub use equipment::*;
pub use mines::*;
pub use production::*;
pub use roads::*;
pub use shipping::*;
pub use users::*;
pub use weather::*;
