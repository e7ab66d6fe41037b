pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::{JwtClaims, JwtService};
pub use middleware::{auth_middleware, AuthState};
pub use models::AuthUser;
