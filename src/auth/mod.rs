//! Authentication: credential issuance, token verification and role gating

pub mod cookies;
pub mod gate;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod session;
pub mod validation;

pub use cookies::{refresh_cookie, CookieSettings, REFRESH_COOKIE_NAME};
pub use gate::{authorize, require_admin, AdminUser};
pub use jwt::{Claims, TokenKind, TokenPair, TokenService, TokenSigner};
pub use middleware::{authenticate, require_auth, AuthUser};
pub use models::{Role, User, UserView};
pub use password::PasswordHasher;
pub use session::{AuthService, Issued, Registrar, Registration};
