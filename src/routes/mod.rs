pub mod auth;

pub mod offerings;

pub mod reviews;

pub mod statistics;

pub mod users;

pub use auth::configure_auth_routes;
pub use offerings::configure_offering_routes;
pub use reviews::configure_review_routes;
pub use statistics::configure_statistics_routes;
pub use users::configure_user_routes;
