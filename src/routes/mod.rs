pub mod audit;

pub mod auth;

pub mod cron;

pub mod documents;

pub mod forms;

pub mod schools;

pub mod students;

pub mod submissions;

pub mod system;

pub mod users;

pub use audit::configure_audit_routes;
pub use auth::configure_auth_routes;
pub use cron::configure_cron_routes;
pub use documents::configure_document_routes;
pub use forms::configure_form_routes;
pub use schools::configure_school_routes;
pub use students::configure_student_routes;
pub use submissions::configure_submission_routes;
pub use system::configure_system_routes;
pub use users::configure_user_routes;
