// Scheduled assessments: window status and submission scoring.

pub mod handlers;
pub mod window;
