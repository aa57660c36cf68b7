pub mod controller;
pub mod router;

pub use controller::AppController;
pub use router::TranslationRouter;
