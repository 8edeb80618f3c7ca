pub mod finalize_answer;
pub mod generate_query;
pub mod reflection;
pub mod web_research;

pub use finalize_answer::AnswerFinalizer;
pub use generate_query::QueryGenerator;
pub use reflection::Reflector;
pub use web_research::WebResearcher;
