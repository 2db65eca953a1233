//! Tenant extraction: page text, prompts, the classification boundary and
//! homepage heuristics.

pub mod classifier;
pub mod extractor;
pub mod homepage;
pub mod page_text;
pub mod prompts;
pub mod response;

pub use classifier::{ChatClassifier, Classify, ClassifyError, ClassifyRequest};
pub use extractor::{Extraction, TenantExtractor};
