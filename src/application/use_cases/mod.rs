mod build_book_vector;
pub mod keywords;
mod recommend_books;
pub mod reasons;
mod update_review_vectors;

pub use build_book_vector::*;
pub use recommend_books::*;
pub use update_review_vectors::*;
