pub mod annotations;
pub mod evaluate;
pub mod grade;
pub mod recognize;
